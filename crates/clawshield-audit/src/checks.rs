//! Built-in configuration checks
//!
//! The rule set is a table: each [`Rule`] pairs check metadata with an
//! evaluation function and a remedy function. The engine only sees the
//! `Check` side; the planner only sees the remedy side.

use crate::fix::{Fix, OWNER_ONLY_MODE};
use crate::layout;
use clawshield_common::crypto::mask_secret;
use clawshield_core::{
    AuditContext, Check, CheckCategory, CheckMetadata, CheckResult, ConfigPath, Error, Finding,
    PermissionSnapshot, Severity,
};
use regex::Regex;
use serde_json::Value;

pub const GATEWAY_BIND_EXPOSED: &str = "gateway-bind-exposed";
pub const GATEWAY_BIND_CUSTOM: &str = "gateway-bind-custom";
pub const GATEWAY_AUTH_WEAK: &str = "gateway-auth-weak";
pub const CHANNEL_DM_POLICY_OPEN: &str = "channel-dm-policy-open";
pub const CHANNEL_GROUP_POLICY_OPEN: &str = "channel-group-policy-open";
pub const EXEC_PERMISSIVE_CHANNEL: &str = "exec-permissive-channel";
pub const HARDCODED_SECRET: &str = "hardcoded-secret";
pub const CONFIG_FILE_PERMISSIONS: &str = "config-file-permissions";

/// API key shapes that should live in the environment, not the config
const SECRET_PATTERN: &str = r"^(sk-|AIza|xoxb-|xoxp-|ghp_)[A-Za-z0-9_\-]{8,}$";

/// Settings a remedy may need
#[derive(Debug, Clone, Copy)]
pub struct RemedyOptions {
    pub min_token_length: usize,
}

impl Default for RemedyOptions {
    fn default() -> Self {
        Self {
            min_token_length: clawshield_core::DEFAULT_MIN_TOKEN_LENGTH,
        }
    }
}

pub type Evaluate = fn(&CheckMetadata, &AuditContext<'_>) -> CheckResult;
pub type Remedy = fn(&Finding, &RemedyOptions) -> Option<Fix>;

/// One row of the rule table
#[derive(Clone)]
pub struct Rule {
    pub metadata: CheckMetadata,
    pub evaluate: Evaluate,
    pub remedy: Remedy,
}

impl Rule {
    pub fn new(metadata: CheckMetadata, evaluate: Evaluate, remedy: Remedy) -> Self {
        Self {
            metadata,
            evaluate,
            remedy,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.metadata.id)
            .field("severity", &self.metadata.severity)
            .finish()
    }
}

impl Check for Rule {
    fn id(&self) -> &str {
        &self.metadata.id
    }

    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> CheckResult {
        (self.evaluate)(&self.metadata, ctx)
    }
}

/// Built-in rules, in report order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            CheckMetadata::new(
                GATEWAY_BIND_EXPOSED,
                "Gateway bind exposure",
                CheckCategory::Network,
                Severity::Critical,
            )
            .with_description("The gateway listens on every network interface")
            .with_tag("gateway"),
            gateway_bind_exposed,
            set_recommended_value,
        ),
        Rule::new(
            CheckMetadata::new(
                GATEWAY_BIND_CUSTOM,
                "Custom gateway bind address",
                CheckCategory::Network,
                Severity::Low,
            )
            .with_description("The gateway is bound to a specific non-loopback address")
            .with_tag("gateway"),
            gateway_bind_custom,
            no_remedy,
        ),
        Rule::new(
            CheckMetadata::new(
                GATEWAY_AUTH_WEAK,
                "Missing or weak gateway authentication",
                CheckCategory::Authentication,
                Severity::Critical,
            )
            .with_description("Gateway authentication is disabled or the token is too short")
            .with_tag("gateway"),
            gateway_auth_weak,
            enable_token_auth,
        ),
        Rule::new(
            CheckMetadata::new(
                CHANNEL_DM_POLICY_OPEN,
                "Channel DM policy too permissive",
                CheckCategory::AccessControl,
                Severity::High,
            )
            .with_description("Anyone can direct-message the agent on this channel")
            .with_tag("channels"),
            channel_dm_policy_open,
            restrict_dm_policy,
        ),
        Rule::new(
            CheckMetadata::new(
                CHANNEL_GROUP_POLICY_OPEN,
                "Channel group policy too permissive",
                CheckCategory::AccessControl,
                Severity::High,
            )
            .with_description("The agent replies to anyone in any group on this channel")
            .with_tag("channels"),
            channel_group_policy_open,
            set_recommended_value,
        ),
        Rule::new(
            CheckMetadata::new(
                EXEC_PERMISSIVE_CHANNEL,
                "Exec tool reachable through a non-allowlisted channel",
                CheckCategory::AccessControl,
                Severity::Critical,
            )
            .with_description("Command execution is enabled and the channel is not allowlist-only")
            .with_tag("channels")
            .with_tag("tools"),
            exec_permissive_channel,
            set_recommended_value,
        ),
        Rule::new(
            CheckMetadata::new(
                HARDCODED_SECRET,
                "Hardcoded secret in config",
                CheckCategory::Secrets,
                Severity::Medium,
            )
            .with_description("An API key is stored in plaintext instead of the environment")
            .with_tag("secrets"),
            hardcoded_secret,
            no_remedy,
        ),
        Rule::new(
            CheckMetadata::new(
                CONFIG_FILE_PERMISSIONS,
                "Insecure config file permissions",
                CheckCategory::FileSystem,
                Severity::High,
            )
            .with_description("Group or other users can access the configuration file")
            .with_tag("filesystem"),
            config_file_permissions,
            tighten_permissions,
        ),
    ]
}

// === Evaluations ===

fn gateway_bind_exposed(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let path = layout::gateway_bind();
    let bind = match ctx.document.get(&path) {
        None => return Ok(vec![]),
        Some(Value::String(bind)) => bind.as_str(),
        Some(other) => {
            return Err(Error::CheckFailed {
                check_id: meta.id.clone(),
                message: format!("{} must be a string, found {}", path, other),
            })
        }
    };

    if !layout::WILDCARD_BINDS.contains(&bind) {
        return Ok(vec![]);
    }

    let port = ctx
        .document
        .get(&layout::gateway_port())
        .map(|p| p.to_string())
        .unwrap_or_else(|| String::from("unknown"));

    Ok(vec![meta
        .finding(path)
        .message(format!(
            "Gateway bound to '{}' on port {}. The control plane is exposed to the network",
            bind, port
        ))
        .current(Some(Value::from(bind)))
        .recommended(layout::DEFAULT_BIND)
        .remediation("Bind the gateway to loopback and reach it through an SSH tunnel or VPN")
        .build()])
}

fn gateway_bind_custom(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let path = layout::gateway_bind();
    let Some(bind) = ctx.document.get_str(&path) else {
        return Ok(vec![]);
    };

    if layout::WILDCARD_BINDS.contains(&bind) || layout::LOOPBACK_BINDS.contains(&bind) {
        return Ok(vec![]);
    }

    Ok(vec![meta
        .finding(path)
        .message(format!(
            "Custom bind address '{}'. Verify this interface is not reachable by untrusted hosts",
            bind
        ))
        .current(Some(Value::from(bind)))
        .recommended(layout::DEFAULT_BIND)
        .remediation("Confirm the address is intended, or bind to loopback")
        .build()])
}

fn gateway_auth_weak(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let mode_path = layout::auth_mode();
    let mode = match ctx.document.get(&mode_path) {
        None => layout::DEFAULT_AUTH_MODE,
        Some(Value::String(mode)) => mode.as_str(),
        Some(other) => {
            return Err(Error::CheckFailed {
                check_id: meta.id.clone(),
                message: format!("{} must be a string, found {}", mode_path, other),
            })
        }
    };

    if mode == "none" {
        return Ok(vec![meta
            .finding(mode_path)
            .message(
                "Gateway authentication is disabled (mode='none'). \
                 Anyone who reaches the gateway has full remote control",
            )
            .current(Some(Value::from(mode)))
            .recommended(layout::DEFAULT_AUTH_MODE)
            .remediation("Enable token authentication with a high-entropy token")
            .build()]);
    }

    if mode != layout::DEFAULT_AUTH_MODE {
        return Ok(vec![]);
    }

    let token_path = layout::auth_token();
    let token = ctx.document.get_str(&token_path);
    let length = token.map(|t| t.chars().count()).unwrap_or(0);
    if length >= ctx.min_token_length {
        return Ok(vec![]);
    }

    let message = match token {
        None => String::from("Token authentication is enabled but no token is configured"),
        Some(_) => format!(
            "Gateway token is weak ({} characters, minimum {})",
            length, ctx.min_token_length
        ),
    };

    Ok(vec![meta
        .finding(token_path)
        .message(message)
        .current(token.map(|t| Value::from(mask_secret(t))))
        .remediation("Rotate to a freshly generated 256-bit token")
        .build()])
}

fn channel_dm_policy_open(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    // With an exec tool enabled, pairing is not enough.
    let target = if layout::exec_tool(ctx.document).is_some() {
        layout::POLICY_ALLOWLIST
    } else {
        layout::POLICY_PAIRING
    };

    Ok(layout::enabled_channels(ctx.document)
        .into_iter()
        .filter(|(_, settings)| layout::dm_policy(settings) == Some(layout::POLICY_OPEN))
        .map(|(name, _)| {
            meta.finding(layout::dm_policy_path(name))
                .message(format!(
                    "DM policy of channel '{}' is 'open'. Anyone can message this agent",
                    name
                ))
                .current(Some(Value::from(layout::POLICY_OPEN)))
                .recommended(target)
                .remediation(format!("Set the DM policy to '{}'", target))
                .build()
        })
        .collect())
}

fn channel_group_policy_open(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    Ok(layout::enabled_channels(ctx.document)
        .into_iter()
        .filter(|(_, settings)| layout::group_policy(settings) == Some(layout::POLICY_OPEN))
        .map(|(name, _)| {
            meta.finding(layout::group_policy_path(name))
                .message(format!(
                    "Group policy of channel '{}' is 'open'. The agent replies to anyone in groups",
                    name
                ))
                .current(Some(Value::from(layout::POLICY_OPEN)))
                .recommended(layout::POLICY_ALLOWLIST)
                .remediation("Set the group policy to 'allowlist'")
                .build()
        })
        .collect())
}

fn exec_permissive_channel(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let Some(tool) = layout::exec_tool(ctx.document) else {
        return Ok(vec![]);
    };

    Ok(layout::enabled_channels(ctx.document)
        .into_iter()
        .filter_map(|(name, settings)| {
            let policy = layout::dm_policy(settings)?;
            (policy != layout::POLICY_ALLOWLIST).then_some((name, policy))
        })
        .map(|(name, policy)| {
            meta.finding(layout::dm_policy_path(name))
                .message(format!(
                    "Compound risk: exec tool '{}' is enabled and channel '{}' uses DM policy '{}'. \
                     Anyone admitted by that policy can run commands on this host",
                    tool, name, policy
                ))
                .current(ctx.document.get(&layout::dm_policy_path(name)).cloned())
                .recommended(layout::POLICY_ALLOWLIST)
                .remediation("Restrict the channel to an explicit allowlist, or disable the exec tool")
                .build()
        })
        .collect())
}

fn hardcoded_secret(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let pattern = Regex::new(SECRET_PATTERN).map_err(|e| Error::CheckFailed {
        check_id: meta.id.clone(),
        message: format!("Invalid regex: {}", e),
    })?;

    let mut hits = Vec::new();
    collect_secrets(ctx.document.root(), ConfigPath::default(), &pattern, &mut hits);

    Ok(hits
        .into_iter()
        .map(|(path, secret)| {
            let env_name = env_var_name(&path);
            meta.finding(path.clone())
                .message(format!(
                    "Potential API key stored in plaintext at '{}'. \
                     Config files leak through git, backups and logs",
                    path
                ))
                .current(Some(Value::from(mask_secret(&secret))))
                .remediation(format!(
                    "Remove the key from the config, rotate it, and provide it through an \
                     environment variable instead (e.g. export {}=\"...\")",
                    env_name
                ))
                .build()
        })
        .collect())
}

fn collect_secrets(
    node: &Value,
    path: ConfigPath,
    pattern: &Regex,
    hits: &mut Vec<(ConfigPath, String)>,
) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                collect_secrets(value, path.child(key.as_str()), pattern, hits);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                collect_secrets(value, path.child(index.to_string()), pattern, hits);
            }
        }
        Value::String(s) if pattern.is_match(s) => hits.push((path, s.clone())),
        _ => {}
    }
}

/// Suggested environment variable name for a secret at `path`
fn env_var_name(path: &ConfigPath) -> String {
    let leaf = path
        .segments()
        .iter()
        .rev()
        .find(|s| s.parse::<usize>().is_err())
        .map(String::as_str)
        .unwrap_or("secret");
    let mut name: String = leaf
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if !name.ends_with("KEY") && !name.ends_with("TOKEN") {
        name.push_str("_KEY");
    }
    name
}

fn config_file_permissions(meta: &CheckMetadata, ctx: &AuditContext<'_>) -> CheckResult {
    let file = ctx.document.path().display().to_string();

    match ctx.permissions {
        PermissionSnapshot::Mode(mode) => {
            let scope = if mode & 0o007 != 0 {
                "world-accessible"
            } else if mode & 0o070 != 0 {
                "group-accessible"
            } else {
                return Ok(vec![]);
            };

            Ok(vec![meta
                .finding(ConfigPath::default())
                .message(format!(
                    "Config file {} is {} (mode {:04o})",
                    file, scope, mode
                ))
                .current(Some(Value::from(format!("{:04o}", mode))))
                .recommended(format!("{:04o}", OWNER_ONLY_MODE))
                .remediation(format!("chmod {:o} {}", OWNER_ONLY_MODE, file))
                .build()])
        }
        PermissionSnapshot::Unsupported => Ok(vec![meta
            .finding(ConfigPath::default())
            .severity(Severity::Info)
            .message(format!(
                "Permission bits do not apply on this platform; review the access list of {} manually",
                file
            ))
            .remediation("Ensure only your user and administrators can read the file")
            .build()]),
        PermissionSnapshot::Unavailable(reason) => Err(Error::CheckFailed {
            check_id: meta.id.clone(),
            message: format!("Cannot inspect permissions of {}: {}", file, reason),
        }),
    }
}

// === Remedies ===

fn no_remedy(_finding: &Finding, _options: &RemedyOptions) -> Option<Fix> {
    None
}

fn set_recommended_value(finding: &Finding, _options: &RemedyOptions) -> Option<Fix> {
    finding.recommended_value.clone().map(|value| Fix::SetValue {
        path: finding.path.clone(),
        value,
    })
}

fn enable_token_auth(_finding: &Finding, options: &RemedyOptions) -> Option<Fix> {
    Some(Fix::EnableTokenAuth {
        min_token_length: options.min_token_length,
    })
}

fn restrict_dm_policy(finding: &Finding, _options: &RemedyOptions) -> Option<Fix> {
    // channels.<name>.dmPolicy
    match finding.path.segments() {
        [_, channel, _] => Some(Fix::RestrictDmPolicy {
            channel: channel.clone(),
        }),
        _ => None,
    }
}

fn tighten_permissions(finding: &Finding, _options: &RemedyOptions) -> Option<Fix> {
    // The platform advisory carries no recommended mode.
    finding
        .recommended_value
        .as_ref()
        .map(|_| Fix::TightenPermissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_core::ConfigDocument;
    use serde_json::json;

    fn doc(json: &str) -> ConfigDocument {
        ConfigDocument::from_bytes("/tmp/openclaw.json", json.as_bytes().to_vec()).unwrap()
    }

    fn rule(id: &str) -> Rule {
        builtin_rules()
            .into_iter()
            .find(|r| r.metadata.id == id)
            .unwrap()
    }

    fn run(id: &str, json: &str) -> Vec<Finding> {
        run_with_perms(id, json, PermissionSnapshot::Mode(0o600))
    }

    fn run_with_perms(id: &str, json: &str, perms: PermissionSnapshot) -> Vec<Finding> {
        let d = doc(json);
        rule(id).evaluate(&AuditContext::new(&d, &perms)).unwrap()
    }

    #[test]
    fn test_rule_ids_are_unique_and_ordered() {
        let ids: Vec<String> = builtin_rules().into_iter().map(|r| r.metadata.id).collect();
        assert_eq!(
            ids,
            vec![
                GATEWAY_BIND_EXPOSED,
                GATEWAY_BIND_CUSTOM,
                GATEWAY_AUTH_WEAK,
                CHANNEL_DM_POLICY_OPEN,
                CHANNEL_GROUP_POLICY_OPEN,
                EXEC_PERMISSIVE_CHANNEL,
                HARDCODED_SECRET,
                CONFIG_FILE_PERMISSIONS,
            ]
        );
    }

    #[test]
    fn test_bind_exposed() {
        for bind in ["0.0.0.0", "all", "::"] {
            let json = format!(r#"{{"gateway": {{"bind": "{}", "port": 18789}}}}"#, bind);
            let findings = run(GATEWAY_BIND_EXPOSED, &json);
            assert_eq!(findings.len(), 1, "bind {}", bind);
            assert_eq!(findings[0].severity, Severity::Critical);
            assert_eq!(findings[0].recommended_value, Some(json!("loopback")));
            assert!(findings[0].message.contains("18789"));
        }
        assert!(run(GATEWAY_BIND_EXPOSED, r#"{"gateway": {"bind": "loopback"}}"#).is_empty());
        assert!(run(GATEWAY_BIND_EXPOSED, r#"{}"#).is_empty());
    }

    #[test]
    fn test_bind_exposed_faults_on_wrong_type() {
        let d = doc(r#"{"gateway": {"bind": 0}}"#);
        let perms = PermissionSnapshot::Mode(0o600);
        let err = rule(GATEWAY_BIND_EXPOSED)
            .evaluate(&AuditContext::new(&d, &perms))
            .unwrap_err();
        assert!(matches!(err, Error::CheckFailed { .. }));
    }

    #[test]
    fn test_bind_custom() {
        let findings = run(GATEWAY_BIND_CUSTOM, r#"{"gateway": {"bind": "192.168.1.20"}}"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(run(GATEWAY_BIND_CUSTOM, r#"{"gateway": {"bind": "0.0.0.0"}}"#).is_empty());
        assert!(run(GATEWAY_BIND_CUSTOM, r#"{"gateway": {"bind": "127.0.0.1"}}"#).is_empty());
    }

    #[test]
    fn test_auth_disabled() {
        let findings = run(GATEWAY_AUTH_WEAK, r#"{"gateway": {"auth": {"mode": "none"}}}"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path.to_string(), "gateway.auth.mode");
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_auth_missing_token_is_flagged() {
        let findings = run(GATEWAY_AUTH_WEAK, r#"{}"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path.to_string(), "gateway.auth.token");
        assert_eq!(findings[0].current_value, None);
    }

    #[test]
    fn test_auth_weak_token_is_masked() {
        let findings = run(
            GATEWAY_AUTH_WEAK,
            r#"{"gateway": {"auth": {"mode": "token", "token": "changeme-please"}}}"#,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].current_value, Some(json!("chan...ease")));
    }

    #[test]
    fn test_auth_strong_token_passes() {
        let json = format!(
            r#"{{"gateway": {{"auth": {{"mode": "token", "token": "{}"}}}}}}"#,
            "f".repeat(64)
        );
        assert!(run(GATEWAY_AUTH_WEAK, &json).is_empty());
    }

    #[test]
    fn test_auth_respects_configured_minimum() {
        let d = doc(&format!(
            r#"{{"gateway": {{"auth": {{"token": "{}"}}}}}}"#,
            "f".repeat(40)
        ));
        let perms = PermissionSnapshot::Mode(0o600);
        let strict = AuditContext::new(&d, &perms).with_min_token_length(48);
        assert_eq!(rule(GATEWAY_AUTH_WEAK).evaluate(&strict).unwrap().len(), 1);
    }

    #[test]
    fn test_dm_policy_open_per_channel() {
        let findings = run(
            CHANNEL_DM_POLICY_OPEN,
            r#"{"channels": {
                "telegram": {"enabled": true, "dmPolicy": "open"},
                "discord": {"enabled": true, "dmPolicy": "pairing"},
                "slack": {"enabled": false, "dmPolicy": "open"},
                "whatsapp": {"enabled": true, "dmPolicy": "open"}
            }}"#,
        );
        let paths: Vec<String> = findings.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(
            paths,
            vec!["channels.telegram.dmPolicy", "channels.whatsapp.dmPolicy"]
        );
        assert_eq!(findings[0].recommended_value, Some(json!("pairing")));
    }

    #[test]
    fn test_group_policy_open() {
        let findings = run(
            CHANNEL_GROUP_POLICY_OPEN,
            r#"{"channels": {"discord": {"enabled": true, "groupPolicy": "open"}}}"#,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].recommended_value, Some(json!("allowlist")));
    }

    #[test]
    fn test_exec_compound_requires_both_conditions() {
        let channel_only = r#"{"channels": {"telegram": {"enabled": true, "dmPolicy": "open"}}}"#;
        assert!(run(EXEC_PERMISSIVE_CHANNEL, channel_only).is_empty());

        let allowlisted = r#"{"tools": {"exec": {"enabled": true}},
            "channels": {"telegram": {"enabled": true, "dmPolicy": "allowlist"}}}"#;
        assert!(run(EXEC_PERMISSIVE_CHANNEL, allowlisted).is_empty());

        let pairing = r#"{"tools": {"allow": ["bash"]},
            "channels": {"telegram": {"enabled": true}}}"#;
        let findings = run(EXEC_PERMISSIVE_CHANNEL, pairing);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Compound risk"));
        assert!(findings[0].message.contains("bash"));
        assert_eq!(findings[0].current_value, None);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_hardcoded_secrets() {
        let findings = run(
            HARDCODED_SECRET,
            r#"{"models": {"openai": {"apiKey": "sk-proj-abcdefghijklmnop"}},
                "plugins": [{"token": "ghp_0123456789abcdef"}],
                "env": {"OPENAI": "${OPENAI_API_KEY}"},
                "note": "sk-"}"#,
        );
        let paths: Vec<String> = findings.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(paths, vec!["models.openai.apiKey", "plugins.0.token"]);
        assert_eq!(findings[0].current_value, Some(json!("sk-p...mnop")));
        assert!(findings[0]
            .remediation
            .as_deref()
            .unwrap()
            .contains("APIKEY"));
        assert!(findings[1].remediation.as_deref().unwrap().contains("TOKEN"));
    }

    #[test]
    fn test_file_permissions() {
        let world = run_with_perms(CONFIG_FILE_PERMISSIONS, "{}", PermissionSnapshot::Mode(0o644));
        assert_eq!(world.len(), 1);
        assert!(world[0].message.contains("world-accessible"));

        let group = run_with_perms(CONFIG_FILE_PERMISSIONS, "{}", PermissionSnapshot::Mode(0o640));
        assert!(group[0].message.contains("group-accessible"));

        assert!(
            run_with_perms(CONFIG_FILE_PERMISSIONS, "{}", PermissionSnapshot::Mode(0o600))
                .is_empty()
        );

        let unsupported =
            run_with_perms(CONFIG_FILE_PERMISSIONS, "{}", PermissionSnapshot::Unsupported);
        assert_eq!(unsupported[0].severity, Severity::Info);
        assert_eq!(
            tighten_permissions(&unsupported[0], &RemedyOptions::default()),
            None
        );
    }

    #[test]
    fn test_remedies() {
        let options = RemedyOptions::default();
        let bind = &run(GATEWAY_BIND_EXPOSED, r#"{"gateway": {"bind": "0.0.0.0"}}"#)[0];
        assert_eq!(
            set_recommended_value(bind, &options),
            Some(Fix::SetValue {
                path: layout::gateway_bind(),
                value: json!("loopback"),
            })
        );

        let dm = &run(
            CHANNEL_DM_POLICY_OPEN,
            r#"{"channels": {"telegram": {"enabled": true, "dmPolicy": "open"}}}"#,
        )[0];
        assert_eq!(
            restrict_dm_policy(dm, &options),
            Some(Fix::RestrictDmPolicy {
                channel: "telegram".into()
            })
        );
    }
}
