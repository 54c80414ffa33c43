//! Where the agent runtime keeps the settings the checks inspect
//!
//! Defaults mirror the runtime: an absent bind means loopback, an absent auth
//! mode means token auth, channels are disabled unless `enabled` is true, an
//! absent DM policy means pairing and an absent group policy means allowlist.

use clawshield_core::{ConfigDocument, ConfigPath};
use serde_json::{Map, Value};

/// Bind values that listen on every interface
pub const WILDCARD_BINDS: &[&str] = &["0.0.0.0", "all", "::", "[::]", "lan", "*"];

/// Bind values restricted to the local machine
pub const LOOPBACK_BINDS: &[&str] = &["loopback", "localhost", "127.0.0.1", "::1", "[::1]"];

/// Tool names that give the agent shell-level execution
pub const EXEC_TOOL_NAMES: &[&str] = &["exec", "bash", "shell", "process"];

pub const DEFAULT_BIND: &str = "loopback";
pub const DEFAULT_AUTH_MODE: &str = "token";
pub const DEFAULT_DM_POLICY: &str = "pairing";
pub const DEFAULT_GROUP_POLICY: &str = "allowlist";

pub const POLICY_OPEN: &str = "open";
pub const POLICY_PAIRING: &str = "pairing";
pub const POLICY_ALLOWLIST: &str = "allowlist";

pub fn gateway_bind() -> ConfigPath {
    ConfigPath::parse("gateway.bind")
}

pub fn gateway_port() -> ConfigPath {
    ConfigPath::parse("gateway.port")
}

pub fn auth_mode() -> ConfigPath {
    ConfigPath::parse("gateway.auth.mode")
}

pub fn auth_token() -> ConfigPath {
    ConfigPath::parse("gateway.auth.token")
}

pub fn channels() -> ConfigPath {
    ConfigPath::parse("channels")
}

pub fn dm_policy_path(channel: &str) -> ConfigPath {
    channels().child(channel).child("dmPolicy")
}

pub fn group_policy_path(channel: &str) -> ConfigPath {
    channels().child(channel).child("groupPolicy")
}

/// Channels with `enabled: true`, in document order
pub fn enabled_channels(doc: &ConfigDocument) -> Vec<(&str, &Map<String, Value>)> {
    doc.get_object(&channels())
        .map(|channels| {
            channels
                .iter()
                .filter_map(|(name, settings)| {
                    let settings = settings.as_object()?;
                    let enabled = settings
                        .get("enabled")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    enabled.then_some((name.as_str(), settings))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// DM policy of a channel, `None` if set to a non-string value
pub fn dm_policy(settings: &Map<String, Value>) -> Option<&str> {
    match settings.get("dmPolicy") {
        None => Some(DEFAULT_DM_POLICY),
        Some(value) => value.as_str(),
    }
}

/// Group policy of a channel, `None` if set to a non-string value
pub fn group_policy(settings: &Map<String, Value>) -> Option<&str> {
    match settings.get("groupPolicy") {
        None => Some(DEFAULT_GROUP_POLICY),
        Some(value) => value.as_str(),
    }
}

/// Name of an enabled exec-class tool, if any
///
/// Accepts `tools.exec.enabled: true`, `tools.exec: true`, or an exec-class
/// name listed in `tools.allow`.
pub fn exec_tool(doc: &ConfigDocument) -> Option<String> {
    let tools = doc.get_object(&ConfigPath::parse("tools"))?;

    let exec_enabled = match tools.get("exec") {
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::Object(exec)) => exec
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        _ => false,
    };
    if exec_enabled {
        return Some(String::from("exec"));
    }

    tools
        .get("allow")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .find(|name| EXEC_TOOL_NAMES.contains(name))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> ConfigDocument {
        ConfigDocument::from_bytes("/tmp/openclaw.json", json.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_enabled_channels_skips_disabled() {
        let d = doc(r#"{"channels": {
            "telegram": {"enabled": true, "dmPolicy": "open"},
            "discord": {"enabled": false, "dmPolicy": "open"},
            "slack": {"dmPolicy": "open"},
            "broken": "yes"
        }}"#);
        let names: Vec<&str> = enabled_channels(&d).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["telegram"]);
    }

    #[test]
    fn test_policy_defaults() {
        let settings = Map::new();
        assert_eq!(dm_policy(&settings), Some(DEFAULT_DM_POLICY));
        assert_eq!(group_policy(&settings), Some(DEFAULT_GROUP_POLICY));
    }

    #[test]
    fn test_exec_tool_detection() {
        assert_eq!(exec_tool(&doc(r#"{}"#)), None);
        assert_eq!(
            exec_tool(&doc(r#"{"tools": {"exec": {"enabled": true}}}"#)),
            Some("exec".into())
        );
        assert_eq!(exec_tool(&doc(r#"{"tools": {"exec": true}}"#)), Some("exec".into()));
        assert_eq!(exec_tool(&doc(r#"{"tools": {"exec": {"enabled": false}}}"#)), None);
        assert_eq!(
            exec_tool(&doc(r#"{"tools": {"allow": ["web_search", "bash"]}}"#)),
            Some("bash".into())
        );
    }
}
