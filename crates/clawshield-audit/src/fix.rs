//! Fixes - pure, idempotent transforms of a configuration document
//!
//! A fix never touches the disk. `apply` takes a snapshot and returns a new
//! document; applying the same fix to its own output changes nothing.

use crate::layout;
use clawshield_common::crypto;
use clawshield_core::{ConfigDocument, ConfigPath, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Mode applied by [`Fix::TightenPermissions`]
pub const OWNER_ONLY_MODE: u32 = 0o600;

/// A concrete remediation for one finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Fix {
    /// Store a fixed value at `path`
    SetValue { path: ConfigPath, value: Value },

    /// Switch gateway auth to token mode with a freshly generated token,
    /// unless a token of at least `min_token_length` is already active
    EnableTokenAuth { min_token_length: usize },

    /// Replace an `open` DM policy with `pairing`, or `allowlist` when an
    /// exec-class tool is enabled. Never loosens a stricter policy.
    RestrictDmPolicy { channel: String },

    /// Restrict the configuration file to its owner (OS-level, not a
    /// document edit)
    TightenPermissions,
}

impl Fix {
    /// Location this fix writes to
    pub fn target_path(&self) -> ConfigPath {
        match self {
            Fix::SetValue { path, .. } => path.clone(),
            Fix::EnableTokenAuth { .. } => layout::auth_token(),
            Fix::RestrictDmPolicy { channel } => layout::dm_policy_path(channel),
            Fix::TightenPermissions => ConfigPath::default(),
        }
    }

    /// Whether the fix edits the document (as opposed to the file's metadata)
    pub fn edits_document(&self) -> bool {
        !matches!(self, Fix::TightenPermissions)
    }

    /// Short operator-facing description, used for prompts
    pub fn describe(&self) -> String {
        match self {
            Fix::SetValue { path, value } => format!("Set {} to {}", path, value),
            Fix::EnableTokenAuth { .. } => {
                String::from("Enable token authentication with a new 256-bit token")
            }
            Fix::RestrictDmPolicy { channel } => {
                format!("Restrict DM policy of channel '{}'", channel)
            }
            Fix::TightenPermissions => {
                format!("Restrict file permissions to {:04o} (owner only)", OWNER_ONLY_MODE)
            }
        }
    }

    /// Apply the fix to a snapshot, returning the remediated document
    pub fn apply(&self, doc: &ConfigDocument) -> Result<ConfigDocument> {
        debug!("Applying fix: {}", self.describe());

        match self {
            Fix::SetValue { path, value } => doc.with_value(path, value.clone()),
            Fix::EnableTokenAuth { min_token_length } => enable_token_auth(doc, *min_token_length),
            Fix::RestrictDmPolicy { channel } => restrict_dm_policy(doc, channel),
            Fix::TightenPermissions => Ok(doc.clone()),
        }
    }
}

fn enable_token_auth(doc: &ConfigDocument, min_token_length: usize) -> Result<ConfigDocument> {
    let mode = doc
        .get_str(&layout::auth_mode())
        .unwrap_or(layout::DEFAULT_AUTH_MODE);
    let token_is_strong = doc
        .get_str(&layout::auth_token())
        .is_some_and(|token| token.chars().count() >= min_token_length);

    if mode == layout::DEFAULT_AUTH_MODE && token_is_strong {
        return Ok(doc.clone());
    }

    // A token that existed while auth was off is rotated as well.
    doc.with_value(&layout::auth_mode(), Value::from(layout::DEFAULT_AUTH_MODE))?
        .with_value(&layout::auth_token(), Value::from(crypto::generate_token()))
}

fn restrict_dm_policy(doc: &ConfigDocument, channel: &str) -> Result<ConfigDocument> {
    let path = layout::dm_policy_path(channel);
    if doc.get_str(&path) != Some(layout::POLICY_OPEN) {
        return Ok(doc.clone());
    }

    let target = if layout::exec_tool(doc).is_some() {
        layout::POLICY_ALLOWLIST
    } else {
        layout::POLICY_PAIRING
    };
    doc.with_value(&path, Value::from(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(json: &str) -> ConfigDocument {
        ConfigDocument::from_bytes("/tmp/openclaw.json", json.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_set_value_is_idempotent() {
        let fix = Fix::SetValue {
            path: layout::gateway_bind(),
            value: json!("loopback"),
        };
        let once = fix.apply(&doc(r#"{"gateway": {"bind": "0.0.0.0"}}"#)).unwrap();
        let twice = fix.apply(&once).unwrap();
        assert_eq!(once.root(), twice.root());
        assert_eq!(twice.get_str(&layout::gateway_bind()), Some("loopback"));
    }

    #[test]
    fn test_enable_token_auth_from_disabled() {
        let fix = Fix::EnableTokenAuth { min_token_length: 32 };
        let fixed = fix
            .apply(&doc(r#"{"gateway": {"auth": {"mode": "none"}}}"#))
            .unwrap();

        assert_eq!(fixed.get_str(&layout::auth_mode()), Some("token"));
        let token = fixed.get_str(&layout::auth_token()).unwrap();
        assert_eq!(token.len(), crypto::TOKEN_BYTES * 2);

        // A second application keeps the token it generated.
        let again = fix.apply(&fixed).unwrap();
        assert_eq!(again.root(), fixed.root());
    }

    #[test]
    fn test_enable_token_auth_rotates_weak_token() {
        let fix = Fix::EnableTokenAuth { min_token_length: 32 };
        let fixed = fix
            .apply(&doc(r#"{"gateway": {"auth": {"mode": "token", "token": "hunter2"}}}"#))
            .unwrap();
        assert_ne!(fixed.get_str(&layout::auth_token()), Some("hunter2"));
        assert!(fixed.is_edited());
    }

    #[test]
    fn test_enable_token_auth_keeps_strong_token() {
        let strong = "a".repeat(40);
        let json = format!(r#"{{"gateway": {{"auth": {{"token": "{}"}}}}}}"#, strong);
        let original = doc(&json);
        let fixed = Fix::EnableTokenAuth { min_token_length: 32 }
            .apply(&original)
            .unwrap();
        assert!(!fixed.is_edited());
    }

    #[test]
    fn test_restrict_dm_policy_without_exec() {
        let fix = Fix::RestrictDmPolicy {
            channel: "telegram".into(),
        };
        let fixed = fix
            .apply(&doc(r#"{"channels": {"telegram": {"enabled": true, "dmPolicy": "open"}}}"#))
            .unwrap();
        assert_eq!(
            fixed.get_str(&layout::dm_policy_path("telegram")),
            Some("pairing")
        );
    }

    #[test]
    fn test_restrict_dm_policy_with_exec_goes_to_allowlist() {
        let fix = Fix::RestrictDmPolicy {
            channel: "telegram".into(),
        };
        let fixed = fix
            .apply(&doc(
                r#"{"tools": {"exec": {"enabled": true}},
                    "channels": {"telegram": {"enabled": true, "dmPolicy": "open"}}}"#,
            ))
            .unwrap();
        assert_eq!(
            fixed.get_str(&layout::dm_policy_path("telegram")),
            Some("allowlist")
        );
    }

    #[test]
    fn test_restrict_dm_policy_never_loosens() {
        let original =
            doc(r#"{"channels": {"telegram": {"enabled": true, "dmPolicy": "allowlist"}}}"#);
        let fixed = Fix::RestrictDmPolicy {
            channel: "telegram".into(),
        }
        .apply(&original)
        .unwrap();
        assert!(!fixed.is_edited());
    }

    #[test]
    fn test_tighten_permissions_leaves_document_alone() {
        let original = doc(r#"{"gateway": {}}"#);
        let fixed = Fix::TightenPermissions.apply(&original).unwrap();
        assert!(!fixed.is_edited());
        assert!(!Fix::TightenPermissions.edits_document());
    }
}
