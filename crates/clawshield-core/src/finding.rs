//! Finding definitions - misconfigurations detected in an agent configuration

use crate::document::ConfigPath;
use crate::severity::{CheckCategory, Severity};
use serde::Serialize;
use serde_json::Value;

/// A single detected misconfiguration
///
/// Findings are produced by one evaluation pass and are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Check that generated this finding
    pub check_id: String,
    pub check_name: String,

    pub severity: Severity,
    pub category: CheckCategory,

    /// What is wrong, in one or two sentences
    pub message: String,

    /// Location within the config tree
    pub path: ConfigPath,

    /// Value found at `path` (`None` when the key is absent)
    pub current_value: Option<Value>,
    /// Value the remediation would set, if there is a single one
    pub recommended_value: Option<Value>,

    /// Operator-facing remediation hint
    pub remediation: Option<String>,
}

impl Finding {
    /// Create a new finding builder
    pub fn builder(check_id: impl Into<String>, path: impl Into<ConfigPath>) -> FindingBuilder {
        FindingBuilder::new(check_id, path)
    }
}

/// Builder for constructing findings
pub struct FindingBuilder {
    finding: Finding,
}

impl FindingBuilder {
    pub fn new(check_id: impl Into<String>, path: impl Into<ConfigPath>) -> Self {
        Self {
            finding: Finding {
                check_id: check_id.into(),
                check_name: String::new(),
                severity: Severity::Info,
                category: CheckCategory::Diagnostic,
                message: String::new(),
                path: path.into(),
                current_value: None,
                recommended_value: None,
                remediation: None,
            },
        }
    }

    pub fn check_name(mut self, name: impl Into<String>) -> Self {
        self.finding.check_name = name.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.finding.severity = severity;
        self
    }

    pub fn category(mut self, category: CheckCategory) -> Self {
        self.finding.category = category;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.finding.message = message.into();
        self
    }

    pub fn current(mut self, value: Option<Value>) -> Self {
        self.finding.current_value = value;
        self
    }

    pub fn recommended(mut self, value: impl Into<Value>) -> Self {
        self.finding.recommended_value = Some(value.into());
        self
    }

    pub fn remediation(mut self, remediation: impl Into<String>) -> Self {
        self.finding.remediation = Some(remediation.into());
        self
    }

    pub fn build(self) -> Finding {
        self.finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finding_builder() {
        let finding = Finding::builder("gateway-bind-exposed", "gateway.bind")
            .check_name("Gateway bind exposure")
            .severity(Severity::Critical)
            .category(CheckCategory::Network)
            .message("Gateway bound to '0.0.0.0'")
            .current(Some(json!("0.0.0.0")))
            .recommended("loopback")
            .remediation("Bind the gateway to loopback only")
            .build();

        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.path.to_string(), "gateway.bind");
        assert_eq!(finding.recommended_value, Some(json!("loopback")));
    }

    #[test]
    fn test_finding_serializes_path_as_string() {
        let finding = Finding::builder("x", "channels.telegram.dmPolicy").build();
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["path"], json!("channels.telegram.dmPolicy"));
        assert_eq!(value["severity"], json!("info"));
    }
}
