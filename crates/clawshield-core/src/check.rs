//! Check trait and metadata - the interface all configuration checks implement

use crate::document::ConfigDocument;
use crate::error::Result;
use crate::finding::Finding;
use crate::severity::{CheckCategory, Severity};
use serde::Serialize;

/// Result of evaluating a check
pub type CheckResult = Result<Vec<Finding>>;

/// The trait that all configuration checks must implement
///
/// Checks are stateless: they read the context and report, nothing else.
pub trait Check: Send + Sync {
    /// Unique identifier for this check (e.g., "gateway-bind-exposed")
    fn id(&self) -> &str;

    /// Get the check metadata
    fn metadata(&self) -> &CheckMetadata;

    /// Evaluate the check against the given context
    /// Returns zero or more findings, one per offending location
    fn evaluate(&self, ctx: &AuditContext<'_>) -> CheckResult;
}

/// Metadata describing a check
#[derive(Debug, Clone, Serialize)]
pub struct CheckMetadata {
    /// Unique identifier
    pub id: String,

    /// Human-readable title
    pub name: String,

    /// Detailed description
    pub description: String,

    /// Check category
    pub category: CheckCategory,

    /// Default severity of findings from this check
    pub severity: Severity,

    /// Tags for filtering/grouping
    pub tags: Vec<String>,
}

impl CheckMetadata {
    /// Create new check metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: CheckCategory,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            severity,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Start a finding pre-filled with this check's identity
    pub fn finding(&self, path: impl Into<crate::ConfigPath>) -> crate::finding::FindingBuilder {
        Finding::builder(&self.id, path)
            .check_name(&self.name)
            .severity(self.severity)
            .category(self.category)
    }
}

/// Permission bits of the configuration file, captured once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSnapshot {
    /// POSIX mode bits (lower 12 bits)
    Mode(u32),
    /// The platform has no POSIX permission bits
    Unsupported,
    /// Inspection failed
    Unavailable(String),
}

impl PermissionSnapshot {
    /// Group or world may access the file
    pub fn is_shared(&self) -> bool {
        matches!(self, PermissionSnapshot::Mode(mode) if mode & 0o077 != 0)
    }
}

/// Context passed to checks during evaluation
#[derive(Debug, Clone)]
pub struct AuditContext<'a> {
    /// The immutable document snapshot every check sees
    pub document: &'a ConfigDocument,

    /// Permission bits of the file backing the document
    pub permissions: &'a PermissionSnapshot,

    /// Shortest gateway token accepted as strong
    pub min_token_length: usize,
}

impl<'a> AuditContext<'a> {
    pub fn new(document: &'a ConfigDocument, permissions: &'a PermissionSnapshot) -> Self {
        Self {
            document,
            permissions,
            min_token_length: crate::DEFAULT_MIN_TOKEN_LENGTH,
        }
    }

    pub fn with_min_token_length(mut self, min: usize) -> Self {
        self.min_token_length = min;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigPath;

    struct TestCheck {
        metadata: CheckMetadata,
    }

    impl Check for TestCheck {
        fn id(&self) -> &str {
            &self.metadata.id
        }

        fn metadata(&self) -> &CheckMetadata {
            &self.metadata
        }

        fn evaluate(&self, ctx: &AuditContext<'_>) -> CheckResult {
            let path = ConfigPath::parse("gateway.port");
            match ctx.document.get(&path) {
                Some(port) if port.as_u64() == Some(23) => Ok(vec![self
                    .metadata
                    .finding(path)
                    .message("telnet port")
                    .build()]),
                _ => Ok(vec![]),
            }
        }
    }

    #[test]
    fn test_check_evaluation() {
        let check = TestCheck {
            metadata: CheckMetadata::new(
                "TEST-001",
                "Test Check",
                CheckCategory::Network,
                Severity::High,
            ),
        };
        let doc = ConfigDocument::from_bytes(
            "/tmp/test.json",
            br#"{"gateway": {"port": 23}}"#.to_vec(),
        )
        .unwrap();
        let perms = PermissionSnapshot::Mode(0o600);

        let findings = check.evaluate(&AuditContext::new(&doc, &perms)).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].check_id, "TEST-001");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_permission_snapshot_sharing() {
        assert!(!PermissionSnapshot::Mode(0o600).is_shared());
        assert!(PermissionSnapshot::Mode(0o640).is_shared());
        assert!(PermissionSnapshot::Mode(0o604).is_shared());
        assert!(!PermissionSnapshot::Unsupported.is_shared());
    }
}
