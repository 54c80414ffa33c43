//! Rule engine - orchestrates check execution

use crate::checks::{builtin_rules, Rule};
use clawshield_core::{
    AuditContext, Check, CheckCategory, ConfigDocument, ConfigPath, Finding, PermissionSnapshot,
    Severity, DEFAULT_MIN_TOKEN_LENGTH,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// How a run ended, for the CLI to map to an exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Nothing to report, or nothing accepted
    Clean,
    /// Findings reported, file not modified
    FindingsReported,
    /// Accepted fixes written to disk
    Persisted,
    /// Session failed; the original file is intact
    Failed,
}

impl Completion {
    pub fn exit_code(&self) -> i32 {
        match self {
            Completion::Clean | Completion::Persisted => 0,
            Completion::FindingsReported => 1,
            Completion::Failed => 2,
        }
    }
}

/// Runs an ordered set of checks against one document snapshot
pub struct RuleEngine {
    checks: Vec<Box<dyn Check>>,
    min_token_length: usize,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Findings in check declaration order
    pub findings: Vec<Finding>,
    pub summary: AuditSummary,
}

/// Summary of an evaluation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    /// Checks run
    pub total_checks: usize,
    /// Checks that produced no finding
    pub passed: usize,
    /// Checks that produced at least one finding
    pub flagged: usize,
    /// Checks that faulted (reported as diagnostics)
    pub errors: usize,
    /// Findings by severity, diagnostics excluded
    pub by_severity: BTreeMap<Severity, usize>,
}

impl AuditReport {
    /// Findings that are not check diagnostics
    pub fn actionable(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.category != CheckCategory::Diagnostic)
    }

    pub fn completion(&self) -> Completion {
        if self.findings.is_empty() {
            Completion::Clean
        } else {
            Completion::FindingsReported
        }
    }
}

impl RuleEngine {
    /// Engine with every built-in rule
    pub fn new() -> Self {
        Self::with_checks(
            builtin_rules()
                .into_iter()
                .map(|rule| Box::new(rule) as Box<dyn Check>)
                .collect(),
        )
    }

    /// Engine with custom checks
    pub fn with_checks(checks: Vec<Box<dyn Check>>) -> Self {
        Self {
            checks,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
        }
    }

    /// Engine with the built-in rules minus `disabled`
    pub fn from_policy(disabled: &[String], min_token_length: usize) -> Self {
        let rules: Vec<Box<dyn Check>> = builtin_rules()
            .into_iter()
            .filter(|rule: &Rule| {
                let skip = disabled.iter().any(|id| id == &rule.metadata.id);
                if skip {
                    debug!("Skipping disabled check: {}", rule.metadata.id);
                }
                !skip
            })
            .map(|rule| Box::new(rule) as Box<dyn Check>)
            .collect();

        Self::with_checks(rules).with_min_token_length(min_token_length)
    }

    pub fn with_min_token_length(mut self, min: usize) -> Self {
        self.min_token_length = min;
        self
    }

    /// Add a check to the end of the run order
    pub fn add_check(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Run every check once, in order, against the same snapshot
    pub fn evaluate(
        &self,
        document: &ConfigDocument,
        permissions: &PermissionSnapshot,
    ) -> AuditReport {
        info!(
            "Evaluating {} checks against {}",
            self.checks.len(),
            document.path().display()
        );

        let ctx = AuditContext::new(document, permissions)
            .with_min_token_length(self.min_token_length);
        let mut summary = AuditSummary::default();
        let mut findings = Vec::new();

        for check in &self.checks {
            summary.total_checks += 1;
            debug!("Executing check: {}", check.id());

            let outcome = catch_unwind(AssertUnwindSafe(|| check.evaluate(&ctx)))
                .unwrap_or_else(|panic| {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| String::from("check panicked"));
                    Err(clawshield_core::Error::CheckFailed {
                        check_id: check.id().to_string(),
                        message,
                    })
                });

            match outcome {
                Ok(check_findings) if check_findings.is_empty() => summary.passed += 1,
                Ok(check_findings) => {
                    summary.flagged += 1;
                    for finding in &check_findings {
                        *summary.by_severity.entry(finding.severity).or_insert(0) += 1;
                    }
                    findings.extend(check_findings);
                }
                Err(e) => {
                    warn!("Check {} failed: {}", check.id(), e);
                    summary.errors += 1;
                    findings.push(diagnostic(&**check, &e.to_string()));
                }
            }
        }

        info!(
            "Audit complete: {} passed, {} flagged, {} errors, {} findings",
            summary.passed,
            summary.flagged,
            summary.errors,
            findings.len()
        );

        AuditReport { findings, summary }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// INFO finding standing in for a check that could not be evaluated
fn diagnostic(check: &dyn Check, error: &str) -> Finding {
    Finding::builder(check.id(), ConfigPath::default())
        .check_name(check.metadata().name.as_str())
        .severity(Severity::Info)
        .category(CheckCategory::Diagnostic)
        .message(format!("Check could not be evaluated: {}", error))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks;
    use clawshield_core::{CheckMetadata, CheckResult};

    struct PanickingCheck(CheckMetadata);

    impl Check for PanickingCheck {
        fn id(&self) -> &str {
            &self.0.id
        }
        fn metadata(&self) -> &CheckMetadata {
            &self.0
        }
        fn evaluate(&self, _ctx: &AuditContext<'_>) -> CheckResult {
            panic!("unexpected layout")
        }
    }

    fn doc(json: &str) -> ConfigDocument {
        ConfigDocument::from_bytes("/tmp/openclaw.json", json.as_bytes().to_vec()).unwrap()
    }

    fn strong() -> String {
        format!(
            r#"{{"gateway": {{"bind": "loopback", "auth": {{"mode": "token", "token": "{}"}}}},
                "channels": {{"telegram": {{"enabled": true, "dmPolicy": "allowlist"}}}}}}"#,
            "a".repeat(64)
        )
    }

    #[test]
    fn test_empty_engine() {
        let report =
            RuleEngine::with_checks(vec![]).evaluate(&doc("{}"), &PermissionSnapshot::Mode(0o600));
        assert_eq!(report.summary.total_checks, 0);
        assert!(report.findings.is_empty());
        assert_eq!(report.completion(), Completion::Clean);
    }

    #[test]
    fn test_well_configured_file_is_clean() {
        let report = RuleEngine::new().evaluate(&doc(&strong()), &PermissionSnapshot::Mode(0o600));
        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(report.summary.passed, report.summary.total_checks);
    }

    #[test]
    fn test_findings_follow_declaration_order() {
        let d = doc(
            r#"{"gateway": {"bind": "0.0.0.0", "auth": {"mode": "none"}},
                "channels": {"telegram": {"enabled": true, "dmPolicy": "open"}}}"#,
        );
        let report = RuleEngine::new().evaluate(&d, &PermissionSnapshot::Mode(0o644));
        let ids: Vec<&str> = report.findings.iter().map(|f| f.check_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                checks::GATEWAY_BIND_EXPOSED,
                checks::GATEWAY_AUTH_WEAK,
                checks::CHANNEL_DM_POLICY_OPEN,
                checks::CONFIG_FILE_PERMISSIONS,
            ]
        );
        assert_eq!(report.summary.by_severity.get(&Severity::Critical), Some(&2));
        assert_eq!(report.completion(), Completion::FindingsReported);
    }

    #[test]
    fn test_faulting_check_becomes_diagnostic() {
        let d = doc(r#"{"gateway": {"bind": 8080, "auth": {"mode": "none"}}}"#);
        let report = RuleEngine::new().evaluate(&d, &PermissionSnapshot::Mode(0o600));

        let diag = &report.findings[0];
        assert_eq!(diag.check_id, checks::GATEWAY_BIND_EXPOSED);
        assert_eq!(diag.severity, Severity::Info);
        assert_eq!(diag.category, CheckCategory::Diagnostic);
        assert_eq!(report.summary.errors, 1);
        // Remaining checks still ran.
        assert!(report
            .findings
            .iter()
            .any(|f| f.check_id == checks::GATEWAY_AUTH_WEAK));
        assert_eq!(report.actionable().count(), report.findings.len() - 1);
    }

    #[test]
    fn test_panicking_check_is_isolated() {
        let mut engine = RuleEngine::with_checks(vec![]);
        engine.add_check(Box::new(PanickingCheck(CheckMetadata::new(
            "broken",
            "Broken",
            CheckCategory::Network,
            Severity::High,
        ))));
        for rule in checks::builtin_rules() {
            engine.add_check(Box::new(rule));
        }

        let report = engine.evaluate(&doc(&strong()), &PermissionSnapshot::Mode(0o600));
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].message.contains("unexpected layout"));
        assert_eq!(report.summary.passed, report.summary.total_checks - 1);
    }

    #[test]
    fn test_disabled_checks_are_not_registered() {
        let engine = RuleEngine::from_policy(
            &[checks::CONFIG_FILE_PERMISSIONS.to_string()],
            DEFAULT_MIN_TOKEN_LENGTH,
        );
        assert!(!engine.check_ids().contains(&checks::CONFIG_FILE_PERMISSIONS));

        let report = engine.evaluate(&doc(&strong()), &PermissionSnapshot::Mode(0o666));
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let d = doc(
            r#"{"gateway": {"bind": "all"}, "channels": {"x": {"enabled": true, "groupPolicy": "open"}}}"#,
        );
        let engine = RuleEngine::new();
        let perms = PermissionSnapshot::Mode(0o600);
        assert_eq!(engine.evaluate(&d, &perms).findings, engine.evaluate(&d, &perms).findings);
    }

    #[test]
    fn test_completion_exit_codes() {
        assert_eq!(Completion::Clean.exit_code(), 0);
        assert_eq!(Completion::Persisted.exit_code(), 0);
        assert_eq!(Completion::FindingsReported.exit_code(), 1);
        assert_eq!(Completion::Failed.exit_code(), 2);
    }
}
