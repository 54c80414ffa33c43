//! Plain-text and JSON rendering of audit and session results

use anyhow::Result;
use chrono::{DateTime, Utc};
use clawshield_audit::{AuditReport, Completion, Outcome, SessionReport, SessionStatus};
use clawshield_core::Finding;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

#[derive(Serialize)]
struct AuditOutput<'a> {
    target: &'a Path,
    generated_at: DateTime<Utc>,
    completion: Completion,
    #[serde(flatten)]
    report: &'a AuditReport,
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    generated_at: DateTime<Utc>,
    completion: Completion,
    #[serde(flatten)]
    report: &'a SessionReport,
}

pub fn audit_json(target: &Path, report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&AuditOutput {
        target,
        generated_at: Utc::now(),
        completion: report.completion(),
        report,
    })?)
}

pub fn session_json(report: &SessionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SessionOutput {
        generated_at: Utc::now(),
        completion: report.completion(),
        report,
    })?)
}

pub fn audit_text(target: &Path, report: &AuditReport) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "clawshield audit: {}", target.display())?;
    writeln!(out)?;

    if report.findings.is_empty() {
        writeln!(out, "No issues found.")?;
    }
    for finding in &report.findings {
        write_finding(&mut out, finding)?;
    }

    let s = &report.summary;
    writeln!(
        out,
        "{} checks: {} passed, {} flagged, {} errors",
        s.total_checks, s.passed, s.flagged, s.errors
    )?;
    if !s.by_severity.is_empty() {
        let counts: Vec<String> = s
            .by_severity
            .iter()
            .rev()
            .map(|(severity, count)| format!("{} {}", count, severity))
            .collect();
        writeln!(out, "Findings: {}", counts.join(", "))?;
    }
    Ok(out)
}

pub fn session_text(report: &SessionReport) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "clawshield harden: {}", report.path.display())?;
    writeln!(out)?;

    for record in &report.records {
        let label = match &record.outcome {
            Outcome::Applied => "applied",
            Outcome::Declined => "skipped",
            Outcome::Advisory { .. } => "advisory",
            Outcome::NotPersisted => "not written",
        };
        writeln!(
            out,
            "  {:<12} [{}] {} ({})",
            label, record.finding.severity, record.finding.check_id, record.finding.path
        )?;
        if let Outcome::Advisory { note } = &record.outcome {
            writeln!(out, "               {}", note)?;
        }
    }
    if !report.records.is_empty() {
        writeln!(out)?;
    }

    match &report.status {
        SessionStatus::Clean => writeln!(out, "No changes made.")?,
        SessionStatus::DryRun => writeln!(
            out,
            "Dry run: {} fixes would be applied, nothing was written.",
            report.applied().count()
        )?,
        SessionStatus::Persisted => {
            writeln!(out, "Applied {} fixes.", report.applied().count())?;
            if let Some(backup) = &report.backup {
                writeln!(out, "Backup: {}", backup.path.display())?;
            }
            writeln!(out, "Restart the agent gateway for the changes to take effect.")?;
        }
        SessionStatus::Failed { code, message } => {
            writeln!(out, "FAILED [{}]: {}", code, message)?;
            writeln!(out, "The configuration file was not modified.")?;
        }
    }
    Ok(out)
}

fn write_finding(out: &mut String, finding: &Finding) -> std::fmt::Result {
    writeln!(out, "[{}] {}  {}", finding.severity, finding.check_id, finding.path)?;
    writeln!(out, "    {}", finding.message)?;
    match (&finding.current_value, &finding.recommended_value) {
        (Some(current), Some(recommended)) => {
            writeln!(out, "    current: {}  recommended: {}", current, recommended)?
        }
        (Some(current), None) => writeln!(out, "    current: {}", current)?,
        (None, Some(recommended)) => writeln!(out, "    recommended: {}", recommended)?,
        (None, None) => {}
    }
    if let Some(remediation) = &finding.remediation {
        writeln!(out, "    fix: {}", remediation)?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_audit::{DeclineAll, RemediationPlanner, RemediationSession, RuleEngine};
    use clawshield_core::{ConfigDocument, PermissionSnapshot};

    const EXPOSED: &str = r#"{"gateway": {"bind": "0.0.0.0", "auth": {"mode": "none"}}}"#;

    fn audit(json: &str) -> AuditReport {
        let doc =
            ConfigDocument::from_bytes("/tmp/openclaw.json", json.as_bytes().to_vec()).unwrap();
        RuleEngine::new().evaluate(&doc, &PermissionSnapshot::Mode(0o600))
    }

    #[test]
    fn test_audit_text() {
        let text = audit_text(Path::new("/tmp/openclaw.json"), &audit(EXPOSED)).unwrap();
        assert!(text.contains("[CRITICAL] gateway-bind-exposed  gateway.bind"));
        assert!(text.contains("current: \"0.0.0.0\"  recommended: \"loopback\""));
        assert!(text.contains("Findings: 2 CRITICAL"));
    }

    #[test]
    fn test_clean_audit_text() {
        let clean = format!(
            r#"{{"gateway": {{"auth": {{"token": "{}"}}}}}}"#,
            "b".repeat(48)
        );
        let text = audit_text(Path::new("/tmp/openclaw.json"), &audit(&clean)).unwrap();
        assert!(text.contains("No issues found."));
    }

    #[test]
    fn test_audit_json() {
        let json = audit_json(Path::new("/tmp/openclaw.json"), &audit(EXPOSED)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["completion"], "findings_reported");
        assert_eq!(value["findings"][0]["check_id"], "gateway-bind-exposed");
        assert_eq!(value["findings"][0]["severity"], "critical");
        assert_eq!(value["summary"]["by_severity"]["critical"], 2);
    }

    #[test]
    fn test_session_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("openclaw.json");
        std::fs::write(&path, EXPOSED).unwrap();

        let report = RemediationSession::open(&path)
            .unwrap()
            .run(&RuleEngine::new(), &RemediationPlanner::new(), &mut DeclineAll)
            .unwrap();

        let text = session_text(&report).unwrap();
        assert!(text.contains("skipped"));
        assert!(text.contains("No changes made."));

        let value: serde_json::Value =
            serde_json::from_str(&session_json(&report).unwrap()).unwrap();
        assert_eq!(value["completion"], "clean");
        assert_eq!(value["status"]["status"], "clean");
    }
}
