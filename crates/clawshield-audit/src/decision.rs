//! Decision sources - who says yes or no to a fix

use crate::fix::Fix;
use clawshield_core::{Finding, Severity};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}

/// Asked once per finding that has a fix, in report order
pub trait DecisionSource {
    fn decide(&mut self, finding: &Finding, fix: &Fix) -> Decision;
}

/// Accepts every fix
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAccept;

impl DecisionSource for AlwaysAccept {
    fn decide(&mut self, _finding: &Finding, _fix: &Fix) -> Decision {
        Decision::Accept
    }
}

/// Declines every fix
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl DecisionSource for DeclineAll {
    fn decide(&mut self, _finding: &Finding, _fix: &Fix) -> Decision {
        Decision::Decline
    }
}

/// Replays a fixed sequence of answers, accepting once it runs out
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<Decision>,
    asked: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Check ids this source was asked about, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl DecisionSource for ScriptedDecisions {
    fn decide(&mut self, finding: &Finding, _fix: &Fix) -> Decision {
        self.asked.push(finding.check_id.clone());
        self.answers.pop_front().unwrap_or(Decision::Accept)
    }
}

/// Accepts fixes for findings at or above a severity
#[derive(Debug, Clone, Copy)]
pub struct SeverityThreshold {
    pub min_severity: Severity,
}

impl SeverityThreshold {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl DecisionSource for SeverityThreshold {
    fn decide(&mut self, finding: &Finding, _fix: &Fix) -> Decision {
        if finding.severity >= self.min_severity {
            Decision::Accept
        } else {
            Decision::Decline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding::builder("gateway-bind-exposed", "gateway.bind")
            .severity(severity)
            .build()
    }

    #[test]
    fn test_scripted_decisions_default_to_accept() {
        let mut source = ScriptedDecisions::new([Decision::Decline]);
        let fix = Fix::TightenPermissions;
        assert_eq!(source.decide(&finding(Severity::High), &fix), Decision::Decline);
        assert_eq!(source.decide(&finding(Severity::High), &fix), Decision::Accept);
        assert_eq!(source.asked().len(), 2);
    }

    #[test]
    fn test_severity_threshold() {
        let mut source = SeverityThreshold::new(Severity::High);
        let fix = Fix::TightenPermissions;
        assert_eq!(source.decide(&finding(Severity::Critical), &fix), Decision::Accept);
        assert_eq!(source.decide(&finding(Severity::High), &fix), Decision::Accept);
        assert_eq!(source.decide(&finding(Severity::Medium), &fix), Decision::Decline);
    }

    #[test]
    fn test_fixed_sources() {
        let fix = Fix::TightenPermissions;
        assert_eq!(AlwaysAccept.decide(&finding(Severity::Low), &fix), Decision::Accept);
        assert_eq!(DeclineAll.decide(&finding(Severity::Critical), &fix), Decision::Decline);
    }
}
