//! Remediation planner - maps findings to fixes

use crate::checks::{builtin_rules, RemedyOptions, Remedy};
use crate::fix::Fix;
use clawshield_core::{CheckCategory, Finding};
use std::collections::HashMap;

/// Deterministic `Finding -> Option<Fix>` lookup built from the rule table
pub struct RemediationPlanner {
    remedies: HashMap<String, Remedy>,
    options: RemedyOptions,
}

impl RemediationPlanner {
    pub fn new() -> Self {
        Self::with_options(RemedyOptions::default())
    }

    pub fn with_options(options: RemedyOptions) -> Self {
        let remedies = builtin_rules()
            .into_iter()
            .map(|rule| (rule.metadata.id, rule.remedy))
            .collect();
        Self { remedies, options }
    }

    /// Fix for `finding`, or `None` when it can only be reported
    pub fn plan(&self, finding: &Finding) -> Option<Fix> {
        if finding.category == CheckCategory::Diagnostic {
            return None;
        }
        let remedy = self.remedies.get(&finding.check_id)?;
        remedy(finding, &self.options)
    }
}

impl Default for RemediationPlanner {
    fn default() -> Self {
        Self::new()
    }
}
