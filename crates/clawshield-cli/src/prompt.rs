//! Interactive `[Y/n]` decision source

use clawshield_audit::{Decision, DecisionSource, Fix};
use clawshield_core::Finding;
use dialoguer::Confirm;
use tracing::warn;

/// Asks the operator on the terminal; Enter accepts
#[derive(Debug, Default)]
pub struct PromptDecisions;

impl DecisionSource for PromptDecisions {
    fn decide(&mut self, finding: &Finding, fix: &Fix) -> Decision {
        eprintln!();
        eprintln!("{}", describe(finding));

        match Confirm::new()
            .with_prompt(format!("{}?", fix.describe()))
            .default(true)
            .interact()
        {
            Ok(true) => Decision::Accept,
            Ok(false) => Decision::Decline,
            Err(e) => {
                // No terminal: never change the file without an answer.
                warn!("Prompt failed ({}); declining {}", e, finding.check_id);
                Decision::Decline
            }
        }
    }
}

/// Finding summary shown above the prompt
pub fn describe(finding: &Finding) -> String {
    let mut text = format!(
        "[{}] {} ({})\n  {}",
        finding.severity, finding.check_name, finding.path, finding.message
    );
    if let Some(current) = &finding.current_value {
        text.push_str(&format!("\n  current: {}", current));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_core::{CheckCategory, Severity};
    use serde_json::json;

    #[test]
    fn test_describe_finding() {
        let finding = Finding::builder("gateway-bind-exposed", "gateway.bind")
            .check_name("Gateway bind exposure")
            .severity(Severity::Critical)
            .category(CheckCategory::Network)
            .message("Gateway bound to '0.0.0.0'")
            .current(Some(json!("0.0.0.0")))
            .build();

        let text = describe(&finding);
        assert!(text.starts_with("[CRITICAL] Gateway bind exposure (gateway.bind)"));
        assert!(text.contains("current: \"0.0.0.0\""));
    }
}
