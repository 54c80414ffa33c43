//! ClawShield Audit - rule engine and guarded remediation
//!
//! This crate audits an agent gateway configuration and optionally fixes it:
//! - Built-in rule table (gateway exposure, auth, channel policies, exec, secrets, file mode)
//! - `RuleEngine`: runs every check against one document snapshot
//! - `RemediationPlanner`: maps findings to idempotent fixes
//! - `RemediationSession`: asks a decision source, then backs up and writes once
//!
//! # Example
//!
//! ```no_run
//! use clawshield_audit::{AlwaysAccept, RemediationPlanner, RemediationSession, RuleEngine};
//!
//! let mut session = RemediationSession::open("/home/me/.openclaw/openclaw.json")?;
//! let report = session.run(&RuleEngine::new(), &RemediationPlanner::new(), &mut AlwaysAccept)?;
//!
//! for record in &report.records {
//!     println!("{} {}: {:?}", record.finding.severity, record.finding.check_id, record.outcome);
//! }
//! # Ok::<(), clawshield_core::Error>(())
//! ```

pub mod backup;
pub mod checks;
pub mod decision;
pub mod engine;
pub mod fix;
pub mod layout;
pub mod permissions;
pub mod persist;
pub mod planner;
pub mod session;

pub use backup::{Backup, BackupManager};
pub use checks::{builtin_rules, RemedyOptions, Rule};
pub use decision::{
    AlwaysAccept, Decision, DecisionSource, DeclineAll, ScriptedDecisions, SeverityThreshold,
};
pub use engine::{AuditReport, AuditSummary, Completion, RuleEngine};
pub use fix::Fix;
pub use permissions::{PermissionAdapter, SystemPermissions, TightenOutcome};
pub use persist::{AtomicFileWriter, ConfigWriter};
pub use planner::RemediationPlanner;
pub use session::{
    Outcome, RemediationSession, SessionRecord, SessionReport, SessionState, SessionStatus,
};
