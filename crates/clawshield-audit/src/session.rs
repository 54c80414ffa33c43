//! Remediation session - the scan, decide, finalize state machine
//!
//! A session owns one loaded document. Accepted fixes are applied to an
//! in-memory working copy; the file on disk changes at most once, in
//! [`RemediationSession::finalize`], after a backup of the original bytes
//! exists. Any failure during finalization leaves the original file as it was.

use crate::backup::{Backup, BackupManager};
use crate::decision::{Decision, DecisionSource};
use crate::engine::{AuditReport, Completion, RuleEngine};
use crate::fix::Fix;
use crate::permissions::{PermissionAdapter, SystemPermissions, TightenOutcome};
use crate::persist::{AtomicFileWriter, ConfigWriter};
use crate::planner::RemediationPlanner;
use clawshield_core::{CheckCategory, ConfigDocument, Error, Finding, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initialized,
    Scanned,
    Deciding,
    Decided,
    Finalizing,
    Persisted,
    Failed,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initialized => "initialized",
            SessionState::Scanned => "scanned",
            SessionState::Deciding => "deciding",
            SessionState::Decided => "decided",
            SessionState::Finalizing => "finalizing",
            SessionState::Persisted => "persisted",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Fix accepted and applied to the working copy
    Applied,
    /// Fix offered and declined
    Declined,
    /// Nothing was changed for this finding; `note` says what to do
    Advisory { note: String },
    /// Fix accepted but the session failed before it reached disk
    NotPersisted,
}

/// One finding and its outcome, in report order
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub finding: Finding,
    pub fix: Option<Fix>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing accepted, nothing written
    Clean,
    /// Decisions collected, nothing written
    DryRun,
    /// Accepted fixes are on disk
    Persisted,
    /// Nothing written; the original file is intact
    Failed { code: String, message: String },
}

/// Summary of a closed session
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub path: PathBuf,
    pub status: SessionStatus,
    pub records: Vec<SessionRecord>,
    pub backup: Option<Backup>,
    #[serde(skip)]
    pub error: Option<Error>,
}

impl SessionReport {
    pub fn applied(&self) -> impl Iterator<Item = &SessionRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Applied)
    }

    pub fn completion(&self) -> Completion {
        match &self.status {
            SessionStatus::Clean => Completion::Clean,
            SessionStatus::DryRun if self.applied().next().is_some() => {
                Completion::FindingsReported
            }
            SessionStatus::DryRun => Completion::Clean,
            SessionStatus::Persisted => Completion::Persisted,
            SessionStatus::Failed { .. } => Completion::Failed,
        }
    }
}

/// Drives one audit-and-remediate run against a single file
pub struct RemediationSession {
    state: SessionState,
    original: ConfigDocument,
    working: ConfigDocument,
    report: AuditReport,
    records: Vec<SessionRecord>,
    tighten_requested: bool,
    backups: BackupManager,
    writer: Box<dyn ConfigWriter>,
    permissions: Box<dyn PermissionAdapter>,
    dry_run: bool,
}

impl RemediationSession {
    /// Session over an already loaded document
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            state: SessionState::Initialized,
            working: document.clone(),
            original: document,
            report: AuditReport::default(),
            records: Vec::new(),
            tighten_requested: false,
            backups: BackupManager::default(),
            writer: Box::new(AtomicFileWriter),
            permissions: Box::new(SystemPermissions),
            dry_run: false,
        }
    }

    /// Load `path` and start a session over it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ConfigDocument::load(path)?))
    }

    pub fn with_backup_manager(mut self, backups: BackupManager) -> Self {
        self.backups = backups;
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn ConfigWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_permission_adapter(mut self, adapter: Box<dyn PermissionAdapter>) -> Self {
        self.permissions = adapter;
        self
    }

    /// Collect decisions without touching the disk
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The in-memory document accepted fixes have been applied to
    pub fn working_copy(&self) -> &ConfigDocument {
        &self.working
    }

    fn expect_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidTransition {
                state: self.state.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
    }

    /// Evaluate every check against the loaded document
    pub fn scan(&mut self, engine: &RuleEngine) -> Result<&AuditReport> {
        self.expect_state(SessionState::Initialized, "scan")?;

        let snapshot = self.permissions.inspect(self.original.path());
        self.report = engine.evaluate(&self.original, &snapshot);
        self.transition(SessionState::Scanned);

        Ok(&self.report)
    }

    /// Ask `source` about each fixable finding, in report order
    pub fn decide(
        &mut self,
        planner: &RemediationPlanner,
        source: &mut dyn DecisionSource,
    ) -> Result<()> {
        self.expect_state(SessionState::Scanned, "decide")?;
        self.transition(SessionState::Deciding);

        for finding in &self.report.findings {
            let fix = planner.plan(finding);
            let outcome = match &fix {
                None => Outcome::Advisory {
                    note: advisory_note(finding),
                },
                Some(fix) => match source.decide(finding, fix) {
                    Decision::Decline => {
                        debug!("Declined: {}", fix.describe());
                        Outcome::Declined
                    }
                    Decision::Accept if !fix.edits_document() => {
                        self.tighten_requested = true;
                        Outcome::Applied
                    }
                    Decision::Accept => match fix.apply(&self.working) {
                        Ok(next) => {
                            self.working = next;
                            Outcome::Applied
                        }
                        Err(e) => {
                            warn!("Fix for {} could not be applied: {}", finding.check_id, e);
                            Outcome::Advisory {
                                note: format!("Automatic fix failed ({}); apply it manually", e),
                            }
                        }
                    },
                },
            };

            self.records.push(SessionRecord {
                finding: finding.clone(),
                fix,
                outcome,
            });
        }

        self.transition(SessionState::Decided);
        Ok(())
    }

    /// Back up, write and tighten as decided, then close the session
    pub fn finalize(&mut self) -> Result<SessionReport> {
        self.expect_state(SessionState::Decided, "finalize")?;

        let edited = self.working.is_edited();
        let status = if self.dry_run {
            info!("Dry run: {} fixes accepted, nothing written", self.applied_count());
            SessionStatus::DryRun
        } else if !edited && !self.tighten_requested {
            info!("No fixes accepted; {} left untouched", self.original.path().display());
            SessionStatus::Clean
        } else {
            self.transition(SessionState::Finalizing);
            match self.persist(edited) {
                Ok(backup) => {
                    let tightened = self.tighten();
                    self.transition(SessionState::Persisted);
                    let status = if backup.is_some() || tightened {
                        SessionStatus::Persisted
                    } else {
                        SessionStatus::Clean
                    };
                    return Ok(self.close(status, backup, None));
                }
                Err(e) => {
                    warn!("Session failed [{}]: {}", e.code(), e);
                    self.transition(SessionState::Failed);
                    for record in &mut self.records {
                        if record.outcome == Outcome::Applied {
                            record.outcome = Outcome::NotPersisted;
                        }
                    }
                    let status = SessionStatus::Failed {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    };
                    return Ok(self.close(status, None, Some(e)));
                }
            }
        };

        Ok(self.close(status, None, None))
    }

    /// Scan, decide and finalize in one call
    pub fn run(
        &mut self,
        engine: &RuleEngine,
        planner: &RemediationPlanner,
        source: &mut dyn DecisionSource,
    ) -> Result<SessionReport> {
        self.scan(engine)?;
        self.decide(planner, source)?;
        self.finalize()
    }

    fn applied_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Applied)
            .count()
    }

    /// Write the working copy, if edited, behind a fresh backup
    fn persist(&mut self, edited: bool) -> Result<Option<Backup>> {
        if !edited {
            return Ok(None);
        }

        let path = self.original.path().to_path_buf();
        let contents = self.working.to_bytes()?;
        let backup = self.backups.snapshot(&path, self.original.raw_bytes())?;

        if let Err(e) = self.writer.write(&path, &contents) {
            if let Err(discard) = self.backups.discard(&backup) {
                warn!("Could not remove backup {}: {}", backup.path.display(), discard);
            }
            return Err(e);
        }

        info!(
            "Wrote {} fixes to {} (backup: {})",
            self.applied_count(),
            path.display(),
            backup.path.display()
        );
        Ok(Some(backup))
    }

    /// Run the permission fix, downgrading it to advisory when it cannot be applied
    fn tighten(&mut self) -> bool {
        if !self.tighten_requested {
            return false;
        }

        let path = self.original.path();
        let note = match self.permissions.tighten(path) {
            TightenOutcome::Success => {
                info!("Restricted permissions of {}", path.display());
                return true;
            }
            TightenOutcome::Unsupported => String::from(
                "Permission bits are not supported on this platform; restrict access to the file manually",
            ),
            TightenOutcome::Failure(reason) => {
                let e = Error::PermissionAdapter(reason);
                warn!("{}", e);
                format!(
                    "Could not restrict permissions ({}); run chmod 600 on the file manually",
                    e
                )
            }
        };

        for record in &mut self.records {
            if record.outcome == Outcome::Applied && record.fix == Some(Fix::TightenPermissions) {
                record.outcome = Outcome::Advisory { note: note.clone() };
            }
        }
        false
    }

    fn close(
        &mut self,
        status: SessionStatus,
        backup: Option<Backup>,
        error: Option<Error>,
    ) -> SessionReport {
        self.transition(SessionState::Closed);
        SessionReport {
            path: self.original.path().to_path_buf(),
            status,
            records: std::mem::take(&mut self.records),
            backup,
            error,
        }
    }
}

fn advisory_note(finding: &Finding) -> String {
    if finding.category == CheckCategory::Diagnostic {
        return String::from("Check could not be evaluated; inspect this setting manually");
    }
    finding
        .remediation
        .clone()
        .unwrap_or_else(|| String::from("No automatic fix; review this setting manually"))
}
