//! ClawShield - audit and harden an agent gateway configuration
//!
//! `audit` reports findings without touching the file, `harden` walks through
//! the fixes and writes them back behind a backup, `restore` puts a backup
//! back in place.

mod prompt;
mod report;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use clawshield_audit::{
    AlwaysAccept, AtomicFileWriter, BackupManager, Completion, DecisionSource, PermissionAdapter,
    RemediationPlanner, RemediationSession, RemedyOptions, RuleEngine, SeverityThreshold,
    SystemPermissions,
};
use clawshield_common::config::{expand_home, BackupNaming};
use clawshield_common::logging::{init_logging, LogConfig, LogFormat};
use clawshield_common::Config;
use clawshield_core::ConfigDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// ClawShield gateway configuration auditor
#[derive(Parser, Debug)]
#[command(name = "clawshield")]
#[command(version)]
#[command(about = "Audit and harden the gateway configuration of a personal AI agent", long_about = None)]
struct Args {
    /// Tool configuration file (defaults to ~/.config/clawshield/clawshield.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report findings without modifying anything
    Audit {
        /// Agent configuration file (overrides config)
        #[arg(short, long)]
        target: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Review fixes and write the accepted ones back
    Harden {
        /// Agent configuration file (overrides config)
        #[arg(short, long)]
        target: Option<String>,

        /// Accept every available fix without prompting
        #[arg(short, long)]
        yes: bool,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy a backup back over the configuration file
    Restore {
        /// Agent configuration file (overrides config)
        #[arg(short, long)]
        target: Option<String>,

        /// Backup to restore (defaults to the fixed backup name)
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    let code = match run(args) {
        Ok(completion) => completion.exit_code(),
        Err(e) => {
            eprintln!("error: {:#}", e);
            Completion::Failed.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> Result<Completion> {
    let config = load_config(args.config.as_deref())?;

    let level = args.log_level.unwrap_or_else(|| config.logging.level.clone());
    let format = args.log_format.unwrap_or_else(|| config.logging.format.clone());
    init_logging(&LogConfig::new().level(level).format(LogFormat::parse(&format)));
    debug!("ClawShield {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Audit { target, json } => audit(&config, &target_path(&config, target), json),
        Command::Harden {
            target,
            yes,
            dry_run,
            json,
        } => harden(&config, &target_path(&config, target), yes, dry_run, json),
        Command::Restore { target, from } => restore(&config, &target_path(&config, target), from),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => match Config::default_path().filter(|p| p.exists()) {
            Some(path) => Config::from_file(&path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => Config::default(),
        },
    };
    Ok(config.merge_env()?)
}

fn target_path(config: &Config, target: Option<String>) -> PathBuf {
    match target {
        Some(t) => expand_home(&t),
        None => config.target_path(),
    }
}

fn engine(config: &Config) -> RuleEngine {
    RuleEngine::from_policy(
        &config.policy.disabled_checks,
        config.policy.min_token_length,
    )
}

fn audit(config: &Config, target: &Path, json: bool) -> Result<Completion> {
    let document = ConfigDocument::load(target)?;
    let permissions = SystemPermissions.inspect(target);
    let audit = engine(config).evaluate(&document, &permissions);

    let rendered = if json {
        report::audit_json(target, &audit)?
    } else {
        report::audit_text(target, &audit)?
    };
    println!("{}", rendered);

    Ok(audit.completion())
}

fn harden(
    config: &Config,
    target: &Path,
    yes: bool,
    dry_run: bool,
    json: bool,
) -> Result<Completion> {
    let planner = RemediationPlanner::with_options(RemedyOptions {
        min_token_length: config.policy.min_token_length,
    });
    let mut source: Box<dyn DecisionSource> = match (yes, config.policy.auto_accept_min_severity) {
        (true, _) => Box::new(AlwaysAccept),
        (false, Some(min)) => {
            info!("Accepting fixes at or above {} without prompting", min);
            Box::new(SeverityThreshold::new(min))
        }
        (false, None) => Box::new(prompt::PromptDecisions),
    };

    let mut session = RemediationSession::open(target)?
        .with_backup_manager(BackupManager::from_config(&config.backup))
        .dry_run(dry_run);
    let session_report = session.run(&engine(config), &planner, source.as_mut())?;

    let rendered = if json {
        report::session_json(&session_report)?
    } else {
        report::session_text(&session_report)?
    };
    println!("{}", rendered);

    Ok(session_report.completion())
}

fn restore(config: &Config, target: &Path, from: Option<PathBuf>) -> Result<Completion> {
    // Backups sit next to the real file when the target is a symlink.
    let target = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
    let target = target.as_path();
    let backups = BackupManager::from_config(&config.backup);
    let backup = match from {
        Some(path) => path,
        None if config.backup.naming == BackupNaming::Timestamped => {
            bail!("timestamped backups need an explicit --from path")
        }
        None => backups.backup_path(target, Utc::now()),
    };

    backups.restore(&backup, target, &AtomicFileWriter)?;
    println!("Restored {} from {}", target.display(), backup.display());
    Ok(Completion::Persisted)
}
