//! ClawShield Common - Shared utilities: logging, configuration, crypto helpers
//!
//! This crate provides common functionality used across all ClawShield crates.

pub mod config;
pub mod crypto;
pub mod logging;

pub use config::{BackupNaming, Config, ConfigBuilder, ConflictPolicy};
pub use logging::{init_logging, LogConfig};
