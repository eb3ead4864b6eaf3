//! Tiered Backup Library
//!
//! Dated, tier-rotated backups of databases and files into compressed
//! archives, with per-tier retention of old archives.

pub mod config;
pub mod executor;
pub mod fs;
pub mod rotation;
pub mod utils;

// Re-export commonly used types
pub use config::JobConfig;
pub use executor::{BackupExecutor, BackupJob, RunReport};
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
