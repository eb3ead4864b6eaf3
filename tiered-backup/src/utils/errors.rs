//! Error types for backup runs.

use crate::config::ConfigError;
use crate::rotation::IdentityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid backup identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("Database dump failed: {0}")]
    Dump(String),

    #[error("Archive creation failed: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;
