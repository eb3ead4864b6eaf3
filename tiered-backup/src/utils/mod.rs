//! Utility modules shared by the CLI and the executor.

pub mod errors;
pub mod logger;

pub use errors::{BackupError, Result};
