//! Job configuration.
//!
//! One file describes one job. Files ending in `.json` are read as JSON,
//! everything else as TOML.

use crate::rotation::{BackupIdentity, CompressionKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: {}", path.display(), problems.join("; "))]
    Invalid { path: PathBuf, problems: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name, part of every archive name
    #[serde(default)]
    pub name: String,

    /// Directory receiving archives; created when missing
    #[serde(default)]
    pub dest: PathBuf,

    /// Host name used in archive names (default: detected)
    #[serde(default)]
    pub hostname: Option<String>,

    /// Compression for new archives (gz or bz2)
    #[serde(default)]
    pub compression: CompressionKind,

    /// Parent of staging directories (default: system temp dir)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    #[serde(default)]
    pub mysql: Option<MysqlConfig>,

    /// Files and directories copied into the archive
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MysqlConfig {
    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub user: String,

    /// May be empty, but must be present
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl JobConfig {
    /// Parse a configuration file without validating it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse, validate and prepare the destination directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;

        let mut problems = config.validate();
        if problems.is_empty() {
            if let Err(problem) = config.prepare_destination() {
                problems.push(problem);
            }
        }

        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                problems,
            })
        }
    }

    /// Every problem with this configuration; empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.is_empty() {
            problems.push("name is required".to_string());
        }
        if self.dest.as_os_str().is_empty() {
            problems.push("dest is required".to_string());
        }
        if !self.name.is_empty() {
            if let Err(e) = self.identity() {
                problems.push(e.to_string());
            }
        }

        if let Some(mysql) = &self.mysql {
            if mysql.database.is_empty() {
                problems.push("mysql.database is required".to_string());
            }
            if mysql.user.is_empty() {
                problems.push("mysql.user is required".to_string());
            }
            if mysql.password.is_none() {
                problems.push("mysql.password is required".to_string());
            }
        }

        problems
    }

    /// Host and job pair for this job's archives
    pub fn identity(&self) -> Result<BackupIdentity, crate::rotation::IdentityError> {
        BackupIdentity::new(self.resolved_hostname(), self.name.clone())
    }

    /// Configured host name, or the machine's
    pub fn resolved_hostname(&self) -> String {
        self.hostname
            .clone()
            .or_else(|| hostname::get().ok().and_then(|h| h.into_string().ok()))
            .unwrap_or_else(|| "localhost".to_string())
    }

    pub fn staging_parent(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create `dest` when missing and check that it accepts new files.
    fn prepare_destination(&self) -> Result<(), String> {
        if !self.dest.exists() {
            std::fs::create_dir_all(&self.dest)
                .map_err(|e| format!("cannot create {}: {}", self.dest.display(), e))?;
        } else if !self.dest.is_dir() {
            return Err(format!("{} is not a directory", self.dest.display()));
        }

        tempfile::tempfile_in(&self.dest)
            .map(|_| ())
            .map_err(|e| format!("{} is not writable: {}", self.dest.display(), e))
    }
}
