//! Database dump collaborator.

use crate::config::MysqlConfig;
use crate::utils::{BackupError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::process::Command;

/// Produces a database dump as raw bytes.
pub trait DatabaseDumper {
    fn dump(&self, db: &MysqlConfig) -> Result<Vec<u8>>;
}

/// Runs `mysqldump`. The password goes through `MYSQL_PWD` so it never
/// shows up in the process list.
#[derive(Debug, Clone)]
pub struct MysqlDump {
    program: PathBuf,
}

impl MysqlDump {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MysqlDump {
    fn default() -> Self {
        Self::new("mysqldump")
    }
}

impl DatabaseDumper for MysqlDump {
    fn dump(&self, db: &MysqlConfig) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command.arg("-u").arg(&db.user).arg(&db.database);
        if let Some(password) = db.password.as_deref().filter(|p| !p.is_empty()) {
            command.env("MYSQL_PWD", password);
        }

        let output = command.output().map_err(|e| {
            BackupError::Dump(format!("cannot run {}: {}", self.program.display(), e))
        })?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(BackupError::Dump(if stderr.is_empty() {
            format!("{} exited with {}", self.program.display(), output.status)
        } else {
            stderr
        }))
    }
}

/// Name of the staged dump file: `<database>-<YYYY-MM-DD>.sql`
pub fn dump_file_name(database: &str, date: NaiveDate) -> String {
    format!("{}-{}.sql", database, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> MysqlConfig {
        MysqlConfig {
            database: "shop".to_string(),
            user: "backup".to_string(),
            password: Some(String::new()),
        }
    }

    #[test]
    fn test_dump_file_name() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 7).unwrap();
        assert_eq!(dump_file_name("shop", date), "shop-2023-03-07.sql");
    }

    #[test]
    fn test_missing_program_is_a_dump_error() {
        let dumper = MysqlDump::new("/nonexistent/mysqldump");
        match dumper.dump(&shop()) {
            Err(BackupError::Dump(message)) => assert!(message.contains("cannot run")),
            other => panic!("expected dump error, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_failed_exit_reports_status() {
        // `false` ignores its arguments and exits 1 without output
        let dumper = MysqlDump::new("false");
        match dumper.dump(&shop()) {
            Err(BackupError::Dump(message)) => assert!(message.contains("exited with")),
            other => panic!("expected dump error, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_successful_exit_returns_stdout() {
        // `echo` prints its arguments: "-u backup shop"
        let dumper = MysqlDump::new("echo");
        let bytes = dumper.dump(&shop()).unwrap();
        assert_eq!(String::from_utf8_lossy(&bytes).trim(), "-u backup shop");
    }
}
