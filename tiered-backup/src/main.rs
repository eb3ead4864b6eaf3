//! Tiered Backup - Main entry point
//!
//! Runs every configured job in turn. A job that fails to load or run is
//! logged and the next one still runs.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tiered_backup::{config::JobConfig, utils, BackupError, BackupExecutor, BackupJob};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Job configuration files (TOML, or JSON with a .json extension)
    #[arg(value_name = "CONFIG", required = true)]
    configs: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run as of this date instead of today (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::logger::init(&args.log_level)?;

    let today = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!(
        "Starting tiered-backup v{} for {} ({} config files)",
        env!("CARGO_PKG_VERSION"),
        today,
        args.configs.len()
    );

    // Load everything first so a broken file is reported before any job runs
    let mut jobs = Vec::new();
    for path in &args.configs {
        let job = JobConfig::load(path)
            .map_err(BackupError::from)
            .and_then(|config| BackupJob::from_config(&config));
        match job {
            Ok(job) => jobs.push(job),
            Err(e) => tracing::error!("Skipping {}: {}", path.display(), e),
        }
    }

    let failed = BackupExecutor::new()
        .execute_all(&jobs, today)
        .iter()
        .filter(|result| !matches!(result, Ok(report) if report.is_clean()))
        .count();

    tracing::info!(
        "Processed {} jobs ({} with errors, {} configs skipped)",
        jobs.len(),
        failed,
        args.configs.len() - jobs.len()
    );

    Ok(())
}
