//! Backup job executor - runs one job end to end.
//!
//! Sequence for a run:
//! - create an exclusive staging area (the only step that can fail the job)
//! - dump the database and copy files into it
//! - archive it under today's rotation name
//! - prune archives outside their tier's quota
//! - remove the staging area
//!
//! Failures in the middle steps are logged and recorded in the `RunReport`;
//! the run carries on with whatever state it has.

pub mod archive;
pub mod dump;
pub mod stage;

use crate::config::{JobConfig, MysqlConfig};
use crate::fs::{list_files, StagingArea};
use crate::rotation::{
    classify, ArchiveDescriptor, BackupIdentity, CompressionKind, RetentionEngine, RotationTier,
};
use crate::utils::{BackupError, Result};
use archive::{Archiver, TarArchiver};
use chrono::NaiveDate;
use dump::{dump_file_name, DatabaseDumper, MysqlDump};
use stage::{FileStager, LocalCopy, StageReport};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Backup job configuration
#[derive(Debug, Clone)]
pub struct BackupJob {
    pub identity: BackupIdentity,
    pub destination: PathBuf,
    pub compression: CompressionKind,
    pub staging_parent: PathBuf,
    pub mysql: Option<MysqlConfig>,
    pub files: Vec<PathBuf>,
}

impl BackupJob {
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        Ok(Self {
            identity: config.identity()?,
            destination: config.dest.clone(),
            compression: config.compression,
            staging_parent: config.staging_parent(),
            mysql: config.mysql.clone(),
            files: config.files.clone(),
        })
    }

    pub fn name(&self) -> &str {
        self.identity.job_name()
    }
}

/// Outcome of a step that either worked or logged a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Failed(String),
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Created { path: PathBuf, bytes: u64 },
    Failed(String),
}

/// What a run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job: String,
    pub date: NaiveDate,
    pub tier: RotationTier,
    pub dump: Option<StepOutcome>,
    pub staged: Option<StageReport>,
    pub archive: ArchiveOutcome,
    /// Archives removed by retention
    pub deleted: Vec<String>,
    /// Archives retention wanted gone but could not remove
    pub delete_failures: Vec<(String, String)>,
    pub retention: StepOutcome,
    pub staging_removed: bool,
}

impl RunReport {
    /// True when every step, including staging removal, went through.
    pub fn is_clean(&self) -> bool {
        matches!(self.archive, ArchiveOutcome::Created { .. })
            && self.dump.as_ref().map_or(true, StepOutcome::is_done)
            && self.staged.as_ref().map_or(true, |s| s.failed() == 0)
            && self.delete_failures.is_empty()
            && self.retention.is_done()
            && self.staging_removed
    }
}

/// External collaborators a run delegates to
pub struct Collaborators {
    pub dumper: Box<dyn DatabaseDumper>,
    pub stager: Box<dyn FileStager>,
    pub archiver: Box<dyn Archiver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            dumper: Box::new(MysqlDump::default()),
            stager: Box::new(LocalCopy::default()),
            archiver: Box::new(TarArchiver),
        }
    }
}

/// Main backup executor
pub struct BackupExecutor {
    collaborators: Collaborators,
    retention: RetentionEngine,
}

impl BackupExecutor {
    /// Executor with the local collaborators and default quotas
    pub fn new() -> Self {
        Self::with_collaborators(Collaborators::default(), RetentionEngine::default())
    }

    pub fn with_collaborators(collaborators: Collaborators, retention: RetentionEngine) -> Self {
        Self {
            collaborators,
            retention,
        }
    }

    /// Run `job` as of `today`.
    ///
    /// Returns `Err` only when the staging area cannot be created; every
    /// later failure is logged and shows up in the report.
    pub fn execute(&self, job: &BackupJob, today: NaiveDate) -> Result<RunReport> {
        let tier = classify(today);
        let name = job.name();
        info!(job = %name, %tier, "{}: Begin {} {} backup process...", today, name, tier);

        let staging = StagingArea::create(&job.staging_parent, name).map_err(|e| {
            BackupError::Staging(format!(
                "cannot create staging area in {}: {}",
                job.staging_parent.display(),
                e
            ))
        })?;
        info!(job = %name, "Staging in {}", staging.path().display());

        let mut report = RunReport {
            job: job.identity.to_string(),
            date: today,
            tier,
            dump: None,
            staged: None,
            archive: ArchiveOutcome::Failed("not attempted".to_string()),
            deleted: Vec::new(),
            delete_failures: Vec::new(),
            retention: StepOutcome::Done,
            staging_removed: false,
        };

        if let Some(db) = &job.mysql {
            report.dump = Some(self.dump_database(db, today, staging.path()));
        }

        if !job.files.is_empty() {
            info!(job = %name, "backing up {} files", name);
            report.staged = Some(self.collaborators.stager.stage(&job.files, staging.path()));
        }

        let descriptor = ArchiveDescriptor {
            identity: job.identity.clone(),
            date: today,
            tier,
            compression: job.compression,
        };
        report.archive = self.create_archive(job, &descriptor, staging.path());

        self.prune(job, &mut report);

        let staging_root = staging.root().to_path_buf();
        match staging.close() {
            Ok(()) => {
                info!(job = %name, "Removed staging area {}", staging_root.display());
                report.staging_removed = true;
            }
            Err(e) => error!(
                job = %name,
                "Failed to remove staging area {}: {}",
                staging_root.display(),
                e
            ),
        }

        info!(job = %name, "{} {} backup is completed", name, tier);
        Ok(report)
    }

    /// Run `jobs` in order as of `today`, one report or error per job.
    ///
    /// A job that fails, even before staging, does not stop the jobs after it.
    pub fn execute_all(&self, jobs: &[BackupJob], today: NaiveDate) -> Vec<Result<RunReport>> {
        jobs.iter()
            .map(|job| {
                let result = self.execute(job, today);
                match &result {
                    Ok(report) if report.is_clean() => {}
                    Ok(report) => warn!(job = %report.job, "Backup finished with errors"),
                    Err(e) => error!(job = %job.name(), "Backup failed: {}", e),
                }
                result
            })
            .collect()
    }

    /// Dump the database into the staging area. A failed dump still leaves
    /// a file, holding the error text instead of SQL.
    fn dump_database(&self, db: &MysqlConfig, today: NaiveDate, staging: &Path) -> StepOutcome {
        info!("backing up {} database", db.database);
        let file = staging.join(dump_file_name(&db.database, today));

        let (content, outcome) = match self.collaborators.dumper.dump(db) {
            Ok(bytes) => (bytes, StepOutcome::Done),
            Err(e) => {
                error!("Dump of {} failed: {}", db.database, e);
                let message = e.to_string();
                (message.clone().into_bytes(), StepOutcome::Failed(message))
            }
        };

        if let Err(e) = std::fs::write(&file, content) {
            error!("Cannot write {}: {}", file.display(), e);
            return StepOutcome::Failed(e.to_string());
        }
        outcome
    }

    fn create_archive(
        &self,
        job: &BackupJob,
        descriptor: &ArchiveDescriptor,
        staging: &Path,
    ) -> ArchiveOutcome {
        info!(job = %job.name(), "Archive {} backup...", job.name());
        let path = job.destination.join(descriptor.file_name());

        if path.exists() {
            warn!("{} already exists and will be replaced", path.display());
        }

        match self
            .collaborators
            .archiver
            .create(staging, descriptor.compression, &path)
        {
            Ok(bytes) => {
                info!("Created {} ({} bytes)", path.display(), bytes);
                ArchiveOutcome::Created { path, bytes }
            }
            Err(e) => {
                error!(job = %job.name(), "{}", e);
                ArchiveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Remove archives outside their tier's quota. Runs whether or not
    /// today's archive was created.
    fn prune(&self, job: &BackupJob, report: &mut RunReport) {
        info!(job = %job.name(), "Cleaning up {} old archives", job.name());

        let listing = match list_files(&job.destination) {
            Ok(listing) => listing,
            Err(e) => {
                error!("Cannot list {}: {}", job.destination.display(), e);
                report.retention = StepOutcome::Failed(e.to_string());
                return;
            }
        };

        let plan = self.retention.plan_deletions(&job.identity, &listing);
        for tier_plan in plan.tiers() {
            debug!(
                "{}: {} kept (quota {}), {} to remove",
                tier_plan.tier,
                tier_plan.kept.len(),
                tier_plan.quota,
                tier_plan.delete.len()
            );
        }

        if plan.is_empty() {
            info!("No archive to clean up");
            return;
        }

        for file_name in plan.file_names() {
            info!("removing {}", file_name);
            if let Err(e) = std::fs::remove_file(job.destination.join(file_name)) {
                error!("Failed to remove {}: {}", file_name, e);
                report
                    .delete_failures
                    .push((file_name.to_string(), e.to_string()));
            } else {
                report.deleted.push(file_name.to_string());
            }
        }
    }
}

impl Default for BackupExecutor {
    fn default() -> Self {
        Self::new()
    }
}
