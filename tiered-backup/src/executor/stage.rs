//! File staging collaborator.
//!
//! Copies configured paths into the staging directory one by one. A path
//! that is missing or fails to copy is recorded and the batch moves on.

use crate::fs::walker::{copy_file, copy_tree, WalkOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to one configured path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Copied { files: usize, bytes: u64 },
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct StagedItem {
    pub path: PathBuf,
    pub outcome: StageOutcome,
}

/// Per-path results of a staging batch, in input order
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub items: Vec<StagedItem>,
}

impl StageReport {
    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, StageOutcome::Copied { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StageOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StageOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&StageOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Copies paths into a staging directory.
pub trait FileStager {
    fn stage(&self, paths: &[PathBuf], staging: &Path) -> StageReport;
}

/// Local filesystem copy. Files land directly in the staging directory,
/// directories are copied recursively under their base name. Symlinks are
/// followed, so the archive carries the data they point to.
#[derive(Debug, Clone, Default)]
pub struct LocalCopy {
    options: WalkOptions,
}

impl LocalCopy {
    fn stage_one(&self, path: &Path, staging: &Path) -> StageOutcome {
        if !path.exists() {
            return StageOutcome::Skipped("does not exist".to_string());
        }
        let Some(name) = path.file_name() else {
            return StageOutcome::Failed("path has no file name".to_string());
        };
        let target = staging.join(name);

        let result = if path.is_dir() {
            copy_tree(path, &target, &self.options).map(|s| (s.files, s.bytes))
        } else if path.is_file() {
            copy_file(path, &target).map(|bytes| (1, bytes))
        } else {
            return StageOutcome::Skipped("not a regular file or directory".to_string());
        };

        match result {
            Ok((files, bytes)) => StageOutcome::Copied { files, bytes },
            Err(e) => StageOutcome::Failed(e.to_string()),
        }
    }
}

impl FileStager for LocalCopy {
    fn stage(&self, paths: &[PathBuf], staging: &Path) -> StageReport {
        let mut report = StageReport::default();

        for path in paths {
            let outcome = self.stage_one(path, staging);
            match &outcome {
                StageOutcome::Copied { files, bytes } => {
                    info!("copied {} ({} files, {} bytes)", path.display(), files, bytes)
                }
                StageOutcome::Skipped(reason) => warn!("skipped {}: {}", path.display(), reason),
                StageOutcome::Failed(reason) => warn!("failed to copy {}: {}", path.display(), reason),
            }
            report.items.push(StagedItem {
                path: path.clone(),
                outcome,
            });
        }

        report
    }
}
