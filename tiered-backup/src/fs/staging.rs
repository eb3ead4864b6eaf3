//! Job-exclusive staging areas.
//!
//! Each run gets a fresh `<job>-XXXXXX` directory under the staging parent,
//! with a `<job>` subdirectory that collaborators fill and the archiver
//! packs. The random suffix keeps overlapping runs, and leftovers from a
//! killed run, from sharing a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug)]
pub struct StagingArea {
    root: TempDir,
    content: PathBuf,
}

impl StagingArea {
    /// Create a staging area for `job_name` under `parent`, creating `parent` if needed.
    pub fn create(parent: &Path, job_name: &str) -> io::Result<Self> {
        fs::create_dir_all(parent)?;
        let root = tempfile::Builder::new()
            .prefix(&format!("{job_name}-"))
            .tempdir_in(parent)?;

        // `root` is removed on drop if this fails
        let content = root.path().join(job_name);
        fs::create_dir(&content)?;

        Ok(Self { root, content })
    }

    /// Directory collaborators write into; archived as `<job>/`.
    pub fn path(&self) -> &Path {
        &self.content
    }

    /// Exclusive parent directory of `path()`.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Remove the staging area, reporting failures.
    ///
    /// Dropping a `StagingArea` without calling `close` still removes it,
    /// but silently.
    pub fn close(self) -> io::Result<()> {
        self.root.close()
    }
}
