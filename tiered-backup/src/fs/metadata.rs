//! File metadata carried over when staging files.
//!
//! Staged copies keep permissions and modification times so the archive
//! restores files as they were on the host.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Metadata preserved on staged copies
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Last modified time
    pub modified: SystemTime,

    /// Last access time, when the platform reports one
    pub accessed: Option<SystemTime>,

    pub permissions: fs::Permissions,
}

impl FileMetadata {
    /// Extract metadata from a path, following symlinks
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;

        Ok(Self {
            modified: metadata.modified()?,
            accessed: metadata.accessed().ok(),
            permissions: metadata.permissions(),
        })
    }

    /// Apply times, then permissions, to an existing file or directory
    pub fn apply_to_path(&self, path: &Path) -> std::io::Result<()> {
        let mut times = fs::FileTimes::new().set_modified(self.modified);
        if let Some(accessed) = self.accessed {
            times = times.set_accessed(accessed);
        }
        open_for_times(path)?.set_times(times)?;

        fs::set_permissions(path, self.permissions.clone())
    }
}

#[cfg(unix)]
fn open_for_times(path: &Path) -> std::io::Result<fs::File> {
    // futimens only needs ownership, so a read-only handle works for dirs too
    fs::File::open(path)
}

#[cfg(not(unix))]
fn open_for_times(path: &Path) -> std::io::Result<fs::File> {
    fs::File::options().write(true).open(path)
}
