//! Directory traversal and tree copies.
//!
//! Used to copy configured directories into a job's staging area with file
//! metadata preserved.

use super::metadata::FileMetadata;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Follow symbolic links and copy what they point to
    pub follow_links: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { follow_links: true }
    }
}

/// Kind of entry found while walking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// An entry discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the entry
    pub path: PathBuf,

    /// Relative path from the root (empty for the root itself)
    pub relative_path: PathBuf,

    /// Resolved kind; only `Symlink` when links are not followed
    pub kind: EntryKind,
}

impl FileInfo {
    fn from_entry(entry: &DirEntry, root: &Path) -> Self {
        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let file_type = entry.file_type();

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        Self {
            path,
            relative_path,
            kind,
        }
    }
}

/// Totals from a tree copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Walk a directory tree, parents before children.
///
/// # Returns
/// * `Ok(Vec<FileInfo>)` - Every entry found, including `root` itself
/// * `Err(io::Error)` - If a directory cannot be read, or a followed link
///   dangles or loops
pub fn walk_directory(root: &Path, options: &WalkOptions) -> io::Result<Vec<FileInfo>> {
    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        entries.push(FileInfo::from_entry(&entry, root));
    }

    Ok(entries)
}

/// Copy the tree at `src` to `dst`, which must not exist yet.
///
/// Regular files keep their permissions and modification time. With
/// `follow_links` set, links are copied as the file or directory they
/// point to; otherwise they are recreated as links on Unix.
pub fn copy_tree(src: &Path, dst: &Path, options: &WalkOptions) -> io::Result<CopyStats> {
    let mut stats = CopyStats::default();
    let entries = walk_directory(src, options)?;

    for info in &entries {
        let target = dst.join(&info.relative_path);
        match info.kind {
            EntryKind::Dir => {
                fs::create_dir(&target)?;
                stats.dirs += 1;
            }
            EntryKind::File => {
                stats.bytes += copy_file(&info.path, &target)?;
                stats.files += 1;
            }
            EntryKind::Symlink => {
                copy_symlink(&info.path, &target)?;
                stats.symlinks += 1;
            }
        }
    }

    // Directory times change as children are written, so apply them last
    for info in entries.iter().filter(|i| i.kind == EntryKind::Dir) {
        FileMetadata::from_path(&info.path)?.apply_to_path(&dst.join(&info.relative_path))?;
    }

    Ok(stats)
}

/// Copy one regular file, keeping permissions and mtime. Returns bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = fs::copy(src, dst)?;
    FileMetadata::from_path(src)?.apply_to_path(dst)?;
    Ok(bytes)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::metadata(src)?.is_dir() {
        copy_tree(src, dst, &WalkOptions::default()).map(|_| ())
    } else {
        copy_file(src, dst).map(|_| ())
    }
}
