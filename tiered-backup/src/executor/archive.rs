//! Archive creation collaborator.
//!
//! Packs a staging directory into a compressed tar file. The archive is
//! written next to its final path under a hidden `.partial` name and renamed
//! into place once complete, so the destination never holds a truncated
//! archive under a valid archive name.

use crate::rotation::CompressionKind;
use crate::utils::{BackupError, Result};
use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Creates one compressed archive of a directory.
pub trait Archiver {
    /// Archive `source` into `dest`, replacing any existing file. Returns
    /// the archive size in bytes.
    fn create(&self, source: &Path, compression: CompressionKind, dest: &Path) -> Result<u64>;
}

/// tar container with gzip or bzip2 compression. Entries are rooted at the
/// source directory's name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    fn create(&self, source: &Path, compression: CompressionKind, dest: &Path) -> Result<u64> {
        let root = source
            .file_name()
            .ok_or_else(|| BackupError::Archive(format!("{} has no name", source.display())))?;
        let partial = partial_path(dest)
            .ok_or_else(|| BackupError::Archive(format!("{} has no name", dest.display())))?;

        let written = write_archive(source, Path::new(root), compression, &partial)
            .and_then(|()| fs::rename(&partial, dest))
            .and_then(|()| fs::metadata(dest).map(|m| m.len()));

        written.map_err(|e| {
            let _ = fs::remove_file(&partial);
            BackupError::Archive(format!("{}: {}", dest.display(), e))
        })
    }
}

/// `<dir>/.<name>.partial` for `<dir>/<name>`
fn partial_path(dest: &Path) -> Option<PathBuf> {
    let name = dest.file_name()?.to_str()?;
    Some(dest.with_file_name(format!(".{name}.partial")))
}

fn write_archive(
    source: &Path,
    root: &Path,
    compression: CompressionKind,
    path: &Path,
) -> io::Result<()> {
    let writer = BufWriter::new(File::create(path)?);

    let writer = match compression {
        CompressionKind::Gzip => {
            let encoder = GzEncoder::new(writer, flate2::Compression::default());
            append_tree(encoder, source, root)?.finish()?
        }
        CompressionKind::Bzip2 => {
            let encoder = BzEncoder::new(writer, bzip2::Compression::default());
            append_tree(encoder, source, root)?.finish()?
        }
    };

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn append_tree<W: Write>(writer: W, source: &Path, root: &Path) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);
    builder.append_dir_all(root, source)?;
    builder.into_inner()
}
