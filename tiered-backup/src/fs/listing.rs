//! Destination directory listing.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Names of the regular files directly inside `dir`, sorted.
///
/// Symlinks count when they point at a regular file. Names that are not
/// valid UTF-8 cannot be archive names and are skipped.
pub fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_file = fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!("Skipping non UTF-8 name in {}: {:?}", dir.display(), raw),
        }
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_regular_files() -> io::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b.tar.gz"), b"x")?;
        fs::write(dir.path().join("a.tar.gz"), b"x")?;
        fs::create_dir(dir.path().join("c.tar.gz"))?;
        fs::write(dir.path().join("c.tar.gz/nested.tar.gz"), b"x")?;

        assert_eq!(list_files(dir.path())?, vec!["a.tar.gz", "b.tar.gz"]);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(list_files(&dir.path().join("missing")).is_err());
    }
}
