//! Write-then-rename file output.

use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Write `path` through a temporary sibling that is renamed into place
/// only after `write` succeeds.
///
/// The temporary file carries no artifact extension, so an interrupted
/// write never leaves anything an existence check would accept.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    write(tmp.as_file_mut())?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.act");
        let result = write_atomic(&target, |_| {
            Err(StoreError::RaggedRows {
                row: 0,
                expected: 1,
                actual: 2,
            })
        });
        assert!(result.is_err());
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn successful_write_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.act");
        std::fs::write(&target, b"old").unwrap();
        write_atomic(&target, |f| {
            f.write_all(b"new").map_err(|e| StoreError::io("out.act", e))
        })
        .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }
}
