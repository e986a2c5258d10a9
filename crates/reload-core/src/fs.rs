//! Filesystem helpers for store files.

use std::fs;
use std::path::Path;

use crate::error::{ReloadError, Result};

/// Move a fully written temp file over `destination`.
///
/// `fs::rename` refuses to replace an existing file on some platforms, so a
/// failed first attempt removes the destination and tries once more. The
/// temp file is removed if both attempts fail.
pub fn replace_file(temp_path: &Path, destination: &Path) -> Result<()> {
    let Err(first) = fs::rename(temp_path, destination) else {
        return Ok(());
    };

    let _ = fs::remove_file(destination);
    fs::rename(temp_path, destination).map_err(|retry| {
        let _ = fs::remove_file(temp_path);
        ReloadError::Storage(format!(
            "Could not move {} into place (first: {}, retry: {})",
            temp_path.display(),
            first,
            retry
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_replace_into_empty_destination() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("store.db.tmp");
        let dest = dir.path().join("store.db");
        fs::write(&temp, b"fresh").unwrap();

        replace_file(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"fresh");
    }

    #[test]
    fn test_replace_overwrites_previous_backup() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("store.db.tmp");
        let dest = dir.path().join("store.db");
        fs::write(&dest, b"stale").unwrap();
        fs::write(&temp, b"fresh").unwrap();

        replace_file(&temp, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"fresh");
    }

    #[test]
    fn test_missing_temp_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = replace_file(&dir.path().join("nope"), &dir.path().join("dest"));
        assert!(matches!(result, Err(ReloadError::Storage(_))));
    }
}
