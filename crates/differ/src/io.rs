use std::fs;
use std::path::Path;

use fstree_common::{Diff, Error, Result};

/// Read a diff document from `path`. Fatal on a missing file or malformed
/// JSON — no partial value is ever returned.
pub fn read_diff(path: &Path) -> Result<Diff> {
    if !path.is_file() {
        return Err(Error::InputMissing {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| Error::IoSource {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a diff document to `path` as pretty-printed JSON.
pub fn write_diff(path: &Path, diff: &Diff) -> Result<()> {
    let json = serde_json::to_string_pretty(diff).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| Error::IoDest {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;
    use fstree_common::Snapshot;
    use tempfile::TempDir;

    #[test]
    fn round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diff.json");

        let mut after = Snapshot::new("/tmp/root");
        after.insert(
            "a.txt",
            fstree_common::Entry::File {
                size: 1,
                mtime: 0,
                hash: fstree_fingerprint::fingerprint_bytes(b"a"),
            },
        );
        let before = Snapshot::new("/tmp/root");
        let d = diff(&before, &after);

        write_diff(&path, &d).unwrap();
        let loaded = read_diff(&path).unwrap();
        assert_eq!(loaded.len(), d.len());
        assert_eq!(loaded.changes[0].path, "a.txt");
    }

    #[test]
    fn missing_file_is_input_missing_error() {
        let dir = TempDir::new().unwrap();
        let err = read_diff(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::InputMissing { .. }));
    }
}
