use std::fs;
use std::path::Path;

use fstree_common::{Error, Result, Snapshot};

/// Read a snapshot document from `path`. Fatal on a missing file or a
/// malformed document — no partial value is ever returned.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.is_file() {
        return Err(Error::InputMissing {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| Error::IoSource {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: Snapshot = serde_json::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    snapshot
        .validate()
        .map_err(|message| Error::InvalidSnapshot { message })?;
    Ok(snapshot)
}

/// Write a snapshot document to `path` as pretty-printed, canonical JSON
/// (keys sorted, since `entries` is a `BTreeMap`).
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| Error::Parse {
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
    use fstree_common::Entry;
    use tempfile::TempDir;

    #[test]
    fn round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snap.json");

        let mut snap = Snapshot::new("/tmp/root");
        snap.insert("a", Entry::Dir);
        snap.insert(
            "a/b.txt",
            Entry::File {
                size: 3,
                mtime: 5,
                hash: fstree_fingerprint::fingerprint_bytes(b"abc"),
            },
        );

        write_snapshot(&path, &snap).unwrap();
        let loaded = read_snapshot(&path).unwrap();
        assert!(snap.content_eq(&loaded));
    }

    #[test]
    fn missing_file_is_input_missing_error() {
        let dir = TempDir::new().unwrap();
        let err = read_snapshot(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::InputMissing { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn structurally_invalid_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.json");
        // "a/b.txt" is a file with no "a" directory entry.
        fs::write(
            &path,
            format!(
                r#"{{"version":1,"captured_root":"/tmp","entries":{{"a/b.txt":{{"kind":"file","size":1,"mtime":0,"hash":"{}"}}}}}}"#,
                "0".repeat(64)
            ),
        )
        .unwrap();
        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot { .. }));
    }
}
