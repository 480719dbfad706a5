use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fstree_fingerprint::Fingerprint;

/// The kind of an entry at a path, as seen by a `Change`. `Absent` only
/// ever appears as one side of a `Change` — a `Snapshot` never stores an
/// absent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Dir,
    Absent,
}

/// A single entry inside a `Snapshot`: either a file (carrying its content
/// fingerprint and the metadata used for reuse decisions) or a directory
/// (which carries no content identity of its own).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    File { size: u64, mtime: i64, hash: Fingerprint },
    Dir,
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File { .. } => EntryKind::File,
            Entry::Dir => EntryKind::Dir,
        }
    }

    pub fn as_file(&self) -> Option<(u64, i64, Fingerprint)> {
        match self {
            Entry::File { size, mtime, hash } => Some((*size, *mtime, *hash)),
            Entry::Dir => None,
        }
    }
}

pub const SNAPSHOT_VERSION: u32 = 1;

/// A path-keyed map of every file and directory below (not including) a
/// captured root. Immutable once built; the root itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// The root's absolute path at capture time. Informational only — it
    /// is never used for matching or equality.
    pub captured_root: String,
    pub entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    pub fn new(captured_root: impl Into<String>) -> Self {
        Snapshot {
            version: SNAPSHOT_VERSION,
            captured_root: captured_root.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn kind_at(&self, path: &str) -> EntryKind {
        match self.entries.get(path) {
            Some(entry) => entry.kind(),
            None => EntryKind::Absent,
        }
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: Entry) {
        self.entries.insert(path.into(), entry);
    }

    /// Equality that matches the spec's contract: two snapshots of the
    /// same tree compare equal regardless of `captured_root` or key
    /// iteration order (the latter is free, since `entries` is a
    /// `BTreeMap`).
    pub fn content_eq(&self, other: &Snapshot) -> bool {
        self.entries == other.entries
    }

    /// Validate the structural invariants from the data model: every
    /// nonempty strict prefix of a file path must be present as a
    /// directory entry, and no path may begin with `/`.
    pub fn validate(&self) -> Result<(), String> {
        for path in self.entries.keys() {
            if path.starts_with('/') {
                return Err(format!("path must not start with '/': {path}"));
            }
            for prefix in fstree_pathutil::strict_prefixes(path) {
                match self.entries.get(&prefix) {
                    Some(Entry::Dir) => {}
                    Some(Entry::File { .. }) => {
                        return Err(format!(
                            "path {path} has an ancestor {prefix} recorded as a file"
                        ));
                    }
                    None => {
                        return Err(format!(
                            "path {path} is missing ancestor directory entry {prefix}"
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// One structural transition between two snapshots at a single path. Only
/// the entry matching the non-absent side(s) is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub from: EntryKind,
    pub to: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_entry: Option<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_entry: Option<Entry>,
}

impl Change {
    pub fn new(
        path: impl Into<String>,
        from: EntryKind,
        to: EntryKind,
        from_entry: Option<Entry>,
        to_entry: Option<Entry>,
    ) -> Self {
        Change {
            path: path.into(),
            from,
            to,
            from_entry,
            to_entry,
        }
    }
}

/// An ordered sequence of `Change`s between two snapshots. The order
/// recorded here is not itself semantically load-bearing at emission time
/// (the Differ emits in path order); the Patch Applier imposes its own
/// phase order when consuming a `Diff`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diff {
    pub changes: Vec<Change>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl IntoIterator for Diff {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_entry(size: u64, mtime: i64) -> Entry {
        Entry::File {
            size,
            mtime,
            hash: fstree_fingerprint::fingerprint_bytes(b"x"),
        }
    }

    #[test]
    fn kind_at_absent_for_missing_path() {
        let snap = Snapshot::new("/tmp/root");
        assert_eq!(snap.kind_at("nope"), EntryKind::Absent);
    }

    #[test]
    fn validate_accepts_well_formed_snapshot() {
        let mut snap = Snapshot::new("/tmp/root");
        snap.insert("a", Entry::Dir);
        snap.insert("a/b.txt", file_entry(1, 0));
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_ancestor_dir() {
        let mut snap = Snapshot::new("/tmp/root");
        snap.insert("a/b.txt", file_entry(1, 0));
        assert!(snap.validate().is_err());
    }

    #[test]
    fn validate_rejects_ancestor_recorded_as_file() {
        let mut snap = Snapshot::new("/tmp/root");
        snap.insert("a", file_entry(1, 0));
        snap.insert("a/b.txt", file_entry(1, 0));
        assert!(snap.validate().is_err());
    }

    #[test]
    fn content_eq_ignores_captured_root() {
        let mut a = Snapshot::new("/root/one");
        let mut b = Snapshot::new("/root/two");
        a.insert("f.txt", file_entry(3, 10));
        b.insert("f.txt", file_entry(3, 10));
        assert!(a.content_eq(&b));
        assert_ne!(a.captured_root, b.captured_root);
    }

    #[test]
    fn entry_json_shape_matches_contract() {
        let entry = file_entry(11, 1700000000);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["size"], 11);
        assert_eq!(json["mtime"], 1700000000);
        assert!(json["hash"].as_str().unwrap().len() == 64);

        let dir_json = serde_json::to_value(Entry::Dir).unwrap();
        assert_eq!(dir_json["kind"], "dir");
    }

    #[test]
    fn diff_json_round_trip() {
        let diff = Diff {
            changes: vec![Change::new(
                "a.txt",
                EntryKind::Absent,
                EntryKind::File,
                None,
                Some(file_entry(2, 0)),
            )],
        };
        let json = serde_json::to_string(&diff).unwrap();
        let back: Diff = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.changes[0].path, "a.txt");
    }
}
