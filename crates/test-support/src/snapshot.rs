use std::fmt;
use std::path::Path;

use fstree_common::{Entry, EntryKind, Snapshot};
use fstree_snapshot::{build_snapshot, BuildOptions};

/// Capture a `Snapshot` of `root` with default build options, for tests
/// that just want the current on-disk state with no reuse/progress concerns.
pub fn capture(root: &Path) -> Snapshot {
    build_snapshot(root, None, &BuildOptions::default()).expect("capture should not fail in tests")
}

#[derive(Debug)]
enum Discrepancy {
    Missing { path: String },
    Extra { path: String },
    TypeMismatch { path: String, expected: EntryKind, actual: EntryKind },
    ContentMismatch { path: String },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Missing { path } => write!(f, "  MISSING: {path}"),
            Discrepancy::Extra { path } => write!(f, "  EXTRA:   {path}"),
            Discrepancy::TypeMismatch { path, expected, actual } => {
                write!(f, "  TYPE:    {path} (expected {expected:?}, got {actual:?})")
            }
            Discrepancy::ContentMismatch { path } => {
                write!(f, "  CONTENT: {path} (fingerprint differs)")
            }
        }
    }
}

/// Compare two `Snapshot`s by content (ignoring `captured_root`), panicking
/// with a human-readable diff listing every discrepancy if they don't match.
pub fn assert_tree_eq(expected: &Snapshot, actual: &Snapshot) {
    let mut discrepancies = Vec::new();

    for (path, expected_entry) in &expected.entries {
        match actual.get(path) {
            None => discrepancies.push(Discrepancy::Missing { path: path.clone() }),
            Some(actual_entry) => {
                if expected_entry.kind() != actual_entry.kind() {
                    discrepancies.push(Discrepancy::TypeMismatch {
                        path: path.clone(),
                        expected: expected_entry.kind(),
                        actual: actual_entry.kind(),
                    });
                } else if let (Entry::File { hash: eh, .. }, Entry::File { hash: ah, .. }) =
                    (expected_entry, actual_entry)
                {
                    if eh != ah {
                        discrepancies.push(Discrepancy::ContentMismatch { path: path.clone() });
                    }
                }
            }
        }
    }

    for path in actual.entries.keys() {
        if !expected.entries.contains_key(path) {
            discrepancies.push(Discrepancy::Extra { path: path.clone() });
        }
    }

    if !discrepancies.is_empty() {
        let mut message = String::from("tree snapshots differ:\n");
        for d in &discrepancies {
            message.push_str(&d.to_string());
            message.push('\n');
        }
        panic!("{message}");
    }
}
