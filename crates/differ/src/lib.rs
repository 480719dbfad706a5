//! The Snapshot Differ: a pure function of two `Snapshot`s producing a
//! `Diff`. Identity for files is fingerprint-only — mtime and size never
//! factor into whether a Change is emitted.

mod io;

use std::collections::BTreeSet;

use fstree_common::{Change, Diff, Entry, EntryKind, Snapshot};

pub use io::{read_diff, write_diff};

/// Compute the structural delta between `before` and `after`.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Diff {
    let mut paths: BTreeSet<&String> = before.entries.keys().collect();
    paths.extend(after.entries.keys());

    let mut changes = Vec::new();
    for path in paths {
        let before_entry = before.get(path);
        let after_entry = after.get(path);
        let before_kind = before.kind_at(path);
        let after_kind = after.kind_at(path);

        if before_kind == after_kind {
            match (before_kind, before_entry, after_entry) {
                (EntryKind::Dir, _, _) => continue,
                (EntryKind::File, Some(b), Some(a)) => {
                    if entries_differ(b, a) {
                        log::debug!("content change: {path}");
                        changes.push(Change::new(
                            path.clone(),
                            EntryKind::File,
                            EntryKind::File,
                            Some(b.clone()),
                            Some(a.clone()),
                        ));
                    }
                }
                _ => {}
            }
            continue;
        }

        log::debug!("kind change at {path}: {before_kind:?} -> {after_kind:?}");
        changes.push(Change::new(
            path.clone(),
            before_kind,
            after_kind,
            before_entry.cloned(),
            after_entry.cloned(),
        ));
    }

    Diff { changes }
}

fn entries_differ(before: &Entry, after: &Entry) -> bool {
    match (before.as_file(), after.as_file()) {
        (Some((_, _, before_hash)), Some((_, _, after_hash))) => before_hash != after_hash,
        _ => true,
    }
}
