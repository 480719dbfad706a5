//! The Patch Applier: takes a `Diff` and a destination tree and brings the
//! destination to the `Diff`'s "after" state, never losing data it did not
//! know about. Every destructive step that would otherwise clobber
//! unexpected content renames the obstacle aside instead, so the whole
//! operation is total rather than partial-and-erroring.

mod audit;
mod ops;
mod rename;

use std::collections::HashSet;
use std::path::Path;

use fstree_common::{Change, Diff, EntryKind, Result};

pub use audit::{AuditEntry, Status};
pub use rename::rename_aside;

/// Apply `diff` onto `dst`, reading any new file content from `src`.
/// `src` and `dst` both refer to the roots the `Diff`'s snapshots were
/// captured against — `src` holds the "after" state, `dst` is patched in
/// place towards it.
///
/// Returns the audit log, one entry per `Change`, in application order
/// (phase order, not the `Diff`'s own order).
pub fn apply_patch(diff: &Diff, dst: &Path, src: &Path) -> Result<Vec<AuditEntry>> {
    let mut log = Vec::with_capacity(diff.len());

    // A `dir -> file` flip discards the whole subtree under the old
    // directory. Its descendants' own removal Changes are settled here,
    // before the directory is touched, so each one runs its usual
    // conflict protocol (content_conflict / conflict_nonempty) against
    // diverged content instead of having that content silently wiped out
    // by a blanket recursive delete. Settled paths are excluded from the
    // ordinary removal phase below so each Change is still applied exactly
    // once.
    let mut settled: HashSet<&str> = HashSet::new();
    for change in kind_flips(diff) {
        match (change.from, change.to) {
            (EntryKind::Dir, EntryKind::File) => {
                let descendants = removals_under(diff, &change.path);
                for d in &descendants {
                    settled.insert(d.path.as_str());
                }
                ops::apply_dir_to_file_flip(change, &descendants, dst, src, &mut log)?;
            }
            (EntryKind::File, EntryKind::Dir) => {
                ops::apply_kind_flip(change, dst, src, &mut log)?;
            }
            _ => unreachable!("kind_flips only yields file<->dir transitions"),
        }
    }
    for change in removals(diff) {
        if settled.contains(change.path.as_str()) {
            continue;
        }
        apply_removal(change, dst, &mut log)?;
    }
    for change in dir_additions(diff) {
        ops::apply_dir_add(change, dst, &mut log)?;
    }
    for change in file_additions(diff) {
        ops::apply_file_add(change, dst, src, &mut log)?;
    }
    for change in content_changes(diff) {
        ops::apply_content_change(change, dst, src, &mut log)?;
    }

    Ok(log)
}

/// Render an audit log as `\n`-terminated lines, in application order.
pub fn render_audit_log(log: &[AuditEntry]) -> String {
    let mut out = String::new();
    for entry in log {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

fn apply_removal(change: &Change, dst: &Path, log: &mut Vec<AuditEntry>) -> Result<()> {
    match change.from {
        EntryKind::File => ops::apply_file_remove(change, dst, log),
        EntryKind::Dir => ops::apply_dir_remove(change, dst, log),
        EntryKind::Absent => unreachable!("a removal always starts from File or Dir"),
    }
}

fn kind_flips(diff: &Diff) -> impl Iterator<Item = &Change> {
    diff.changes.iter().filter(|c| {
        c.from != EntryKind::Absent && c.to != EntryKind::Absent && c.from != c.to
    })
}

/// Every Change whose "to" side is Absent, deepest path first. This single
/// descending sort satisfies "file removals before enclosing directory
/// removals" for free: a directory's path is always a strict prefix of its
/// children's, and is therefore always shallower.
fn removals(diff: &Diff) -> Vec<&Change> {
    let mut changes: Vec<&Change> = diff
        .changes
        .iter()
        .filter(|c| c.to == EntryKind::Absent)
        .collect();
    changes.sort_by(|a, b| {
        fstree_pathutil::depth(&b.path)
            .cmp(&fstree_pathutil::depth(&a.path))
            .then_with(|| b.path.cmp(&a.path))
    });
    changes
}

/// Removal Changes strictly under `prefix`, deepest path first — the same
/// ordering `removals` uses, scoped to one subtree. Used to settle a
/// `dir -> file` kind flip's descendants before the directory itself is
/// replaced.
fn removals_under<'a>(diff: &'a Diff, prefix: &str) -> Vec<&'a Change> {
    let under_prefix = format!("{prefix}/");
    let mut changes: Vec<&Change> = diff
        .changes
        .iter()
        .filter(|c| c.to == EntryKind::Absent && c.path.starts_with(&under_prefix))
        .collect();
    changes.sort_by(|a, b| {
        fstree_pathutil::depth(&b.path)
            .cmp(&fstree_pathutil::depth(&a.path))
            .then_with(|| b.path.cmp(&a.path))
    });
    changes
}

fn dir_additions(diff: &Diff) -> Vec<&Change> {
    let mut changes: Vec<&Change> = diff
        .changes
        .iter()
        .filter(|c| c.from == EntryKind::Absent && c.to == EntryKind::Dir)
        .collect();
    changes.sort_by_key(|c| (fstree_pathutil::depth(&c.path), c.path.clone()));
    changes
}

fn file_additions(diff: &Diff) -> Vec<&Change> {
    let mut changes: Vec<&Change> = diff
        .changes
        .iter()
        .filter(|c| c.from == EntryKind::Absent && c.to == EntryKind::File)
        .collect();
    changes.sort_by_key(|c| (fstree_pathutil::depth(&c.path), c.path.clone()));
    changes
}

fn content_changes(diff: &Diff) -> impl Iterator<Item = &Change> {
    diff.changes
        .iter()
        .filter(|c| c.from == EntryKind::File && c.to == EntryKind::File)
}
