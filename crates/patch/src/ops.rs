use std::fs;
use std::path::Path;

use fstree_common::{Change, Entry, EntryKind, Error, Result};
use fstree_fingerprint::{fingerprint_file, Fingerprint};

use crate::audit::{AuditEntry, Status};
use crate::rename::rename_aside;

/// Pull the content fingerprint out of a Change's before/after entry. Both
/// are `None`/non-file only for a malformed diff (e.g. hand-edited JSON
/// claiming a file-kind Change with no entry attached) — a genuine input
/// error, not an invariant the Applier should assume away.
fn file_hash(entry: Option<&Entry>, change_path: &str) -> Result<Fingerprint> {
    match entry.and_then(Entry::as_file) {
        Some((_, _, hash)) => Ok(hash),
        None => Err(Error::InvalidDiff {
            message: format!("change at {change_path} is missing its file entry"),
        }),
    }
}

fn copy_file(src_root: &Path, dst_root: &Path, relative: &str) -> Result<()> {
    let src_full = fstree_pathutil::join(src_root, relative);
    let dst_full = fstree_pathutil::join(dst_root, relative);

    if !src_full.is_file() {
        return Err(Error::InputMissing { path: src_full });
    }
    if let Some(parent) = dst_full.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::IoDest {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(&src_full, &dst_full).map_err(|source| Error::IoDest {
        path: dst_full,
        source,
    })?;
    Ok(())
}

fn existing_file_hash(dst_full: &Path) -> Result<Fingerprint> {
    fingerprint_file(dst_full).map_err(|source| Error::IoDest {
        path: dst_full.to_path_buf(),
        source,
    })
}

fn dir_is_empty(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|source| Error::IoDest {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

/// `absent -> file`: add a file at `p`.
pub fn apply_file_add(
    change: &Change,
    dst: &Path,
    src: &Path,
    log: &mut Vec<AuditEntry>,
) -> Result<()> {
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);
    let after_hash = file_hash(change.to_entry.as_ref(), relative)?;

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::Absent,
                EntryKind::File,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            let alt = rename_aside(dst, relative)?;
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::Absent,
                EntryKind::File,
                Status::TypeConflict,
                relative.clone(),
                Some(alt),
            ));
        }
        Ok(_) => {
            let existing = existing_file_hash(&dst_full)?;
            if existing == after_hash {
                log.push(AuditEntry::new(
                    EntryKind::Absent,
                    EntryKind::File,
                    Status::OkUnchanged,
                    relative.clone(),
                    None,
                ));
            } else {
                let alt = rename_aside(dst, relative)?;
                copy_file(src, dst, relative)?;
                log.push(AuditEntry::new(
                    EntryKind::Absent,
                    EntryKind::File,
                    Status::ContentConflict,
                    relative.clone(),
                    Some(alt),
                ));
            }
        }
    }
    Ok(())
}

/// `absent -> dir`: add a directory at `p`.
pub fn apply_dir_add(change: &Change, dst: &Path, log: &mut Vec<AuditEntry>) -> Result<()> {
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            fs::create_dir_all(&dst_full).map_err(|source| Error::IoDest {
                path: dst_full.clone(),
                source,
            })?;
            log.push(AuditEntry::new(
                EntryKind::Absent,
                EntryKind::Dir,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            log.push(AuditEntry::new(
                EntryKind::Absent,
                EntryKind::Dir,
                Status::OkExists,
                relative.clone(),
                None,
            ));
        }
        Ok(_) => {
            let alt = rename_aside(dst, relative)?;
            fs::create_dir_all(&dst_full).map_err(|source| Error::IoDest {
                path: dst_full.clone(),
                source,
            })?;
            log.push(AuditEntry::new(
                EntryKind::Absent,
                EntryKind::Dir,
                Status::TypeConflict,
                relative.clone(),
                Some(alt),
            ));
        }
    }
    Ok(())
}

/// `file -> absent`: remove a file at `p`.
pub fn apply_file_remove(change: &Change, dst: &Path, log: &mut Vec<AuditEntry>) -> Result<()> {
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);
    let before_hash = file_hash(change.from_entry.as_ref(), relative)?;

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            log.push(AuditEntry::new(
                EntryKind::File,
                EntryKind::Absent,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            let alt = rename_aside(dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::File,
                EntryKind::Absent,
                Status::TypeConflict,
                relative.clone(),
                Some(alt),
            ));
        }
        Ok(_) => {
            let existing = existing_file_hash(&dst_full)?;
            if existing == before_hash {
                fs::remove_file(&dst_full).map_err(|source| Error::IoDest {
                    path: dst_full.clone(),
                    source,
                })?;
                log.push(AuditEntry::new(
                    EntryKind::File,
                    EntryKind::Absent,
                    Status::Ok,
                    relative.clone(),
                    None,
                ));
            } else {
                let alt = rename_aside(dst, relative)?;
                log.push(AuditEntry::new(
                    EntryKind::File,
                    EntryKind::Absent,
                    Status::ContentConflict,
                    relative.clone(),
                    Some(alt),
                ));
            }
        }
    }
    Ok(())
}

/// `dir -> absent`: remove a directory at `p`. Must run after every
/// descendant Change (guaranteed by the depth-descending removal order).
pub fn apply_dir_remove(change: &Change, dst: &Path, log: &mut Vec<AuditEntry>) -> Result<()> {
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            log.push(AuditEntry::new(
                EntryKind::Dir,
                EntryKind::Absent,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            if dir_is_empty(&dst_full)? {
                fs::remove_dir(&dst_full).map_err(|source| Error::IoDest {
                    path: dst_full.clone(),
                    source,
                })?;
                log.push(AuditEntry::new(
                    EntryKind::Dir,
                    EntryKind::Absent,
                    Status::Ok,
                    relative.clone(),
                    None,
                ));
            } else {
                let alt = rename_aside(dst, relative)?;
                log.push(AuditEntry::new(
                    EntryKind::Dir,
                    EntryKind::Absent,
                    Status::ConflictNonempty,
                    relative.clone(),
                    Some(alt),
                ));
            }
        }
        Ok(_) => {
            // A file now sits where a directory was expected; rename it
            // aside rather than silently destroying it.
            let alt = rename_aside(dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::Dir,
                EntryKind::Absent,
                Status::ConflictNonempty,
                relative.clone(),
                Some(alt),
            ));
        }
    }
    Ok(())
}

/// `file -> file` with a differing fingerprint: overwrite content.
pub fn apply_content_change(
    change: &Change,
    dst: &Path,
    src: &Path,
    log: &mut Vec<AuditEntry>,
) -> Result<()> {
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);
    let before_hash = file_hash(change.from_entry.as_ref(), relative)?;
    let after_hash = file_hash(change.to_entry.as_ref(), relative)?;

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::File,
                EntryKind::File,
                Status::OkAdded,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            let alt = rename_aside(dst, relative)?;
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                EntryKind::File,
                EntryKind::File,
                Status::ContentConflict,
                relative.clone(),
                Some(alt),
            ));
        }
        Ok(_) => {
            let existing = existing_file_hash(&dst_full)?;
            if existing == after_hash {
                log.push(AuditEntry::new(
                    EntryKind::File,
                    EntryKind::File,
                    Status::OkUnchanged,
                    relative.clone(),
                    None,
                ));
            } else if existing == before_hash {
                copy_file(src, dst, relative)?;
                log.push(AuditEntry::new(
                    EntryKind::File,
                    EntryKind::File,
                    Status::OkChanged,
                    relative.clone(),
                    None,
                ));
            } else {
                let alt = rename_aside(dst, relative)?;
                copy_file(src, dst, relative)?;
                log.push(AuditEntry::new(
                    EntryKind::File,
                    EntryKind::File,
                    Status::ContentConflict,
                    relative.clone(),
                    Some(alt),
                ));
            }
        }
    }
    Ok(())
}

/// `file -> dir`: replace the file at `p` with a directory. The new
/// subtree's contents arrive separately through Phase C's additions, which
/// run after this (shallowest directory first), so no descendant handling
/// is needed here — unlike the `dir -> file` direction, a file has no
/// children whose content could be silently lost.
pub fn apply_kind_flip(
    change: &Change,
    dst: &Path,
    _src: &Path,
    log: &mut Vec<AuditEntry>,
) -> Result<()> {
    debug_assert_eq!(change.from, EntryKind::File);
    debug_assert_eq!(change.to, EntryKind::Dir);
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);

    let create_dir = || -> Result<()> {
        fs::create_dir_all(&dst_full).map_err(|source| Error::IoDest {
            path: dst_full.clone(),
            source,
        })
    };

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            create_dir()?;
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_file() => {
            fs::remove_file(&dst_full).map_err(|source| Error::IoDest {
                path: dst_full.clone(),
                source,
            })?;
            create_dir()?;
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::OkExists,
                relative.clone(),
                None,
            ));
        }
        Ok(_) => {
            let alt = rename_aside(dst, relative)?;
            create_dir()?;
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::TypeConflict,
                relative.clone(),
                Some(alt),
            ));
        }
    }
    Ok(())
}

/// `dir -> file`: replace the directory at `p` with a file.
///
/// `descendants` are the diff's own removal Changes for everything under
/// `p`, deepest path first. Each is settled through the ordinary
/// `apply_file_remove`/`apply_dir_remove` conflict protocol *before* the
/// directory itself is touched, so content that diverged from what the
/// "before" snapshot expected gets renamed aside (and logged) rather than
/// wiped out by a blanket recursive delete. Only once every declared
/// descendant is gone — or preserved aside — do we look at what, if
/// anything, is left in the directory.
pub fn apply_dir_to_file_flip(
    change: &Change,
    descendants: &[&Change],
    dst: &Path,
    src: &Path,
    log: &mut Vec<AuditEntry>,
) -> Result<()> {
    debug_assert_eq!(change.from, EntryKind::Dir);
    debug_assert_eq!(change.to, EntryKind::File);
    let relative = &change.path;
    let dst_full = fstree_pathutil::join(dst, relative);

    for descendant in descendants {
        match descendant.from {
            EntryKind::File => apply_file_remove(descendant, dst, log)?,
            EntryKind::Dir => apply_dir_remove(descendant, dst, log)?,
            EntryKind::Absent => unreachable!("a removal always starts from File or Dir"),
        }
    }

    match fs::symlink_metadata(&dst_full) {
        Err(_) => {
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::Ok,
                relative.clone(),
                None,
            ));
        }
        Ok(meta) if meta.is_dir() => {
            if dir_is_empty(&dst_full)? {
                fs::remove_dir(&dst_full).map_err(|source| Error::IoDest {
                    path: dst_full.clone(),
                    source,
                })?;
                copy_file(src, dst, relative)?;
                log.push(AuditEntry::new(
                    change.from,
                    change.to,
                    Status::Ok,
                    relative.clone(),
                    None,
                ));
            } else {
                // Either the "before" snapshot never knew about some of
                // this directory's contents, or a descendant above was
                // itself preserved aside inside it — either way there is
                // still something here the diff doesn't account for.
                // Relocate the whole directory rather than losing it.
                let alt = rename_aside(dst, relative)?;
                copy_file(src, dst, relative)?;
                log.push(AuditEntry::new(
                    change.from,
                    change.to,
                    Status::ConflictNonempty,
                    relative.clone(),
                    Some(alt),
                ));
            }
        }
        Ok(meta) if meta.is_file() => {
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::OkExists,
                relative.clone(),
                None,
            ));
        }
        Ok(_) => {
            let alt = rename_aside(dst, relative)?;
            copy_file(src, dst, relative)?;
            log.push(AuditEntry::new(
                change.from,
                change.to,
                Status::TypeConflict,
                relative.clone(),
                Some(alt),
            ));
        }
    }
    Ok(())
}
