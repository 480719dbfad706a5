use std::fmt;

use fstree_common::EntryKind;

/// The per-change outcome reported on the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    OkUnchanged,
    OkExists,
    OkAdded,
    OkChanged,
    ContentConflict,
    TypeConflict,
    ConflictNonempty,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Status::Ok => "ok",
            Status::OkUnchanged => "ok_unchanged",
            Status::OkExists => "ok_exists",
            Status::OkAdded => "ok_added",
            Status::OkChanged => "ok_changed",
            Status::ContentConflict => "content_conflict",
            Status::TypeConflict => "type_conflict",
            Status::ConflictNonempty => "conflict_nonempty",
        };
        write!(f, "{token}")
    }
}

fn kind_token(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Dir => "dir",
        EntryKind::Absent => "absent",
    }
}

/// One line of the patch audit log, in application order.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub from: EntryKind,
    pub to: EntryKind,
    pub status: Status,
    pub path: String,
    pub alt_path: Option<String>,
}

impl AuditEntry {
    pub fn new(
        from: EntryKind,
        to: EntryKind,
        status: Status,
        path: impl Into<String>,
        alt_path: Option<String>,
    ) -> Self {
        AuditEntry {
            from,
            to,
            status,
            path: path.into(),
            alt_path,
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{}:{}:{}",
            kind_token(self.from),
            kind_token(self.to),
            self.status,
            self.path
        )?;
        if let Some(alt) = &self.alt_path {
            write!(f, " ==> {alt}")?;
        }
        Ok(())
    }
}
