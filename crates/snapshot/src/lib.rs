//! The Snapshot Builder: walks a directory tree into a `Snapshot`, reusing
//! prior fingerprints when filesystem metadata proves a file is unchanged,
//! plus JSON serialization for the resulting document.

mod build;
mod io;

pub use build::{build_snapshot, BuildOptions};
pub use io::{read_snapshot, write_snapshot};

pub use fstree_common::{Entry, EntryKind, Snapshot};
