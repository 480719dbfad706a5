//! Shared data model and error types for the snapshot/diff/patch engine.

mod error;
mod model;

pub use error::{Error, Result};
pub use model::{Change, Diff, Entry, EntryKind, Snapshot, SNAPSHOT_VERSION};
