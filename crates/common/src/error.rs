use std::io;
use std::path::PathBuf;

/// Error taxonomy for the snapshot/diff/patch engine.
///
/// Logical conflicts encountered while applying a patch are NOT represented
/// here — they are in-band, reported through the audit log's `STATUS`
/// field and recovered via rename-aside. Only genuinely fatal conditions
/// (missing input, malformed documents, I/O failure) are `Err` values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: not found")]
    InputMissing { path: PathBuf },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid snapshot document: {message}")]
    InvalidSnapshot { message: String },

    #[error("invalid diff document: {message}")]
    InvalidDiff { message: String },

    #[error("failed to read {path}: {source}")]
    IoSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    IoDest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
