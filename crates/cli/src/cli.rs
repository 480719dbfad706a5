use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fstree", about = "Directory-tree snapshot, diff, and patch engine")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture a snapshot of a directory tree and write it as JSON.
    Snapshot {
        /// Directory to walk.
        #[arg(long)]
        root: PathBuf,

        /// Where to write the resulting snapshot JSON.
        #[arg(long)]
        out: PathBuf,

        /// A prior snapshot to reuse fingerprints from.
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Disable the advisory progress bar.
        #[arg(long)]
        no_progress_bar: bool,

        /// Testing hook: force every recorded mtime to this value.
        #[arg(long)]
        time_override: Option<i64>,
    },

    /// Compute the structural delta between two snapshots and print it.
    Diff {
        /// The "before" snapshot JSON.
        #[arg(long)]
        before: PathBuf,

        /// The "after" snapshot JSON.
        #[arg(long)]
        after: PathBuf,
    },

    /// Apply a diff onto a destination tree, copying new content from a
    /// source tree, and print the audit log.
    Patch {
        /// The diff JSON produced by `fstree diff`.
        #[arg(long)]
        diff: PathBuf,

        /// The tree being patched in place.
        #[arg(long)]
        dst: PathBuf,

        /// The tree the diff's "after" side was captured from.
        #[arg(long)]
        src: PathBuf,
    },
}
