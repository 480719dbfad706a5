mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cli::{CliArgs, Command};

fn main() -> ExitCode {
    env_logger::init();
    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fstree: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Snapshot {
            root,
            out,
            prior,
            no_progress_bar,
            time_override,
        } => {
            let prior_snapshot = prior
                .as_deref()
                .map(fstree_snapshot::read_snapshot)
                .transpose()
                .context("reading prior snapshot")?;
            let opts = fstree_snapshot::BuildOptions {
                progress: !no_progress_bar,
                time_override,
            };
            let snapshot =
                fstree_snapshot::build_snapshot(&root, prior_snapshot.as_ref(), &opts)
                    .context("building snapshot")?;
            fstree_snapshot::write_snapshot(&out, &snapshot).context("writing snapshot")?;
            log::info!("wrote snapshot with {} entries to {}", snapshot.entries.len(), out.display());
            Ok(())
        }

        Command::Diff { before, after } => {
            let before = fstree_snapshot::read_snapshot(&before).context("reading before snapshot")?;
            let after = fstree_snapshot::read_snapshot(&after).context("reading after snapshot")?;
            let diff = fstree_differ::diff(&before, &after);
            let json = serde_json::to_string_pretty(&diff).context("serializing diff")?;
            println!("{json}");
            Ok(())
        }

        Command::Patch { diff, dst, src } => {
            let diff = fstree_differ::read_diff(&diff).context("reading diff")?;
            let log_lines = fstree_patch::apply_patch(&diff, &dst, &src).context("applying patch")?;
            print!("{}", fstree_patch::render_audit_log(&log_lines));
            Ok(())
        }
    }
}
