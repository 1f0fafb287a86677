// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

//! Drive an external genome assembly pipeline over every paired-end sample
//! found in a directory of FASTQ files.

pub mod batch;
pub mod cleanup;
pub mod env;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod utils;

use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use log::{debug, info};
use shell_escape::escape;
use std::process::{Command, ExitCode};

pub use batch::{AssemblyBatch, BatchConfig, BatchSummary, FailurePolicy};
pub use cleanup::{Cleanup, CleanupMode, FileCleanup};
pub use errors::BatchError;
pub use events::{BatchEvent, BatchObserver, LogObserver};
pub use pipeline::{AssemblyPipeline, ToolchainPipeline};

/// Convert something to an ExitCode.
pub trait IntoExitCode {
    fn into_exit_code(self) -> ExitCode;
}

impl IntoExitCode for &anyhow::Error {
    /// Batch errors carry their own exit code; anything else is a generic failure.
    fn into_exit_code(self) -> ExitCode {
        self.downcast_ref::<BatchError>()
            .map_or(ExitCode::FAILURE, |err| ExitCode::from(err.exit_code()))
    }
}

/// Runs external programs, or only logs them in dry-run mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandRunner {
    dry_run: bool,
}

impl CommandRunner {
    pub fn new(dry_run: bool) -> Self {
        CommandRunner { dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run `cmd` to completion. A non-zero exit status is an error.
    /// `label` prefixes the log lines, so output of concurrent samples stays attributable.
    pub fn run(&self, label: &str, cmd: &mut Command) -> Result<()> {
        let cmdline = command_line(cmd);
        if self.dry_run {
            info!("[{label}] Dry run: {cmdline}");
            return Ok(());
        }

        debug!("[{label}] Running {cmdline}");
        let status = cmd
            .status()
            .with_context(|| format!("Failed to run {cmdline}"))?;
        ensure!(status.success(), "{cmdline} exited with {status}");
        Ok(())
    }
}

/// The shell-escaped command line of `cmd`.
pub fn command_line(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| escape(arg.to_string_lossy()))
        .join(" ")
}
