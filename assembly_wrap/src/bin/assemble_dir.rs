//! assemble_dir
#![deny(missing_docs)]

use anyhow::Result;
use assembly_wrap::env::{get_version, init_logging, set_env_columns};
use assembly_wrap::pipeline::DEFAULT_PILON_MEMORY;
use assembly_wrap::utils::{parse_path, print_error_chain};
use assembly_wrap::{
    AssemblyBatch, BatchConfig, CleanupMode, CommandRunner, FailurePolicy, FileCleanup,
    IntoExitCode, ToolchainPipeline,
};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use fastq_pairs::read_pair::{DEFAULT_FORWARD_MARKER, DEFAULT_REVERSE_MARKER};
use fastq_pairs::ReadMarkers;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

const CMD: &str = "assemble_dir";

/// Assemble every paired-end sample found in a directory of FASTQ files
#[derive(Parser, Debug)]
#[clap(name = CMD, version = get_version(), before_help = format!("{CMD} {}", get_version()))]
struct AssembleDir {
    /// Directory containing the FASTQ files to assemble
    #[clap(
        short = 'i',
        long = "input_dir",
        alias = "input-dir",
        value_name = "PATH",
        value_parser = parse_path
    )]
    input_dir: PathBuf,

    /// Root directory for the per-sample output directories
    #[clap(
        short = 'o',
        long = "out_dir",
        alias = "out-dir",
        value_name = "PATH",
        value_parser = parse_path
    )]
    out_dir: PathBuf,

    /// Substring identifying forward read files
    #[clap(
        short = 'f',
        long = "fwd_id",
        value_name = "TEXT",
        default_value = DEFAULT_FORWARD_MARKER,
        value_parser = NonEmptyStringValueParser::new(),
    )]
    fwd_id: String,

    /// Substring identifying reverse read files
    #[clap(
        short = 'r',
        long = "rev_id",
        value_name = "TEXT",
        default_value = DEFAULT_REVERSE_MARKER,
        value_parser = NonEmptyStringValueParser::new(),
    )]
    rev_id: String,

    /// Memory for the Pilon polishing step, passed as -Xmx<MEM>
    #[clap(short = 'm', long, value_name = "MEM", default_value = DEFAULT_PILON_MEMORY)]
    memory: String,

    /// Delete all intermediate files, keeping only the FASTA assemblies
    #[clap(long)]
    cleanup: bool,

    /// Keep going after a sample fails and report all failed samples at the end
    #[clap(long)]
    continue_on_error: bool,

    /// Number of samples to assemble at the same time
    #[clap(short = 'j', long, value_name = "NUM", default_value = "1")]
    jobs: NonZeroUsize,

    /// Log the external commands without running them
    #[clap(long)]
    dry_run: bool,
}

impl AssembleDir {
    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            input_dir: self.input_dir.clone(),
            out_dir: self.out_dir.clone(),
            markers: ReadMarkers::new(&self.fwd_id, &self.rev_id),
            failure_policy: if self.continue_on_error {
                FailurePolicy::ContinueOnError
            } else {
                FailurePolicy::FailFast
            },
            jobs: self.jobs,
        }
    }
}

fn inner_main() -> Result<ExitCode> {
    set_env_columns();
    let args = AssembleDir::parse();
    init_logging();

    let pipeline = ToolchainPipeline::new(&args.memory, CommandRunner::new(args.dry_run));
    let mode = if args.cleanup {
        CleanupMode::Total
    } else {
        CleanupMode::Basic
    };
    let cleanup = FileCleanup::new(mode, args.dry_run);

    AssemblyBatch::new(args.batch_config(), &pipeline, &cleanup).run()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            print_error_chain(&err);
            (&err).into_exit_code()
        }
    }
}
