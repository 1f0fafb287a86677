//! assemble
#![deny(missing_docs)]

use anyhow::{ensure, Context, Result};
use assembly_wrap::env::{get_version, init_logging, set_env_columns};
use assembly_wrap::pipeline::DEFAULT_PILON_MEMORY;
use assembly_wrap::utils::{parse_path, print_error_chain, CliPath};
use assembly_wrap::{
    AssemblyPipeline, BatchError, Cleanup, CleanupMode, CommandRunner, FileCleanup, IntoExitCode,
    ToolchainPipeline,
};
use clap::Parser;
use fastq_pairs::{ReadFile, ReadPair};
use log::info;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;

const CMD: &str = "assemble";

/// Assemble a single pair of FASTQ files
#[derive(Parser, Debug)]
#[clap(name = CMD, version = get_version(), before_help = format!("{CMD} {}", get_version()))]
struct Assemble {
    /// Forward reads (R1)
    #[clap(short = '1', long = "fwd_reads", value_name = "PATH")]
    fwd_reads: CliPath,

    /// Reverse reads (R2)
    #[clap(short = '2', long = "rev_reads", value_name = "PATH")]
    rev_reads: CliPath,

    /// Output directory, which must not exist yet
    #[clap(short = 'o', long = "out_dir", value_name = "PATH", value_parser = parse_path)]
    out_dir: PathBuf,

    /// Memory for the Pilon polishing step, passed as -Xmx<MEM>
    #[clap(short = 'm', long, value_name = "MEM", default_value = DEFAULT_PILON_MEMORY)]
    memory: String,

    /// Delete all intermediate files, keeping only the FASTA assembly
    #[clap(long)]
    cleanup: bool,

    /// Log the external commands without running them
    #[clap(long)]
    dry_run: bool,
}

fn read_file(path: &CliPath) -> Result<ReadFile> {
    ReadFile::new(path).with_context(|| format!("{path} is not a valid read file path"))
}

fn inner_main() -> Result<ExitCode> {
    set_env_columns();
    let args = Assemble::parse();
    init_logging();

    let pair = ReadPair::from_files(read_file(&args.fwd_reads)?, read_file(&args.rev_reads)?)?;
    let sample_id = pair.sample_id().clone();
    info!("Set sample ID to {sample_id}");

    ensure!(
        !args.out_dir.exists(),
        "Output directory {} already exists. Specify a directory that does not yet exist.",
        args.out_dir.display()
    );
    create_dir_all(&args.out_dir).map_err(|source| BatchError::DirectoryCreation {
        path: args.out_dir.clone(),
        source,
    })?;

    let pipeline = ToolchainPipeline::new(&args.memory, CommandRunner::new(args.dry_run));
    pipeline
        .preflight()
        .map_err(|source| BatchError::Preflight { source })?;
    pipeline
        .assemble(&pair, &args.out_dir)
        .map_err(|source| BatchError::Pipeline {
            sample_id: sample_id.clone(),
            source,
        })?;

    let mode = if args.cleanup {
        CleanupMode::Total
    } else {
        CleanupMode::Basic
    };
    FileCleanup::new(mode, args.dry_run)
        .clean(&args.out_dir)
        .map_err(|source| BatchError::Cleanup {
            sample_id,
            path: args.out_dir.clone(),
            source,
        })?;

    info!("Assembly complete! Results available in {}", args.out_dir.display());
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
