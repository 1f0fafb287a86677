//! The external assembly toolchain.
//!
//! Reads are re-paired, adapter trimmed, quality filtered and error corrected with
//! BBTools, assembled with SKESA, mapped back to the contigs with BBMap and the
//! assembly polished with Pilon. Every step runs inside the sample's output directory.

use crate::CommandRunner;
use anyhow::{ensure, Context, Result};
use fastq_pairs::{ReadPair, SampleId};
use log::info;
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Executables the toolchain pipeline runs.
pub const TOOLCHAIN: &[&str] = &[
    "repair.sh",
    "bbduk.sh",
    "tadpole.sh",
    "skesa",
    "bbmap.sh",
    "samtools",
    "pilon",
];

/// Default JVM heap size for Pilon.
pub const DEFAULT_PILON_MEMORY: &str = "8g";

/// Subdirectory of a sample's output directory that Pilon writes into.
pub const POLISH_DIR: &str = "pilon";

const FASTQ_EXTENSIONS: &[&str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];

/// Turns a read pair into an assembly inside a directory.
pub trait AssemblyPipeline: Sync {
    /// Assemble `pair`, writing every output into `out_dir`, which already exists.
    fn assemble(&self, pair: &ReadPair, out_dir: &Path) -> Result<()>;

    /// Checks run once before any sample is processed.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }
}

/// Search `PATH` for an executable file named `program`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

/// Fail unless every program of the toolchain is on `PATH`.
pub fn check_toolchain() -> Result<()> {
    let missing: Vec<_> = TOOLCHAIN
        .iter()
        .copied()
        .filter(|program| find_on_path(program).is_none())
        .collect();
    ensure!(
        missing.is_empty(),
        "Required programs not found on PATH: {}",
        missing.join(", ")
    );
    Ok(())
}

/// Insert `.<tag>` into a read file name ahead of its FASTQ extension.
///
/// `S1_R1.fastq.gz` tagged `cleaned` becomes `S1_R1.cleaned.fastq.gz`. A name
/// without a recognised FASTQ extension gets the tag before its last extension.
pub fn tagged_file_name(file_name: &str, tag: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    let split = FASTQ_EXTENSIONS
        .iter()
        .find(|ext| lower.len() > ext.len() && lower.ends_with(*ext))
        .map(|ext| file_name.len() - ext.len())
        .or_else(|| file_name.rfind('.').filter(|&i| i > 0))
        .unwrap_or(file_name.len());
    let (stem, ext) = file_name.split_at(split);
    format!("{stem}.{tag}{ext}")
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Not a valid read file name: {}", path.display()))
}

/// The forward and reverse reads between two steps.
struct Reads {
    forward: PathBuf,
    reverse: PathBuf,
}

impl Reads {
    /// Output paths in `out_dir` for this pair, tagged with `tag`.
    fn tagged(&self, out_dir: &Path, tag: &str) -> Result<Reads> {
        Ok(Reads {
            forward: out_dir.join(tagged_file_name(file_name(&self.forward)?, tag)),
            reverse: out_dir.join(tagged_file_name(file_name(&self.reverse)?, tag)),
        })
    }

    fn exist(&self) -> bool {
        self.forward.exists() && self.reverse.exists()
    }
}

/// Runs the BBTools/SKESA/Pilon toolchain through a [`CommandRunner`].
#[derive(Clone, Debug)]
pub struct ToolchainPipeline {
    memory: String,
    runner: CommandRunner,
}

impl Default for ToolchainPipeline {
    fn default() -> Self {
        ToolchainPipeline::new(DEFAULT_PILON_MEMORY, CommandRunner::default())
    }
}

impl ToolchainPipeline {
    /// `memory` is passed to Pilon as `-Xmx<memory>`.
    pub fn new(memory: impl Into<String>, runner: CommandRunner) -> Self {
        ToolchainPipeline {
            memory: memory.into(),
            runner,
        }
    }

    fn command(&self, program: &str, out_dir: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(out_dir);
        cmd
    }

    fn repair(&self, sample_id: &SampleId, pair: &ReadPair, out_dir: &Path) -> Result<Reads> {
        let reads = Reads {
            forward: out_dir.join(pair.forward().file_name()),
            reverse: out_dir.join(pair.reverse().file_name()),
        };
        let mut cmd = self.command("repair.sh", out_dir);
        cmd.arg(format!("in={}", pair.forward().path().display()))
            .arg(format!("in2={}", pair.reverse().path().display()))
            .arg(format!("out={}", reads.forward.display()))
            .arg(format!("out2={}", reads.reverse.display()))
            .arg("overwrite=t");
        self.runner.run(sample_id, &mut cmd)?;
        Ok(reads)
    }

    fn trim_adapters(
        &self,
        sample_id: &SampleId,
        reads: &Reads,
        out_dir: &Path,
    ) -> Result<Reads> {
        let cleaned = reads.tagged(out_dir, "cleaned")?;
        let stats = out_dir.join("adapter_trimming_stats.txt");
        let mut cmd = self.command("bbduk.sh", out_dir);
        cmd.arg(format!("in1={}", reads.forward.display()))
            .arg(format!("in2={}", reads.reverse.display()))
            .arg(format!("out1={}", cleaned.forward.display()))
            .arg(format!("out2={}", cleaned.reverse.display()))
            .args(["ref=adapters", "tpe", "tbo", "overwrite=t", "unbgzip=f"])
            .args(["ktrim=r", "k=23", "mink=11", "hdist=1"])
            .arg(format!("stats={}", stats.display()));
        self.runner.run(sample_id, &mut cmd)?;
        Ok(cleaned)
    }

    fn quality_filter(
        &self,
        sample_id: &SampleId,
        reads: &Reads,
        out_dir: &Path,
    ) -> Result<Reads> {
        let filtered = reads.tagged(out_dir, "filtered")?;
        let mut cmd = self.command("bbduk.sh", out_dir);
        cmd.arg(format!("in1={}", reads.forward.display()))
            .arg(format!("in2={}", reads.reverse.display()))
            .arg(format!("out1={}", filtered.forward.display()))
            .arg(format!("out2={}", filtered.reverse.display()))
            .args(["unbgzip=f", "qtrim=rl", "trimq=10"]);
        if !self.runner.dry_run() {
            let stats = out_dir.join("quality_filtering_stats.txt");
            let stats_file = File::create(&stats)
                .with_context(|| format!("Unable to create {}", stats.display()))?;
            cmd.stderr(Stdio::from(stats_file));
        }
        self.runner.run(sample_id, &mut cmd)?;
        Ok(filtered)
    }

    /// Error correct the filtered reads. Output names follow the adapter trimmed reads.
    fn correct(
        &self,
        sample_id: &SampleId,
        reads: &Reads,
        cleaned: &Reads,
        out_dir: &Path,
    ) -> Result<Reads> {
        let corrected = cleaned.tagged(out_dir, "corrected")?;
        if corrected.exist() {
            log_skip(sample_id, &corrected.forward);
            return Ok(corrected);
        }
        let mut cmd = self.command("tadpole.sh", out_dir);
        cmd.arg(format!("in1={}", reads.forward.display()))
            .arg(format!("in2={}", reads.reverse.display()))
            .arg(format!("out1={}", corrected.forward.display()))
            .arg(format!("out2={}", corrected.reverse.display()))
            .arg("mode=correct");
        self.runner.run(sample_id, &mut cmd)?;
        Ok(corrected)
    }

    fn assemble_contigs(
        &self,
        sample_id: &SampleId,
        reads: &Reads,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let contigs = out_dir.join(format!("{sample_id}.contigs.fa"));
        if contigs.exists() {
            log_skip(sample_id, &contigs);
            return Ok(contigs);
        }
        let mut cmd = self.command("skesa", out_dir);
        cmd.arg("--use_paired_ends")
            .arg("--fastq")
            .arg(format!(
                "{},{}",
                reads.forward.display(),
                reads.reverse.display()
            ))
            .arg("--contigs_out")
            .arg(&contigs);
        self.runner.run(sample_id, &mut cmd)?;
        Ok(contigs)
    }

    /// Map the reads back to the contigs; returns the sorted, indexed BAM.
    fn map_reads(
        &self,
        sample_id: &SampleId,
        reads: &Reads,
        contigs: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let bam = out_dir.join(format!("{sample_id}.contigs.bam"));
        let sorted_bam = out_dir.join(format!("{sample_id}.contigs_sorted.bam"));
        if bam.exists() {
            log_skip(sample_id, &bam);
            return Ok(sorted_bam);
        }

        let mut cmd = self.command("bbmap.sh", out_dir);
        cmd.arg(format!("in1={}", reads.forward.display()))
            .arg(format!("in2={}", reads.reverse.display()))
            .arg(format!("ref={}", contigs.display()))
            .arg(format!("out={}", bam.display()))
            .args(["overwrite=t", "deterministic=t", "bamscript=bs.sh"]);
        self.runner.run(sample_id, &mut cmd)?;
        self.runner
            .run(sample_id, self.command("sh", out_dir).arg("bs.sh"))?;
        self.runner.run(
            sample_id,
            self.command("samtools", out_dir)
                .arg("index")
                .arg(&sorted_bam),
        )?;
        Ok(sorted_bam)
    }

    /// Polish the contigs with Pilon and move the result to `<sample>.pilon.fasta`.
    fn polish(
        &self,
        sample_id: &SampleId,
        contigs: &Path,
        bam: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let polish_dir = out_dir.join(POLISH_DIR);
        let polished = polish_dir.join(format!("{sample_id}.fasta"));
        let assembly = out_dir.join(format!("{sample_id}.pilon.fasta"));

        let mut cmd = self.command("pilon", out_dir);
        cmd.arg(format!("-Xmx{}", self.memory))
            .arg("--genome")
            .arg(contigs)
            .arg("--bam")
            .arg(bam)
            .arg("--outdir")
            .arg(&polish_dir)
            .arg("--output")
            .arg(sample_id.as_str());
        if self.runner.dry_run() {
            self.runner.run(sample_id, &mut cmd)?;
            return Ok(assembly);
        }

        fs::create_dir_all(&polish_dir)
            .with_context(|| format!("Unable to create {}", polish_dir.display()))?;
        self.runner.run(sample_id, &mut cmd)?;
        fs::rename(&polished, &assembly).with_context(|| {
            format!(
                "Unable to move {} to {}",
                polished.display(),
                assembly.display()
            )
        })?;
        Ok(assembly)
    }
}

fn log_skip(sample_id: &SampleId, existing: &Path) {
    info!("[{sample_id}] {} exists, skipping step", existing.display());
}

impl AssemblyPipeline for ToolchainPipeline {
    fn assemble(&self, pair: &ReadPair, out_dir: &Path) -> Result<()> {
        let sample_id = pair.sample_id();
        let repaired = self.repair(sample_id, pair, out_dir)?;
        let cleaned = self.trim_adapters(sample_id, &repaired, out_dir)?;
        let filtered = self.quality_filter(sample_id, &cleaned, out_dir)?;
        let corrected = self.correct(sample_id, &filtered, &cleaned, out_dir)?;
        let contigs = self.assemble_contigs(sample_id, &corrected, out_dir)?;
        let bam = self.map_reads(sample_id, &corrected, &contigs, out_dir)?;
        let assembly = self.polish(sample_id, &contigs, &bam, out_dir)?;
        info!("[{sample_id}] Assembly written to {}", assembly.display());
        Ok(())
    }

    /// The toolchain must be installed unless commands are only logged.
    fn preflight(&self) -> Result<()> {
        if self.runner.dry_run() {
            return Ok(());
        }
        check_toolchain()
    }
}
