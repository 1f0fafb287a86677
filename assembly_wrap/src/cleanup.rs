//! Remove intermediate pipeline outputs from a sample directory.

use crate::pipeline::POLISH_DIR;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Removes intermediate files from a sample's output directory once its pipeline finished.
pub trait Cleanup: Sync {
    fn clean(&self, out_dir: &Path) -> Result<()>;
}

/// Substrings of the intermediate file names removed by [`CleanupMode::Basic`].
const INTERMEDIATE_MARKERS: &[&str] = &[".filtered", ".contigs.bam", ".contigs.fa"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CleanupMode {
    /// Remove filtered reads, raw contigs, the unsorted BAM and the Pilon directory.
    #[default]
    Basic,
    /// Keep only files with `.fasta` in their name.
    Total,
}

impl CleanupMode {
    fn removes(self, file_name: &str) -> bool {
        match self {
            CleanupMode::Basic => INTERMEDIATE_MARKERS
                .iter()
                .any(|marker| file_name.contains(marker)),
            CleanupMode::Total => !file_name.contains(".fasta"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FileCleanup {
    pub mode: CleanupMode,
    /// Only log what would be removed.
    pub dry_run: bool,
}

impl FileCleanup {
    pub fn new(mode: CleanupMode, dry_run: bool) -> Self {
        FileCleanup { mode, dry_run }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            info!("Dry run: remove {}", path.display());
            return Ok(());
        }
        debug!("Removing {}", path.display());
        fs::remove_file(path).with_context(|| format!("Unable to remove {}", path.display()))
    }

    fn remove_polish_dir(&self, out_dir: &Path) -> Result<()> {
        let polish_dir = out_dir.join(POLISH_DIR);
        if self.dry_run {
            info!("Dry run: remove {}", polish_dir.display());
            return Ok(());
        }
        match fs::remove_dir_all(&polish_dir) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err)
                .with_context(|| format!("Unable to remove {}", polish_dir.display())),
            _ => Ok(()),
        }
    }
}

impl Cleanup for FileCleanup {
    fn clean(&self, out_dir: &Path) -> Result<()> {
        let entries = fs::read_dir(out_dir)
            .with_context(|| format!("Unable to list {}", out_dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Unable to list {}", out_dir.display()))?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !self.mode.removes(file_name) {
                continue;
            }
            match (self.mode, self.remove_file(&path)) {
                (_, Ok(())) => {}
                (CleanupMode::Total, Err(err)) => warn!("{err:#}"),
                (CleanupMode::Basic, Err(err)) => return Err(err),
            }
        }
        self.remove_polish_dir(out_dir)
    }
}
