//! Scan a directory for read files by filename pattern.

use glob::{MatchOptions, Pattern};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::{debug, warn};
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filename pattern of a read file: `.fastq`, `.fq`, `.fastq.gz`, `.fq.gz` and friends.
pub const READ_FILE_PATTERN: &str = "*.f*q*";

const READ_FILE_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

lazy_static! {
    static ref READ_FILE_GLOB: Pattern = Pattern::new(READ_FILE_PATTERN).unwrap();
}

/// Failure to list the input directory. Nothing has been processed when this occurs.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Input directory {path:?} does not exist")]
    NotFound { path: PathBuf },

    #[error("Input path {path:?} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Unable to read input directory {path:?}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A sequencing read file found on disk.
/// The path is absolute when the file was found by `scan_read_files`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadFile {
    path: PathBuf,
    file_name: String,
}

impl ReadFile {
    /// Returns `None` if `path` has no file name or the name is not valid UTF-8.
    pub fn new(path: impl AsRef<Path>) -> Option<ReadFile> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(ReadFile {
            path: path.to_path_buf(),
            file_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl AsRef<Path> for ReadFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Display for ReadFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.path.display(), f)
    }
}

/// Is `file_name` the name of a read file?
pub fn is_read_file_name(file_name: &str) -> bool {
    READ_FILE_GLOB.matches_with(file_name, READ_FILE_MATCH_OPTIONS)
}

/// Find the read files directly inside `dir`. Subdirectories are not searched.
///
/// The directory is canonicalized first, so every returned path is absolute.
/// The result is sorted by path and contains no duplicates.
pub fn scan_read_files(dir: impl AsRef<Path>) -> Result<Vec<ReadFile>, DiscoveryError> {
    let requested = dir.as_ref();
    let unreadable = |source: std::io::Error| DiscoveryError::Unreadable {
        path: requested.to_path_buf(),
        source,
    };

    let dir = match requested.canonicalize() {
        Ok(dir) => dir,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(DiscoveryError::NotFound {
                path: requested.to_path_buf(),
            })
        }
        Err(err) => return Err(unreadable(err)),
    };
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory { path: dir });
    }

    let entries: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(unreadable)?
        .map_ok(|entry| entry.path())
        .try_collect()
        .map_err(unreadable)?;

    let mut files = Vec::new();
    for path in entries {
        let Some(name) = path.file_name() else {
            continue;
        };
        if !is_read_file_name(&name.to_string_lossy()) {
            continue;
        }
        if !path.is_file() {
            debug!("Skipping {}: not a regular file", path.display());
            continue;
        }
        match ReadFile::new(&path) {
            Some(read_file) => files.push(read_file),
            None => warn!("Skipping {}: file name is not valid UTF-8", path.display()),
        }
    }

    Ok(files.into_iter().sorted().dedup().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir, File};
    use tempfile::tempdir;

    fn names(files: &[ReadFile]) -> Vec<&str> {
        files.iter().map(ReadFile::file_name).collect()
    }

    #[test]
    fn test_read_file_names() {
        for name in [
            "S1_R1.fastq.gz",
            "S1_R2.fastq",
            "S1_R1.fq",
            "S1_R1.fq.gz",
            "S1_R1.FASTQ.GZ",
            "S1_R1_001.fastq.bz2",
            ".hidden_R1.fq",
        ] {
            assert!(is_read_file_name(name), "{name} should be a read file");
        }
        for name in ["S1_R1.fasta", "S1_R1.txt", "fastq", "S1_R1.bam", "S1.fa.gz"] {
            assert!(!is_read_file_name(name), "{name} should not be a read file");
        }
    }

    #[test]
    fn test_scan_filters_by_pattern() -> anyhow::Result<()> {
        let dir = tempdir()?;
        for name in ["S2_R1.fq", "S1_R2.fastq.gz", "S1_R1.fastq.gz", "notes.txt"] {
            File::create(dir.path().join(name))?;
        }
        create_dir(dir.path().join("nested.fastq"))?;
        File::create(dir.path().join("nested.fastq").join("S3_R1.fastq"))?;

        let files = scan_read_files(dir.path())?;
        assert_eq!(
            names(&files),
            vec!["S1_R1.fastq.gz", "S1_R2.fastq.gz", "S2_R1.fq"]
        );
        assert!(files.iter().all(|f| f.path().is_absolute()));
        Ok(())
    }

    #[test]
    fn test_scan_empty_dir() -> anyhow::Result<()> {
        let dir = tempdir()?;
        assert!(scan_read_files(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_missing_dir() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");
        match scan_read_files(&missing) {
            Err(DiscoveryError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_scan_file_instead_of_dir() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("S1_R1.fastq");
        File::create(&file)?;
        assert!(matches!(
            scan_read_files(&file),
            Err(DiscoveryError::NotADirectory { .. })
        ));
        Ok(())
    }
}
