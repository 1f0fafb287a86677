use fastq_pairs::filenames::READ_FILE_PATTERN;
use fastq_pairs::{DiscoveryError, SampleId};
use itertools::Itertools;
use std::path::PathBuf;

/// Exit code for any failure without a more specific code.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code when the input directory is missing or unreadable.
pub const EXIT_INVALID_INPUT: u8 = 3;
/// Exit code when the input directory contains no read files.
pub const EXIT_NO_SAMPLES: u8 = 4;
/// Exit code when a sample could not be assembled or cleaned up.
pub const EXIT_PIPELINE_FAILURE: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("No read files matching {READ_FILE_PATTERN} were found in {path:?}")]
    NoSamples { path: PathBuf },

    #[error("Unable to create output directory {path:?}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Preflight check failed")]
    Preflight { source: anyhow::Error },

    #[error("Assembly pipeline failed for sample {sample_id}")]
    Pipeline {
        sample_id: SampleId,
        source: anyhow::Error,
    },

    #[error("Cleanup of {path:?} failed for sample {sample_id}")]
    Cleanup {
        sample_id: SampleId,
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("{} sample(s) could not be assembled: {}", .failed.len(), .failed.iter().join(", "))]
    SamplesFailed { failed: Vec<SampleId> },

    #[error("Unable to start a pool of {jobs} worker threads")]
    WorkerPool {
        jobs: usize,
        source: rayon::ThreadPoolBuildError,
    },
}

impl BatchError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BatchError::Discovery(_) => EXIT_INVALID_INPUT,
            BatchError::NoSamples { .. } => EXIT_NO_SAMPLES,
            BatchError::Pipeline { .. }
            | BatchError::Cleanup { .. }
            | BatchError::SamplesFailed { .. } => EXIT_PIPELINE_FAILURE,
            BatchError::DirectoryCreation { .. }
            | BatchError::Preflight { .. }
            | BatchError::WorkerPool { .. } => EXIT_FAILURE,
        }
    }

    /// The sample this error belongs to, if it is specific to one sample.
    pub fn sample_id(&self) -> Option<&SampleId> {
        match self {
            BatchError::Pipeline { sample_id, .. } | BatchError::Cleanup { sample_id, .. } => {
                Some(sample_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exit_codes_are_distinct() {
        let invalid = BatchError::Discovery(DiscoveryError::NotFound {
            path: "/no/such/dir".into(),
        });
        let empty = BatchError::NoSamples {
            path: "/reads".into(),
        };
        let pipeline = BatchError::Pipeline {
            sample_id: "S1".into(),
            source: anyhow::anyhow!("skesa exited with exit status: 1"),
        };
        assert_eq!(invalid.exit_code(), EXIT_INVALID_INPUT);
        assert_eq!(empty.exit_code(), EXIT_NO_SAMPLES);
        assert_eq!(pipeline.exit_code(), EXIT_PIPELINE_FAILURE);
        assert_eq!(pipeline.sample_id().map(SampleId::as_str), Some("S1"));
        assert_eq!(invalid.sample_id(), None);
    }

    #[test]
    fn test_samples_failed_message() {
        let err = BatchError::SamplesFailed {
            failed: vec!["S1".into(), "S3".into()],
        };
        assert_eq!(err.to_string(), "2 sample(s) could not be assembled: S1, S3");
    }
}
