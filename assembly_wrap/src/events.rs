//! Progress events emitted while a batch runs.

use crate::batch::BatchSummary;
use crate::errors::BatchError;
use fastq_pairs::{ReadPair, SampleId, UnpairedSample};
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::error::Error;
use std::path::Path;

#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// The input directory was scanned.
    SamplesDiscovered {
        input_dir: &'a Path,
        read_files: usize,
        samples: usize,
    },
    /// The sample identifier cannot name an output directory; the sample is skipped.
    InvalidSampleId(&'a SampleId),
    /// No complete read pair exists for a sample; it is skipped.
    PairingFailed(&'a UnpairedSample),
    Paired(&'a ReadPair),
    PipelineStarted {
        sample_id: &'a SampleId,
        out_dir: &'a Path,
    },
    PipelineComplete {
        sample_id: &'a SampleId,
        out_dir: &'a Path,
    },
    CleanupComplete {
        sample_id: &'a SampleId,
        out_dir: &'a Path,
    },
    /// A sample failed and the batch continues with the next one.
    SampleFailed {
        sample_id: &'a SampleId,
        error: &'a BatchError,
    },
    BatchComplete {
        out_dir: &'a Path,
        summary: &'a BatchSummary,
    },
}

impl BatchEvent<'_> {
    pub fn sample_id(&self) -> Option<&SampleId> {
        match self {
            BatchEvent::InvalidSampleId(sample_id) => Some(*sample_id),
            BatchEvent::PairingFailed(unpaired) => Some(&unpaired.sample_id),
            BatchEvent::Paired(pair) => Some(pair.sample_id()),
            BatchEvent::PipelineStarted { sample_id, .. }
            | BatchEvent::PipelineComplete { sample_id, .. }
            | BatchEvent::CleanupComplete { sample_id, .. }
            | BatchEvent::SampleFailed { sample_id, .. } => Some(*sample_id),
            BatchEvent::SamplesDiscovered { .. } | BatchEvent::BatchComplete { .. } => None,
        }
    }
}

/// Receives batch events. Notified from worker threads when samples run concurrently.
pub trait BatchObserver: Sync {
    fn notify(&self, event: &BatchEvent<'_>);
}

/// Forward batch events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn notify(&self, event: &BatchEvent<'_>) {
        match event {
            BatchEvent::SamplesDiscovered {
                input_dir,
                read_files,
                samples,
            } => {
                info!("Found {read_files} FASTQ files in {}", input_dir.display());
                info!("Found {samples} unique sample IDs");
            }
            BatchEvent::InvalidSampleId(sample_id) => {
                warn!("Sample ID {:?} is not a valid directory name, skipping", sample_id.as_str());
            }
            BatchEvent::PairingFailed(unpaired) => {
                warn!("[{}] {unpaired}, skipping", unpaired.sample_id);
            }
            BatchEvent::Paired(pair) => debug!(
                "[{}] Forward reads: {}, reverse reads: {}",
                pair.sample_id(),
                pair.forward(),
                pair.reverse()
            ),
            BatchEvent::PipelineStarted { sample_id, out_dir } => {
                info!("[{sample_id}] Assembling into {}", out_dir.display());
            }
            BatchEvent::PipelineComplete { sample_id, .. } => {
                info!("[{sample_id}] Assembly complete");
            }
            BatchEvent::CleanupComplete { sample_id, out_dir } => {
                debug!("[{sample_id}] Cleaned up {}", out_dir.display());
            }
            BatchEvent::SampleFailed { sample_id, error } => {
                error!("[{sample_id}] {}", error_chain(*error));
            }
            BatchEvent::BatchComplete { out_dir, summary } => {
                if !summary.skipped.is_empty() {
                    warn!(
                        "Skipped {} sample(s) with invalid IDs: {:?}",
                        summary.skipped.len(),
                        summary.skipped.iter().map(SampleId::as_str).collect::<Vec<_>>()
                    );
                }
                if !summary.unpaired.is_empty() {
                    warn!(
                        "Skipped {} unpaired sample(s): {}",
                        summary.unpaired.len(),
                        summary.unpaired.iter().join(", ")
                    );
                }
                info!("Pipeline complete! Results available in {}", out_dir.display());
            }
        }
    }
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |err| (*err).source()).join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_chain() {
        let err = BatchError::Pipeline {
            sample_id: "S1".into(),
            source: anyhow::anyhow!("skesa exited with exit status: 1"),
        };
        assert_eq!(
            error_chain(&err),
            "Assembly pipeline failed for sample S1: skesa exited with exit status: 1"
        );
    }

    #[test]
    fn test_event_sample_id() {
        let sample_id: SampleId = "S1".into();
        let event = BatchEvent::PipelineStarted {
            sample_id: &sample_id,
            out_dir: Path::new("/out/S1"),
        };
        assert_eq!(event.sample_id(), Some(&sample_id));
        assert_eq!(
            BatchEvent::InvalidSampleId(&sample_id).sample_id(),
            Some(&sample_id)
        );

        let summary = BatchSummary::default();
        let event = BatchEvent::BatchComplete {
            out_dir: Path::new("/out"),
            summary: &summary,
        };
        assert_eq!(event.sample_id(), None);
    }
}
