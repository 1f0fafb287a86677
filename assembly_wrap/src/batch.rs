//! Assemble every sample found in an input directory.
//!
//! Each sample moves through
//! `Discovered -> Paired -> DirectoryReady -> PipelineComplete -> CleanedUp`,
//! or stops at `Discovered -> PairingFailed` and is skipped. A sample whose
//! identifier is not a plain directory name (`""`, `.` or `..`) is skipped
//! before pairing.

use crate::cleanup::Cleanup;
use crate::errors::BatchError;
use crate::events::{BatchEvent, BatchObserver, LogObserver};
use crate::pipeline::AssemblyPipeline;
use fastq_pairs::{FastqDir, ReadMarkers, SampleId};
use rayon::prelude::*;
use std::fs::{create_dir, create_dir_all};
use std::io::{self, ErrorKind};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// What to do when the pipeline or cleanup fails for a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole batch on the first failure.
    #[default]
    FailFast,
    /// Record the failure, finish the remaining samples, then report every failed sample.
    ContinueOnError,
}

#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Directory containing the read files.
    pub input_dir: PathBuf,
    /// Root of the per-sample output directories. Created if absent.
    pub out_dir: PathBuf,
    pub markers: ReadMarkers,
    pub failure_policy: FailurePolicy,
    /// Number of samples processed at the same time.
    pub jobs: NonZeroUsize,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        BatchConfig {
            input_dir: input_dir.into(),
            out_dir: out_dir.into(),
            markers: ReadMarkers::default(),
            failure_policy: FailurePolicy::default(),
            jobs: NonZeroUsize::MIN,
        }
    }
}

/// Sample identifiers by outcome, each in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: Vec<SampleId>,
    /// Identifiers that cannot name an output directory.
    pub skipped: Vec<SampleId>,
    pub unpaired: Vec<SampleId>,
    pub failed: Vec<SampleId>,
}

enum SampleOutcome {
    Processed,
    Skipped,
    Unpaired,
    Failed,
}

pub struct AssemblyBatch<'a> {
    config: BatchConfig,
    pipeline: &'a dyn AssemblyPipeline,
    cleanup: &'a dyn Cleanup,
    observer: &'a dyn BatchObserver,
}

impl<'a> AssemblyBatch<'a> {
    pub fn new(
        config: BatchConfig,
        pipeline: &'a dyn AssemblyPipeline,
        cleanup: &'a dyn Cleanup,
    ) -> Self {
        AssemblyBatch {
            config,
            pipeline,
            cleanup,
            observer: &LogObserver,
        }
    }

    /// Send batch events to `observer` instead of the log.
    pub fn with_observer(mut self, observer: &'a dyn BatchObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Assemble every sample in the input directory.
    ///
    /// Samples are visited in sorted order. A sample without a complete read pair is
    /// skipped. Any other per-sample failure is handled according to the failure policy.
    pub fn run(&self) -> Result<BatchSummary, BatchError> {
        let fastq_dir = FastqDir::new(&self.config.input_dir)?;
        if fastq_dir.is_empty() {
            return Err(BatchError::NoSamples {
                path: self.config.input_dir.clone(),
            });
        }
        self.observer.notify(&BatchEvent::SamplesDiscovered {
            input_dir: fastq_dir.path(),
            read_files: fastq_dir.read_files().len(),
            samples: fastq_dir.samples().len(),
        });

        self.pipeline
            .preflight()
            .map_err(|source| BatchError::Preflight { source })?;

        let out_dir = create_out_dir(&self.config.out_dir)?;
        let samples: Vec<&SampleId> = fastq_dir.samples().iter().collect();

        let outcomes: Vec<SampleOutcome> = if self.config.jobs.get() == 1 {
            samples
                .iter()
                .map(|sample_id| self.process_sample(&fastq_dir, sample_id, &out_dir))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let jobs = self.config.jobs.get();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|source| BatchError::WorkerPool { jobs, source })?;
            pool.install(|| {
                samples
                    .par_iter()
                    .map(|sample_id| self.process_sample(&fastq_dir, sample_id, &out_dir))
                    .collect::<Result<Vec<_>, _>>()
            })?
        };

        let mut summary = BatchSummary::default();
        for (sample_id, outcome) in samples.into_iter().zip(outcomes) {
            let bucket = match outcome {
                SampleOutcome::Processed => &mut summary.processed,
                SampleOutcome::Skipped => &mut summary.skipped,
                SampleOutcome::Unpaired => &mut summary.unpaired,
                SampleOutcome::Failed => &mut summary.failed,
            };
            bucket.push(sample_id.clone());
        }

        if !summary.failed.is_empty() {
            return Err(BatchError::SamplesFailed {
                failed: summary.failed,
            });
        }
        self.observer.notify(&BatchEvent::BatchComplete {
            out_dir: &out_dir,
            summary: &summary,
        });
        Ok(summary)
    }

    fn process_sample(
        &self,
        fastq_dir: &FastqDir,
        sample_id: &SampleId,
        out_dir: &Path,
    ) -> Result<SampleOutcome, BatchError> {
        if !sample_id.is_dir_name() {
            self.observer.notify(&BatchEvent::InvalidSampleId(sample_id));
            return Ok(SampleOutcome::Skipped);
        }
        let pair = match fastq_dir.read_pair(sample_id, &self.config.markers) {
            Ok(pair) => pair,
            Err(unpaired) => {
                self.observer.notify(&BatchEvent::PairingFailed(&unpaired));
                return Ok(SampleOutcome::Unpaired);
            }
        };
        self.observer.notify(&BatchEvent::Paired(&pair));

        let sample_dir = create_sample_dir(out_dir, sample_id)?;

        self.observer.notify(&BatchEvent::PipelineStarted {
            sample_id,
            out_dir: &sample_dir,
        });
        if let Err(source) = self.pipeline.assemble(&pair, &sample_dir) {
            return self.sample_failed(BatchError::Pipeline {
                sample_id: sample_id.clone(),
                source,
            });
        }
        self.observer.notify(&BatchEvent::PipelineComplete {
            sample_id,
            out_dir: &sample_dir,
        });

        if let Err(source) = self.cleanup.clean(&sample_dir) {
            return self.sample_failed(BatchError::Cleanup {
                sample_id: sample_id.clone(),
                path: sample_dir,
                source,
            });
        }
        self.observer.notify(&BatchEvent::CleanupComplete {
            sample_id,
            out_dir: &sample_dir,
        });

        Ok(SampleOutcome::Processed)
    }

    fn sample_failed(&self, err: BatchError) -> Result<SampleOutcome, BatchError> {
        match self.config.failure_policy {
            FailurePolicy::FailFast => Err(err),
            FailurePolicy::ContinueOnError => {
                if let Some(sample_id) = err.sample_id() {
                    self.observer.notify(&BatchEvent::SampleFailed {
                        sample_id,
                        error: &err,
                    });
                }
                Ok(SampleOutcome::Failed)
            }
        }
    }
}

/// Create the output root (and its parents) if needed and return its absolute path.
fn create_out_dir(out_dir: &Path) -> Result<PathBuf, BatchError> {
    let creation_error = |source| BatchError::DirectoryCreation {
        path: out_dir.to_path_buf(),
        source,
    };
    create_dir_all(out_dir).map_err(creation_error)?;
    out_dir.canonicalize().map_err(creation_error)
}

/// Create `<out_dir>/<sample_id>`. A directory that already exists is reused,
/// so concurrent or repeated calls for the same sample all succeed.
/// The sample identifier must name a single child of `out_dir`.
pub fn create_sample_dir(out_dir: &Path, sample_id: &SampleId) -> Result<PathBuf, BatchError> {
    let path = out_dir.join(sample_id.as_str());
    if !sample_id.is_dir_name() {
        return Err(BatchError::DirectoryCreation {
            path,
            source: io::Error::new(
                ErrorKind::InvalidInput,
                format!("sample ID {:?} is not a directory name", sample_id.as_str()),
            ),
        });
    }
    match create_dir(&path) {
        Ok(()) => Ok(path),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(path),
        Err(source) => Err(BatchError::DirectoryCreation { path, source }),
    }
}
