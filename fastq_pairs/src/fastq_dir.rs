//! Scan a directory of FASTQ files & provide access to the samples and read pairs in it.

use crate::filenames::{scan_read_files, DiscoveryError, ReadFile};
use crate::read_pair::{find_read_pair, ReadMarkers, ReadPair, UnpairedSample};
use crate::sample_id::{infer_sample_ids, SampleId};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct FastqDir {
    fastq_path: PathBuf,
    read_files: Vec<ReadFile>,
    samples: BTreeSet<SampleId>,
}

impl FastqDir {
    /// Scan `fastq_path`. An empty directory is not an error here;
    /// the caller chooses what to do if no read files were found.
    pub fn new(fastq_path: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let fastq_path = fastq_path.as_ref();
        let read_files = scan_read_files(fastq_path)?;
        let samples = infer_sample_ids(&read_files);
        Ok(FastqDir {
            fastq_path: fastq_path.to_path_buf(),
            read_files,
            samples,
        })
    }

    pub fn path(&self) -> &Path {
        &self.fastq_path
    }

    pub fn is_empty(&self) -> bool {
        self.read_files.is_empty()
    }

    pub fn read_files(&self) -> &[ReadFile] {
        &self.read_files
    }

    /// Distinct sample identifiers, sorted.
    pub fn samples(&self) -> &BTreeSet<SampleId> {
        &self.samples
    }

    pub fn read_pair(
        &self,
        sample_id: &SampleId,
        markers: &ReadMarkers,
    ) -> Result<ReadPair, UnpairedSample> {
        find_read_pair(sample_id, &self.read_files, markers)
    }
}
