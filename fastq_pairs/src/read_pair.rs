//! Resolve the forward and reverse read files of a sample by filename markers.

use crate::filenames::ReadFile;
use crate::sample_id::SampleId;
use std::fmt::{Display, Formatter};

pub const DEFAULT_FORWARD_MARKER: &str = "_R1";
pub const DEFAULT_REVERSE_MARKER: &str = "_R2";

/// Substrings identifying forward and reverse read files, e.g. `_R1` and `_R2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadMarkers {
    pub forward: String,
    pub reverse: String,
}

impl ReadMarkers {
    pub fn new(forward: impl Into<String>, reverse: impl Into<String>) -> Self {
        ReadMarkers {
            forward: forward.into(),
            reverse: reverse.into(),
        }
    }
}

impl Default for ReadMarkers {
    fn default() -> Self {
        ReadMarkers::new(DEFAULT_FORWARD_MARKER, DEFAULT_REVERSE_MARKER)
    }
}

/// The forward and reverse read files of one sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadPair {
    sample_id: SampleId,
    forward: ReadFile,
    reverse: ReadFile,
}

/// The two files given to `ReadPair::from_files` belong to different samples.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "Forward reads {forward} (sample {forward_id}) and reverse reads {reverse} \
     (sample {reverse_id}) do not belong to the same sample"
)]
pub struct SampleIdMismatch {
    pub forward: ReadFile,
    pub forward_id: SampleId,
    pub reverse: ReadFile,
    pub reverse_id: SampleId,
}

impl ReadPair {
    /// Pair two explicitly chosen files. Both names must yield the same sample identifier.
    pub fn from_files(forward: ReadFile, reverse: ReadFile) -> Result<ReadPair, SampleIdMismatch> {
        let forward_id = SampleId::from_file_name(forward.file_name());
        let reverse_id = SampleId::from_file_name(reverse.file_name());
        if forward_id != reverse_id {
            return Err(SampleIdMismatch {
                forward,
                forward_id,
                reverse,
                reverse_id,
            });
        }
        Ok(ReadPair {
            sample_id: forward_id,
            forward,
            reverse,
        })
    }

    pub fn sample_id(&self) -> &SampleId {
        &self.sample_id
    }

    pub fn forward(&self) -> &ReadFile {
        &self.forward
    }

    pub fn reverse(&self) -> &ReadFile {
        &self.reverse
    }
}

/// A sample for which the forward or reverse read file (or both) could not be found.
/// This is not fatal: the sample is skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpairedSample {
    pub sample_id: SampleId,
    pub forward: Option<ReadFile>,
    pub reverse: Option<ReadFile>,
}

impl Display for UnpairedSample {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not pair {}", self.sample_id)?;
        match (&self.forward, &self.reverse) {
            (Some(fwd), None) => write!(f, ": found forward reads {fwd} but no reverse reads"),
            (None, Some(rev)) => write!(f, ": found reverse reads {rev} but no forward reads"),
            _ => write!(f, ": found neither forward nor reverse reads"),
        }
    }
}

impl std::error::Error for UnpairedSample {}

/// Find the read pair of `sample_id` among `files`.
///
/// A file is a candidate when its name contains the sample identifier. A candidate
/// containing the forward marker fills the forward slot; otherwise, one containing the
/// reverse marker fills the reverse slot. A single file never fills both slots.
///
/// When several files qualify for the same slot the **last one wins**: every file is
/// visited and each match overwrites the previous one. With the sorted output of
/// `scan_read_files` this selects the lexicographically greatest path.
pub fn find_read_pair<'a>(
    sample_id: &SampleId,
    files: impl IntoIterator<Item = &'a ReadFile>,
    markers: &ReadMarkers,
) -> Result<ReadPair, UnpairedSample> {
    let mut forward = None;
    let mut reverse = None;

    for file in files {
        let name = file.file_name();
        if !name.contains(sample_id.as_str()) {
            continue;
        }
        if name.contains(markers.forward.as_str()) {
            forward = Some(file);
        } else if name.contains(markers.reverse.as_str()) {
            reverse = Some(file);
        }
    }

    match (forward, reverse) {
        (Some(forward), Some(reverse)) => Ok(ReadPair {
            sample_id: sample_id.clone(),
            forward: forward.clone(),
            reverse: reverse.clone(),
        }),
        (forward, reverse) => Err(UnpairedSample {
            sample_id: sample_id.clone(),
            forward: forward.cloned(),
            reverse: reverse.cloned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_id::infer_sample_ids;
    use pretty_assertions::assert_eq;

    fn read_files(names: &[&str]) -> Vec<ReadFile> {
        let mut files: Vec<_> = names
            .iter()
            .map(|name| ReadFile::new(format!("/reads/{name}")).unwrap())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_every_sample_pairs() {
        let mut names = Vec::new();
        for id in ["2021-LMC-001", "2021-LMC-002", "2021-LMC-003"] {
            names.push(format!("{id}_S1_L001_R1_001.fastq.gz"));
            names.push(format!("{id}_S1_L001_R2_001.fastq.gz"));
        }
        let names: Vec<_> = names.iter().map(String::as_str).collect();
        let files = read_files(&names);
        let markers = ReadMarkers::default();

        let ids = infer_sample_ids(&files);
        assert_eq!(ids.len(), 3);
        for id in &ids {
            let pair = find_read_pair(id, &files, &markers).unwrap();
            assert_eq!(pair.sample_id(), id);
            assert!(pair.forward().file_name().starts_with(id.as_str()));
            assert!(pair.forward().file_name().contains("_R1"));
            assert!(pair.reverse().file_name().starts_with(id.as_str()));
            assert!(pair.reverse().file_name().contains("_R2"));
        }
    }

    #[test]
    fn test_forward_only() {
        let files = read_files(&["S2_R1.fastq.gz"]);
        let err = find_read_pair(&"S2".into(), &files, &ReadMarkers::default()).unwrap_err();
        assert_eq!(err.sample_id.as_str(), "S2");
        assert_eq!(err.forward.unwrap().file_name(), "S2_R1.fastq.gz");
        assert_eq!(err.reverse, None);
    }

    #[test]
    fn test_reverse_only() {
        let files = read_files(&["S2_R2.fastq.gz"]);
        let err = find_read_pair(&"S2".into(), &files, &ReadMarkers::default()).unwrap_err();
        assert_eq!(err.forward, None);
        assert_eq!(err.reverse.unwrap().file_name(), "S2_R2.fastq.gz");
        assert_eq!(
            UnpairedSample {
                sample_id: "S2".into(),
                forward: None,
                reverse: None
            }
            .to_string(),
            "Could not pair S2: found neither forward nor reverse reads"
        );
    }

    #[test]
    fn test_last_match_wins() {
        let files = read_files(&[
            "S1_L001_R1.fastq.gz",
            "S1_L001_R2.fastq.gz",
            "S1_L002_R1.fastq.gz",
            "S1_L002_R2.fastq.gz",
        ]);
        let pair = find_read_pair(&"S1".into(), &files, &ReadMarkers::default()).unwrap();
        assert_eq!(pair.forward().file_name(), "S1_L002_R1.fastq.gz");
        assert_eq!(pair.reverse().file_name(), "S1_L002_R2.fastq.gz");

        // Iteration order decides, not file name order.
        let reversed: Vec<_> = files.iter().rev().collect();
        let pair = find_read_pair(&"S1".into(), reversed, &ReadMarkers::default()).unwrap();
        assert_eq!(pair.forward().file_name(), "S1_L001_R1.fastq.gz");
        assert_eq!(pair.reverse().file_name(), "S1_L001_R2.fastq.gz");
    }

    #[test]
    fn test_forward_marker_takes_precedence() {
        let files = read_files(&["S1_R1_R2.fastq"]);
        let err = find_read_pair(&"S1".into(), &files, &ReadMarkers::default()).unwrap_err();
        assert_eq!(err.forward.unwrap().file_name(), "S1_R1_R2.fastq");
        assert_eq!(err.reverse, None);
    }

    #[test]
    fn test_markers_select_files() {
        let files = read_files(&["SampleA_R1.fq", "SampleA_R2.fq"]);
        let ids = infer_sample_ids(&files);
        let id = ids.iter().next().unwrap();
        assert_eq!(id.as_str(), "SampleA");

        assert!(find_read_pair(id, &files, &ReadMarkers::new("_R1", "_R2")).is_ok());
        assert!(find_read_pair(id, &files, &ReadMarkers::new("_FWD", "_REV")).is_err());

        // Swapping the markers swaps the roles of the files.
        let pair = find_read_pair(id, &files, &ReadMarkers::new("_R2", "_R1")).unwrap();
        assert_eq!(pair.forward().file_name(), "SampleA_R2.fq");
        assert_eq!(pair.reverse().file_name(), "SampleA_R1.fq");
    }

    #[test]
    fn test_sample_id_is_matched_as_substring() {
        // `S1` is a substring of `S10`, so the S10 files qualify for S1 as well.
        let files = read_files(&["S10_R1.fq", "S10_R2.fq"]);
        let pair = find_read_pair(&"S1".into(), &files, &ReadMarkers::default()).unwrap();
        assert_eq!(pair.forward().file_name(), "S10_R1.fq");

        // With its own files present, `S1_...` sorts after `S10_...` and wins.
        let files = read_files(&["S10_R1.fq", "S10_R2.fq", "S1_R1.fq", "S1_R2.fq"]);
        let pair = find_read_pair(&"S1".into(), &files, &ReadMarkers::default()).unwrap();
        assert_eq!(pair.forward().file_name(), "S1_R1.fq");
        assert_eq!(pair.reverse().file_name(), "S1_R2.fq");
    }

    #[test]
    fn test_from_files() {
        let fwd = ReadFile::new("/reads/S1_R1.fq").unwrap();
        let rev = ReadFile::new("/reads/S1_R2.fq").unwrap();
        let pair = ReadPair::from_files(fwd, rev).unwrap();
        assert_eq!(pair.sample_id().as_str(), "S1");

        let fwd = ReadFile::new("/reads/S1_R1.fq").unwrap();
        let rev = ReadFile::new("/reads/S2_R2.fq").unwrap();
        let err = ReadPair::from_files(fwd, rev).unwrap_err();
        assert_eq!(err.forward_id.as_str(), "S1");
        assert_eq!(err.reverse_id.as_str(), "S2");
    }
}
