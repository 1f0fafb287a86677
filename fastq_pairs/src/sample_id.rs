//! Infer sample identifiers from read file names.

use crate::filenames::ReadFile;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Component, Path};

/// Separator between the sample identifier and the rest of a read file name.
pub const SAMPLE_ID_SEPARATOR: char = '_';

/// The identifier grouping the forward and reverse reads of one sample,
/// e.g. `S1` for `S1_R1.fastq.gz` and `S1_R2.fastq.gz`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(String);

impl SampleId {
    /// The prefix of `file_name` up to its first `_`.
    /// A name without any `_` is used in full, extension included.
    pub fn from_file_name(file_name: &str) -> SampleId {
        let prefix = file_name
            .split(SAMPLE_ID_SEPARATOR)
            .next()
            .unwrap_or(file_name);
        SampleId(prefix.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier names exactly one child directory.
    /// `""`, `.` and `..` (from `_R1.fq`, `._S1_R1.fq` or `.._R1.fq`) do not.
    pub fn is_dir_name(&self) -> bool {
        let mut components = Path::new(&self.0).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        SampleId(id.to_string())
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> Self {
        SampleId(id)
    }
}

impl Deref for SampleId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SampleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SampleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SampleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The distinct sample identifiers of `files`, in lexicographic order.
pub fn infer_sample_ids<'a>(files: impl IntoIterator<Item = &'a ReadFile>) -> BTreeSet<SampleId> {
    files
        .into_iter()
        .map(|f| SampleId::from_file_name(f.file_name()))
        .collect()
}
