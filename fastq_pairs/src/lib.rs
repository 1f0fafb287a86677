//! Tools for finding paired-end FASTQ files in a directory.
//! Major functionality includes:
//! * Scan a directory for read files by name pattern
//! * Infer sample identifiers from read file names
//! * Resolve the forward/reverse read pair of a sample using filename markers

pub mod fastq_dir;
pub mod filenames;
pub mod read_pair;
pub mod sample_id;

pub use fastq_dir::FastqDir;
pub use filenames::{scan_read_files, DiscoveryError, ReadFile};
pub use read_pair::{find_read_pair, ReadMarkers, ReadPair, UnpairedSample};
pub use sample_id::{infer_sample_ids, SampleId};
