//! Origin trust classification.
//!
//! Decides whether the package a type was defined in is implicitly trusted:
//! the application core, the transport library, a recognized plugin archive
//! (including the legacy unpacked layout), or, under test configuration only,
//! build and test output.

pub mod classifier;
pub mod reader;

pub use classifier::{DescriptorRules, OriginClassifier};
pub use reader::{ArchiveReader, DescriptorReader, MAX_DESCRIPTOR_BYTES};
