//! Admission decision engine, its caches, and the filter mode switch.

pub mod admission;
pub mod cache;
pub mod mode;

pub use admission::{AdmissionEngine, EngineParts, EngineSettings, Rationale};
pub use mode::{FilterMode, FilterState};
