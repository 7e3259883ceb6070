//! Candidate-type data model.
//!
//! The transport layer describes every type it meets while decoding a stream
//! with a [`TypeHandle`] (resolved type) or, before resolution, with the bare
//! fully-qualified name. Handles are shared as `Arc<TypeHandle>`; the filter
//! keys its verdict cache on that allocation without keeping it alive.

pub mod handle;
pub mod origin;

pub use handle::{Provenance, TypeHandle, TypeShape};
pub use origin::OriginId;
