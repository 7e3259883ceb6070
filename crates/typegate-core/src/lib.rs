//! typegate core: the candidate-type data model, package descriptor parsing,
//! and the error surface shared by the filter and its embedders.
//!
//! This crate carries no I/O and no logging setup so the transport layer can
//! depend on it to describe the types it is about to materialize.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A malformed descriptor must surface as `TypeGateError`, never a crash on
//! the deserialization hot path.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod descriptor;
pub mod error;
pub mod types;

/// Shared result type.
pub use error::{Result, TypeGateError};
