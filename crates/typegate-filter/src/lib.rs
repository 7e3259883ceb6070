//! typegate filter library entry.
//!
//! Wires the allow-list, baseline denylist, custom policy chain, origin
//! classifier, and decision caches into an [`AdmissionGate`] the transport
//! layer consults before materializing any type from an inbound stream.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod engine;
pub mod gate;
pub mod obs;
pub mod origin;
pub mod policy;

pub use gate::{AdmissionGate, Installed};
