//! Package descriptor parsing.
//!
//! Packages (archives and legacy unpacked layouts) carry a descriptor in the
//! manifest text format: `Name: value` headers, continuation lines starting
//! with a single space, main section terminated by the first blank line.
//! Only the main section is consulted for trust decisions.

pub mod manifest;

pub use manifest::{Attributes, Manifest};
