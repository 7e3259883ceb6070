//! Top-level facade crate for typegate.
//!
//! Re-exports the data model and the filter so the transport layer can depend
//! on a single crate.

pub mod core {
    pub use typegate_core::*;
}

pub mod filter {
    pub use typegate_filter::*;
}
