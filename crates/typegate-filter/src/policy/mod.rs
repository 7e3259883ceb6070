//! Policy layer (allow-list, baseline denylist, custom policy hooks).
//!
//! Compiles configuration into lookup structures the decision engine consults
//! on every candidate type.

pub mod allowlist;
pub mod baseline;
pub mod custom;

pub use allowlist::AllowList;
pub use baseline::{BaselineDecision, PatternDenylist};
pub use custom::{CustomPolicy, PolicyChain, PolicyVerdict, StaticPolicy};
