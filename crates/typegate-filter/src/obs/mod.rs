//! Lightweight in-process metrics for admission decisions.
//!
//! Counters are atomics keyed by sorted label sets and rendered in the
//! Prometheus text format on demand.

pub mod metrics;

pub use metrics::{CounterVec, FilterMetrics};
