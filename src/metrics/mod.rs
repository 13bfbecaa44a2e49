//! Observability metrics for the captioning pipeline.
//!
//! All metrics use lock-free atomics so recording never contends with the
//! sequence counter.

pub mod histogram;
pub mod registry;

pub use histogram::LatencyHistogram;
pub use registry::DispatchMetrics;
