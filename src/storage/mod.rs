//! Volatile metric storage.
//!
//! The metrics store is the only mutable state in the engine. It lives for the
//! lifetime of the process and is injected wherever counters are read or
//! written.

mod metrics;

pub use metrics::{AdMetrics, MetricsStore};
