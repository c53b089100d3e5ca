//! Metrics for the region matchmaker
//!
//! Prometheus counters and histograms for probe sweeps and join attempts.

pub mod collector;

pub use collector::{JoinMetrics, MetricsCollector, MetricsTimer, ProbeMetrics};
