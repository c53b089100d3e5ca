//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for region probing and join
//! attempts using Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the region matchmaker
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Region probe metrics
    probe_metrics: ProbeMetrics,

    /// Join attempt metrics
    join_metrics: JoinMetrics,
}

/// Region probe metrics
#[derive(Clone)]
pub struct ProbeMetrics {
    /// Probes by region and result
    pub probes_total: IntCounterVec,

    /// Measured round-trip time of successful probes
    pub probe_latency_seconds: HistogramVec,

    /// Completed sweeps
    pub sweeps_total: IntCounter,

    /// Regions usable after the last sweep
    pub available_regions: IntGauge,
}

/// Join attempt metrics
#[derive(Clone)]
pub struct JoinMetrics {
    /// Join requests that reached the network, by outcome
    pub join_attempts_total: IntCounterVec,

    /// Join attempts refused locally, by reason
    pub join_refused_total: IntCounterVec,

    /// Join request round-trip time
    pub join_duration_seconds: Histogram,

    /// Name color overrides that failed to parse
    pub color_override_errors_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let probe_metrics = ProbeMetrics::new(&registry)?;
        let join_metrics = JoinMetrics::new(&registry)?;

        Ok(Self {
            registry,
            probe_metrics,
            join_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get probe metrics
    pub fn probe(&self) -> &ProbeMetrics {
        &self.probe_metrics
    }

    /// Get join metrics
    pub fn join(&self) -> &JoinMetrics {
        &self.join_metrics
    }

    /// Record one probe; latency only for successful probes
    pub fn record_probe(&self, region: &str, result: &str, latency: Option<Duration>) {
        self.probe_metrics
            .probes_total
            .with_label_values(&[region, result])
            .inc();

        if let Some(latency) = latency {
            self.probe_metrics
                .probe_latency_seconds
                .with_label_values(&[region])
                .observe(latency.as_secs_f64());
        }
    }

    /// Record a finished sweep
    pub fn record_sweep(&self, available_regions: usize) {
        self.probe_metrics.sweeps_total.inc();
        self.probe_metrics
            .available_regions
            .set(available_regions as i64);
    }

    /// Record a join request that reached the network
    pub fn record_join(&self, outcome: &str, duration: Duration) {
        self.join_metrics
            .join_attempts_total
            .with_label_values(&[outcome])
            .inc();
        self.join_metrics
            .join_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a join attempt refused before any network call
    pub fn record_join_refused(&self, reason: &str) {
        self.join_metrics
            .join_refused_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a malformed name color override
    pub fn record_color_override_error(&self) {
        self.join_metrics.color_override_errors_total.inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ProbeMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("region_matchmaker_probes_total", "Region probes by result"),
            &["region", "result"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "region_matchmaker_probe_latency_seconds",
                "Region probe round-trip time",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.15, 0.25, 0.5, 1.0, 2.0]),
            &["region"],
        )?;
        registry.register(Box::new(probe_latency_seconds.clone()))?;

        let sweeps_total =
            IntCounter::new("region_matchmaker_sweeps_total", "Completed probe sweeps")?;
        registry.register(Box::new(sweeps_total.clone()))?;

        let available_regions = IntGauge::new(
            "region_matchmaker_available_regions",
            "Regions usable after the last sweep",
        )?;
        registry.register(Box::new(available_regions.clone()))?;

        Ok(Self {
            probes_total,
            probe_latency_seconds,
            sweeps_total,
            available_regions,
        })
    }
}

impl JoinMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let join_attempts_total = IntCounterVec::new(
            Opts::new(
                "region_matchmaker_join_attempts_total",
                "Join requests sent, by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(join_attempts_total.clone()))?;

        let join_refused_total = IntCounterVec::new(
            Opts::new(
                "region_matchmaker_join_refused_total",
                "Join attempts refused locally, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(join_refused_total.clone()))?;

        let join_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "region_matchmaker_join_duration_seconds",
                "Join request round-trip time",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(join_duration_seconds.clone()))?;

        let color_override_errors_total = IntCounter::new(
            "region_matchmaker_color_override_errors_total",
            "Malformed name color overrides",
        )?;
        registry.register(Box::new(color_override_errors_total.clone()))?;

        Ok(Self {
            join_attempts_total,
            join_refused_total,
            join_duration_seconds,
            color_override_errors_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _probe = collector.probe();
        let _join = collector.join();
    }

    #[test]
    fn test_probe_recording() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_probe("eu", "available", Some(Duration::from_millis(80)));
        collector.record_probe("eu", "unreachable", None);
        collector.record_sweep(1);

        assert_eq!(
            collector
                .probe()
                .probes_total
                .with_label_values(&["eu", "available"])
                .get(),
            1
        );
        assert_eq!(collector.probe().sweeps_total.get(), 1);
        assert_eq!(collector.probe().available_regions.get(), 1);
    }

    #[test]
    fn test_join_recording() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_join("success", Duration::from_millis(120));
        collector.record_join_refused("throttled");
        collector.record_join_refused("throttled");
        collector.record_color_override_error();

        assert_eq!(
            collector
                .join()
                .join_refused_total
                .with_label_values(&["throttled"])
                .get(),
            2
        );
        assert_eq!(collector.join().color_override_errors_total.get(), 1);
    }

    #[test]
    fn test_gather_text() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_join("temp_ban", Duration::from_millis(50));

        let text = collector.gather_text().unwrap();
        assert!(text.contains("region_matchmaker_join_attempts_total"));
        assert!(text.contains("temp_ban"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
