//! Region probing
//!
//! A sweep fans out one bounded status request per region and joins them all
//! before anything is decided. Each probe yields a [`ProbeReport`]; the
//! registry applies the reports afterwards, so entries are only ever written
//! by the single task holding the registry.

use crate::error::MatchmakingError;
use crate::metrics::MetricsCollector;
use crate::region::transport::RegionTransport;
use crate::types::{RegionId, RegionInfo, ServerInfo};
use crate::utils::{current_timestamp, duration_ms};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info};

/// What one probe found out
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    /// Reachable and speaking our protocol
    Available { info: ServerInfo, latency_ms: u64 },
    /// Reachable but running another protocol version
    VersionMismatch { expected: u32, actual: u32 },
    /// Timed out or failed
    Failed { reason: String },
}

impl ProbeResult {
    pub fn latency_ms(&self) -> Option<u64> {
        match self {
            ProbeResult::Available { latency_ms, .. } => Some(*latency_ms),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeResult::Available { .. } => "available",
            ProbeResult::VersionMismatch { .. } => "version_mismatch",
            ProbeResult::Failed { .. } => "unreachable",
        }
    }
}

/// Result of probing one region
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub region_id: RegionId,
    pub result: ProbeResult,
    pub probed_at: DateTime<Utc>,
}

impl ProbeReport {
    pub fn new(region_id: impl Into<RegionId>, result: ProbeResult) -> Self {
        Self {
            region_id: region_id.into(),
            result,
            probed_at: current_timestamp(),
        }
    }
}

/// All reports of one sweep, in registry order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub reports: Vec<ProbeReport>,
}

impl SweepReport {
    /// Lowest-latency available region; first in registry order on ties
    pub fn best_region(&self) -> Option<&RegionId> {
        best_region(&self.reports)
    }

    pub fn available_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.result.latency_ms().is_some())
            .count()
    }
}

/// Pick the region with strictly lowest latency among available reports
pub fn best_region(reports: &[ProbeReport]) -> Option<&RegionId> {
    let mut best: Option<(&RegionId, u64)> = None;

    for report in reports {
        if let Some(latency) = report.result.latency_ms() {
            match best {
                Some((_, best_latency)) if latency >= best_latency => {}
                _ => best = Some((&report.region_id, latency)),
            }
        }
    }

    best.map(|(id, _)| id)
}

/// Issues bounded status requests against regions
#[derive(Clone)]
pub struct RegionProber {
    transport: Arc<dyn RegionTransport>,
    timeout: Duration,
    protocol_version: u32,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RegionProber {
    pub fn new(transport: Arc<dyn RegionTransport>, timeout: Duration, protocol_version: u32) -> Self {
        Self {
            transport,
            timeout,
            protocol_version,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Probe a single region
    pub async fn probe(&self, region_id: &RegionId, region: &RegionInfo) -> ProbeReport {
        let started = Instant::now();
        let response = timeout(self.timeout, self.transport.fetch_server_info(region)).await;
        let elapsed = started.elapsed();

        let result = match response {
            Err(_) => ProbeResult::Failed {
                reason: format!("timed out after {}ms", duration_ms(self.timeout)),
            },
            Ok(Err(e)) => ProbeResult::Failed {
                reason: format!("{:#}", e),
            },
            Ok(Ok(info)) if info.protocol_version != self.protocol_version => {
                ProbeResult::VersionMismatch {
                    expected: self.protocol_version,
                    actual: info.protocol_version,
                }
            }
            Ok(Ok(info)) => ProbeResult::Available {
                info,
                latency_ms: duration_ms(elapsed),
            },
        };

        match &result {
            ProbeResult::Available { latency_ms, info } => debug!(
                "Region {} available: {}ms, {:?} players",
                region_id, latency_ms, info.player_count
            ),
            ProbeResult::VersionMismatch { expected, actual } => error!(
                "{}",
                MatchmakingError::VersionMismatch {
                    region: region_id.clone(),
                    expected: *expected,
                    actual: *actual,
                }
            ),
            ProbeResult::Failed { reason } => error!(
                "{}",
                MatchmakingError::ProbeFailure {
                    region: region_id.clone(),
                    reason: reason.clone(),
                }
            ),
        }

        if let Some(metrics) = &self.metrics {
            let latency = result.latency_ms().map(|_| elapsed);
            metrics.record_probe(region_id, result.label(), latency);
        }

        ProbeReport::new(region_id.clone(), result)
    }

    /// Probe every target concurrently and wait for all of them
    pub async fn sweep(&self, targets: &[(RegionId, RegionInfo)]) -> SweepReport {
        debug!("Probing {} regions", targets.len());

        let probes = targets.iter().map(|(id, region)| self.probe(id, region));
        let reports = join_all(probes).await;
        let sweep = SweepReport { reports };

        info!(
            "Probe sweep finished: {}/{} regions available, best: {}",
            sweep.available_count(),
            targets.len(),
            sweep.best_region().map(String::as_str).unwrap_or("none")
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_sweep(sweep.available_count());
        }

        sweep
    }
}
