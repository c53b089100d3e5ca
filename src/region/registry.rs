//! Region registry
//!
//! Ordered table of regions built once from configuration. Probe reports
//! refresh entries in place; entries are never removed.

use crate::config::regions::RegionsConfig;
use crate::error::{MatchmakingError, Result};
use crate::region::prober::{ProbeReport, ProbeResult, SweepReport};
use crate::types::{RegionId, RegionInfo, RegionStatus};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RegionRegistry {
    entries: Vec<(RegionId, RegionInfo)>,
    default_region: RegionId,
}

impl RegionRegistry {
    /// Build a registry; ids must be unique and the default must exist
    pub fn new(entries: Vec<(RegionId, RegionInfo)>, default_region: RegionId) -> Result<Self> {
        if entries.is_empty() {
            return Err(MatchmakingError::ConfigurationError {
                message: "Region registry cannot be empty".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for (id, _) in &entries {
            if !seen.insert(id.as_str()) {
                return Err(MatchmakingError::ConfigurationError {
                    message: format!("Duplicate region id: {}", id),
                }
                .into());
            }
        }

        if !seen.contains(default_region.as_str()) {
            return Err(MatchmakingError::ConfigurationError {
                message: format!("Default region {} is not registered", default_region),
            }
            .into());
        }

        Ok(Self {
            entries,
            default_region,
        })
    }

    pub fn from_config(config: &RegionsConfig) -> Result<Self> {
        let entries = config
            .regions
            .iter()
            .map(|entry| (entry.id.clone(), entry.to_region_info()))
            .collect();
        Self::new(entries, config.default_region.clone())
    }

    pub fn default_region(&self) -> &RegionId {
        &self.default_region
    }

    pub fn get(&self, id: &str) -> Option<&RegionInfo> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, info)| info)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut RegionInfo> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, info)| info)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Entries in registry order
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &RegionInfo)> {
        self.entries.iter().map(|(id, info)| (id, info))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the entries, used as sweep targets
    pub fn snapshot(&self) -> Vec<(RegionId, RegionInfo)> {
        self.entries.clone()
    }

    /// Fold one probe report into its entry
    ///
    /// Success refreshes stats and latency. Mismatch and failure only change
    /// the status; previously known stats stay as they were.
    pub fn apply_report(&mut self, report: &ProbeReport) {
        let Some(entry) = self.get_mut(&report.region_id) else {
            debug!("Ignoring report for unknown region {}", report.region_id);
            return;
        };

        match &report.result {
            ProbeResult::Available { info, latency_ms } => {
                if info.player_count.is_some() {
                    entry.player_count = info.player_count;
                }
                if info.max_team_size.is_some() {
                    entry.max_team_size = info.max_team_size;
                }
                entry.latency_ms = Some(*latency_ms);
                entry.status = RegionStatus::Available;
                entry.last_probed_at = Some(report.probed_at);
            }
            ProbeResult::VersionMismatch { actual, .. } => {
                entry.status = RegionStatus::VersionMismatch {
                    server_version: *actual,
                };
            }
            ProbeResult::Failed { .. } => {
                entry.status = RegionStatus::Unreachable;
            }
        }
    }

    pub fn apply_sweep(&mut self, sweep: &SweepReport) {
        for report in &sweep.reports {
            self.apply_report(report);
        }
    }
}
