//! Active region selection
//!
//! Holds the selected region id for a session and keeps it valid against the
//! registry. Persisted preference, probe results and the configured default
//! are the three sources, in that priority.

use crate::error::{MatchmakingError, Result};
use crate::region::prober::SweepReport;
use crate::region::registry::RegionRegistry;
use crate::settings::{SettingKey, SettingsStore};
use crate::types::{RegionId, RegionInfo};
use crate::utils::display_count;
use serde::Serialize;
use tracing::{debug, info, warn};

/// How the current selection came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionSource {
    Persisted,
    BestLatency,
    Default,
    User,
}

/// One row of the region list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionListItem {
    pub id: RegionId,
    pub name: String,
    pub player_count: Option<u32>,
    pub latency_ms: Option<u64>,
    pub disabled: bool,
    pub selected: bool,
}

/// The selector label: active region name and its live stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorView {
    pub id: RegionId,
    pub name: String,
    pub player_count: Option<u32>,
    pub latency_ms: Option<u64>,
}

impl std::fmt::Display for SelectorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} players)",
            self.name,
            display_count(self.player_count)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionSelection {
    selected: Option<RegionId>,
    source: Option<SelectionSource>,
}

impl RegionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_id(&self) -> Option<&RegionId> {
        self.selected.as_ref()
    }

    pub fn source(&self) -> Option<SelectionSource> {
        self.source
    }

    pub fn is_set(&self) -> bool {
        self.selected.is_some()
    }

    /// Adopt the persisted preference without waiting for probes.
    ///
    /// Returns false when there is no preference. An unknown preference is
    /// corrected to the default right away.
    pub fn select_persisted(
        &mut self,
        registry: &RegionRegistry,
        settings: &dyn SettingsStore,
    ) -> Result<bool> {
        let preferred = settings.text(SettingKey::Region);
        if preferred.is_empty() {
            return Ok(false);
        }

        debug!("Using persisted region preference {}", preferred);
        self.selected = Some(preferred);
        self.source = Some(SelectionSource::Persisted);
        self.ensure_valid(registry, settings)?;
        Ok(true)
    }

    /// Select the sweep's best region, or the default when nothing qualified
    pub fn select_best_or_default(
        &mut self,
        registry: &RegionRegistry,
        sweep: &SweepReport,
        settings: &dyn SettingsStore,
    ) -> Result<&RegionId> {
        match sweep.best_region() {
            Some(best) => {
                info!("Selected best-latency region {}", best);
                self.selected = Some(best.clone());
                self.source = Some(SelectionSource::BestLatency);
            }
            None => {
                info!(
                    "No region answered the probe, using default {}",
                    registry.default_region()
                );
                self.selected = Some(registry.default_region().clone());
                self.source = Some(SelectionSource::Default);
            }
        }
        self.ensure_valid(registry, settings)?;
        self.current(registry)
    }

    /// Explicit user choice: selection and preference change together
    pub fn select(
        &mut self,
        region_id: &str,
        registry: &RegionRegistry,
        settings: &dyn SettingsStore,
    ) -> Result<()> {
        if !registry.contains(region_id) {
            return Err(MatchmakingError::RegionNotFound {
                region: region_id.to_string(),
            }
            .into());
        }

        settings.set(SettingKey::Region, region_id.into())?;
        self.selected = Some(region_id.to_string());
        self.source = Some(SelectionSource::User);
        info!("User selected region {}", region_id);
        Ok(())
    }

    /// Reset an unset or unknown selection to the default and clear the
    /// preference. Returns whether a correction happened.
    pub fn ensure_valid(
        &mut self,
        registry: &RegionRegistry,
        settings: &dyn SettingsStore,
    ) -> Result<bool> {
        match &self.selected {
            Some(id) if registry.contains(id) => Ok(false),
            invalid => {
                if let Some(id) = invalid {
                    warn!(
                        "{}, falling back to {}",
                        MatchmakingError::InvalidSelection { region: id.clone() },
                        registry.default_region()
                    );
                }
                self.selected = Some(registry.default_region().clone());
                self.source = Some(SelectionSource::Default);
                if let Err(e) = settings.clear(SettingKey::Region) {
                    warn!("Failed to clear region preference: {:#}", e);
                }
                Ok(true)
            }
        }
    }

    /// The selected id; fails only if `ensure_valid` was never run
    pub fn current<'a>(&'a self, registry: &RegionRegistry) -> Result<&'a RegionId> {
        match &self.selected {
            Some(id) if registry.contains(id) => Ok(id),
            Some(id) => Err(MatchmakingError::InvalidSelection { region: id.clone() }.into()),
            None => Err(MatchmakingError::InvalidSelection {
                region: String::new(),
            }
            .into()),
        }
    }

    pub fn current_region<'a>(&self, registry: &'a RegionRegistry) -> Result<&'a RegionInfo> {
        let id = self.current(registry)?;
        registry.get(id).ok_or_else(|| {
            MatchmakingError::InvalidSelection { region: id.clone() }.into()
        })
    }

    pub fn view(&self, registry: &RegionRegistry) -> Result<SelectorView> {
        let id = self.current(registry)?;
        let region = self.current_region(registry)?;
        Ok(SelectorView {
            id: id.clone(),
            name: region.name.clone(),
            player_count: region.player_count,
            latency_ms: region.latency_ms,
        })
    }

    pub fn list(&self, registry: &RegionRegistry) -> Vec<RegionListItem> {
        registry
            .iter()
            .map(|(id, region)| RegionListItem {
                id: id.clone(),
                name: region.name.clone(),
                player_count: region.player_count,
                latency_ms: region.latency_ms,
                disabled: region.status.is_disabled(),
                selected: self.selected.as_ref() == Some(id),
            })
            .collect()
    }
}
