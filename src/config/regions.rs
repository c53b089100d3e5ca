//! Region registry configuration

use crate::types::{RegionId, RegionInfo, TeamSize};
use serde::{Deserialize, Serialize};

/// One statically configured region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    /// Identifier persisted as the region preference
    pub id: RegionId,
    /// Display label
    pub name: String,
    /// host[:port] of the region's HTTP and WebSocket endpoints
    pub address: String,
    /// Use https/wss
    #[serde(default)]
    pub https: bool,
    /// Declared team-size limit (1 = solo, 2 = duo)
    #[serde(default)]
    pub max_team_size: Option<TeamSize>,
}

impl RegionEntry {
    pub fn new(id: &str, name: &str, address: &str, https: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            https,
            max_team_size: Some(TeamSize::Solo),
        }
    }

    pub fn to_region_info(&self) -> RegionInfo {
        let mut info = RegionInfo::new(self.name.clone(), self.address.clone(), self.https);
        info.max_team_size = self.max_team_size.map(TeamSize::players);
        info
    }
}

/// The static region table, in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionsConfig {
    /// Region selected when no valid preference or probe result exists
    pub default_region: RegionId,
    /// Registry entries; order is display and tie-break order
    pub regions: Vec<RegionEntry>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            default_region: "na".to_string(),
            regions: vec![
                RegionEntry::new("na", "North America", "na.arena.example.com", true),
                RegionEntry::new("eu", "Europe", "eu.arena.example.com", true),
                RegionEntry::new("as", "Asia", "as.arena.example.com", true),
            ],
        }
    }
}

impl RegionsConfig {
    pub fn contains(&self, id: &str) -> bool {
        self.regions.iter().any(|entry| entry.id == id)
    }
}
