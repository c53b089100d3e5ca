//! Play button state

use crate::types::{RegionInfo, RejectionReason, TeamSize};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayControls {
    /// A join request is in flight
    pub loading: bool,
    pub solo_enabled: bool,
    /// Duo play and team create/join
    pub duo_enabled: bool,
}

impl PlayControls {
    /// Interactive state for a region: only its own team size is playable,
    /// and solo stays locked while a modal notice is unacknowledged.
    pub fn for_region(region: &RegionInfo, pending: Option<RejectionReason>) -> Self {
        let team_size = region.effective_team_size();
        Self {
            loading: false,
            solo_enabled: team_size == Some(TeamSize::Solo) && pending.is_none(),
            duo_enabled: team_size == Some(TeamSize::Duo),
        }
    }

    pub fn loading(mut self) -> Self {
        self.loading = true;
        self
    }

    pub fn allows(&self, team_size: TeamSize) -> bool {
        match team_size {
            TeamSize::Solo => self.solo_enabled,
            TeamSize::Duo => self.duo_enabled,
        }
    }
}
