//! Common types used throughout the region matchmaker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a region in the registry (e.g. "na", "eu")
pub type RegionId = String;

/// Identifier of a game instance allocated by a region
pub type GameId = u64;

/// Largest team a region accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TeamSize {
    Solo,
    Duo,
}

impl TeamSize {
    pub fn players(self) -> u8 {
        match self {
            TeamSize::Solo => 1,
            TeamSize::Duo => 2,
        }
    }
}

impl TryFrom<u8> for TeamSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TeamSize::Solo),
            2 => Ok(TeamSize::Duo),
            other => Err(format!("unsupported team size: {}", other)),
        }
    }
}

impl From<TeamSize> for u8 {
    fn from(size: TeamSize) -> Self {
        size.players()
    }
}

impl std::fmt::Display for TeamSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSize::Solo => write!(f, "solo"),
            TeamSize::Duo => write!(f, "duo"),
        }
    }
}

/// Result of the most recent probe of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionStatus {
    /// Not probed yet this session
    Unprobed,
    /// Last probe succeeded with a matching protocol version
    Available,
    /// Region speaks a different protocol than this client build
    VersionMismatch { server_version: u32 },
    /// Last probe timed out or failed
    Unreachable,
}

impl RegionStatus {
    /// Whether the region list should render this entry as disabled
    pub fn is_disabled(&self) -> bool {
        matches!(
            self,
            RegionStatus::VersionMismatch { .. } | RegionStatus::Unreachable
        )
    }
}

/// Connection metadata and live stats for one deployment region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
    /// host[:port]
    pub address: String,
    /// TLS for both HTTP and WebSocket endpoints
    pub secure: bool,
    pub player_count: Option<u32>,
    /// Largest team the region declared, as reported on the wire
    pub max_team_size: Option<u8>,
    pub latency_ms: Option<u64>,
    pub status: RegionStatus,
    pub last_probed_at: Option<DateTime<Utc>>,
}

impl RegionInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            secure,
            player_count: None,
            max_team_size: None,
            latency_ms: None,
            status: RegionStatus::Unprobed,
            last_probed_at: None,
        }
    }

    pub fn with_max_team_size(mut self, max_team_size: TeamSize) -> Self {
        self.max_team_size = Some(max_team_size.players());
        self
    }

    /// `http://address` or `https://address`
    pub fn http_base(&self) -> String {
        format!(
            "http{}://{}",
            if self.secure { "s" } else { "" },
            self.address
        )
    }

    /// `ws://address` or `wss://address`
    pub fn ws_base(&self) -> String {
        format!("ws{}://{}", if self.secure { "s" } else { "" }, self.address)
    }

    /// Team size the play controls offer for this region
    ///
    /// Regions that declare nothing are solo. A declared size this client
    /// cannot play yields `None`, which leaves every play button disabled.
    pub fn effective_team_size(&self) -> Option<TeamSize> {
        match self.max_team_size {
            None => Some(TeamSize::Solo),
            Some(players) => TeamSize::try_from(players).ok(),
        }
    }
}

/// Payload of `GET /api/serverInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// 0 when the region omits it, which never matches a client build
    #[serde(default)]
    pub protocol_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_team_size: Option<u8>,
}

/// Payload of `GET /api/getGame`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetGameResponse {
    pub success: bool,
    #[serde(rename = "gameID", default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GetGameResponse {
    pub fn joined(game_id: GameId) -> Self {
        Self {
            success: true,
            game_id: Some(game_id),
            message: None,
        }
    }

    pub fn rejected(reason: RejectionReason) -> Self {
        Self {
            success: false,
            game_id: None,
            message: reason.code().map(str::to_string),
        }
    }
}

/// Reason a region refused to allocate a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    RateLimit,
    Warning,
    TempBan,
    PermaBan,
    Unspecified,
}

impl RejectionReason {
    /// Map the wire `message` field; unknown or missing codes are unspecified
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("rateLimit") => RejectionReason::RateLimit,
            Some("warning") => RejectionReason::Warning,
            Some("tempBan") => RejectionReason::TempBan,
            Some("permaBan") => RejectionReason::PermaBan,
            _ => RejectionReason::Unspecified,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            RejectionReason::RateLimit => Some("rateLimit"),
            RejectionReason::Warning => Some("warning"),
            RejectionReason::TempBan => Some("tempBan"),
            RejectionReason::PermaBan => Some("permaBan"),
            RejectionReason::Unspecified => None,
        }
    }

    /// Whether this rejection opens a modal that must be acknowledged
    pub fn requires_acknowledgment(&self) -> bool {
        matches!(
            self,
            RejectionReason::Warning | RejectionReason::TempBan | RejectionReason::PermaBan
        )
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code().unwrap_or("unspecified"))
    }
}

/// Endpoint handed to the game transport after a successful join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub game_id: GameId,
    pub url: String,
}

/// Why a join attempt did not produce a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinFailure {
    Rejected(RejectionReason),
    /// The request never completed (network error, timeout, unreadable body)
    Transport(String),
}

/// Result of a join attempt that reached the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRequestOutcome {
    Success {
        game_id: GameId,
        target: ConnectionTarget,
    },
    Failure(JoinFailure),
}

impl MatchRequestOutcome {
    /// Label used for logging and metrics
    pub fn label(&self) -> &'static str {
        match self {
            MatchRequestOutcome::Success { .. } => "success",
            MatchRequestOutcome::Failure(JoinFailure::Transport(_)) => "transport_error",
            MatchRequestOutcome::Failure(JoinFailure::Rejected(reason)) => match reason {
                RejectionReason::RateLimit => "rate_limit",
                RejectionReason::Warning => "warning",
                RejectionReason::TempBan => "temp_ban",
                RejectionReason::PermaBan => "perma_ban",
                RejectionReason::Unspecified => "unspecified",
            },
        }
    }
}
