//! Error types for the region matchmaker
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Typed failures are `MatchmakingError` variants that
//! callers can recover with `downcast_ref`.

use crate::types::{RegionId, RejectionReason};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Protocol version mismatch for region {region}: expected {expected}, got {actual}")]
    VersionMismatch {
        region: RegionId,
        expected: u32,
        actual: u32,
    },

    #[error("Failed to load server info for region {region}: {reason}")]
    ProbeFailure { region: RegionId, reason: String },

    #[error("Selected region is not in the registry: {region}")]
    InvalidSelection { region: RegionId },

    #[error("Region not found: {region}")]
    RegionNotFound { region: RegionId },

    #[error("Join rejected by server: {reason}")]
    JoinRejected { reason: RejectionReason },

    #[error("Join request failed: {reason}")]
    JoinTransportFailure { reason: String },

    #[error("Malformed name color override: {value}")]
    MalformedColorOverride { value: String },

    #[error("Join attempt throttled, retry in {retry_after_ms}ms")]
    Throttled { retry_after_ms: u64 },

    #[error("A notice must be acknowledged before joining again")]
    AcknowledgmentRequired,

    #[error("The warning must be explicitly agreed to before joining again")]
    ConsentRequired,

    #[error("Team size {team_size} is not available in region {region}")]
    TeamSizeUnavailable { region: RegionId, team_size: u8 },

    #[error("Setting {key} does not hold a value of that type")]
    SettingTypeMismatch { key: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}
