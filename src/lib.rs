//! Region Matchmaker - region selection and game joining for arena clients
//!
//! This crate probes the configured deployment regions, keeps one of them
//! selected for the session, and asks the selected region for a game,
//! turning every answer into a connection endpoint or a user-facing notice.

pub mod config;
pub mod error;
pub mod matchmaking;
pub mod metrics;
pub mod region;
pub mod service;
pub mod settings;
pub mod stub;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use matchmaking::MatchmakingClient;
pub use region::{RegionProber, RegionRegistry, RegionSelection, RegionTransport};
pub use service::AppState;
pub use settings::{SettingKey, SettingsStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
