//! Joining a game on the selected region
//!
//! This module covers the allocate-game request, its local throttle, the
//! connection endpoint built from a successful answer, and the notices and
//! play-button state shown for every outcome.

pub mod client;
pub mod color;
pub mod controls;
pub mod endpoint;
pub mod notice;
pub mod throttle;

// Re-export commonly used types
pub use client::MatchmakingClient;
pub use color::parse_color;
pub use controls::PlayControls;
pub use endpoint::{build_endpoint, BuiltEndpoint};
pub use notice::{notice_for, notice_for_rejection, JoinNotice, ModalKind};
pub use throttle::JoinThrottle;
