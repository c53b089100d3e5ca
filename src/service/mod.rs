//! Session layer for the region matchmaker
//!
//! This module contains the session state that owns the region registry,
//! selection, prober and matchmaking client, and the background refresh task.

pub mod app;

pub use app::{AppState, PlayOutcome, PlayResult, ServiceError};
