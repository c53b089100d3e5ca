//! Typed settings store used by region selection and matchmaking
//!
//! The store replaces string-keyed console variables with an enumerated
//! key set and typed accessors.

pub mod keys;
pub mod overrides;
pub mod store;

// Re-export commonly used types
pub use keys::{SettingKey, SettingValue};
pub use overrides::{apply_query_overrides, QueryOverrides};
pub use store::{FileSettingsStore, InMemorySettingsStore, SettingsStore};
