//! Debug overrides carried in a page/launch query string

use crate::error::Result;
use crate::settings::keys::SettingKey;
use crate::settings::store::SettingsStore;
use anyhow::Context;
use reqwest::Url;
use tracing::info;

/// What `apply_query_overrides` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOverrides {
    /// Keys written, in the order they were applied
    pub applied: Vec<SettingKey>,
    /// The query carried credentials and should be removed from the location
    pub strip_query: bool,
}

/// Copy `nameColor`, `lobbyClearing`, `password` and `role` query parameters
/// into the debug settings. Empty parameters are ignored.
pub fn apply_query_overrides(query: &str, settings: &dyn SettingsStore) -> Result<QueryOverrides> {
    let query = query.trim_start_matches('?');
    let url = Url::parse(&format!("http://localhost/?{}", query))
        .with_context(|| format!("Invalid query string: {}", query))?;

    let param = |name: &str| -> Option<String> {
        url.query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    };

    let mut result = QueryOverrides::default();

    if let Some(color) = param("nameColor") {
        settings.set(SettingKey::DevNameColor, color.into())?;
        result.applied.push(SettingKey::DevNameColor);
    }

    if let Some(clearing) = param("lobbyClearing") {
        settings.set(SettingKey::DevLobbyClearing, (clearing == "true").into())?;
        result.applied.push(SettingKey::DevLobbyClearing);
    }

    if let Some(password) = param("password") {
        settings.set(SettingKey::DevPassword, password.into())?;
        result.applied.push(SettingKey::DevPassword);
        result.strip_query = true;
    }

    if let Some(role) = param("role") {
        settings.set(SettingKey::DevRole, role.into())?;
        result.applied.push(SettingKey::DevRole);
        result.strip_query = true;
    }

    if !result.applied.is_empty() {
        info!("Applied {} debug override(s) from query", result.applied.len());
    }

    Ok(result)
}
