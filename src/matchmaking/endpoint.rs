//! Transport endpoint construction

use crate::error::MatchmakingError;
use crate::matchmaking::color::parse_color;
use crate::settings::{SettingKey, SettingsStore};
use crate::types::{ConnectionTarget, GameId, RegionInfo};
use tracing::{error, warn};

/// A built endpoint plus the override that had to be dropped, if any
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltEndpoint {
    pub target: ConnectionTarget,
    pub dropped_override: Option<MatchmakingError>,
}

/// `ws{s}://{address}/play?gameID={id}` followed by whichever debug
/// overrides are set, in a fixed order. A malformed name color is cleared
/// from the settings and left out.
pub fn build_endpoint(
    region: &RegionInfo,
    game_id: GameId,
    settings: &dyn SettingsStore,
) -> BuiltEndpoint {
    let mut url = format!("{}/play?gameID={}", region.ws_base(), game_id);

    let password = settings.text(SettingKey::DevPassword);
    if !password.is_empty() {
        url.push_str(&format!("&password={}", password));
    }

    let role = settings.text(SettingKey::DevRole);
    if !role.is_empty() {
        url.push_str(&format!("&role={}", role));
    }

    if settings.flag(SettingKey::DevLobbyClearing) {
        url.push_str("&lobbyClearing=true");
    }

    let weapon_preset = settings.text(SettingKey::DevWeaponPreset);
    if !weapon_preset.is_empty() {
        url.push_str(&format!("&weaponPreset={}", weapon_preset));
    }

    let mut dropped_override = None;
    let name_color = settings.text(SettingKey::DevNameColor);
    if !name_color.is_empty() {
        match parse_color(&name_color) {
            Ok(color) => url.push_str(&format!("&nameColor={}", color)),
            Err(e) => {
                error!("{}", e);
                if let Err(clear_err) = settings.clear(SettingKey::DevNameColor) {
                    warn!("Failed to clear name color override: {}", clear_err);
                }
                dropped_override = Some(e);
            }
        }
    }

    BuiltEndpoint {
        target: ConnectionTarget { game_id, url },
        dropped_override,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{InMemorySettingsStore, SettingValue};

    #[test]
    fn test_plain_endpoint() {
        let settings = InMemorySettingsStore::new();
        let region = RegionInfo::new("Europe", "eu.example.com", true);

        let built = build_endpoint(&region, 42, &settings);
        assert_eq!(built.target.url, "wss://eu.example.com/play?gameID=42");
        assert_eq!(built.target.game_id, 42);
        assert!(built.dropped_override.is_none());
    }

    #[test]
    fn test_all_overrides() {
        let settings = InMemorySettingsStore::with_values([
            (SettingKey::DevPassword, SettingValue::from("pw")),
            (SettingKey::DevRole, SettingValue::from("admin")),
            (SettingKey::DevLobbyClearing, SettingValue::from(true)),
            (SettingKey::DevWeaponPreset, SettingValue::from("sniper")),
            (SettingKey::DevNameColor, SettingValue::from("#00ff00")),
        ])
        .unwrap();
        let region = RegionInfo::new("Local", "127.0.0.1:8000", false);

        let built = build_endpoint(&region, 7, &settings);
        assert_eq!(
            built.target.url,
            "ws://127.0.0.1:8000/play?gameID=7&password=pw&role=admin&lobbyClearing=true&weaponPreset=sniper&nameColor=65280"
        );
    }

    #[test]
    fn test_malformed_color_dropped_and_cleared() {
        let settings = InMemorySettingsStore::with_values([
            (SettingKey::DevRole, SettingValue::from("mod")),
            (SettingKey::DevNameColor, SettingValue::from("not-a-color")),
        ])
        .unwrap();
        let region = RegionInfo::new("Local", "127.0.0.1:8000", false);

        let built = build_endpoint(&region, 9, &settings);
        assert_eq!(
            built.target.url,
            "ws://127.0.0.1:8000/play?gameID=9&role=mod"
        );
        assert_eq!(
            built.dropped_override,
            Some(MatchmakingError::MalformedColorOverride {
                value: "not-a-color".to_string()
            })
        );
        assert_eq!(settings.text(SettingKey::DevNameColor), "");
    }
}
