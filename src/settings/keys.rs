//! Typed setting keys and values

use serde::{Deserialize, Serialize};

/// Every setting the matchmaking flow reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SettingKey {
    /// Preferred region id; empty when unset
    Region,
    /// Confirm before leaving a running game
    LeaveWarning,
    /// Developer password forwarded to the game server
    DevPassword,
    /// Developer role override
    DevRole,
    /// Ask the server for lobby clearing
    DevLobbyClearing,
    /// Weapon preset override
    DevWeaponPreset,
    /// Name color override, any format `parse_color` accepts
    DevNameColor,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::Region,
        SettingKey::LeaveWarning,
        SettingKey::DevPassword,
        SettingKey::DevRole,
        SettingKey::DevLobbyClearing,
        SettingKey::DevWeaponPreset,
        SettingKey::DevNameColor,
    ];

    /// Stable name used in settings files
    pub fn name(&self) -> &'static str {
        match self {
            SettingKey::Region => "cv_region",
            SettingKey::LeaveWarning => "cv_leave_warning",
            SettingKey::DevPassword => "dv_password",
            SettingKey::DevRole => "dv_role",
            SettingKey::DevLobbyClearing => "dv_lobby_clearing",
            SettingKey::DevWeaponPreset => "dv_weapon_preset",
            SettingKey::DevNameColor => "dv_name_color",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// Debug overrides only live for the session
    pub fn is_persisted(&self) -> bool {
        matches!(self, SettingKey::Region | SettingKey::LeaveWarning)
    }

    pub fn default_value(&self) -> SettingValue {
        match self {
            SettingKey::LeaveWarning => SettingValue::Flag(true),
            SettingKey::DevLobbyClearing => SettingValue::Flag(false),
            SettingKey::Region
            | SettingKey::DevPassword
            | SettingKey::DevRole
            | SettingKey::DevWeaponPreset
            | SettingKey::DevNameColor => SettingValue::Text(String::new()),
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A setting value; each key has exactly one variant, fixed by its default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
}

impl SettingValue {
    pub fn same_kind(&self, other: &SettingValue) -> bool {
        matches!(
            (self, other),
            (SettingValue::Text(_), SettingValue::Text(_))
                | (SettingValue::Flag(_), SettingValue::Flag(_))
        )
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Flag(value)
    }
}
