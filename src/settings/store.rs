//! Settings store interface and implementations

use crate::error::{MatchmakingError, Result};
use crate::settings::keys::{SettingKey, SettingValue};
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Synchronous typed key/value configuration
pub trait SettingsStore: Send + Sync {
    /// Current value, or the key's default when unset
    fn get(&self, key: SettingKey) -> SettingValue;

    /// Store a value; the variant must match the key's default
    fn set(&self, key: SettingKey, value: SettingValue) -> Result<()>;

    /// Text value; empty for unset or non-text keys
    fn text(&self, key: SettingKey) -> String {
        match self.get(key) {
            SettingValue::Text(text) => text,
            SettingValue::Flag(_) => String::new(),
        }
    }

    /// Flag value; false for non-flag keys
    fn flag(&self, key: SettingKey) -> bool {
        matches!(self.get(key), SettingValue::Flag(true))
    }

    /// Reset a key to its default
    fn clear(&self, key: SettingKey) -> Result<()> {
        self.set(key, key.default_value())
    }
}

fn check_kind(key: SettingKey, value: &SettingValue) -> Result<()> {
    if !value.same_kind(&key.default_value()) {
        return Err(MatchmakingError::SettingTypeMismatch {
            key: key.name().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Settings held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<SettingKey, SettingValue>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with values
    pub fn with_values(values: impl IntoIterator<Item = (SettingKey, SettingValue)>) -> Result<Self> {
        let store = Self::new();
        for (key, value) in values {
            store.set(key, value)?;
        }
        Ok(store)
    }

    fn snapshot(&self) -> HashMap<SettingKey, SettingValue> {
        self.values
            .read()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: SettingKey) -> SettingValue {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(&key).cloned())
            .unwrap_or_else(|| key.default_value())
    }

    fn set(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        check_kind(key, &value)?;

        let mut values = self
            .values
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire settings write lock".to_string(),
            })?;
        values.insert(key, value);
        Ok(())
    }
}

/// Settings backed by a JSON file
///
/// Only keys where [`SettingKey::is_persisted`] holds are written to disk;
/// debug overrides stay in memory.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    memory: InMemorySettingsStore,
}

impl FileSettingsStore {
    /// Open the store, loading existing values when the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let memory = InMemorySettingsStore::new();

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            let stored: BTreeMap<String, SettingValue> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

            for (name, value) in stored {
                match SettingKey::from_name(&name) {
                    Some(key) if key.is_persisted() => {
                        if let Err(e) = memory.set(key, value) {
                            warn!("Ignoring stored setting {}: {}", name, e);
                        }
                    }
                    _ => debug!("Ignoring unknown stored setting {}", name),
                }
            }
        }

        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let stored: BTreeMap<&'static str, SettingValue> = self
            .memory
            .snapshot()
            .into_iter()
            .filter(|(key, _)| key.is_persisted())
            .map(|(key, value)| (key.name(), value))
            .collect();

        let contents = serde_json::to_string_pretty(&stored)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings file {}", self.path.display()))?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: SettingKey) -> SettingValue {
        self.memory.get(key)
    }

    /// A value that cannot be written to disk is rolled back in memory
    fn set(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        let previous = self.memory.get(key);
        self.memory.set(key, value)?;
        if key.is_persisted() {
            if let Err(e) = self.persist() {
                self.memory.set(key, previous)?;
                return Err(e);
            }
        }
        Ok(())
    }
}
