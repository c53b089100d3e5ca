//! Main application configuration
//!
//! This module defines the primary configuration structures for the region
//! matchmaker, including environment variable loading, TOML file loading and
//! validation.

use crate::config::regions::RegionsConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub matchmaking: MatchmakingSettings,
    #[serde(default)]
    pub regions: RegionsConfig,
}

/// Client-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Client name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Where persisted settings live; in-memory only when unset
    pub settings_file: Option<PathBuf>,
}

/// Probe and join settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Protocol version this client build speaks
    pub protocol_version: u32,
    /// Per-region status request timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Join request timeout in milliseconds
    pub join_timeout_ms: u64,
    /// Minimum spacing between join attempts in milliseconds
    pub join_cooldown_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "region-matchmaker".to_string(),
            log_level: "info".to_string(),
            settings_file: None,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            protocol_version: 23,
            probe_timeout_ms: 2000,
            join_timeout_ms: 10_000,
            join_cooldown_ms: 1500,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(path) = env::var("SETTINGS_FILE") {
            self.service.settings_file = Some(PathBuf::from(path));
        }

        // Matchmaking settings
        if let Ok(version) = env::var("PROTOCOL_VERSION") {
            self.matchmaking.protocol_version = version
                .parse()
                .map_err(|_| anyhow!("Invalid PROTOCOL_VERSION value: {}", version))?;
        }
        if let Ok(timeout) = env::var("PROBE_TIMEOUT_MS") {
            self.matchmaking.probe_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid PROBE_TIMEOUT_MS value: {}", timeout))?;
        }
        if let Ok(timeout) = env::var("JOIN_TIMEOUT_MS") {
            self.matchmaking.join_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid JOIN_TIMEOUT_MS value: {}", timeout))?;
        }
        if let Ok(cooldown) = env::var("JOIN_COOLDOWN_MS") {
            self.matchmaking.join_cooldown_ms = cooldown
                .parse()
                .map_err(|_| anyhow!("Invalid JOIN_COOLDOWN_MS value: {}", cooldown))?;
        }

        // Region settings
        if let Ok(region) = env::var("DEFAULT_REGION") {
            self.regions.default_region = region;
        }

        Ok(())
    }

    /// Get probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.matchmaking.probe_timeout_ms)
    }

    /// Get join timeout as Duration
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.matchmaking.join_timeout_ms)
    }

    /// Get join cooldown as Duration
    pub fn join_cooldown(&self) -> Duration {
        Duration::from_millis(self.matchmaking.join_cooldown_ms)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.matchmaking.protocol_version == 0 {
        return Err(anyhow!("Protocol version must be greater than 0"));
    }

    // Validate timeouts
    if config.matchmaking.probe_timeout_ms == 0 {
        return Err(anyhow!("Probe timeout must be greater than 0"));
    }
    if config.matchmaking.join_timeout_ms == 0 {
        return Err(anyhow!("Join timeout must be greater than 0"));
    }

    // Validate regions
    if config.regions.regions.is_empty() {
        return Err(anyhow!("At least one region must be configured"));
    }
    let mut seen = HashSet::new();
    for entry in &config.regions.regions {
        if entry.id.is_empty() {
            return Err(anyhow!("Region id cannot be empty"));
        }
        if entry.address.is_empty() {
            return Err(anyhow!("Region {} has an empty address", entry.id));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(anyhow!("Duplicate region id: {}", entry.id));
        }
    }
    if !config.regions.contains(&config.regions.default_region) {
        return Err(anyhow!(
            "Default region {} is not a configured region",
            config.regions.default_region
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::regions::RegionEntry;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.probe_timeout(), Duration::from_millis(2000));
        assert_eq!(config.join_cooldown(), Duration::from_millis(1500));
        assert_eq!(config.join_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_default_region_must_exist() {
        let mut config = AppConfig::default();
        config.regions.default_region = "mars".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_region_ids_rejected() {
        let mut config = AppConfig::default();
        config
            .regions
            .regions
            .push(RegionEntry::new("na", "Duplicate", "dup.example.com", false));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.probe_timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.matchmaking.join_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_protocol_version_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.protocol_version = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [service]
            log_level = "debug"

            [matchmaking]
            protocol_version = 30
            join_timeout_ms = 4000

            [regions]
            default_region = "dev"

            [[regions.regions]]
            id = "dev"
            name = "Local"
            address = "127.0.0.1:8000"
            max_team_size = 2
            "#,
        )
        .unwrap();

        assert!(validate_config(&config).is_ok());
        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.matchmaking.protocol_version, 30);
        assert_eq!(config.matchmaking.probe_timeout_ms, 2000);
        assert_eq!(config.regions.regions.len(), 1);
        assert!(!config.regions.regions[0].https);
        assert_eq!(
            config.regions.regions[0].max_team_size,
            Some(crate::types::TeamSize::Duo)
        );
    }
}
