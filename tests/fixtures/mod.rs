//! Test fixtures and scripted implementations for integration testing

use async_trait::async_trait;
use region_matchmaker::config::{AppConfig, RegionEntry, RegionsConfig};
use region_matchmaker::error::Result;
use region_matchmaker::types::{GetGameResponse, RegionInfo, ServerInfo};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How one scripted region answers its status request
#[derive(Debug, Clone)]
pub enum ProbeScript {
    /// Answer after `latency` with the given version and stats
    Answer {
        latency: Duration,
        protocol_version: u32,
        player_count: Option<u32>,
        max_team_size: Option<u8>,
    },
    /// Fail after `latency`
    Fail { latency: Duration },
    /// Never answer
    Hang,
}

impl ProbeScript {
    pub fn ok(latency_ms: u64) -> Self {
        ProbeScript::Answer {
            latency: Duration::from_millis(latency_ms),
            protocol_version: 23,
            player_count: Some(10),
            max_team_size: None,
        }
    }

    pub fn players(latency_ms: u64, player_count: u32) -> Self {
        ProbeScript::Answer {
            latency: Duration::from_millis(latency_ms),
            protocol_version: 23,
            player_count: Some(player_count),
            max_team_size: None,
        }
    }

    pub fn version(latency_ms: u64, protocol_version: u32) -> Self {
        ProbeScript::Answer {
            latency: Duration::from_millis(latency_ms),
            protocol_version,
            player_count: Some(99),
            max_team_size: None,
        }
    }
}

/// Transport keyed by region address with scripted answers and call counts
///
/// Latencies are real `tokio::time::sleep`s, so tests run with paused time.
#[derive(Default)]
pub struct ScriptedTransport {
    probes: Mutex<HashMap<String, ProbeScript>>,
    games: Mutex<Vec<GetGameResponse>>,
    game_delay: Mutex<Duration>,
    probe_calls: Mutex<HashMap<String, usize>>,
    game_calls: Mutex<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(self, address: &str, script: ProbeScript) -> Self {
        self.set_probe(address, script);
        self
    }

    /// Queue join answers; the last one repeats
    pub fn with_games(self, responses: Vec<GetGameResponse>) -> Self {
        if let Ok(mut games) = self.games.lock() {
            *games = responses;
        }
        self
    }

    pub fn with_game_delay(self, delay: Duration) -> Self {
        if let Ok(mut game_delay) = self.game_delay.lock() {
            *game_delay = delay;
        }
        self
    }

    pub fn set_probe(&self, address: &str, script: ProbeScript) {
        if let Ok(mut probes) = self.probes.lock() {
            probes.insert(address.to_string(), script);
        }
    }

    pub fn probe_calls(&self, address: &str) -> usize {
        self.probe_calls
            .lock()
            .map(|calls| calls.get(address).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_probe_calls(&self) -> usize {
        self.probe_calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    pub fn game_calls(&self) -> usize {
        self.game_calls.lock().map(|calls| *calls).unwrap_or(0)
    }
}

#[async_trait]
impl region_matchmaker::RegionTransport for ScriptedTransport {
    async fn fetch_server_info(&self, region: &RegionInfo) -> Result<ServerInfo> {
        if let Ok(mut calls) = self.probe_calls.lock() {
            *calls.entry(region.address.clone()).or_insert(0) += 1;
        }

        let script = self
            .probes
            .lock()
            .ok()
            .and_then(|probes| probes.get(&region.address).cloned())
            .unwrap_or(ProbeScript::Fail {
                latency: Duration::ZERO,
            });

        match script {
            ProbeScript::Answer {
                latency,
                protocol_version,
                player_count,
                max_team_size,
            } => {
                tokio::time::sleep(latency).await;
                Ok(ServerInfo {
                    protocol_version,
                    player_count,
                    max_team_size,
                })
            }
            ProbeScript::Fail { latency } => {
                tokio::time::sleep(latency).await;
                Err(anyhow::anyhow!("connection refused"))
            }
            ProbeScript::Hang => std::future::pending::<Result<ServerInfo>>().await,
        }
    }

    async fn request_game(&self, _region: &RegionInfo) -> Result<GetGameResponse> {
        let call = {
            let mut calls = self
                .game_calls
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?;
            *calls += 1;
            *calls
        };

        let delay = self.game_delay.lock().map(|d| *d).unwrap_or_default();
        tokio::time::sleep(delay).await;

        let games = self
            .games
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?;
        games
            .get(call - 1)
            .or_else(|| games.last())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no scripted game response"))
    }
}

/// Three regions at `{id}.test`, default `na`
pub fn three_regions() -> RegionsConfig {
    RegionsConfig {
        default_region: "na".to_string(),
        regions: vec![
            RegionEntry::new("na", "North America", "na.test", false),
            RegionEntry::new("eu", "Europe", "eu.test", false),
            RegionEntry::new("as", "Asia", "as.test", false),
        ],
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.regions = three_regions();
    config
}

pub fn shared(transport: ScriptedTransport) -> Arc<ScriptedTransport> {
    Arc::new(transport)
}
