//! Client session state and coordination
//!
//! `AppState` owns everything one client session needs: the region registry,
//! the active selection, the prober, the matchmaking client, settings and
//! metrics. The UI layer talks to the session only; every failure is turned
//! into view state here.

use crate::config::{validate_config, AppConfig};
use crate::error::{MatchmakingError, Result};
use crate::matchmaking::{notice_for, JoinNotice, MatchmakingClient, PlayControls};
use crate::metrics::MetricsCollector;
use crate::region::{
    HttpRegionTransport, RegionListItem, RegionProber, RegionRegistry, RegionSelection,
    RegionTransport, SelectorView, SweepReport,
};
use crate::settings::{
    apply_query_overrides, FileSettingsStore, InMemorySettingsStore, QueryOverrides, SettingKey,
    SettingsStore,
};
use crate::types::{ConnectionTarget, MatchRequestOutcome, RegionId, RegionInfo, TeamSize};
use crate::utils::generate_session_id;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Session-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// What a play action led to
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Hand this endpoint to the game transport
    Connect(ConnectionTarget),
    /// The region answered but no game was joined
    Notice(JoinNotice),
    /// Refused before or instead of reaching the region
    Refused(MatchmakingError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayResult {
    pub outcome: PlayOutcome,
    /// Controls after the action settled
    pub controls: PlayControls,
}

fn into_matchmaking_error(error: anyhow::Error) -> MatchmakingError {
    match error.downcast_ref::<MatchmakingError>() {
        Some(typed) => typed.clone(),
        None => MatchmakingError::InternalError {
            message: format!("{:#}", error),
        },
    }
}

/// Main session state containing all client components
pub struct AppState {
    /// Session configuration
    config: AppConfig,

    session_id: Uuid,

    /// Region table with live stats
    registry: Arc<RwLock<RegionRegistry>>,

    /// Active region; always locked after `registry`
    selection: Arc<RwLock<RegionSelection>>,

    settings: Arc<dyn SettingsStore>,

    prober: RegionProber,

    client: MatchmakingClient,

    metrics: Arc<MetricsCollector>,

    /// A join request is in flight
    loading: AtomicBool,
}

impl AppState {
    /// Build a session talking HTTP to the configured regions
    pub fn new(config: AppConfig) -> std::result::Result<Self, ServiceError> {
        let transport =
            HttpRegionTransport::new().map_err(|e| ServiceError::Initialization {
                message: format!("Failed to create HTTP transport: {}", e),
            })?;

        let settings: Arc<dyn SettingsStore> = match &config.service.settings_file {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                Arc::new(
                    FileSettingsStore::open(path).map_err(|e| ServiceError::Initialization {
                        message: format!("Failed to open settings file: {:#}", e),
                    })?,
                )
            }
            None => Arc::new(InMemorySettingsStore::new()),
        };

        Self::with_components(config, Arc::new(transport), settings)
    }

    /// Build a session over an arbitrary transport and settings store
    pub fn with_components(
        config: AppConfig,
        transport: Arc<dyn RegionTransport>,
        settings: Arc<dyn SettingsStore>,
    ) -> std::result::Result<Self, ServiceError> {
        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: format!("{:#}", e),
        })?;

        let session_id = generate_session_id();
        info!(
            "Initializing {} session {} ({} regions)",
            config.service.name,
            session_id,
            config.regions.regions.len()
        );

        let registry = RegionRegistry::from_config(&config.regions).map_err(|e| {
            ServiceError::Configuration {
                message: format!("{:#}", e),
            }
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let prober = RegionProber::new(
            transport.clone(),
            config.probe_timeout(),
            config.matchmaking.protocol_version,
        )
        .with_metrics(metrics.clone());

        let client =
            MatchmakingClient::new(transport, config.join_timeout(), config.join_cooldown())
                .with_metrics(metrics.clone());

        Ok(Self {
            config,
            session_id,
            registry: Arc::new(RwLock::new(registry)),
            selection: Arc::new(RwLock::new(RegionSelection::new())),
            settings,
            prober,
            client,
            metrics,
            loading: AtomicBool::new(false),
        })
    }

    /// Resolve the initial selection.
    ///
    /// With a persisted preference the selection is made right away and the
    /// probe sweep runs in the returned background task, refreshing stats
    /// only. Without one the sweep runs first and picks the best region.
    pub async fn initialize(&self) -> Result<Option<JoinHandle<()>>> {
        let timer = self.metrics.start_timer();
        let persisted = {
            let registry = self.registry.read().await;
            let mut selection = self.selection.write().await;
            selection.select_persisted(&registry, self.settings.as_ref())?
        };

        if persisted {
            info!("Region selected from preference, refreshing stats in background");
            self.reset_play_controls().await;
            return Ok(Some(self.spawn_refresh()));
        }

        let sweep = self.refresh_regions().await;
        {
            let registry = self.registry.read().await;
            let mut selection = self.selection.write().await;
            if selection.is_set() {
                debug!("Keeping selection made during the sweep");
                selection.ensure_valid(&registry, self.settings.as_ref())?;
            } else {
                selection.select_best_or_default(&registry, &sweep, self.settings.as_ref())?;
            }
        }

        self.reset_play_controls().await;
        info!("Region selection resolved in {:?}", timer.stop());
        Ok(None)
    }

    /// Probe every region and merge the results into the registry
    pub async fn refresh_regions(&self) -> SweepReport {
        sweep_and_merge(&self.prober, &self.registry).await
    }

    /// Run a sweep in the background; it never touches the selection
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let prober = self.prober.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let sweep = sweep_and_merge(&prober, &registry).await;
            debug!(
                "Background refresh finished with {} available regions",
                sweep.available_count()
            );
        })
    }

    /// Explicit user reselection; no probe is issued
    pub async fn select_region(&self, region_id: &str) -> Result<PlayControls> {
        {
            let registry = self.registry.read().await;
            let mut selection = self.selection.write().await;
            selection.select(region_id, &registry, self.settings.as_ref())?;
        }
        Ok(self.reset_play_controls().await)
    }

    pub async fn selector_view(&self) -> Result<SelectorView> {
        let registry = self.registry.read().await;
        let selection = self.selection.read().await;
        selection.view(&registry)
    }

    pub async fn region_list(&self) -> Vec<RegionListItem> {
        let registry = self.registry.read().await;
        let selection = self.selection.read().await;
        selection.list(&registry)
    }

    pub async fn selected_region(&self) -> Result<(RegionId, RegionInfo)> {
        let registry = self.registry.read().await;
        let selection = self.selection.read().await;
        let id = selection.current(&registry)?.clone();
        let region = selection.current_region(&registry)?.clone();
        Ok((id, region))
    }

    /// Ask the selected region for a game
    pub async fn play(&self, team_size: TeamSize) -> PlayResult {
        let outcome = match self.request_play(team_size).await {
            Ok(outcome) => outcome,
            Err(e) => PlayOutcome::Refused(into_matchmaking_error(e)),
        };

        match &outcome {
            PlayOutcome::Connect(target) => info!("Connecting to {}", target.url),
            PlayOutcome::Notice(notice) => debug!("Join notice: {:?}", notice.message),
            PlayOutcome::Refused(e) => warn!("Play refused: {}", e),
        }

        let controls = self.reset_play_controls().await;
        PlayResult { outcome, controls }
    }

    async fn request_play(&self, team_size: TeamSize) -> Result<PlayOutcome> {
        let (region_id, region) = self.selected_region().await?;

        if region.effective_team_size() != Some(team_size) {
            return Err(MatchmakingError::TeamSizeUnavailable {
                region: region_id,
                team_size: team_size.players(),
            }
            .into());
        }

        self.loading.store(true, Ordering::SeqCst);
        let outcome = self
            .client
            .request_game(&region, self.settings.as_ref())
            .await?;

        Ok(match outcome {
            MatchRequestOutcome::Success { target, .. } => PlayOutcome::Connect(target),
            MatchRequestOutcome::Failure(failure) => PlayOutcome::Notice(notice_for(&failure)),
        })
    }

    /// Return the controls to an interactive state for the active region
    pub async fn reset_play_controls(&self) -> PlayControls {
        self.loading.store(false, Ordering::SeqCst);
        self.play_controls().await
    }

    pub async fn play_controls(&self) -> PlayControls {
        let registry = self.registry.read().await;
        let selection = self.selection.read().await;

        let controls = match (selection.current_region(&registry), self.client.pending_notice()) {
            (Ok(region), Ok(pending)) => PlayControls::for_region(region, pending),
            (Err(e), _) | (_, Err(e)) => {
                error!("Play controls unavailable: {}", e);
                PlayControls {
                    loading: false,
                    solo_enabled: false,
                    duo_enabled: false,
                }
            }
        };

        if self.loading.load(Ordering::SeqCst) {
            controls.loading()
        } else {
            controls
        }
    }

    /// Close the pending modal notice
    pub async fn acknowledge_notice(&self, consent: bool) -> Result<PlayControls> {
        self.client.acknowledge_notice(consent)?;
        Ok(self.reset_play_controls().await)
    }

    pub fn should_confirm_leave(&self, in_game: bool, game_over: bool) -> bool {
        in_game && !game_over && self.settings.flag(SettingKey::LeaveWarning)
    }

    /// Copy debug overrides from a launch query string into the settings
    pub fn apply_query_overrides(&self, query: &str) -> Result<QueryOverrides> {
        apply_query_overrides(query, self.settings.as_ref())
    }

    /// Get session configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn settings(&self) -> Arc<dyn SettingsStore> {
        self.settings.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn client(&self) -> &MatchmakingClient {
        &self.client
    }

    pub fn registry(&self) -> Arc<RwLock<RegionRegistry>> {
        self.registry.clone()
    }
}

/// Sweep a snapshot of the registry, then merge under one write lock
async fn sweep_and_merge(
    prober: &RegionProber,
    registry: &Arc<RwLock<RegionRegistry>>,
) -> SweepReport {
    let targets = registry.read().await.snapshot();
    let sweep = prober.sweep(&targets).await;
    registry.write().await.apply_sweep(&sweep);
    sweep
}
