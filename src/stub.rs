//! Local region server for development and tests
//!
//! Answers `/api/serverInfo` and `/api/getGame` the way a deployed region
//! does, with configurable protocol version, stats, join result and added
//! latency. Runs on Axum.

use crate::types::{GameId, GetGameResponse, RejectionReason, ServerInfo, TeamSize};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How the stub region behaves
#[derive(Debug, Clone)]
pub struct StubConfig {
    pub host: String,
    /// 0 picks a free port
    pub port: u16,
    pub protocol_version: u32,
    pub player_count: Option<u32>,
    pub max_team_size: Option<TeamSize>,
    /// Refuse every join with this reason
    pub reject: Option<RejectionReason>,
    /// Answer joins with a non-JSON body
    pub malformed_join: bool,
    /// Added before every response
    pub delay: Duration,
    pub first_game_id: GameId,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            protocol_version: 23,
            player_count: Some(0),
            max_team_size: Some(TeamSize::Solo),
            reject: None,
            malformed_join: false,
            delay: Duration::ZERO,
            first_game_id: 1,
        }
    }
}

/// Shared state for the stub handlers
#[derive(Clone)]
pub struct StubState {
    config: Arc<StubConfig>,
    info_requests: Arc<AtomicUsize>,
    game_requests: Arc<AtomicUsize>,
    next_game_id: Arc<AtomicU64>,
}

impl StubState {
    pub fn new(config: StubConfig) -> Self {
        let next_game_id = Arc::new(AtomicU64::new(config.first_game_id));
        Self {
            config: Arc::new(config),
            info_requests: Arc::new(AtomicUsize::new(0)),
            game_requests: Arc::new(AtomicUsize::new(0)),
            next_game_id,
        }
    }

    pub fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }

    pub fn game_requests(&self) -> usize {
        self.game_requests.load(Ordering::SeqCst)
    }
}

/// Stub region HTTP server
pub struct StubServer {
    config: StubConfig,
    state: StubState,
    shutdown_tx: broadcast::Sender<()>,
}

impl StubServer {
    pub fn new(config: StubConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state: StubState::new(config.clone()),
            config,
            shutdown_tx,
        }
    }

    pub fn state(&self) -> StubState {
        self.state.clone()
    }

    /// Create the Axum router with both region endpoints
    pub fn create_router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid stub server address")?;
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))
    }

    /// Serve on an already bound listener until `stop` is called
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("Stub region listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.create_router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Stub region shutdown signal received");
            })
            .await?;

        info!("Stub region stopped");
        Ok(())
    }

    /// Start the stub on a background task; returns the bound address
    pub async fn spawn(self: Arc<Self>) -> Result<(SocketAddr, JoinHandle<()>)> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = self.serve(listener).await {
                warn!("Stub region failed: {}", e);
            }
        });
        Ok((addr, handle))
    }

    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to stub region: {}", e);
        }
    }
}

pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/serverInfo", get(server_info_handler))
        .route("/api/getGame", get(get_game_handler))
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "region-stub",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/api/serverInfo", "/api/getGame"]
    }))
}

async fn server_info_handler(State(state): State<StubState>) -> Json<ServerInfo> {
    state.info_requests.fetch_add(1, Ordering::SeqCst);
    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }
    debug!("Serving server info");

    Json(ServerInfo {
        protocol_version: state.config.protocol_version,
        player_count: state.config.player_count,
        max_team_size: state.config.max_team_size.map(TeamSize::players),
    })
}

async fn get_game_handler(State(state): State<StubState>) -> Response {
    state.game_requests.fetch_add(1, Ordering::SeqCst);
    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }

    if state.config.malformed_join {
        return (StatusCode::OK, "<html>upstream error</html>").into_response();
    }

    let response = match state.config.reject {
        Some(reason) => {
            debug!("Rejecting join: {}", reason);
            GetGameResponse::rejected(reason)
        }
        None => {
            let game_id = state.next_game_id.fetch_add(1, Ordering::SeqCst);
            debug!("Allocated game {}", game_id);
            GetGameResponse::joined(game_id)
        }
    };

    Json(response).into_response()
}
