//! Transport for the two per-region HTTP endpoints
//!
//! Callers apply their own timeouts; the HTTP client is built without one so
//! the probe and join deadlines stay explicit at the call sites.

use crate::error::Result;
use crate::types::{GetGameResponse, RegionInfo, ServerInfo};
use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

/// Calls a region's status and allocate-game endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionTransport: Send + Sync {
    /// `GET /api/serverInfo`
    async fn fetch_server_info(&self, region: &RegionInfo) -> Result<ServerInfo>;

    /// `GET /api/getGame`
    async fn request_game(&self, region: &RegionInfo) -> Result<GetGameResponse>;
}

/// Production transport over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpRegionTransport {
    client: reqwest::Client,
}

impl HttpRegionTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("region-matchmaker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RegionTransport for HttpRegionTransport {
    async fn fetch_server_info(&self, region: &RegionInfo) -> Result<ServerInfo> {
        let url = format!("{}/api/serverInfo", region.http_base());
        debug!("GET {}", url);

        let info = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ServerInfo>()
            .await
            .with_context(|| format!("Invalid server info from {}", url))?;
        Ok(info)
    }

    async fn request_game(&self, region: &RegionInfo) -> Result<GetGameResponse> {
        let url = format!("{}/api/getGame", region.http_base());
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<GetGameResponse>()
            .await
            .with_context(|| format!("Invalid game response from {}", url))?;
        Ok(response)
    }
}
