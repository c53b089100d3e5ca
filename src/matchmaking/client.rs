//! Matchmaking client
//!
//! Sends the allocate-game request to a region and classifies the answer.
//! Attempts are throttled locally, and a rejection that opens a modal
//! blocks further attempts until it is acknowledged.

use crate::error::{MatchmakingError, Result};
use crate::matchmaking::endpoint::build_endpoint;
use crate::matchmaking::throttle::JoinThrottle;
use crate::metrics::MetricsCollector;
use crate::region::transport::RegionTransport;
use crate::settings::SettingsStore;
use crate::types::{JoinFailure, MatchRequestOutcome, RegionInfo, RejectionReason};
use crate::utils::duration_ms;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

pub struct MatchmakingClient {
    transport: Arc<dyn RegionTransport>,
    join_timeout: Duration,
    throttle: Mutex<JoinThrottle>,
    /// Rejection whose modal is still open
    pending: Mutex<Option<RejectionReason>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MatchmakingClient {
    pub fn new(transport: Arc<dyn RegionTransport>, join_timeout: Duration, cooldown: Duration) -> Self {
        Self {
            transport,
            join_timeout,
            throttle: Mutex::new(JoinThrottle::new(cooldown)),
            pending: Mutex::new(None),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn lock_pending(&self) -> Result<MutexGuard<'_, Option<RejectionReason>>> {
        self.pending.lock().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire pending notice lock".to_string(),
            }
            .into()
        })
    }

    /// The rejection awaiting acknowledgment, if any
    pub fn pending_notice(&self) -> Result<Option<RejectionReason>> {
        Ok(*self.lock_pending()?)
    }

    /// Close the pending modal. A warning needs explicit consent.
    pub fn acknowledge_notice(&self, consent: bool) -> Result<()> {
        let mut pending = self.lock_pending()?;

        match *pending {
            Some(RejectionReason::Warning) if !consent => {
                Err(MatchmakingError::ConsentRequired.into())
            }
            Some(reason) => {
                info!("Notice {} acknowledged", reason);
                *pending = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn refuse(&self, error: MatchmakingError, label: &str) -> anyhow::Error {
        debug!("Join attempt refused locally: {}", error);
        if let Some(metrics) = &self.metrics {
            metrics.record_join_refused(label);
        }
        error.into()
    }

    fn admit(&self) -> Result<()> {
        if self.pending_notice()?.is_some() {
            return Err(self.refuse(MatchmakingError::AcknowledgmentRequired, "acknowledgment"));
        }

        let admitted = self
            .throttle
            .lock()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire throttle lock".to_string(),
            })?
            .try_acquire();

        admitted.map_err(|remaining| {
            self.refuse(
                MatchmakingError::Throttled {
                    retry_after_ms: duration_ms(remaining).max(1),
                },
                "throttled",
            )
        })
    }

    /// Ask a region for a game.
    ///
    /// Local refusals (`Throttled`, `AcknowledgmentRequired`) come back as
    /// errors without touching the network. Everything the region or the
    /// network says comes back as an outcome.
    pub async fn request_game(
        &self,
        region: &RegionInfo,
        settings: &dyn SettingsStore,
    ) -> Result<MatchRequestOutcome> {
        self.admit()?;

        debug!("Requesting game from {}", region.name);
        let started = Instant::now();
        let response = timeout(self.join_timeout, self.transport.request_game(region)).await;

        let outcome = match response {
            Err(_) => MatchRequestOutcome::Failure(JoinFailure::Transport(format!(
                "timed out after {}ms",
                duration_ms(self.join_timeout)
            ))),
            Ok(Err(e)) => MatchRequestOutcome::Failure(JoinFailure::Transport(format!("{:#}", e))),
            Ok(Ok(response)) if response.success => match response.game_id {
                Some(game_id) => {
                    let built = build_endpoint(region, game_id, settings);
                    if built.dropped_override.is_some() {
                        if let Some(metrics) = &self.metrics {
                            metrics.record_color_override_error();
                        }
                    }
                    MatchRequestOutcome::Success {
                        game_id,
                        target: built.target,
                    }
                }
                None => {
                    warn!("Region {} reported success without a game id", region.name);
                    MatchRequestOutcome::Failure(JoinFailure::Rejected(RejectionReason::Unspecified))
                }
            },
            Ok(Ok(response)) => MatchRequestOutcome::Failure(JoinFailure::Rejected(
                RejectionReason::from_code(response.message.as_deref()),
            )),
        };

        match &outcome {
            MatchRequestOutcome::Success { game_id, target } => {
                info!("Joined game {} at {}", game_id, target.url)
            }
            MatchRequestOutcome::Failure(JoinFailure::Rejected(reason)) => {
                warn!("{}", MatchmakingError::JoinRejected { reason: *reason });
                if reason.requires_acknowledgment() {
                    *self.lock_pending()? = Some(*reason);
                }
            }
            MatchRequestOutcome::Failure(JoinFailure::Transport(reason)) => warn!(
                "{}",
                MatchmakingError::JoinTransportFailure {
                    reason: reason.clone()
                }
            ),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_join(outcome.label(), started.elapsed());
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::transport::MockRegionTransport;
    use crate::settings::InMemorySettingsStore;
    use crate::types::GetGameResponse;

    fn region() -> RegionInfo {
        RegionInfo::new("North America", "na.example.com", true)
    }

    fn client_returning(response: GetGameResponse, calls: usize) -> MatchmakingClient {
        let mut transport = MockRegionTransport::new();
        transport
            .expect_request_game()
            .times(calls)
            .returning(move |_| Ok(response.clone()));
        MatchmakingClient::new(
            Arc::new(transport),
            Duration::from_secs(10),
            Duration::from_millis(1500),
        )
    }

    #[tokio::test]
    async fn test_success_builds_plain_endpoint() {
        let client = client_returning(GetGameResponse::joined(42), 1);
        let settings = InMemorySettingsStore::new();

        let outcome = client.request_game(&region(), &settings).await.unwrap();
        match outcome {
            MatchRequestOutcome::Success { game_id, target } => {
                assert_eq!(game_id, 42);
                assert_eq!(target.url, "wss://na.example.com/play?gameID=42");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_attempt_inside_cooldown_is_throttled() {
        // times(1): the second attempt must never reach the transport
        let client = client_returning(GetGameResponse::joined(1), 1);
        let settings = InMemorySettingsStore::new();

        assert!(client.request_game(&region(), &settings).await.is_ok());
        let err = client.request_game(&region(), &settings).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::Throttled { .. })
        ));
    }

    #[tokio::test]
    async fn test_temp_ban_blocks_until_acknowledged() {
        let client = MatchmakingClient::new(
            {
                let mut transport = MockRegionTransport::new();
                transport
                    .expect_request_game()
                    .times(1)
                    .returning(|_| Ok(GetGameResponse::rejected(RejectionReason::TempBan)));
                Arc::new(transport)
            },
            Duration::from_secs(10),
            Duration::ZERO,
        );
        let settings = InMemorySettingsStore::new();

        let outcome = client.request_game(&region(), &settings).await.unwrap();
        assert_eq!(
            outcome,
            MatchRequestOutcome::Failure(JoinFailure::Rejected(RejectionReason::TempBan))
        );
        assert_eq!(client.pending_notice().unwrap(), Some(RejectionReason::TempBan));

        let err = client.request_game(&region(), &settings).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::AcknowledgmentRequired)
        ));

        client.acknowledge_notice(false).unwrap();
        assert_eq!(client.pending_notice().unwrap(), None);
    }

    #[tokio::test]
    async fn test_poisoned_notice_lock_refuses_join() {
        let client = client_returning(GetGameResponse::joined(1), 0);
        let settings = InMemorySettingsStore::new();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pending = client.pending.lock().unwrap();
            panic!("lock holder died");
        }));

        assert!(client.pending_notice().is_err());
        let err = client.request_game(&region(), &settings).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::InternalError { .. })
        ));
    }

    #[tokio::test]
    async fn test_warning_requires_consent() {
        let client = MatchmakingClient::new(
            {
                let mut transport = MockRegionTransport::new();
                transport
                    .expect_request_game()
                    .returning(|_| Ok(GetGameResponse::rejected(RejectionReason::Warning)));
                Arc::new(transport)
            },
            Duration::from_secs(10),
            Duration::ZERO,
        );
        let settings = InMemorySettingsStore::new();

        client.request_game(&region(), &settings).await.unwrap();
        let err = client.acknowledge_notice(false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::ConsentRequired)
        ));
        assert_eq!(client.pending_notice().unwrap(), Some(RejectionReason::Warning));

        client.acknowledge_notice(true).unwrap();
        assert_eq!(client.pending_notice().unwrap(), None);
    }

    #[tokio::test]
    async fn test_rate_limit_has_no_modal() {
        let client = client_returning(GetGameResponse::rejected(RejectionReason::RateLimit), 1);
        let settings = InMemorySettingsStore::new();

        let outcome = client.request_game(&region(), &settings).await.unwrap();
        assert_eq!(
            outcome,
            MatchRequestOutcome::Failure(JoinFailure::Rejected(RejectionReason::RateLimit))
        );
        assert_eq!(client.pending_notice().unwrap(), None);
    }

    #[tokio::test]
    async fn test_success_without_game_id_is_unspecified() {
        let client = client_returning(
            GetGameResponse {
                success: true,
                game_id: None,
                message: None,
            },
            1,
        );
        let settings = InMemorySettingsStore::new();

        let outcome = client.request_game(&region(), &settings).await.unwrap();
        assert_eq!(
            outcome,
            MatchRequestOutcome::Failure(JoinFailure::Rejected(RejectionReason::Unspecified))
        );
    }

    #[tokio::test]
    async fn test_transport_error_classified() {
        let mut transport = MockRegionTransport::new();
        transport
            .expect_request_game()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let client = MatchmakingClient::new(
            Arc::new(transport),
            Duration::from_secs(10),
            Duration::from_millis(1500),
        )
        .with_metrics(metrics.clone());
        let settings = InMemorySettingsStore::new();

        let outcome = client.request_game(&region(), &settings).await.unwrap();
        assert!(matches!(
            outcome,
            MatchRequestOutcome::Failure(JoinFailure::Transport(_))
        ));
        assert_eq!(
            metrics
                .join()
                .join_attempts_total
                .with_label_values(&["transport_error"])
                .get(),
            1
        );
    }
}
