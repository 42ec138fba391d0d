use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::error::{ApplyOutcome, GatewayError, StartError, StoreError};
use crate::gateway::ArtifactGateway;
use crate::store::{SessionStore, SettleResult};
use crate::types::{ArtifactId, PaymentSession, SessionStatus, SettlementId};

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Budget for one external call (gateway or store). Calls never
    /// hang past this; expiry surfaces as a distinct timeout error.
    pub call_timeout: Duration,

    /// Hard cap on history listings.
    pub history_limit: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            history_limit: 25,
        }
    }
}

/// A session as returned to the creating client: the persisted record
/// plus the presentation target, which is not stored.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session: PaymentSession,
    pub presentation_target: String,
}

/// The session lifecycle state machine.
///
/// Owns the ordering rules between creation, polling and webhook
/// delivery. Collaborators are injected at construction; there is no
/// hidden global state.
pub struct SessionManager {
    gateway: Arc<dyn ArtifactGateway>,
    store: Arc<dyn SessionStore>,
    config: ManagerConfig,
}

impl SessionManager {
    pub fn new(
        gateway: Arc<dyn ArtifactGateway>,
        store: Arc<dyn SessionStore>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
        }
    }

    /// Create an artifact at the processor, then persist a pending
    /// session keyed by the returned artifact id.
    ///
    /// If the store write fails after the artifact was created, the
    /// failure is reported as [`StartError::PartialFailure`] and logged
    /// at error level: the artifact exists externally, so money may
    /// still arrive for a session this system is not tracking.
    pub async fn start_session(&self, amount: u64) -> Result<StartedSession, StartError> {
        if amount < 1 {
            return Err(StartError::InvalidAmount { amount });
        }

        let artifact = match timeout(self.config.call_timeout, self.gateway.create_artifact(amount))
            .await
        {
            Ok(Ok(artifact)) => artifact,
            Ok(Err(err)) => {
                warn!(amount, error = %err, "artifact creation failed");
                return Err(StartError::ArtifactCreation(err));
            }
            Err(_) => {
                warn!(amount, "artifact creation timed out");
                return Err(StartError::ArtifactCreation(GatewayError::Timeout));
            }
        };

        let session = PaymentSession::pending(artifact.id.clone(), amount);
        if let Err(source) = self.store_create(&session).await {
            error!(
                artifact_id = %session.artifact_id.0,
                error = %source,
                "session write failed after artifact creation; artifact is live but untracked"
            );
            return Err(StartError::PartialFailure {
                artifact_id: artifact.id,
                source,
            });
        }

        info!(
            artifact_id = %session.artifact_id.0,
            amount,
            "payment session started"
        );
        Ok(StartedSession {
            session,
            presentation_target: artifact.presentation_target,
        })
    }

    /// Pure read. `Ok(None)` is "unknown to this system", not an error.
    pub async fn status(
        &self,
        artifact_id: &ArtifactId,
    ) -> Result<Option<(SessionStatus, Option<SettlementId>)>, StoreError> {
        let found = timeout(self.config.call_timeout, self.store.find(artifact_id))
            .await
            .map_err(|_| StoreError::Timeout)??;
        Ok(found.map(|session| (session.status, session.settlement_id)))
    }

    /// Apply a verified settlement event.
    ///
    /// Idempotent: duplicate deliveries observe `AlreadySettled` and the
    /// stored settlement id is never written a second time. Unknown
    /// artifact ids are orphans; they are logged and dropped, never
    /// turned into sessions retroactively.
    pub async fn apply_success(
        &self,
        artifact_id: &ArtifactId,
        settlement_id: &SettlementId,
    ) -> Result<ApplyOutcome, StoreError> {
        let result = timeout(
            self.config.call_timeout,
            self.store.settle(artifact_id, settlement_id),
        )
        .await
        .map_err(|_| StoreError::Timeout)??;

        Ok(match result {
            SettleResult::Settled => {
                info!(
                    artifact_id = %artifact_id.0,
                    settlement_id = %settlement_id.0,
                    "session settled"
                );
                ApplyOutcome::Applied
            }
            SettleResult::AlreadySettled => {
                info!(
                    artifact_id = %artifact_id.0,
                    "duplicate settlement delivery, no-op"
                );
                ApplyOutcome::AlreadySettled
            }
            SettleResult::NotFound => {
                warn!(
                    artifact_id = %artifact_id.0,
                    settlement_id = %settlement_id.0,
                    "orphan settlement event dropped"
                );
                ApplyOutcome::Orphan
            }
        })
    }

    /// Most-recent-first session history, capped by the configured
    /// limit even when the caller asks for more.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<PaymentSession>, StoreError> {
        let cap = limit
            .unwrap_or(self.config.history_limit)
            .min(self.config.history_limit);
        timeout(self.config.call_timeout, self.store.recent(cap))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn store_create(&self, session: &PaymentSession) -> Result<(), StoreError> {
        timeout(self.config.call_timeout, self.store.create(session))
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
