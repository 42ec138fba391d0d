use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::types::{ArtifactId, PaymentSession, SessionStatus, SettlementId};

/// Result of the atomic settle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResult {
    /// The session moved `Pending -> Success`.
    Settled,

    /// The session was already `Success`; nothing changed.
    AlreadySettled,

    /// No session exists for the artifact id.
    NotFound,
}

/// Durable record of payment sessions, keyed by artifact id.
///
/// `settle` is the only mutation and must be an atomic
/// update-if-matching-key, never a read-modify-write pair: two webhook
/// deliveries for the same artifact may race, and the loser has to
/// observe `AlreadySettled` rather than clobber the settlement id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session. Called exactly once per artifact id.
    async fn create(&self, session: &PaymentSession) -> Result<(), StoreError>;

    /// Look up a session. `None` means "unknown to this system",
    /// which is a valid negative result, not corruption.
    async fn find(&self, artifact_id: &ArtifactId) -> Result<Option<PaymentSession>, StoreError>;

    /// Transition a session to `Success` and record the settlement id,
    /// atomically. Idempotent under duplicate delivery.
    async fn settle(
        &self,
        artifact_id: &ArtifactId,
        settlement_id: &SettlementId,
    ) -> Result<SettleResult, StoreError>;

    /// Most-recent-first by creation time, at most `limit` entries.
    async fn recent(&self, limit: usize) -> Result<Vec<PaymentSession>, StoreError>;
}

/// In-memory store for tests and lightweight deployments.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: Mutex<HashMap<ArtifactId, PaymentSession>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create(&self, session: &PaymentSession) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().await;
        guard.insert(session.artifact_id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, artifact_id: &ArtifactId) -> Result<Option<PaymentSession>, StoreError> {
        let guard = self.sessions.lock().await;
        Ok(guard.get(artifact_id).cloned())
    }

    async fn settle(
        &self,
        artifact_id: &ArtifactId,
        settlement_id: &SettlementId,
    ) -> Result<SettleResult, StoreError> {
        let mut guard = self.sessions.lock().await;
        match guard.get_mut(artifact_id) {
            None => Ok(SettleResult::NotFound),
            Some(session) if session.status == SessionStatus::Success => {
                Ok(SettleResult::AlreadySettled)
            }
            Some(session) => {
                session.status = SessionStatus::Success;
                session.settlement_id = Some(settlement_id.clone());
                Ok(SettleResult::Settled)
            }
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PaymentSession>, StoreError> {
        let guard = self.sessions.lock().await;
        let mut sessions: Vec<PaymentSession> = guard.values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
