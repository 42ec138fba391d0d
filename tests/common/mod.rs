#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use paycollect::{
    AppState, Artifact, ArtifactGateway, ArtifactId, GatewayError, InMemoryStore, ManagerConfig,
    PaymentSession, SessionManager, SessionStore, SettleResult, SettlementId, StoreError,
    DEFAULT_SIGNATURE_HEADER,
};

pub const TEST_SECRET: &[u8] = b"whsec_paycollect_test";

/// Gateway that issues predictable sequential artifact ids
/// (`qr_A1`, `qr_A2`, ...).
pub struct ScriptedGateway {
    prefix: &'static str,
    next: AtomicU64,
}

impl ScriptedGateway {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ArtifactGateway for ScriptedGateway {
    async fn create_artifact(&self, _amount: u64) -> Result<Artifact, GatewayError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}_A{}", self.prefix, n);
        Ok(Artifact {
            presentation_target: format!("https://processor.example/qr/{}.png", id),
            id: ArtifactId(id),
        })
    }
}

/// Gateway that always fails, as if the processor rejected the request.
pub struct RejectingGateway;

#[async_trait]
impl ArtifactGateway for RejectingGateway {
    async fn create_artifact(&self, _amount: u64) -> Result<Artifact, GatewayError> {
        Err(GatewayError::Rejected {
            message: "amount not supported".to_string(),
        })
    }
}

/// Gateway that hangs long past any reasonable call timeout.
pub struct SlowGateway {
    pub delay: std::time::Duration,
}

#[async_trait]
impl ArtifactGateway for SlowGateway {
    async fn create_artifact(&self, _amount: u64) -> Result<Artifact, GatewayError> {
        tokio::time::sleep(self.delay).await;
        Ok(Artifact {
            id: ArtifactId("qr_late".to_string()),
            presentation_target: "https://processor.example/qr/late.png".to_string(),
        })
    }
}

/// Store whose every call hangs, as if the backend stopped responding.
pub struct SlowStore {
    pub delay: std::time::Duration,
}

#[async_trait]
impl SessionStore for SlowStore {
    async fn create(&self, _session: &PaymentSession) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn find(&self, _artifact_id: &ArtifactId) -> Result<Option<PaymentSession>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn settle(
        &self,
        _artifact_id: &ArtifactId,
        _settlement_id: &SettlementId,
    ) -> Result<SettleResult, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(SettleResult::NotFound)
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<PaymentSession>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Store whose writes fail, for exercising the partial-failure path.
pub struct BrokenStore;

#[async_trait]
impl SessionStore for BrokenStore {
    async fn create(&self, _session: &PaymentSession) -> Result<(), StoreError> {
        Err(StoreError::Unavailable {
            message: "write failed".to_string(),
        })
    }

    async fn find(&self, _artifact_id: &ArtifactId) -> Result<Option<PaymentSession>, StoreError> {
        Err(StoreError::Unavailable {
            message: "read failed".to_string(),
        })
    }

    async fn settle(
        &self,
        _artifact_id: &ArtifactId,
        _settlement_id: &SettlementId,
    ) -> Result<SettleResult, StoreError> {
        Err(StoreError::Unavailable {
            message: "write failed".to_string(),
        })
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<PaymentSession>, StoreError> {
        Err(StoreError::Unavailable {
            message: "read failed".to_string(),
        })
    }
}

pub fn manager() -> Arc<SessionManager> {
    manager_with(Arc::new(ScriptedGateway::new("qr")), ManagerConfig::default())
}

pub fn manager_with(gateway: Arc<dyn ArtifactGateway>, config: ManagerConfig) -> Arc<SessionManager> {
    let store: Arc<dyn SessionStore> = Arc::new(InMemoryStore::new());
    Arc::new(SessionManager::new(gateway, store, config))
}

pub fn app_state(manager: Arc<SessionManager>) -> AppState {
    AppState {
        manager,
        webhook_secret: Arc::new(TEST_SECRET.to_vec()),
        signature_header: Arc::new(DEFAULT_SIGNATURE_HEADER.to_string()),
    }
}

/// Build a credited webhook body in the processor's nested shape.
pub fn credited_payload(event: &str, entity: &str, artifact_id: &str, settlement_id: &str) -> Vec<u8> {
    let mut payload = serde_json::Map::new();
    payload.insert(
        entity.to_string(),
        serde_json::json!({ "entity": { "id": artifact_id } }),
    );
    payload.insert(
        "payment".to_string(),
        serde_json::json!({ "entity": { "id": settlement_id } }),
    );

    serde_json::to_vec(&serde_json::json!({
        "event": event,
        "payload": payload,
    }))
    .expect("serialize payload")
}
