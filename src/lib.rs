//! A single-process payment collection and reconciliation service.
//!
//! This crate creates payment artifacts (scannable QR codes or hosted
//! payment links) through an external processor, tracks each attempt as
//! a local **payment session**, and reconciles session status when the
//! processor delivers a signed webhook saying money arrived. Clients
//! poll a status endpoint instead of talking to the processor directly.
//!
//! ## Guarantees
//! - One session per artifact, created exactly once
//! - Monotone status: `PENDING -> SUCCESS` only, idempotent under
//!   duplicate webhook delivery
//! - Webhook state transitions gated by HMAC-SHA256 over the exact
//!   wire bytes, compared in constant time
//! - Prompt webhook acknowledgment regardless of store latency
//!
//! ## Non-Guarantees
//! - Exactly-once webhook delivery (the processor may delay, duplicate,
//!   or drop events; the design tolerates this, it does not eliminate it)
//! - Multi-currency or multi-amount support
//! - Refunds or partial payments
//!
//! A status poll may observe `PENDING` an instant before a settlement
//! commits. That is intentional: retried polling is the eventual
//! consistency mechanism.

mod config;
mod error;
mod event;
mod gateway;
mod http;
mod manager;
mod signing;
mod store;
mod types;

#[cfg(feature = "redis")]
mod store_redis;

pub use config::{Config, ConfigError};
pub use error::{ApplyOutcome, GatewayError, StartError, StoreError};
pub use event::{parse_event, WebhookEvent};
pub use gateway::{
    build_gateway, ArtifactGateway, PaymentLinkGateway, ProcessorConfig, QrCodeGateway,
};
pub use http::{router, AppState, DEFAULT_SIGNATURE_HEADER};
pub use manager::{ManagerConfig, SessionManager, StartedSession};
pub use signing::{compute_signature, verify_signature};
pub use store::{InMemoryStore, SessionStore, SettleResult};
pub use types::{
    Artifact, ArtifactId, ArtifactKind, PaymentSession, SessionStatus, SettlementId,
};

#[cfg(feature = "redis")]
pub use store_redis::RedisStore;
