use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Processor-issued identifier for a payment artifact.
///
/// This is a strongly-typed wrapper to avoid accidental mixing
/// of artifact ids with other string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

/// Processor-issued identifier for a settled payment.
///
/// Distinct from [`ArtifactId`]: the artifact is what the payer scanned
/// or clicked, the settlement is the money movement that paid it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub String);

/// Which artifact flavour the processor is asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A scannable single-use QR code.
    QrCode,
    /// A hosted payment link.
    PaymentLink,
}

/// A payment artifact returned by the processor.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Identifier the processor will reference in later webhook events.
    pub id: ArtifactId,

    /// What to show the payer: an image URL for QR codes,
    /// a short URL for payment links.
    pub presentation_target: String,
}

/// Lifecycle status of a payment session.
///
/// `Pending` is the only legal initial value. The sole transition this
/// design implements is `Pending -> Success`; nothing moves out of
/// `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    Success,
    Failed,
}

/// Local record of one payment attempt, keyed by the processor-issued
/// artifact id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub artifact_id: ArtifactId,

    /// Amount in major currency units. Validated `>= 1` before the
    /// artifact is created; gateways convert to minor units on the wire.
    pub amount: u64,

    pub status: SessionStatus,

    /// Set exactly once, on the transition to `Success`. Repeated
    /// deliveries of the same settlement never overwrite it.
    pub settlement_id: Option<SettlementId>,

    /// Unix millis, set once at creation. Orders history listings.
    pub created_at_ms: u64,
}

impl PaymentSession {
    /// Create a fresh pending session for a just-created artifact.
    pub fn pending(artifact_id: ArtifactId, amount: u64) -> Self {
        Self {
            artifact_id,
            amount,
            status: SessionStatus::Pending,
            settlement_id: None,
            created_at_ms: now_ms(),
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
