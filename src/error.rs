use std::fmt;

use crate::types::ArtifactId;

/// Errors from the external processor's "create artifact" operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The processor rejected the request (invalid amount, auth failure,
    /// malformed response). Carries the processor's message verbatim.
    Rejected { message: String },

    /// The call exceeded its time budget.
    Timeout,

    /// The processor could not be reached.
    Unavailable,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Rejected { message } =>
                write!(f, "processor rejected artifact creation: {}", message),
            GatewayError::Timeout =>
                write!(f, "artifact creation timed out"),
            GatewayError::Unavailable =>
                write!(f, "processor unreachable"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Errors from the session store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or the operation failed outright.
    Unavailable { message: String },

    /// The operation exceeded its time budget.
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable { message } =>
                write!(f, "session store unavailable: {}", message),
            StoreError::Timeout =>
                write!(f, "session store operation timed out"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors returned when starting a payment session fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// Amount failed boundary validation (must be `>= 1` major unit).
    InvalidAmount { amount: u64 },

    /// The processor never produced an artifact. Nothing was persisted.
    ArtifactCreation(GatewayError),

    /// The session write failed *after* the artifact was created.
    /// The artifact exists at the processor but is untracked locally,
    /// so the money path may still complete without local visibility.
    PartialFailure {
        artifact_id: ArtifactId,
        source: StoreError,
    },
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::InvalidAmount { amount } =>
                write!(f, "invalid amount: {} (must be at least 1)", amount),
            StartError::ArtifactCreation(err) =>
                write!(f, "artifact creation failed: {}", err),
            StartError::PartialFailure { artifact_id, source } =>
                write!(
                    f,
                    "session write failed after artifact {:?} was created: {}",
                    artifact_id, source
                ),
        }
    }
}

impl std::error::Error for StartError {}

/// Outcome of applying a verified settlement event to a session.
///
/// None of these are errors; every one of them is acknowledged to the
/// processor with a 2xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The session moved `Pending -> Success`.
    Applied,

    /// The session was already settled; duplicate delivery, no-op.
    AlreadySettled,

    /// No session matches the artifact id. Logged and dropped; a session
    /// is never created retroactively since amount and provenance are
    /// unknown.
    Orphan,
}
