use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
#[cfg(feature = "http")]
use serde::Deserialize;
#[cfg(feature = "http")]
use serde_json::json;

use crate::error::GatewayError;
use crate::types::{Artifact, ArtifactId, ArtifactKind};

/// Adapter to the external processor's "create payment artifact"
/// operation.
///
/// Two concrete flavours exist, one per artifact kind; everything
/// downstream of artifact creation (session lifecycle, webhook
/// reconciliation) is shared and never duplicated per flavour.
#[async_trait]
pub trait ArtifactGateway: Send + Sync {
    /// Create a short-lived, single-use payment artifact.
    ///
    /// `amount` is in major currency units; implementations convert to
    /// whatever minor unit the processor requires. On failure nothing
    /// was persisted locally and the caller must not write a session.
    async fn create_artifact(&self, amount: u64) -> Result<Artifact, GatewayError>;
}

/// Credentials and connection settings shared by both gateway flavours.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,

    /// How long a created artifact stays payable. Short by design: it
    /// bounds how long a pending session remains actionable.
    pub artifact_ttl: Duration,
}

impl ProcessorConfig {
    fn close_by_secs(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        now + self.artifact_ttl.as_secs()
    }
}

fn minor_units(amount: u64) -> u64 {
    amount.saturating_mul(100)
}

/// Build the gateway selected by configuration.
pub fn build_gateway(kind: ArtifactKind, config: ProcessorConfig) -> Arc<dyn ArtifactGateway> {
    match kind {
        ArtifactKind::QrCode => Arc::new(QrCodeGateway::new(config)),
        ArtifactKind::PaymentLink => Arc::new(PaymentLinkGateway::new(config)),
    }
}

/// QR-code flavour: the presentation target is an image URL the client
/// renders for scanning.
pub struct QrCodeGateway {
    config: ProcessorConfig,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl QrCodeGateway {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "http")]
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
#[derive(Deserialize)]
struct QrCodeResponse {
    id: String,
    image_url: String,
}

#[async_trait]
impl ArtifactGateway for QrCodeGateway {
    async fn create_artifact(&self, amount: u64) -> Result<Artifact, GatewayError> {
        #[cfg(feature = "http")]
        {
            let body = json!({
                "type": "upi_qr",
                "usage": "single_use",
                "fixed_amount": true,
                "payment_amount": minor_units(amount),
                "close_by": self.config.close_by_secs(),
            });

            let response: QrCodeResponse = post_processor(
                &self.client,
                &self.config,
                "/v1/payments/qr_codes",
                &body,
            )
            .await?;

            return Ok(Artifact {
                id: ArtifactId(response.id),
                presentation_target: response.image_url,
            });
        }

        #[cfg(not(feature = "http"))]
        {
            // Simulated processor: fabricate an artifact in the shape
            // the real one returns.
            let _ = self.config.close_by_secs();
            let _ = minor_units(amount);
            let id = format!("qr_{:012x}", fastrand::u64(..));
            Ok(Artifact {
                presentation_target: format!("https://processor.example/qr/{}.png", id),
                id: ArtifactId(id),
            })
        }
    }
}

/// Hosted-link flavour: the presentation target is a short URL the
/// client opens.
pub struct PaymentLinkGateway {
    config: ProcessorConfig,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl PaymentLinkGateway {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "http")]
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
#[derive(Deserialize)]
struct PaymentLinkResponse {
    id: String,
    short_url: String,
}

#[async_trait]
impl ArtifactGateway for PaymentLinkGateway {
    async fn create_artifact(&self, amount: u64) -> Result<Artifact, GatewayError> {
        #[cfg(feature = "http")]
        {
            let body = json!({
                "amount": minor_units(amount),
                "expire_by": self.config.close_by_secs(),
            });

            let response: PaymentLinkResponse = post_processor(
                &self.client,
                &self.config,
                "/v1/payment_links",
                &body,
            )
            .await?;

            return Ok(Artifact {
                id: ArtifactId(response.id),
                presentation_target: response.short_url,
            });
        }

        #[cfg(not(feature = "http"))]
        {
            let _ = self.config.close_by_secs();
            let _ = minor_units(amount);
            let id = format!("plink_{:012x}", fastrand::u64(..));
            Ok(Artifact {
                presentation_target: format!("https://processor.example/l/{}", id),
                id: ArtifactId(id),
            })
        }
    }
}

#[cfg(feature = "http")]
async fn post_processor<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    config: &ProcessorConfig,
    path: &str,
    body: &serde_json::Value,
) -> Result<T, GatewayError> {
    let url = format!("{}{}", config.base_url.trim_end_matches('/'), path);
    let response = client
        .post(&url)
        .basic_auth(&config.key_id, Some(&config.key_secret))
        .json(body)
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Unavailable
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected {
            message: format!("{}: {}", status, message),
        });
    }

    response.json::<T>().await.map_err(|err| GatewayError::Rejected {
        message: format!("malformed processor response: {}", err),
    })
}
