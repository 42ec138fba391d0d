use std::env;
use std::fmt;
use std::time::Duration;

use crate::gateway::ProcessorConfig;
use crate::http::DEFAULT_SIGNATURE_HEADER;
use crate::types::ArtifactKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) =>
                write!(f, "required configuration {} is not set", name),
            ConfigError::Invalid { name, value } =>
                write!(f, "configuration {} has invalid value {:?}", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Service configuration, loaded from the environment once at startup.
///
/// The webhook secret and processor credentials are required: their
/// absence is a startup-time fatal condition, never a per-request
/// error.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub webhook_secret: Vec<u8>,
    pub signature_header: String,
    pub artifact_kind: ArtifactKind,
    pub processor: ProcessorConfig,
    pub history_limit: usize,
    pub call_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = require("WEBHOOK_SECRET")?.into_bytes();
        let key_id = require("PROCESSOR_KEY_ID")?;
        let key_secret = require("PROCESSOR_KEY_SECRET")?;

        let kind_raw = env::var("ARTIFACT_KIND").unwrap_or_else(|_| "qr".to_string());
        let artifact_kind = match kind_raw.as_str() {
            "qr" | "qr_code" => ArtifactKind::QrCode,
            "link" | "payment_link" => ArtifactKind::PaymentLink,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "ARTIFACT_KIND",
                    value: kind_raw,
                })
            }
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            webhook_secret,
            signature_header: env::var("SIGNATURE_HEADER")
                .unwrap_or_else(|_| DEFAULT_SIGNATURE_HEADER.to_string()),
            artifact_kind,
            processor: ProcessorConfig {
                base_url: env::var("PROCESSOR_URL")
                    .unwrap_or_else(|_| "https://api.processor.example".to_string()),
                key_id,
                key_secret,
                artifact_ttl: Duration::from_secs(parse_var("ARTIFACT_TTL_SECS", 300)?),
            },
            history_limit: parse_var("HISTORY_LIMIT", 25)?,
            call_timeout: Duration::from_secs(parse_var("CALL_TIMEOUT_SECS", 10)?),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
