use serde_json::Value;

use crate::types::{ArtifactId, SettlementId};

/// A processor webhook event after defensive parsing.
///
/// The processor's payload format is untyped JSON it controls, so the
/// parse is a tagged-variant extraction: the known credited/paid shapes
/// yield [`WebhookEvent::Credited`], everything else (unknown event
/// names, missing nested fields, bodies that are not JSON at all) yields
/// [`WebhookEvent::Ignored`]. Parsing never fails and never panics;
/// unrecognized events are acknowledged and dropped, which keeps the
/// handler forward-compatible with event types the processor adds later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Money was received against an artifact this system may know.
    Credited {
        artifact_id: ArtifactId,
        settlement_id: SettlementId,
    },

    /// Any other shape. Carries the event name (or a placeholder) for
    /// logging only.
    Ignored { event: String },
}

/// Parse a raw webhook body into a [`WebhookEvent`].
///
/// Recognized shapes, matching the two artifact flavours:
///
/// ```json
/// {"event":"qr_code.credited",
///  "payload":{"qr_code":{"entity":{"id":"qr_..."}},
///             "payment":{"entity":{"id":"pay_..."}}}}
/// ```
///
/// and the same with `payment_link.paid` / `payload.payment_link`.
pub fn parse_event(raw: &[u8]) -> WebhookEvent {
    let Ok(value) = serde_json::from_slice::<Value>(raw) else {
        return WebhookEvent::Ignored {
            event: "<malformed>".to_string(),
        };
    };

    let event = value
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    let artifact = match event.as_str() {
        "qr_code.credited" => entity_id(&value, "qr_code"),
        "payment_link.paid" => entity_id(&value, "payment_link"),
        _ => None,
    };

    match (artifact, entity_id(&value, "payment")) {
        (Some(artifact_id), Some(settlement_id)) => WebhookEvent::Credited {
            artifact_id: ArtifactId(artifact_id),
            settlement_id: SettlementId(settlement_id),
        },
        // A credited event missing its nested ids is indistinguishable
        // from noise; treat it as ignorable rather than crash.
        _ => WebhookEvent::Ignored { event },
    }
}

fn entity_id(value: &Value, entity: &str) -> Option<String> {
    value
        .get("payload")?
        .get(entity)?
        .get("entity")?
        .get("id")?
        .as_str()
        .map(str::to_string)
}
