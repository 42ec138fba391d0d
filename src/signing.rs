use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Compute the hex-encoded HMAC-SHA256 signature of a payload.
///
/// This is what the processor computes over the webhook body before
/// delivery; the verifier recomputes it over the exact bytes received.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .unwrap_or_else(|_| Hmac::<Sha256>::new_from_slice(b"default").expect("hmac"));
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a received webhook signature.
///
/// Must be called with the untouched wire bytes, never a re-serialized
/// parsed representation: re-serialization can reorder keys or change
/// whitespace and produce false negatives. The comparison goes through
/// `Mac::verify_slice`, which is constant-time.
pub fn verify_signature(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .unwrap_or_else(|_| Hmac::<Sha256>::new_from_slice(b"default").expect("hmac"));
    mac.update(payload);

    mac.verify_slice(&signature).is_ok()
}
