//! Webhook signature verification.
//!
//! Providers sign the raw request body with a shared secret using
//! HMAC-SHA256 and send the hex digest alongside it.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::webhooks::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(secret: &str, payload: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::NotConfigured(e.to_string()))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature.
///
/// Accepts the bare hex digest or a `sha256=<hex>` prefixed one.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), WebhookError> {
    if signature.is_empty() || secret.is_empty() {
        return Err(WebhookError::InvalidSignature);
    }

    let provided = signature.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let provided = hex::decode(provided).map_err(|_| WebhookError::InvalidSignature)?;

    let expected = compute_signature(secret, payload)?;
    let expected = hex::decode(expected).map_err(|_| WebhookError::InvalidSignature)?;

    if expected.len() != provided.len() || !bool::from(expected.ct_eq(&provided)) {
        return Err(WebhookError::InvalidSignature);
    }
    Ok(())
}

/// Answer a provider's endpoint verification challenge.
///
/// The response is `<public_key>|<signature of the challenge>`, proving the
/// endpoint holds the shared secret.
pub fn verify_challenge(challenge: &str, public_key: &str, secret: &str) -> Result<String, WebhookError> {
    if challenge.is_empty() || !challenge.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WebhookError::ParseError("challenge must be alphanumeric".into()));
    }
    if public_key.is_empty() || secret.is_empty() {
        return Err(WebhookError::NotConfigured("webhook public key and secret".into()));
    }

    let signature = compute_signature(secret, challenge.as_bytes())?;
    Ok(format!("{}|{}", public_key, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret_12345";

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"kind":"charge_succeeded","id":"e1"}"#;
        let signature = compute_signature(SECRET, body).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(body, &signature, SECRET).is_ok());
        assert!(verify_signature(body, &format!("sha256={}", signature), SECRET).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = compute_signature(SECRET, b"original").unwrap();
        let result = verify_signature(b"tampered", &signature, SECRET);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        assert!(matches!(
            verify_signature(b"body", "not-hex", SECRET),
            Err(WebhookError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(b"body", "", SECRET),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_challenge() {
        let response = verify_challenge("abc123", "pk_live", SECRET).unwrap();
        let (key, sig) = response.split_once('|').unwrap();
        assert_eq!(key, "pk_live");
        assert_eq!(sig, compute_signature(SECRET, b"abc123").unwrap());
    }

    #[test]
    fn test_verify_challenge_rejects_non_alphanumeric() {
        assert!(verify_challenge("abc;rm", "pk", SECRET).is_err());
        assert!(matches!(
            verify_challenge("abc", "", SECRET),
            Err(WebhookError::NotConfigured(_))
        ));
    }
}
