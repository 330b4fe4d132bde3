//! Turning raw webhook requests into notifications.

use cashbox_core::WebhookNotification;
use tracing::warn;

use crate::signature::verify_signature;
use crate::webhooks::{WebhookError, WebhookPayload};

/// The parse step of webhook dispatch.
///
/// Swappable so each provider (or a test) can supply its own decoding and
/// authentication.
pub trait NotificationParser: Send + Sync {
    fn parse(&self, payload: &WebhookPayload) -> Result<WebhookNotification, WebhookError>;
}

/// Reads the body as a JSON notification. No authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNotificationParser;

impl NotificationParser for JsonNotificationParser {
    fn parse(&self, payload: &WebhookPayload) -> Result<WebhookNotification, WebhookError> {
        serde_json::from_slice(&payload.body).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

/// Checks the payload signature before parsing.
pub struct SignedNotificationParser {
    secret: String,
    inner: Box<dyn NotificationParser>,
}

impl SignedNotificationParser {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            inner: Box::new(JsonNotificationParser),
        }
    }

    pub fn with_inner(mut self, inner: impl NotificationParser + 'static) -> Self {
        self.inner = Box::new(inner);
        self
    }
}

impl NotificationParser for SignedNotificationParser {
    fn parse(&self, payload: &WebhookPayload) -> Result<WebhookNotification, WebhookError> {
        let signature = payload.signature.as_deref().unwrap_or_default();
        if let Err(e) = verify_signature(&payload.body, signature, &self.secret) {
            warn!(body_len = payload.body.len(), "Rejected webhook with bad signature");
            return Err(e);
        }
        self.inner.parse(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::compute_signature;

    const BODY: &str = r#"{"kind":"subscription_charged_successfully","id":"e9"}"#;

    #[test]
    fn test_json_parser() {
        let n = JsonNotificationParser
            .parse(&WebhookPayload::new(BODY))
            .unwrap();
        assert_eq!(n.kind, "subscription_charged_successfully");
    }

    #[test]
    fn test_signed_parser_accepts_valid_signature() {
        let sig = compute_signature("secret", BODY.as_bytes()).unwrap();
        let parser = SignedNotificationParser::new("secret");
        let n = parser
            .parse(&WebhookPayload::new(BODY).with_signature(sig))
            .unwrap();
        assert_eq!(n.id.as_str(), "e9");
    }

    #[test]
    fn test_signed_parser_rejects_missing_signature() {
        let parser = SignedNotificationParser::new("secret");
        let result = parser.parse(&WebhookPayload::new(BODY));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn test_signed_parser_checks_signature_before_json() {
        let parser = SignedNotificationParser::new("secret");
        let result = parser.parse(&WebhookPayload::new("{broken").with_signature("00"));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }
}
