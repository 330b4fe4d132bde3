//! Webhook dispatch.
//!
//! A notification's `kind` is turned into a handler name (`charge_succeeded`
//! becomes `handleChargeSucceeded`) and looked up in a registry filled at
//! construction time. Kinds without a handler are acknowledged with an empty
//! 200 so the provider does not keep retrying them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cashbox_core::WebhookNotification;
use cashbox_core::ports::SubscriptionRegistry;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser::{JsonNotificationParser, NotificationParser};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Handler error: {0}")]
    HandlerError(String),
    #[error("Not configured: {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Core(#[from] cashbox_core::Error),
}

/// Raw inbound webhook request.
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    pub body: Vec<u8>,
    pub signature: Option<String>,
}

impl WebhookPayload {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// What a handler wants sent back to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl WebhookResponse {
    /// 200 with no body.
    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: body.into().into_bytes(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A handler for one notification kind.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(
        &self,
        notification: &WebhookNotification,
    ) -> Result<WebhookResponse, WebhookError>;
}

/// Adapter turning a plain closure into a [`WebhookHandler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&WebhookNotification) -> Result<WebhookResponse, WebhookError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> WebhookHandler for FnHandler<F>
where
    F: Fn(&WebhookNotification) -> Result<WebhookResponse, WebhookError> + Send + Sync,
{
    async fn handle(
        &self,
        notification: &WebhookNotification,
    ) -> Result<WebhookResponse, WebhookError> {
        (self.0)(notification)
    }
}

/// Derive the handler name for an event kind.
///
/// `_`, `.`, `-` and whitespace separate words; each word gets an uppercase
/// first letter and the rest is kept as-is.
pub fn handler_name(kind: &str) -> String {
    let mut name = String::from("handle");
    for word in kind
        .split(|c: char| c == '_' || c == '.' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

/// Routes notifications to the handlers registered for their kind.
pub struct WebhookDispatcher {
    parser: Arc<dyn NotificationParser>,
    handlers: HashMap<String, Arc<dyn WebhookHandler>>,
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(JsonNotificationParser))
    }
}

impl WebhookDispatcher {
    pub fn new(parser: Arc<dyn NotificationParser>) -> Self {
        Self {
            parser,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`. Kinds deriving the same handler name
    /// (`charge.succeeded`, `charge_succeeded`) share one slot; the last
    /// registration wins.
    pub fn on(mut self, kind: &str, handler: impl WebhookHandler + 'static) -> Self {
        self.handlers.insert(handler_name(kind), Arc::new(handler));
        self
    }

    /// Cancel subscriptions when the provider reports them cancelled or expired.
    pub fn with_subscription_lifecycle(self, registry: Arc<dyn SubscriptionRegistry>) -> Self {
        self.on(
            "subscription_canceled",
            CancelSubscription::new(registry.clone()),
        )
        .on("subscription_expired", CancelSubscription::new(registry))
    }

    pub fn has_handler(&self, kind: &str) -> bool {
        self.handlers.contains_key(&handler_name(kind))
    }

    /// Registered handler names, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse a raw payload and dispatch it.
    ///
    /// Parse failures are returned as errors; an unknown kind is not an error.
    pub async fn dispatch(&self, payload: &WebhookPayload) -> Result<WebhookResponse, WebhookError> {
        let notification = self.parser.parse(payload)?;
        self.dispatch_notification(&notification).await
    }

    /// Dispatch an already parsed notification.
    pub async fn dispatch_notification(
        &self,
        notification: &WebhookNotification,
    ) -> Result<WebhookResponse, WebhookError> {
        let method = handler_name(&notification.kind);

        match self.handlers.get(&method) {
            Some(handler) => {
                info!(
                    event_id = %notification.id,
                    kind = %notification.kind,
                    handler = %method,
                    "Handling webhook"
                );
                handler.handle(notification).await
            }
            None => {
                debug!(
                    event_id = %notification.id,
                    kind = %notification.kind,
                    "No handler registered, acknowledging"
                );
                Ok(WebhookResponse::ok())
            }
        }
    }
}

/// Marks the notification's subscription as cancelled.
pub struct CancelSubscription {
    registry: Arc<dyn SubscriptionRegistry>,
}

impl CancelSubscription {
    pub fn new(registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl WebhookHandler for CancelSubscription {
    async fn handle(
        &self,
        notification: &WebhookNotification,
    ) -> Result<WebhookResponse, WebhookError> {
        match notification.subscription_id() {
            Some(id) => {
                if self.registry.cancel(&id).await? {
                    info!(event_id = %notification.id, subscription_id = %id, "Subscription cancelled");
                } else {
                    warn!(event_id = %notification.id, subscription_id = %id, "Unknown subscription");
                }
            }
            None => {
                warn!(event_id = %notification.id, kind = %notification.kind, "Notification has no subscription");
            }
        }

        Ok(WebhookResponse::text(200, "Webhook Handled"))
    }
}
