//! Application state shared across handlers.

use cashbox_billing::{
    Fixtures, InMemoryGateway, InvoiceRenderer, JsonNotificationParser, NotificationParser,
    SignedNotificationParser, TeraRenderer, TextPdfRenderer, WebhookDispatcher,
};
use cashbox_core::CurrencyFormatter;
use cashbox_core::ports::{CustomerDirectory, TransactionGateway};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, BillingConfig};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<WebhookDispatcher>,
    pub transactions: Arc<dyn TransactionGateway>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub renderer: InvoiceRenderer,
    pub formatter: Arc<dyn CurrencyFormatter>,
    pub billing: BillingConfig,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<WebhookDispatcher>,
        transactions: Arc<dyn TransactionGateway>,
        customers: Arc<dyn CustomerDirectory>,
        renderer: InvoiceRenderer,
        billing: BillingConfig,
    ) -> Self {
        Self {
            dispatcher,
            transactions,
            customers,
            renderer,
            formatter: Arc::new(billing.currency_format()),
            billing,
        }
    }

    /// Wire the service from configuration: fixtures-backed gateway,
    /// signature checking when a secret is set, and templates.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let billing = config.billing.clone();

        let gateway = Arc::new(match &billing.fixtures {
            Some(path) => InMemoryGateway::from_fixtures(Fixtures::from_path(path)?),
            None => InMemoryGateway::new(),
        });

        let parser: Arc<dyn NotificationParser> = match &billing.webhook_secret {
            Some(secret) => Arc::new(SignedNotificationParser::new(secret.clone())),
            None => {
                warn!("No webhook secret configured, accepting unsigned webhooks");
                Arc::new(JsonNotificationParser)
            }
        };
        let dispatcher =
            WebhookDispatcher::new(parser).with_subscription_lifecycle(gateway.clone());

        let mut templates = TeraRenderer::new()?;
        if let Some(dir) = &billing.template_dir {
            templates = templates.with_template_dir(dir)?;
        }
        let renderer = InvoiceRenderer::new(Arc::new(templates), Arc::new(TextPdfRenderer::default()));

        info!(
            handlers = ?dispatcher.handler_names(),
            currency = %billing.currency,
            "Billing configured"
        );

        Ok(Self::new(
            Arc::new(dispatcher),
            gateway.clone(),
            gateway,
            renderer,
            billing,
        ))
    }
}
