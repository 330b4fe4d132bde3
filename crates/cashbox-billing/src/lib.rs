//! Billing integration for Cashbox.
//!
//! Dispatches payment-provider webhook notifications to registered handlers
//! and renders provider transactions as invoices (HTML and PDF).

pub mod gateway;
pub mod invoice;
pub mod parser;
pub mod render;
pub mod signature;
pub mod webhooks;

pub use gateway::{Fixtures, InMemoryGateway};
pub use invoice::{Invoice, InvoiceData, InvoiceDownload, InvoiceError, InvoiceSummary, VAT_RATE};
pub use parser::{JsonNotificationParser, NotificationParser, SignedNotificationParser};
pub use render::{
    InvoiceRenderer, PdfRenderer, RenderError, TemplateRenderer, TeraRenderer, TextPdfRenderer,
    DEFAULT_TEMPLATE,
};
pub use signature::{compute_signature, verify_challenge, verify_signature};
pub use webhooks::{
    CancelSubscription, FnHandler, WebhookDispatcher, WebhookError, WebhookHandler,
    WebhookPayload, WebhookResponse, handler_fn, handler_name,
};
