//! Invoices rendered from provider transactions.
//!
//! An [`Invoice`] is a per-request view over a `(customer, transaction)`
//! pair. All amounts come from the transaction; nothing here is stored.

use std::sync::Arc;

use cashbox_core::{Billable, CurrencyFormatter, Transaction};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::render::{DEFAULT_TEMPLATE, InvoiceRenderer, RenderError};

/// Flat VAT rate applied by [`Invoice::vat`].
///
/// This is independent of the customer's own tax percentage, which only
/// feeds [`Invoice::net`].
pub const VAT_RATE: f64 = 0.27;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Invoice data is missing a product name")]
    MissingProduct,
    #[error("Invoice context error: {0}")]
    Context(#[from] serde_json::Error),
}

/// Caller-supplied data bound into the invoice template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceData {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product: String,
    /// Zone the invoice date is displayed in. UTC when unset.
    #[serde(skip)]
    pub timezone: Option<Tz>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceData {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            ..Default::default()
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// A downloadable PDF invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDownload {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl InvoiceDownload {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// What templates see under `invoice`.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSummary {
    pub id: String,
    pub date: String,
    pub date_iso: String,
    pub currency: String,
    pub raw_total: f64,
    pub total: String,
    pub subtotal: String,
    pub has_add_on: bool,
    pub add_ons: Vec<String>,
    pub add_on_amount: String,
    pub has_discount: bool,
    pub coupons: Vec<String>,
    pub discount_amount: String,
    pub vat_percentage: f64,
    pub vat_rate_percent: f64,
    pub net: String,
    pub vat: String,
}

pub struct Invoice<U: Billable> {
    user: U,
    transaction: Transaction,
    formatter: Arc<dyn CurrencyFormatter>,
}

impl<U: Billable> Invoice<U> {
    pub fn new(user: U, transaction: Transaction, formatter: Arc<dyn CurrencyFormatter>) -> Self {
        Self {
            user,
            transaction,
            formatter,
        }
    }

    pub fn id(&self) -> &str {
        self.transaction.id.as_str()
    }

    pub fn user(&self) -> &U {
        &self.user
    }

    /// When the transaction was created, in `timezone` (UTC by default).
    pub fn date(&self, timezone: Option<Tz>) -> DateTime<Tz> {
        self.transaction
            .created_at
            .with_timezone(&timezone.unwrap_or(Tz::UTC))
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.transaction.created_at
    }

    /// Transaction amount, never below zero.
    pub fn raw_total(&self) -> f64 {
        self.transaction.amount.max(0.0)
    }

    pub fn total(&self) -> String {
        self.format_amount(self.raw_total())
    }

    /// Total before discounts were taken off.
    pub fn subtotal(&self) -> String {
        self.format_amount((self.transaction.amount + self.discount_amount()).max(0.0))
    }

    pub fn has_add_on(&self) -> bool {
        !self.transaction.add_ons.is_empty()
    }

    pub fn add_on_amount(&self) -> f64 {
        self.transaction.add_ons.iter().map(|a| a.amount).sum::<f64>().max(0.0)
    }

    /// Add-on ids in the order the provider listed them.
    pub fn add_ons(&self) -> Vec<&str> {
        self.transaction.add_ons.iter().map(|a| a.id.as_str()).collect()
    }

    pub fn has_discount(&self) -> bool {
        !self.transaction.discounts.is_empty()
    }

    pub fn discount_amount(&self) -> f64 {
        self.transaction.discounts.iter().map(|d| d.amount).sum::<f64>().max(0.0)
    }

    /// Discount ids in the order the provider listed them.
    pub fn coupons(&self) -> Vec<&str> {
        self.transaction.discounts.iter().map(|d| d.id.as_str()).collect()
    }

    /// The customer's own tax percentage.
    pub fn vat_percentage(&self) -> f64 {
        self.user.tax_percentage()
    }

    /// Total with the customer's tax taken out.
    pub fn net(&self) -> f64 {
        self.raw_total() / (1.0 + self.vat_percentage() / 100.0)
    }

    pub fn vat(&self) -> f64 {
        self.net() * VAT_RATE
    }

    pub fn format_amount(&self, amount: f64) -> String {
        self.formatter.format(amount)
    }

    /// Provider field without a typed accessor.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.transaction.field(name)
    }

    pub fn as_transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn summary(&self, timezone: Option<Tz>) -> InvoiceSummary {
        let date = self.date(timezone);
        InvoiceSummary {
            id: self.id().to_string(),
            date: date.format("%b %-d, %Y").to_string(),
            date_iso: date.to_rfc3339(),
            currency: self.formatter.currency().to_string(),
            raw_total: self.raw_total(),
            total: self.total(),
            subtotal: self.subtotal(),
            has_add_on: self.has_add_on(),
            add_ons: self.add_ons().into_iter().map(String::from).collect(),
            add_on_amount: self.format_amount(self.add_on_amount()),
            has_discount: self.has_discount(),
            coupons: self.coupons().into_iter().map(String::from).collect(),
            discount_amount: self.format_amount(self.discount_amount()),
            vat_percentage: self.vat_percentage(),
            vat_rate_percent: VAT_RATE * 100.0,
            net: self.format_amount(self.net()),
            vat: self.format_amount(self.vat()),
        }
    }

    /// Template context: the caller's data plus `invoice` and `user`.
    pub fn context(&self, data: &InvoiceData) -> Result<Value, InvoiceError> {
        let mut ctx = data.extra.clone();
        ctx.insert(
            "vendor".into(),
            data.vendor.clone().map(Value::from).unwrap_or(Value::Null),
        );
        ctx.insert("product".into(), Value::from(data.product.clone()));
        ctx.insert(
            "invoice".into(),
            serde_json::to_value(self.summary(data.timezone))?,
        );
        ctx.insert("user".into(), self.user.template_context());
        Ok(Value::Object(ctx))
    }

    /// Render the invoice as HTML.
    pub fn view(
        &self,
        renderer: &InvoiceRenderer,
        data: &InvoiceData,
        template: Option<&str>,
    ) -> Result<String, InvoiceError> {
        let template = template.unwrap_or(DEFAULT_TEMPLATE);
        debug!(invoice_id = %self.id(), template, "Rendering invoice");
        Ok(renderer.templates.render(template, &self.context(data)?)?)
    }

    /// Render the invoice as PDF bytes.
    pub fn pdf(
        &self,
        renderer: &InvoiceRenderer,
        data: &InvoiceData,
        template: Option<&str>,
    ) -> Result<Vec<u8>, InvoiceError> {
        let html = self.view(renderer, data, template)?;
        let title = format!("{} receipt {}", data.product, self.id());
        Ok(renderer.pdf.render_pdf(title.trim(), &html)?)
    }

    /// `<product>_<month>_<year>.pdf`, month unpadded.
    pub fn filename(&self, data: &InvoiceData) -> Result<String, InvoiceError> {
        if data.product.trim().is_empty() {
            return Err(InvoiceError::MissingProduct);
        }
        let date = self.date(data.timezone);
        let product: String = data
            .product
            .chars()
            .map(|c| if matches!(c, '"' | '/' | '\\') { '_' } else { c })
            .collect();
        Ok(format!("{}_{}_{}.pdf", product, date.month(), date.year()))
    }

    /// Render the PDF and wrap it as an attachment.
    pub fn download(
        &self,
        renderer: &InvoiceRenderer,
        data: &InvoiceData,
        template: Option<&str>,
    ) -> Result<InvoiceDownload, InvoiceError> {
        let filename = self.filename(data)?;
        let bytes = self.pdf(renderer, data, template)?;
        Ok(InvoiceDownload {
            filename,
            content_type: "application/pdf",
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbox_core::{CurrencyFormat, Customer};
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap()
    }

    fn invoice(amount: f64, tax: f64) -> Invoice<Customer> {
        let tx = Transaction::new("tx_1", amount, created())
            .with_add_on("seats", 5.0)
            .with_add_on("support", 2.5)
            .with_discount("WELCOME", 10.0);
        Invoice::new(
            Customer::new("cus_1").with_tax_percentage(tax),
            tx,
            Arc::new(CurrencyFormat::default()),
        )
    }

    #[test]
    fn test_raw_total_clamped() {
        assert_eq!(invoice(-5.0, 0.0).raw_total(), 0.0);
        assert_eq!(invoice(-5.0, 0.0).total(), "$0.00");
        assert_eq!(invoice(42.0, 0.0).raw_total(), 42.0);
    }

    #[test]
    fn test_subtotal_adds_back_discounts() {
        let inv = invoice(90.0, 0.0);
        assert_eq!(inv.subtotal(), "$100.00");
        assert_eq!(inv.total(), "$90.00");
    }

    #[test]
    fn test_add_ons_and_coupons() {
        let inv = invoice(90.0, 0.0);
        assert!(inv.has_add_on());
        assert!(inv.has_discount());
        assert_eq!(inv.add_on_amount(), 7.5);
        assert_eq!(inv.discount_amount(), 10.0);
        assert_eq!(inv.add_ons(), vec!["seats", "support"]);
        assert_eq!(inv.coupons(), vec!["WELCOME"]);
    }

    #[test]
    fn test_empty_collections() {
        let inv = Invoice::new(
            Customer::new("cus_2"),
            Transaction::new("tx_2", 10.0, created()),
            Arc::new(CurrencyFormat::default()),
        );
        assert!(!inv.has_add_on());
        assert!(!inv.has_discount());
        assert_eq!(inv.add_on_amount(), 0.0);
        assert_eq!(inv.discount_amount(), 0.0);
        assert!(inv.add_ons().is_empty());
    }

    #[test]
    fn test_net_and_vat() {
        let inv = invoice(127.0, 27.0);
        assert!((inv.net() - 100.0).abs() < 1e-9);
        assert!((inv.vat() - 27.0).abs() < 1e-9);
        assert_eq!(inv.vat_percentage(), 27.0);
    }

    #[test]
    fn test_vat_rate_is_fixed_regardless_of_customer_rate() {
        let inv = invoice(110.0, 10.0);
        assert!((inv.net() - 100.0).abs() < 1e-9);
        assert!((inv.vat() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_date_timezone() {
        let inv = invoice(1.0, 0.0);
        assert_eq!(inv.date(None).month(), 3);
        let budapest = inv.date(Some(chrono_tz::Europe::Budapest));
        assert_eq!(budapest.month(), 4);
        assert_eq!(budapest.day(), 1);
    }

    #[test]
    fn test_filename() {
        let inv = invoice(1.0, 0.0);
        let data = InvoiceData::new("Pro");
        assert_eq!(inv.filename(&data).unwrap(), "Pro_3_2024.pdf");
        let data = data.with_timezone(chrono_tz::Asia::Tokyo);
        assert_eq!(inv.filename(&data).unwrap(), "Pro_4_2024.pdf");
        assert!(matches!(
            inv.filename(&InvoiceData::default()),
            Err(InvoiceError::MissingProduct)
        ));
    }

    #[test]
    fn test_field_passthrough() {
        let tx = Transaction::new("tx_3", 1.0, created())
            .with_field("plan_id", Value::from("gold"));
        let inv = Invoice::new(Customer::new("c"), tx, Arc::new(CurrencyFormat::default()));
        assert_eq!(inv.field("plan_id"), Some(&Value::from("gold")));
        assert!(inv.field("missing").is_none());
    }

    #[test]
    fn test_custom_formatter() {
        let inv = Invoice::new(
            Customer::new("c"),
            Transaction::new("tx_4", 1500.0, created()),
            Arc::new(|amount: f64| format!("{:.0} Ft", amount)),
        );
        assert_eq!(inv.total(), "1500 Ft");
    }

    #[test]
    fn test_context_binds_invoice_and_user() {
        let inv = invoice(90.0, 0.0);
        let ctx = inv
            .context(&InvoiceData::new("Pro").with_field("street", Value::from("1 Main St")))
            .unwrap();
        assert_eq!(ctx["product"], "Pro");
        assert_eq!(ctx["street"], "1 Main St");
        assert_eq!(ctx["invoice"]["total"], "$90.00");
        assert_eq!(ctx["invoice"]["date"], "Mar 31, 2024");
        assert_eq!(ctx["user"]["id"], "cus_1");
        assert!(ctx["vendor"].is_null());
    }

    #[test]
    fn test_context_keeps_invoice_with_non_finite_amounts() {
        let inv = invoice(f64::NAN, 0.0);
        let ctx = inv.context(&InvoiceData::new("Pro")).unwrap();
        assert!(ctx["invoice"].is_object());
        assert_eq!(ctx["invoice"]["id"], "tx_1");
    }
}
