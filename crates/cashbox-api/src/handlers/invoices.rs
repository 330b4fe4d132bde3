//! Invoice handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Response},
};
use cashbox_billing::{Invoice, InvoiceData};
use cashbox_core::{Customer, CustomerId, TransactionId};
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceParams {
    /// IANA zone for the displayed date, e.g. `Europe/Budapest`.
    pub tz: Option<String>,
    pub template: Option<String>,
}

pub async fn view_invoice(
    State(state): State<Arc<AppState>>,
    Path((customer_id, transaction_id)): Path<(String, String)>,
    Query(params): Query<InvoiceParams>,
) -> Result<Html<String>, ApiError> {
    let invoice = load_invoice(&state, customer_id, transaction_id).await?;
    let data = invoice_data(&state, &params)?;

    let html = invoice.view(&state.renderer, &data, params.template.as_deref())?;
    Ok(Html(html))
}

pub async fn download_invoice(
    State(state): State<Arc<AppState>>,
    Path((customer_id, transaction_id)): Path<(String, String)>,
    Query(params): Query<InvoiceParams>,
) -> Result<Response, ApiError> {
    let invoice = load_invoice(&state, customer_id, transaction_id).await?;
    let data = invoice_data(&state, &params)?;

    let download = invoice.download(&state.renderer, &data, params.template.as_deref())?;
    info!(
        invoice_id = %invoice.id(),
        filename = %download.filename,
        bytes = download.bytes.len(),
        "Serving invoice download"
    );

    let disposition = HeaderValue::from_str(&download.content_disposition())
        .map_err(|e| ApiError::BadRequest(format!("Invalid filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(download.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

async fn load_invoice(
    state: &AppState,
    customer_id: String,
    transaction_id: String,
) -> Result<Invoice<Customer>, ApiError> {
    let customer_id = CustomerId::new(customer_id);
    let transaction_id = TransactionId::new(transaction_id);

    let customer = state
        .customers
        .find_customer(&customer_id)
        .await?
        .ok_or_else(|| cashbox_core::Error::CustomerNotFound(customer_id.to_string()))?;

    let transaction = state
        .transactions
        .find_transaction(&transaction_id)
        .await?
        .ok_or_else(|| cashbox_core::Error::TransactionNotFound(transaction_id.to_string()))?;

    // Transactions that name their customer may only be viewed by that customer.
    if let Some(owner) = transaction.field("customer_id").and_then(|v| v.as_str()) {
        if owner != customer_id.as_str() {
            return Err(cashbox_core::Error::TransactionNotFound(transaction_id.to_string()).into());
        }
    }

    Ok(Invoice::new(customer, transaction, state.formatter.clone()))
}

fn invoice_data(state: &AppState, params: &InvoiceParams) -> Result<InvoiceData, ApiError> {
    let mut data = InvoiceData::new(state.billing.product.clone());
    if let Some(vendor) = &state.billing.vendor {
        data = data.with_vendor(vendor.clone());
    }
    if let Some(tz) = &params.tz {
        let zone: Tz = tz
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Unknown timezone: {}", tz)))?;
        data = data.with_timezone(zone);
    }
    Ok(data)
}
