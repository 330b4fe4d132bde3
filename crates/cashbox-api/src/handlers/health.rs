//! Liveness and readiness.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub signed_webhooks: bool,
    pub webhook_handlers: Vec<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        signed_webhooks: state.billing.webhook_secret.is_some(),
        webhook_handlers: state
            .dispatcher
            .handler_names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

/// Ready once the product name invoices are issued under is known.
pub async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.billing.product.trim().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}
