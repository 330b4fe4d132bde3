//! API route definitions.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, invoices, webhooks};
use crate::middleware::{cors_layer, request_id};
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .route(
            "/webhooks",
            post(webhooks::receive_webhook).get(webhooks::verify_endpoint),
        )
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state)
}

/// The router with request ids, tracing and CORS applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_router(state)
        .layer(axum::middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/customers", customer_routes())
}

fn customer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/{customer_id}/invoices/{transaction_id}",
            get(invoices::view_invoice),
        )
        .route(
            "/{customer_id}/invoices/{transaction_id}/pdf",
            get(invoices::download_invoice),
        )
}
