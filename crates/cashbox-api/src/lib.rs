//! HTTP API server for Cashbox.
//!
//! Receives payment-provider webhooks and serves customer invoices.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::{build_app, create_router};
pub use state::AppState;
