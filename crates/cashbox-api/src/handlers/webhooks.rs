//! Payment-provider webhook endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use cashbox_billing::{WebhookError, WebhookPayload, WebhookResponse, verify_challenge};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Dispatch an inbound notification. Kinds without a handler get an empty 200.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mut payload = WebhookPayload::new(body.to_vec());
    if let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        payload = payload.with_signature(signature);
    }

    let response = state.dispatcher.dispatch(&payload).await.inspect_err(|e| {
        warn!(error = %e, body_len = payload.body.len(), "Webhook rejected");
    })?;

    Ok(into_http(response))
}

#[derive(Deserialize)]
pub struct ChallengeParams {
    pub challenge: String,
}

/// Answer the provider's endpoint verification challenge.
pub async fn verify_endpoint(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChallengeParams>,
) -> Result<String, ApiError> {
    let (Some(public_key), Some(secret)) = (
        state.billing.public_key.as_deref(),
        state.billing.webhook_secret.as_deref(),
    ) else {
        return Err(WebhookError::NotConfigured("webhook verification".into()).into());
    };

    Ok(verify_challenge(&params.challenge, public_key, secret)?)
}

fn into_http(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    if response.body.is_empty() {
        return status.into_response();
    }

    let mut http = (status, response.body).into_response();
    if let Some(value) = response
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        http.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    http
}
