//! HTTP middleware for the API server.

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// CORS for the invoice endpoints. Webhooks are server-to-server and
/// unaffected.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_origin(Any)
}

/// Tag each request and its response with a request id, keeping one the
/// caller already sent.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

    if let Some(id) = &request_id {
        request.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
    }

    let mut response = next.run(request).await;
    if let Some(id) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, id);
    }

    response
}
