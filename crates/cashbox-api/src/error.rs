//! API error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cashbox_billing::{InvoiceError, RenderError, WebhookError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error(transparent)]
    Invoice(#[from] InvoiceError),
    #[error(transparent)]
    Core(#[from] cashbox_core::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Webhook(e) => match e {
                WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,
                WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
                WebhookError::NotConfigured(_) => StatusCode::NOT_FOUND,
                WebhookError::HandlerError(_) | WebhookError::Core(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Invoice(InvoiceError::Render(RenderError::TemplateNotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Invoice(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(e) => match e {
                cashbox_core::Error::TransactionNotFound(_)
                | cashbox_core::Error::CustomerNotFound(_)
                | cashbox_core::Error::SubscriptionNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(WebhookError::ParseError("eof".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WebhookError::InvalidSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(cashbox_core::Error::TransactionNotFound("tx".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(InvoiceError::MissingProduct).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
