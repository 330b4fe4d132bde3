//! Error types for Cashbox.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Lookup errors
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    // Provider errors
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
