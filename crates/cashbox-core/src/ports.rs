//! Port traits (hexagonal architecture).
//!
//! These traits define what the billing layer needs from the payment
//! provider and from the host application.

use crate::customer::Customer;
use crate::ids::*;
use crate::transaction::Transaction;
use crate::Result;
use async_trait::async_trait;

/// Read access to the provider's transaction records.
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Find a transaction by its provider id.
    async fn find_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>>;
}

/// Lookup of the customers invoices are issued to.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Find a customer by id.
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>>;
}

/// Subscription state owned by the host application.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Mark a subscription as cancelled.
    ///
    /// Returns `false` when the subscription is unknown.
    async fn cancel(&self, id: &SubscriptionId) -> Result<bool>;
}
