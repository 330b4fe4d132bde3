//! In-memory stand-in for the payment provider.
//!
//! Serves transactions, customers and subscriptions from fixtures loaded at
//! startup. State lives only as long as the process.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use cashbox_core::ports::{CustomerDirectory, SubscriptionRegistry, TransactionGateway};
use cashbox_core::{Customer, CustomerId, Error, Result, SubscriptionId, Transaction, TransactionId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Seed data for [`InMemoryGateway`], read from JSON or YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionId>,
}

impl Fixtures {
    /// Load fixtures from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|e| Error::InvalidFixture(format!("{}: {}", path.display(), e))),
            _ => serde_json::from_str(&contents)
                .map_err(|e| Error::InvalidFixture(format!("{}: {}", path.display(), e))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriptionState {
    Active,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct InMemoryGateway {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    transactions: RwLock<HashMap<TransactionId, Transaction>>,
    subscriptions: RwLock<HashMap<SubscriptionId, SubscriptionState>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        info!(
            customers = fixtures.customers.len(),
            transactions = fixtures.transactions.len(),
            subscriptions = fixtures.subscriptions.len(),
            "Loaded gateway fixtures"
        );
        fixtures
            .customers
            .into_iter()
            .fold(Self::new(), Self::with_customer)
            .with_transactions(fixtures.transactions)
            .with_subscriptions(fixtures.subscriptions)
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customers
            .get_mut()
            .insert(customer.id.clone(), customer);
        self
    }

    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions
            .get_mut()
            .insert(transaction.id.clone(), transaction);
        self
    }

    fn with_transactions(self, transactions: Vec<Transaction>) -> Self {
        transactions.into_iter().fold(self, Self::with_transaction)
    }

    pub fn with_subscription(mut self, id: impl Into<SubscriptionId>) -> Self {
        self.subscriptions
            .get_mut()
            .insert(id.into(), SubscriptionState::Active);
        self
    }

    fn with_subscriptions(self, ids: Vec<SubscriptionId>) -> Self {
        ids.into_iter().fold(self, Self::with_subscription)
    }

    pub async fn is_cancelled(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.read().await.get(id) == Some(&SubscriptionState::Cancelled)
    }
}

#[async_trait]
impl TransactionGateway for InMemoryGateway {
    async fn find_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        Ok(self.transactions.read().await.get(id).cloned())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryGateway {
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }
}

#[async_trait]
impl SubscriptionRegistry for InMemoryGateway {
    async fn cancel(&self, id: &SubscriptionId) -> Result<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(id) {
            Some(state) => {
                *state = SubscriptionState::Cancelled;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_lookup() {
        let gateway = InMemoryGateway::new()
            .with_customer(Customer::new("cus_1"))
            .with_transaction(Transaction::new("tx_1", 10.0, Utc::now()));

        assert!(gateway.find_customer(&"cus_1".into()).await.unwrap().is_some());
        assert!(gateway.find_customer(&"cus_2".into()).await.unwrap().is_none());
        assert!(gateway.find_transaction(&"tx_1".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_subscription() {
        let gateway = InMemoryGateway::new().with_subscription("sub_1");
        let id = SubscriptionId::from("sub_1");

        assert!(!gateway.is_cancelled(&id).await);
        assert!(gateway.cancel(&id).await.unwrap());
        assert!(gateway.is_cancelled(&id).await);
        assert!(!gateway.cancel(&"sub_x".into()).await.unwrap());
    }

    #[test]
    fn test_fixtures_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.yaml");
        std::fs::write(
            &path,
            r#"
customers:
  - id: cus_1
    name: Ada
    tax_percentage: 27
transactions:
  - id: tx_1
    amount: 12.5
    created_at: "2024-03-05T10:00:00Z"
    discounts:
      - id: WELCOME
        amount: 2.5
subscriptions: [sub_1]
"#,
        )
        .unwrap();

        let fixtures = Fixtures::from_path(&path).unwrap();
        assert_eq!(fixtures.customers[0].tax_percentage, 27.0);
        assert_eq!(fixtures.transactions[0].discounts[0].id, "WELCOME");
        assert_eq!(fixtures.subscriptions, vec![SubscriptionId::from("sub_1")]);
    }
}
