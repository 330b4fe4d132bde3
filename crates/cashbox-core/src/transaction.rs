//! Transaction records as reported by the payment provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::TransactionId;

/// A priced extra line item attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// A priced reduction applied to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// A charge as recorded by the provider.
///
/// Only the fields the billing layer reads are modelled. Everything else the
/// provider sends is kept in `extra` and reachable through [`Transaction::field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_iso_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    pub fn new(id: impl Into<TransactionId>, amount: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            amount,
            currency_iso_code: None,
            status: None,
            created_at,
            add_ons: vec![],
            discounts: vec![],
            extra: Map::new(),
        }
    }

    pub fn with_add_on(mut self, id: impl Into<String>, amount: f64) -> Self {
        self.add_ons.push(AddOn {
            id: id.into(),
            amount,
            quantity: None,
        });
        self
    }

    pub fn with_discount(mut self, id: impl Into<String>, amount: f64) -> Self {
        self.discounts.push(Discount {
            id: id.into(),
            amount,
            quantity: None,
        });
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Look up a provider field that has no typed accessor.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unknown_fields_land_in_extra() {
        let json = r#"{
            "id": "tx_1",
            "amount": 19.99,
            "created_at": "2024-03-05T10:00:00Z",
            "type": "sale",
            "merchant_account_id": "acme"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.field("type"), Some(&Value::from("sale")));
        assert_eq!(tx.field("merchant_account_id"), Some(&Value::from("acme")));
        assert!(tx.field("amount").is_none());
        assert!(tx.add_ons.is_empty());
    }

    #[test]
    fn test_builder_preserves_collection_order() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let tx = Transaction::new("tx_2", 10.0, created)
            .with_add_on("seats", 2.0)
            .with_add_on("support", 3.0);
        let ids: Vec<_> = tx.add_ons.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["seats", "support"]);
    }
}
