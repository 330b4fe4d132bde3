//! Billable customers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::CustomerId;

/// Anything an invoice can be issued to.
pub trait Billable: Send + Sync {
    fn billable_id(&self) -> String;

    /// Tax percentage applied to this customer's charges, e.g. `27.0`.
    fn tax_percentage(&self) -> f64 {
        0.0
    }

    /// The value bound to `user` when rendering invoice templates.
    fn template_context(&self) -> Value;
}

/// A customer record as the application knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub tax_percentage: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    pub fn new(id: impl Into<CustomerId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            tax_percentage: 0.0,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tax_percentage(mut self, percentage: f64) -> Self {
        self.tax_percentage = percentage;
        self
    }
}

impl Billable for Customer {
    fn billable_id(&self) -> String {
        self.id.to_string()
    }

    fn tax_percentage(&self) -> f64 {
        self.tax_percentage
    }

    fn template_context(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_template_context() {
        let customer = Customer::new("cus_1")
            .with_name("Ada Lovelace")
            .with_tax_percentage(27.0);
        let ctx = customer.template_context();
        assert_eq!(ctx["id"], "cus_1");
        assert_eq!(ctx["name"], "Ada Lovelace");
        assert_eq!(ctx["tax_percentage"], 27.0);
    }

    #[test]
    fn test_tax_percentage_defaults_to_zero() {
        let customer: Customer = serde_json::from_str(r#"{"id":"cus_2"}"#).unwrap();
        assert_eq!(customer.tax_percentage(), 0.0);
    }
}
