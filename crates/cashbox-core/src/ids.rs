//! Provider-assigned identifiers.
//!
//! Payment providers hand out opaque string ids, so unlike locally minted
//! ids these carry no prefix and are never generated here.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(TransactionId);
define_id!(EventId);
define_id!(SubscriptionId);
define_id!(CustomerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_verbatim() {
        let id = TransactionId::new("8xk2m1");
        assert_eq!(id.to_string(), "8xk2m1");
        assert_eq!(id.as_str(), "8xk2m1");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = EventId::from("event-id");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"event-id\"");
    }
}
