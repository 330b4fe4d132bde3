//! Parsed webhook notifications.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ids::{EventId, SubscriptionId};

/// A provider webhook notification.
///
/// `kind` is the provider's event type name (`subscription_canceled`,
/// `charge.succeeded`, ...). The rest of the payload is kept verbatim.
///
/// Only `kind` is strict; `id` and `timestamp` never fail parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub kind: String,
    /// Numeric ids are kept as their decimal text; a missing id is empty.
    #[serde(default = "empty_event_id", deserialize_with = "lenient_event_id")]
    pub id: EventId,
    /// `None` when absent or in a format that is not recognised.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookNotification {
    pub fn new(kind: impl Into<String>, id: impl Into<EventId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            timestamp: None,
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// The subscription this notification is about, if any.
    ///
    /// Accepts both `{"subscription": {"id": ..}}` and a flat
    /// `{"subscription_id": ..}`.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.extra
            .get("subscription")
            .and_then(|s| s.get("id"))
            .or_else(|| self.extra.get("subscription_id"))
            .and_then(Value::as_str)
            .map(SubscriptionId::from)
    }
}

fn empty_event_id() -> EventId {
    EventId::new("")
}

fn lenient_event_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EventId, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => EventId::new(id),
        None | Some(Value::Null) => empty_event_id(),
        Some(other) => EventId::new(other.to_string()),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(parse_timestamp))
}

/// Read a provider timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` in UTC, or
/// unix seconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|t| t.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_notification() {
        let n: WebhookNotification =
            serde_json::from_str(r#"{"kind":"charge_succeeded","id":"event-id"}"#).unwrap();
        assert_eq!(n.kind, "charge_succeeded");
        assert_eq!(n.id.as_str(), "event-id");
        assert!(n.extra.is_empty());
    }

    #[test]
    fn test_subscription_id_nested() {
        let n: WebhookNotification = serde_json::from_str(
            r#"{"kind":"subscription_canceled","id":"e1","subscription":{"id":"sub_9"}}"#,
        )
        .unwrap();
        assert_eq!(n.subscription_id(), Some(SubscriptionId::from("sub_9")));
    }

    #[test]
    fn test_subscription_id_flat() {
        let n = WebhookNotification::new("subscription_expired", "e2")
            .with_field("subscription_id", Value::from("sub_3"));
        assert_eq!(n.subscription_id(), Some(SubscriptionId::from("sub_3")));
    }

    #[test]
    fn test_numeric_id_kept_as_text() {
        let n: WebhookNotification =
            serde_json::from_str(r#"{"kind":"foo_bar","id":42}"#).unwrap();
        assert_eq!(n.id.as_str(), "42");

        let n: WebhookNotification = serde_json::from_str(r#"{"kind":"foo_bar"}"#).unwrap();
        assert_eq!(n.id.as_str(), "");
    }

    #[test]
    fn test_timestamp_formats() {
        let parse = |body: &str| -> Option<DateTime<Utc>> {
            serde_json::from_str::<WebhookNotification>(body)
                .unwrap()
                .timestamp
        };
        let expected = DateTime::from_timestamp(1_700_000_000, 0);

        assert_eq!(parse(r#"{"kind":"k","id":"e","timestamp":1700000000}"#), expected);
        assert_eq!(
            parse(r#"{"kind":"k","id":"e","timestamp":"2023-11-14T22:13:20Z"}"#),
            expected
        );
        assert_eq!(
            parse(r#"{"kind":"k","id":"e","timestamp":"2023-11-14 22:13:20"}"#),
            expected
        );
        assert_eq!(parse(r#"{"kind":"k","id":"e","timestamp":"last tuesday"}"#), None);
        assert_eq!(parse(r#"{"kind":"k","id":"e","timestamp":null}"#), None);
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let result: Result<WebhookNotification, _> = serde_json::from_str(r#"{"id":"e3"}"#);
        assert!(result.is_err());
    }
}
