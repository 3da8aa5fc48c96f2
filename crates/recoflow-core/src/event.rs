//! Raw and validated user events

use crate::error::{RecoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Metadata keys that may carry an item reference, in priority order
const ITEM_KEYS: [&str; 3] = ["product_id", "id", "productId"];

/// Kind of user action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    View,
    Click,
    AddToCart,
    /// Legacy cart action; classified like `AddToCart` but weighted by its own name
    Cart,
    Purchase,
    /// Any other action, kept by name so it can be audited
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::View => "view",
            EventType::Click => "click",
            EventType::AddToCart => "add_to_cart",
            EventType::Cart => "cart",
            EventType::Purchase => "purchase",
            EventType::Other(name) => name,
        }
    }

    /// Types whose item reference feeds one of the session item lists
    pub fn is_item_bearing(&self) -> bool {
        matches!(
            self,
            EventType::View | EventType::AddToCart | EventType::Cart | EventType::Purchase
        )
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "view" => EventType::View,
            "click" => EventType::Click,
            "add_to_cart" => EventType::AddToCart,
            "cart" => EventType::Cart,
            "purchase" => EventType::Purchase,
            _ => EventType::Other(name),
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        EventType::from(name.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated event with a UTC instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

impl Event {
    pub fn new(
        user_id: impl Into<String>,
        event_type: impl Into<EventType>,
        timestamp: DateTime<Utc>,
        metadata: Value,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            event_type: event_type.into(),
            timestamp,
            metadata,
        }
    }

    /// Event whose metadata references a single product
    pub fn with_item(
        user_id: impl Into<String>,
        event_type: impl Into<EventType>,
        timestamp: DateTime<Utc>,
        item_id: impl Into<String>,
    ) -> Self {
        Self::new(
            user_id,
            event_type,
            timestamp,
            serde_json::json!({ "product_id": item_id.into() }),
        )
    }

    /// Item reference carried in metadata, if one can be extracted
    pub fn item_id(&self) -> Option<String> {
        extract_item_id(&self.metadata)
    }

    /// Metadata value rendered as a string
    pub fn metadata_value(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn metadata_keys(&self) -> impl Iterator<Item = &str> {
        self.metadata
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(|k| k.as_str()))
    }
}

fn extract_item_id(metadata: &Value) -> Option<String> {
    match metadata {
        Value::Object(map) => ITEM_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(item_ref_value)),
        // Metadata stored as an encoded JSON object
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .ok()
            .filter(|v| v.is_object())
            .and_then(|v| extract_item_id(&v)),
        _ => None,
    }
}

fn item_ref_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Event as delivered by an event store, before timestamp validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub event_type: String,
    /// Any JSON value; only RFC 3339 strings pass `TryFrom`
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub metadata: Value,
}

impl TryFrom<RawEvent> for Event {
    type Error = RecoError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let ts = match &raw.timestamp {
            None | Some(Value::Null) => {
                return Err(RecoError::Timestamp(format!(
                    "event for user '{}' has no timestamp",
                    raw.user_id
                )));
            }
            Some(Value::String(ts)) => ts.as_str(),
            Some(other) => {
                return Err(RecoError::Timestamp(format!(
                    "event for user '{}' has a non-string timestamp {}",
                    raw.user_id, other
                )));
            }
        };
        // RFC 3339 requires an explicit offset, so naive local times are rejected
        let timestamp = DateTime::parse_from_rfc3339(ts.trim())
            .map_err(|e| {
                RecoError::Timestamp(format!(
                    "'{}' for user '{}' is not an offset-qualified RFC 3339 instant: {}",
                    ts, raw.user_id, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Event {
            user_id: raw.user_id,
            event_type: EventType::from(raw.event_type),
            timestamp,
            metadata: raw.metadata,
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
