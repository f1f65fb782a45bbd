//! Locally logged events evaluated by the engine.
//!
//! The event log is produced by the host SDK's event-logging pipeline and
//! handed to the engine as a snapshot. The engine only reads it.

use crate::error::{CriteriaError, Result};
use crate::ir::DataType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One entry of the event log.
///
/// Wire names are camelCase (`eventType`, `eventName`, `dataFields`, `items`,
/// `total`, `createdAt`). Purchases and cart updates carry their cart items in
/// `items`; every other event carries its fields in `dataFields`.
///
/// ```rust
/// use criteria_engine::{DataType, EventRecord};
/// use serde_json::json;
///
/// let event = EventRecord::custom_event("button-clicked", json!({"animal": "cat"}))
///     .with_created_at(1_700_000_000_000);
///
/// assert_eq!(event.data_type(), Some(DataType::CustomEvent));
/// assert_eq!(event.data_fields["animal"], "cat");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub data_fields: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
}

impl EventRecord {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_name: None,
            data_fields: Map::new(),
            items: Vec::new(),
            total: None,
            created_at: None,
        }
    }

    /// A user profile update. Non-object `data_fields` are ignored.
    pub fn user(data_fields: Value) -> Self {
        Self::new(DataType::User.as_str()).with_data_fields(data_fields)
    }

    pub fn custom_event(event_name: impl Into<String>, data_fields: Value) -> Self {
        let mut event = Self::new(DataType::CustomEvent.as_str()).with_data_fields(data_fields);
        event.event_name = Some(event_name.into());
        event
    }

    pub fn purchase(items: Vec<Value>, total: f64) -> Self {
        let mut event = Self::new(DataType::Purchase.as_str());
        event.items = items;
        event.total = Some(Value::from(total));
        event
    }

    pub fn cart_update(items: Vec<Value>) -> Self {
        let mut event = Self::new(DataType::CartUpdate.as_str());
        event.items = items;
        event
    }

    pub fn with_data_fields(mut self, data_fields: Value) -> Self {
        if let Value::Object(map) = data_fields {
            self.data_fields = map;
        }
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// The data type this event is evaluated under, if `eventType` is known.
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_wire(&self.event_type)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Timestamps show up as integers, floats or numeric strings depending on the
// platform that logged them; anything else is dropped.
fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Time-ordered snapshot of locally logged events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    /// Parse an event log from JSON text.
    ///
    /// Invalid JSON or a top level that is not an array is an error. Entries
    /// that are not valid event records are skipped.
    ///
    /// ```rust
    /// use criteria_engine::EventLog;
    ///
    /// let log = EventLog::from_json_str(r#"[
    ///     {"eventType": "user", "dataFields": {"firstName": "David"}},
    ///     "not an event",
    ///     {"eventType": "customEvent", "eventName": "signup", "dataFields": {"total": "10"}}
    /// ]"#).unwrap();
    ///
    /// assert_eq!(log.len(), 2);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value.as_array().ok_or_else(|| {
            CriteriaError::InvalidEventLog(format!(
                "expected a JSON array of events, found {}",
                json_type_name(value)
            ))
        })?;

        let mut events = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match EventRecord::deserialize(entry) {
                Ok(event) => events.push(event),
                Err(err) => warn!(index, error = %err, "skipping unparsable event record"),
            }
        }

        Ok(Self { events })
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events evaluated under the given data type, in log order.
    pub fn events_of(&self, data_type: DataType) -> impl Iterator<Item = &EventRecord> + '_ {
        self.events
            .iter()
            .filter(move |event| event.data_type() == Some(data_type))
    }

    pub fn push(&mut self, event: EventRecord) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<EventRecord>> for EventLog {
    fn from(events: Vec<EventRecord>) -> Self {
        Self::from_events(events)
    }
}

impl FromIterator<EventRecord> for EventLog {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        Self::from_events(iter.into_iter().collect())
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
