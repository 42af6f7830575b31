//! Event — an immutable record of something that happened on a thing.

use serde_json::{Map, Value as JsonValue, json};

use crate::time::{self, Timestamp};

/// An occurrence of an event, stamped at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    data: Option<JsonValue>,
    time: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(name: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            name: name.into(),
            data,
            time: time::now(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data(&self) -> Option<&JsonValue> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// `{ <name>: {timestamp, data?} }`
    #[must_use]
    pub fn as_event_description(&self) -> JsonValue {
        let mut body = Map::new();
        body.insert("timestamp".to_string(), json!(time::format(&self.time)));
        if let Some(data) = &self.data {
            body.insert("data".to_string(), data.clone());
        }
        let mut description = Map::new();
        description.insert(self.name.clone(), JsonValue::Object(body));
        JsonValue::Object(description)
    }
}
