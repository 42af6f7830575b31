//! Notifications broadcast to subscribers after every observable change.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::action::Action;
use crate::event::Event;

/// A change notification, serialized as `{"messageType": …, "data": …}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "messageType", content = "data", rename_all = "camelCase")]
pub enum Notification {
    /// `{<property name>: <new value>}`
    PropertyStatus(JsonValue),
    /// Action description.
    ActionStatus(JsonValue),
    /// Event description.
    Event(JsonValue),
}

impl Notification {
    #[must_use]
    pub fn property_status(name: &str, value: JsonValue) -> Self {
        let mut data = Map::new();
        data.insert(name.to_string(), value);
        Self::PropertyStatus(JsonValue::Object(data))
    }

    #[must_use]
    pub fn action_status(action: &Action) -> Self {
        Self::ActionStatus(action.as_action_description())
    }

    #[must_use]
    pub fn event(event: &Event) -> Self {
        Self::Event(event.as_event_description())
    }

    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::PropertyStatus(_) => "propertyStatus",
            Self::ActionStatus(_) => "actionStatus",
            Self::Event(_) => "event",
        }
    }

    #[must_use]
    pub fn data(&self) -> &JsonValue {
        match self {
            Self::PropertyStatus(data) | Self::ActionStatus(data) | Self::Event(data) => data,
        }
    }

    /// Serialized wire form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error; never expected for JSON payloads.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
