//! Templates describing the actions and events a thing supports.

use serde_json::{Map, Value as JsonValue, json};

use crate::schema::SchemaValidator;

/// An action kind a thing can perform, before any instance exists.
#[derive(Debug, Clone)]
pub struct AvailableAction {
    metadata: Map<String, JsonValue>,
    schema: Option<JsonValue>,
}

impl AvailableAction {
    /// Create a template. The `input` member of `metadata`, when present,
    /// becomes the input schema.
    #[must_use]
    pub fn new(metadata: JsonValue) -> Self {
        let metadata = match metadata {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        let schema = metadata.get("input").cloned();
        Self { metadata, schema }
    }

    #[must_use]
    pub fn metadata(&self) -> &Map<String, JsonValue> {
        &self.metadata
    }

    #[must_use]
    pub fn schema(&self) -> Option<&JsonValue> {
        self.schema.as_ref()
    }

    /// Validate the input of a new action request. Without a schema every
    /// input is valid; a missing input is validated as `null`.
    ///
    /// # Errors
    ///
    /// Returns the validator's violation list when the input is rejected.
    pub fn validate_input(
        &self,
        input: Option<&JsonValue>,
        validator: &dyn SchemaValidator,
    ) -> Result<(), Vec<String>> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let violations = validator.validate(schema, input.unwrap_or(&JsonValue::Null));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Metadata merged with an `action` link under `href_prefix`.
    #[must_use]
    pub fn as_description(&self, name: &str, href_prefix: &str) -> JsonValue {
        with_link(&self.metadata, "action", format!("{href_prefix}/actions/{name}"))
    }
}

/// An event kind a thing can emit.
#[derive(Debug, Clone)]
pub struct AvailableEvent {
    metadata: Map<String, JsonValue>,
}

impl AvailableEvent {
    #[must_use]
    pub fn new(metadata: JsonValue) -> Self {
        let metadata = match metadata {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        Self { metadata }
    }

    #[must_use]
    pub fn metadata(&self) -> &Map<String, JsonValue> {
        &self.metadata
    }

    /// Metadata merged with an `event` link under `href_prefix`.
    #[must_use]
    pub fn as_description(&self, name: &str, href_prefix: &str) -> JsonValue {
        with_link(&self.metadata, "event", format!("{href_prefix}/events/{name}"))
    }
}

fn with_link(metadata: &Map<String, JsonValue>, rel: &str, href: String) -> JsonValue {
    let mut description = metadata.clone();
    description.insert("links".to_string(), json!([{ "rel": rel, "href": href }]));
    JsonValue::Object(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BasicSchemaValidator;

    #[test]
    fn should_accept_any_input_without_schema() {
        let toggle = AvailableAction::new(json!({"title": "Toggle"}));
        assert!(toggle.schema().is_none());
        assert!(toggle.validate_input(None, &BasicSchemaValidator).is_ok());
        assert!(
            toggle
                .validate_input(Some(&json!("whatever")), &BasicSchemaValidator)
                .is_ok()
        );
    }

    #[test]
    fn should_extract_input_schema_from_metadata() {
        let fade = AvailableAction::new(json!({
            "title": "Fade",
            "input": {"type": "object", "required": ["brightness"]}
        }));
        assert!(fade.schema().is_some());
        let err = fade
            .validate_input(Some(&json!({})), &BasicSchemaValidator)
            .unwrap_err();
        assert_eq!(err, vec!["$: missing required property `brightness`"]);
    }

    #[test]
    fn should_reject_missing_input_when_schema_requires_object() {
        let fade = AvailableAction::new(json!({"input": {"type": "object"}}));
        assert!(fade.validate_input(None, &BasicSchemaValidator).is_err());
    }

    #[test]
    fn should_render_action_link() {
        let fade = AvailableAction::new(json!({"title": "Fade"}));
        let description = fade.as_description("fade", "/things/1");
        assert_eq!(description["title"], "Fade");
        assert_eq!(description["links"][0]["rel"], "action");
        assert_eq!(description["links"][0]["href"], "/things/1/actions/fade");
    }

    #[test]
    fn should_render_event_link() {
        let overheated = AvailableEvent::new(json!({"type": "number"}));
        let description = overheated.as_description("overheated", "");
        assert_eq!(description["links"][0]["rel"], "event");
        assert_eq!(description["links"][0]["href"], "/events/overheated");
    }
}
