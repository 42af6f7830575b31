//! Property — a named, typed, observable value owned by a thing.

use serde_json::{Map, Value as JsonValue, json};

use crate::error::{ValidationError, WebThingError};
use crate::schema::{self, BasicSchemaValidator, SchemaValidator};
use crate::value::Value;

/// A property of a thing.
///
/// Metadata is the JSON description advertised in the thing description
/// (`type`, `unit`, `minimum`, `readOnly`, …). It doubles as the schema the
/// property's values are validated against.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    value: Value,
    metadata: Map<String, JsonValue>,
    href_prefix: String,
}

impl Property {
    /// Create a property. Non-object metadata is treated as empty.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value, metadata: JsonValue) -> Self {
        let metadata = match metadata {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            value,
            metadata,
            href_prefix: String::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the underlying value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn metadata(&self) -> &Map<String, JsonValue> {
        &self.metadata
    }

    #[must_use]
    pub fn href(&self) -> String {
        format!("{}/properties/{}", self.href_prefix, self.name)
    }

    pub fn set_href_prefix(&mut self, prefix: impl Into<String>) {
        self.href_prefix = prefix.into();
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.metadata
            .get("readOnly")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Declared JSON Schema primitive type, if any.
    #[must_use]
    pub fn primitive_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(JsonValue::as_str)
    }

    /// Metadata merged with the property's `links`.
    #[must_use]
    pub fn as_description(&self) -> JsonValue {
        let mut description = self.metadata.clone();
        description.insert(
            "links".to_string(),
            json!([{ "rel": "property", "href": self.href() }]),
        );
        JsonValue::Object(description)
    }

    /// Check a candidate value before it is written.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ReadOnly`] when the property is read-only
    /// - [`ValidationError::TypeMismatch`] when the JSON type does not match
    ///   the declared primitive type
    /// - [`ValidationError::ConstraintViolation`] when `minimum`, `maximum`,
    ///   `enum` or similar constraints are broken
    pub fn validate_value(&self, value: &JsonValue) -> Result<(), ValidationError> {
        if self.is_read_only() {
            return Err(ValidationError::ReadOnly {
                property: self.name.clone(),
            });
        }

        if let Some(expected) = self.primitive_type()
            && !schema::matches_type(expected, value)
        {
            return Err(ValidationError::TypeMismatch {
                property: self.name.clone(),
                expected: expected.to_string(),
                found: schema::type_name(value),
            });
        }

        let schema = JsonValue::Object(self.metadata.clone());
        let violations = BasicSchemaValidator.validate(&schema, value);
        if !violations.is_empty() {
            return Err(ValidationError::ConstraintViolation {
                property: self.name.clone(),
                violations,
            });
        }
        Ok(())
    }

    /// Validate `value` then write it through the value's forwarders.
    ///
    /// # Errors
    ///
    /// Returns [`WebThingError::Validation`] (and leaves the value untouched)
    /// when validation fails, or [`WebThingError::Forwarding`] when a
    /// forwarder rejected the value after it was recorded.
    pub fn set_value(&self, value: JsonValue) -> Result<(), WebThingError> {
        self.validate_value(&value)?;
        self.value.set(value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_property() -> Property {
        Property::new(
            "on",
            Value::new(true),
            json!({"@type": "OnOffProperty", "type": "boolean", "title": "On/Off"}),
        )
    }

    fn level_property() -> Property {
        Property::new(
            "level",
            Value::new(50),
            json!({"type": "number", "readOnly": true, "unit": "percent"}),
        )
    }

    #[test]
    fn should_render_description_with_property_link() {
        let mut prop = on_property();
        prop.set_href_prefix("/things/0");

        let description = prop.as_description();

        assert_eq!(description["type"], "boolean");
        assert_eq!(description["title"], "On/Off");
        assert_eq!(description["links"][0]["rel"], "property");
        assert_eq!(description["links"][0]["href"], "/things/0/properties/on");
    }

    #[test]
    fn should_reject_write_to_read_only_property() {
        let prop = level_property();
        let err = prop.validate_value(&json!(10)).unwrap_err();
        assert!(matches!(err, ValidationError::ReadOnly { .. }));
    }

    #[test]
    fn should_reject_mismatched_type() {
        let prop = on_property();
        let err = prop.validate_value(&json!("yes")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                property: "on".to_string(),
                expected: "boolean".to_string(),
                found: "string",
            }
        );
    }

    #[test]
    fn should_accept_float_representation_for_integer_property() {
        let prop = Property::new("brightness", Value::new(50), json!({"type": "integer"}));
        assert!(prop.validate_value(&json!(66.0)).is_ok());
    }

    #[test]
    fn should_reject_value_outside_declared_range() {
        let prop = Property::new(
            "brightness",
            Value::new(50),
            json!({"type": "integer", "minimum": 0, "maximum": 100}),
        );
        let err = prop.validate_value(&json!(101)).unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }));
    }

    #[test]
    fn should_leave_value_unchanged_when_validation_fails() {
        let prop = on_property();
        assert!(prop.set_value(json!(42)).is_err());
        assert_eq!(prop.value().get(), Some(json!(true)));
    }

    #[test]
    fn should_update_value_when_valid() {
        let prop = on_property();
        prop.set_value(json!(false)).unwrap();
        assert_eq!(prop.value().get(), Some(json!(false)));
    }

    #[test]
    fn should_accept_anything_when_no_type_declared() {
        let prop = Property::new("misc", Value::default(), json!({}));
        assert!(prop.validate_value(&json!({"a": [1, 2]})).is_ok());
    }
}
