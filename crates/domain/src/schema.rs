//! JSON Schema subset used to validate action input and property values.
//!
//! Supported keywords: `type` (string or list), `enum`, `minimum`,
//! `maximum`, `exclusiveMinimum`, `exclusiveMaximum`, `minLength`,
//! `maxLength`, `minItems`, `maxItems`, `items`, `required` and
//! `properties`. Unknown keywords (`@type`, `unit`, `title`, …) are
//! ignored, so thing metadata can be validated as-is.

use serde_json::Value as JsonValue;

/// Validates a JSON document against a schema.
///
/// The result is the list of human-readable violations; an empty list means
/// the document is valid.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, schema: &JsonValue, document: &JsonValue) -> Vec<String>;
}

/// Built-in validator covering the keywords listed in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicSchemaValidator;

impl SchemaValidator for BasicSchemaValidator {
    fn validate(&self, schema: &JsonValue, document: &JsonValue) -> Vec<String> {
        let mut violations = Vec::new();
        check(schema, document, "$", &mut violations);
        violations
    }
}

/// Name of the JSON type of `value`, distinguishing integral numbers.
#[must_use]
pub fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) if is_integral(value) => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Whether `value` matches the JSON Schema primitive type `primitive`.
///
/// `integer` accepts any number with an integral value regardless of its
/// representation, `number` accepts every number. Unknown type names match
/// everything.
#[must_use]
pub fn matches_type(primitive: &str, value: &JsonValue) -> bool {
    match primitive {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "number" => value.is_number(),
        "integer" => is_integral(value),
        _ => true,
    }
}

fn is_integral(value: &JsonValue) -> bool {
    value.is_i64()
        || value.is_u64()
        || value
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn check(schema: &JsonValue, doc: &JsonValue, path: &str, out: &mut Vec<String>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(declared) = schema.get("type") {
        let allowed: Vec<&str> = match declared {
            JsonValue::String(t) => vec![t.as_str()],
            JsonValue::Array(list) => list.iter().filter_map(JsonValue::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(t, doc)) {
            out.push(format!(
                "{path}: expected {}, found {}",
                allowed.join(" or "),
                type_name(doc)
            ));
            return;
        }
    }

    if let Some(JsonValue::Array(options)) = schema.get("enum")
        && !options.contains(doc)
    {
        out.push(format!("{path}: value is not one of the allowed values"));
    }

    if let Some(n) = doc.as_f64() {
        check_bound(schema, "minimum", path, out, |min| n >= min, ">=");
        check_bound(schema, "maximum", path, out, |max| n <= max, "<=");
        check_bound(schema, "exclusiveMinimum", path, out, |min| n > min, ">");
        check_bound(schema, "exclusiveMaximum", path, out, |max| n < max, "<");
    }

    match doc {
        JsonValue::String(s) => {
            let len = s.chars().count();
            check_len(schema, "minLength", path, out, |min| len >= min, "at least");
            check_len(schema, "maxLength", path, out, |max| len <= max, "at most");
        }
        JsonValue::Array(items) => {
            let len = items.len();
            check_len(schema, "minItems", path, out, |min| len >= min, "at least");
            check_len(schema, "maxItems", path, out, |max| len <= max, "at most");
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    check(item_schema, item, &format!("{path}[{i}]"), out);
                }
            }
        }
        JsonValue::Object(fields) => {
            if let Some(JsonValue::Array(required)) = schema.get("required") {
                for name in required.iter().filter_map(JsonValue::as_str) {
                    if !fields.contains_key(name) {
                        out.push(format!("{path}: missing required property `{name}`"));
                    }
                }
            }
            if let Some(JsonValue::Object(props)) = schema.get("properties") {
                for (name, sub_schema) in props {
                    if let Some(value) = fields.get(name) {
                        check(sub_schema, value, &format!("{path}.{name}"), out);
                    }
                }
            }
        }
        _ => {}
    }
}

fn check_bound(
    schema: &serde_json::Map<String, JsonValue>,
    keyword: &str,
    path: &str,
    out: &mut Vec<String>,
    ok: impl Fn(f64) -> bool,
    op: &str,
) {
    if let Some(bound) = schema.get(keyword).and_then(JsonValue::as_f64)
        && !ok(bound)
    {
        out.push(format!("{path}: must be {op} {bound}"));
    }
}

fn check_len(
    schema: &serde_json::Map<String, JsonValue>,
    keyword: &str,
    path: &str,
    out: &mut Vec<String>,
    ok: impl Fn(usize) -> bool,
    qualifier: &str,
) {
    let bound = schema
        .get(keyword)
        .and_then(JsonValue::as_u64)
        .and_then(|b| usize::try_from(b).ok());
    if let Some(bound) = bound
        && !ok(bound)
    {
        out.push(format!("{path}: length must be {qualifier} {bound}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fade_schema() -> JsonValue {
        json!({
            "type": "object",
            "required": ["brightness", "duration"],
            "properties": {
                "brightness": {"type": "integer", "minimum": 0, "maximum": 100},
                "duration": {"type": "integer", "minimum": 1}
            }
        })
    }

    #[test]
    fn should_accept_valid_document() {
        let violations =
            BasicSchemaValidator.validate(&fade_schema(), &json!({"brightness": 50, "duration": 10}));
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn should_report_missing_required_property() {
        let violations = BasicSchemaValidator.validate(&fade_schema(), &json!({"brightness": 50}));
        assert_eq!(violations, vec!["$: missing required property `duration`"]);
    }

    #[test]
    fn should_report_out_of_range_nested_value() {
        let violations = BasicSchemaValidator
            .validate(&fade_schema(), &json!({"brightness": 150, "duration": 10}));
        assert_eq!(violations, vec!["$.brightness: must be <= 100"]);
    }

    #[test]
    fn should_report_type_mismatch_and_stop_descending() {
        let violations = BasicSchemaValidator.validate(&fade_schema(), &json!("bright"));
        assert_eq!(violations, vec!["$: expected object, found string"]);
    }

    #[test]
    fn should_treat_null_as_type_mismatch_for_object_schema() {
        let violations = BasicSchemaValidator.validate(&fade_schema(), &JsonValue::Null);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn should_accept_integral_float_as_integer() {
        assert!(matches_type("integer", &json!(66.0)));
        assert!(!matches_type("integer", &json!(66.5)));
        assert!(matches_type("number", &json!(3)));
    }

    #[test]
    fn should_check_enum_membership() {
        let schema = json!({"type": "string", "enum": ["low", "high"]});
        assert!(BasicSchemaValidator.validate(&schema, &json!("low")).is_empty());
        assert_eq!(BasicSchemaValidator.validate(&schema, &json!("mid")).len(), 1);
    }

    #[test]
    fn should_validate_array_items() {
        let schema = json!({"type": "array", "maxItems": 2, "items": {"type": "boolean"}});
        let violations = BasicSchemaValidator.validate(&schema, &json!([true, 1, false]));
        assert_eq!(
            violations,
            vec![
                "$: length must be at most 2".to_string(),
                "$[1]: expected boolean, found integer".to_string(),
            ]
        );
    }

    #[test]
    fn should_ignore_unknown_keywords() {
        let schema = json!({"@type": "LevelProperty", "unit": "percent", "readOnly": true});
        assert!(BasicSchemaValidator.validate(&schema, &json!(12)).is_empty());
    }

    #[test]
    fn should_accept_any_of_multiple_types() {
        let schema = json!({"type": ["string", "null"]});
        assert!(BasicSchemaValidator.validate(&schema, &JsonValue::Null).is_empty());
        assert_eq!(BasicSchemaValidator.validate(&schema, &json!(1)).len(), 1);
    }
}
