//! Property handlers.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value as JsonValue};
use webthing_app::services::thing_handle::ThingHandle;
use webthing_domain::error::WebThingError;

use crate::api::parse_object;
use crate::error::ApiError;

/// `GET <thing>/properties`: `{name: value}` for every property.
pub fn list(thing: &ThingHandle) -> Result<Response, ApiError> {
    Ok(Json(JsonValue::Object(thing.properties())).into_response())
}

/// `GET <thing>/properties/<name>`: `{name: value}`.
pub fn get(thing: &ThingHandle, name: &str) -> Result<Response, ApiError> {
    let value = thing
        .property_value(name)
        .map_err(WebThingError::from)?;
    Ok(Json(single(name, value)).into_response())
}

/// `PUT <thing>/properties/<name>` with body `{name: value}`.
///
/// Answers with the value as recorded after the write.
pub fn put(thing: &ThingHandle, name: &str, body: &[u8]) -> Result<Response, ApiError> {
    let mut request = parse_object(body)?;
    let value = request
        .remove(name)
        .ok_or_else(|| ApiError::bad_request(format!("request body must contain `{name}`")))?;

    thing.set_property(name, value)?;

    let current = thing
        .property_value(name)
        .map_err(WebThingError::from)?;
    Ok(Json(single(name, current)).into_response())
}

fn single(name: &str, value: JsonValue) -> JsonValue {
    let mut body = Map::new();
    body.insert(name.to_string(), value);
    JsonValue::Object(body)
}
