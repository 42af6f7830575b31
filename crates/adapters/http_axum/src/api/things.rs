//! Thing descriptions.

use axum::Json;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::{IntoResponse, Response};
use serde_json::{Value as JsonValue, json};
use webthing_app::services::thing_handle::ThingHandle;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET <thing>`
pub fn get(thing: &ThingHandle, headers: &HeaderMap) -> Result<Response, ApiError> {
    Ok(Json(describe(thing, headers)).into_response())
}

/// `GET /things`: every thing, each with its own `href`.
pub fn list(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let descriptions: Vec<JsonValue> = state
        .addressing
        .things()
        .things()
        .iter()
        .map(|thing| {
            let mut description = describe(thing, headers);
            description["href"] = json!(thing.href());
            description
        })
        .collect();
    Ok(Json(descriptions).into_response())
}

/// Thing description plus the WebSocket alternate link for this host.
fn describe(thing: &ThingHandle, headers: &HeaderMap) -> JsonValue {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    let mut description = thing.description();
    if let Some(links) = description["links"].as_array_mut() {
        links.push(json!({
            "rel": "alternate",
            "href": format!("ws://{host}{}", thing.href()),
        }));
    }
    description
}
