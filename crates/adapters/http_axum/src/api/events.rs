//! Event log handlers.

use axum::Json;
use axum::response::{IntoResponse, Response};
use webthing_app::services::thing_handle::ThingHandle;

use crate::error::ApiError;

/// `GET <thing>/events[/<name>]`: the event log, oldest first. The name
/// filter is case-insensitive.
pub fn list(thing: &ThingHandle, name: Option<&str>) -> Result<Response, ApiError> {
    Ok(Json(thing.event_descriptions(name)).into_response())
}
