//! Action handlers.

use std::str::FromStr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value as JsonValue;
use webthing_app::services::thing_handle::ThingHandle;
use webthing_domain::error::{NotFoundError, WebThingError};
use webthing_domain::id::ActionId;

use crate::api::parse_object;
use crate::error::ApiError;

/// Possible responses from the create endpoints.
pub enum CreateResponse {
    /// One action requested: its description.
    Created(Json<JsonValue>),
    /// Several actions requested: an array of descriptions.
    CreatedMany(Json<Vec<JsonValue>>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::CreatedMany(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET <thing>/actions[/<name>]`: live actions in creation order per name.
pub fn list(thing: &ThingHandle, name: Option<&str>) -> Result<Response, ApiError> {
    if let Some(name) = name
        && !thing.has_available_action(name)
    {
        return Err(WebThingError::from(NotFoundError::new("action", name)).into());
    }
    Ok(Json(thing.action_descriptions(name)).into_response())
}

/// `POST <thing>/actions[/<name>]` with body `{<name>: {"input": …}, …}`.
///
/// Every requested action is checked before any is created, so a bad
/// request leaves no trace. On `/actions/<name>`, entries for other names
/// are ignored.
pub fn post(thing: &ThingHandle, only: Option<&str>, body: &[u8]) -> Result<Response, ApiError> {
    let request = parse_object(body)?;

    let mut wanted = Vec::with_capacity(request.len());
    for (name, params) in request {
        if only.is_some_and(|only| only != name) {
            continue;
        }
        let input = match params {
            JsonValue::Object(mut params) => params.remove("input").filter(|i| !i.is_null()),
            JsonValue::Null => None,
            _ => {
                return Err(ApiError::bad_request(format!(
                    "request for action `{name}` must be an object"
                )));
            }
        };
        thing.check_action_request(&name, input.as_ref())?;
        wanted.push((name, input));
    }
    if wanted.is_empty() {
        return Err(ApiError::bad_request("no action requested"));
    }

    let mut created = Vec::with_capacity(wanted.len());
    for (name, input) in wanted {
        let action = thing.perform_action(&name, input)?;
        created.push(action.as_action_description());
    }

    let response = if created.len() == 1 {
        CreateResponse::Created(Json(created.swap_remove(0)))
    } else {
        CreateResponse::CreatedMany(Json(created))
    };
    Ok(response.into_response())
}

/// `GET <thing>/actions/<name>/<id>`
pub fn get(thing: &ThingHandle, name: &str, id: &str) -> Result<Response, ApiError> {
    let action = ActionId::from_str(id)
        .ok()
        .and_then(|action_id| thing.action(name, action_id))
        .ok_or_else(|| unknown_action(id))?;
    Ok(Json(action.as_action_description()).into_response())
}

/// `DELETE <thing>/actions/<name>/<id>`: cancel and forget the action.
pub fn delete(thing: &ThingHandle, name: &str, id: &str) -> Result<Response, ApiError> {
    let action_id = ActionId::from_str(id).map_err(|_| unknown_action(id))?;
    if thing.remove_action(name, action_id) {
        Ok(DeleteResponse::NoContent.into_response())
    } else {
        Err(unknown_action(id))
    }
}

/// Missing, removed and unparsable ids all answer like an unknown action.
fn unknown_action(id: &str) -> ApiError {
    WebThingError::from(NotFoundError::new("action", id)).into()
}
