//! Web Thing REST handlers.
//!
//! A single fallback handler resolves the request path through the
//! [`Addressing`](webthing_app::addressing::Addressing) table, then
//! dispatches on the resource and the method. Everything that resolves but
//! does not support the method answers `405`.

#[allow(clippy::missing_errors_doc)]
pub mod actions;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod properties;
#[allow(clippy::missing_errors_doc)]
pub mod things;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value as JsonValue};
use webthing_app::addressing::{Resource, Route};
use webthing_app::services::thing_handle::ThingHandle;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Entry point for every request that is not `/health`.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    let Some(route) = state.addressing.resolve(parts.uri.path()) else {
        return ApiError::UnknownPath.into_response();
    };

    let (index, resource) = match route {
        Route::ThingList => {
            return match parts.method {
                Method::GET => things::list(&state, &parts.headers).into_response(),
                _ => ApiError::MethodNotAllowed.into_response(),
            };
        }
        Route::Thing { index, resource } => (index, resource),
    };
    let Some(thing) = state.addressing.thing(index).cloned() else {
        return ApiError::UnknownPath.into_response();
    };

    if resource == Resource::Thing && ws::is_upgrade(&parts.headers) {
        return ws::upgrade(&mut parts, &state, thing).await;
    }

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => return ApiError::bad_request(err.to_string()).into_response(),
    };

    match handle(&thing, resource, &parts, &body) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn handle(
    thing: &ThingHandle,
    resource: Resource,
    parts: &Parts,
    body: &[u8],
) -> Result<Response, ApiError> {
    let method = &parts.method;
    match resource {
        Resource::Thing => match *method {
            Method::GET => things::get(thing, &parts.headers),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::Properties => match *method {
            Method::GET => properties::list(thing),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::Property(name) => match *method {
            Method::GET => properties::get(thing, &name),
            Method::PUT => properties::put(thing, &name, body),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::Actions => match *method {
            Method::GET => actions::list(thing, None),
            Method::POST => actions::post(thing, None, body),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::ActionsByName(name) => match *method {
            Method::GET => actions::list(thing, Some(&name)),
            Method::POST => actions::post(thing, Some(&name), body),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::ActionInstance { name, id } => match *method {
            Method::GET => actions::get(thing, &name, &id),
            Method::DELETE => actions::delete(thing, &name, &id),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::Events => match *method {
            Method::GET => events::list(thing, None),
            _ => Err(ApiError::MethodNotAllowed),
        },
        Resource::EventsByName(name) => match *method {
            Method::GET => events::list(thing, Some(&name)),
            _ => Err(ApiError::MethodNotAllowed),
        },
    }
}

/// Parse a request body that must be a JSON object.
pub(crate) fn parse_object(body: &[u8]) -> Result<Map<String, JsonValue>, ApiError> {
    match serde_json::from_slice(body) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(err) => Err(ApiError::bad_request(format!("invalid JSON body: {err}"))),
    }
}
