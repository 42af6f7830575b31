//! WebSocket subscriptions on a thing's href.
//!
//! Connecting registers the socket as a [`Subscriber`] of the thing, so it
//! receives every `propertyStatus`, `actionStatus` and `event` message.
//! Inbound messages share the same `{"messageType", "data"}` envelope:
//!
//! - `setProperty` — `{"<name>": <value>, …}`
//! - `requestAction` — `{"<name>": {"input": …}, …}`
//! - `addEventSubscription` — `{"<name>": {}, …}`; every subscriber already
//!   receives every event, so this only checks that the events exist
//!
//! Failures are answered on the same socket with an `error` message.

use std::future::Future;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::UPGRADE;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use tokio::sync::mpsc;
use webthing_app::ports::{Subscriber, SubscriberError};
use webthing_app::services::thing_handle::ThingHandle;

use crate::state::AppState;

/// Notifications queued per connection before the subscriber is reported
/// as lagging.
const QUEUE_CAPACITY: usize = 256;

/// Whether the request asks for a WebSocket upgrade.
#[must_use]
pub fn is_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Complete the upgrade and hand the socket to a session task.
pub async fn upgrade(parts: &mut Parts, state: &AppState, thing: ThingHandle) -> Response {
    match WebSocketUpgrade::from_request_parts(parts, state).await {
        Ok(ws) => ws.on_upgrade(move |socket| session(socket, thing)),
        Err(rejection) => rejection.into_response(),
    }
}

enum Outbound {
    Text(String),
    Close,
}

/// [`Subscriber`] feeding a connection's outbound queue.
struct SocketSubscriber {
    tx: mpsc::Sender<Outbound>,
}

impl SocketSubscriber {
    fn push(&self, message: Outbound) -> Result<(), SubscriberError> {
        self.tx.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                SubscriberError::Delivery("outbound queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => SubscriberError::Disconnected,
        })
    }
}

impl Subscriber for SocketSubscriber {
    fn send(&self, message: &str) -> Result<(), SubscriberError> {
        self.push(Outbound::Text(message.to_string()))
    }

    fn close(&self) -> Result<(), SubscriberError> {
        self.push(Outbound::Close)
    }
}

/// The two halves of a socket the session loop needs.
trait Connection: Send {
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, axum::Error>>> + Send;
    fn send(&mut self, message: Message) -> impl Future<Output = Result<(), axum::Error>> + Send;
}

impl Connection for WebSocket {
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, axum::Error>>> + Send {
        WebSocket::recv(self)
    }

    fn send(&mut self, message: Message) -> impl Future<Output = Result<(), axum::Error>> + Send {
        WebSocket::send(self, message)
    }
}

/// Pings are answered by the protocol layer; only text frames matter here.
async fn session(mut socket: impl Connection, thing: ThingHandle) {
    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    let id = thing.add_subscriber(Arc::new(SocketSubscriber { tx }));
    tracing::info!(subscriber = %id, thing = %thing.title(), "websocket connected");

    'session: loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    for reply in handle_message(&thing, text.as_str()) {
                        if socket.send(Message::Text(reply.into())).await.is_err() {
                            break 'session;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(subscriber = %id, error = %err, "websocket error");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(Outbound::Text(message)) => {
                    if socket.send(Message::Text(message.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    thing.remove_subscriber(id);
    tracing::info!(subscriber = %id, "websocket disconnected");
}

#[derive(Debug, Deserialize)]
#[serde(tag = "messageType", content = "data", rename_all = "camelCase")]
enum Inbound {
    SetProperty(Map<String, JsonValue>),
    RequestAction(Map<String, JsonValue>),
    AddEventSubscription(Map<String, JsonValue>),
}

/// Apply one inbound message, returning the error replies to send back.
#[must_use]
pub fn handle_message(thing: &ThingHandle, text: &str) -> Vec<String> {
    let message: Inbound = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => return vec![error_reply(&format!("invalid message: {err}"))],
    };

    let mut replies = Vec::new();
    match message {
        Inbound::SetProperty(values) => {
            for (name, value) in values {
                if let Err(err) = thing.set_property(&name, value) {
                    replies.push(error_reply(&err.to_string()));
                }
            }
        }
        Inbound::RequestAction(requests) => {
            for (name, params) in requests {
                let input = params.get("input").filter(|i| !i.is_null()).cloned();
                if let Err(err) = thing.perform_action(&name, input) {
                    replies.push(error_reply(&err.to_string()));
                }
            }
        }
        Inbound::AddEventSubscription(events) => {
            for name in events.keys() {
                if !thing.has_available_event(name) {
                    replies.push(error_reply(&format!("event `{name}` not found")));
                }
            }
        }
    }
    replies
}

fn error_reply(message: &str) -> String {
    json!({
        "messageType": "error",
        "data": {"status": "400 Bad Request", "message": message},
    })
    .to_string()
}
