//! # webthing-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **Web Thing REST API**: thing descriptions, properties,
//!   actions and events, for one thing or several
//! - Upgrade requests on a thing's href to a **WebSocket** that receives
//!   every notification and accepts `setProperty`, `requestAction` and
//!   `addEventSubscription` messages
//! - Map requests onto [`ThingHandle`] calls through the immutable
//!   [`Addressing`] table (driving adapter)
//! - Map results and errors into JSON responses with the right status code
//!
//! ## Dependency rule
//! Depends on `webthing-app` (for the thing handle and addressing) and
//! `webthing-domain` (for error types). Never leaks axum types into either.
//!
//! [`ThingHandle`]: webthing_app::services::thing_handle::ThingHandle
//! [`Addressing`]: webthing_app::addressing::Addressing

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;
