//! # webthing-app
//!
//! Application layer — thing orchestration and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `Subscriber` — a sink for change notifications (e.g. a WebSocket)
//!   - `ActionHandler` / `ActionFactory` — the runnable part of an action
//! - Wrap a domain `Thing` in a shareable, thread-safe [`ThingHandle`]
//!   that serializes mutation and notifies subscribers after every change
//! - Run actions on the tokio executor (created → pending → completed)
//! - Fan notifications out to every subscriber, best effort
//! - Map request paths onto things and their resources ([`addressing`])
//!
//! ## Dependency rule
//! Depends on `webthing-domain` only (plus `tokio` for task spawning).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.
//!
//! [`ThingHandle`]: services::thing_handle::ThingHandle

pub mod addressing;
pub mod container;
pub mod fanout;
pub mod ports;
pub mod services;
