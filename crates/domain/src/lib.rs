//! # webthing-domain
//!
//! Pure domain model for a Web Thing server.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Values** (last known state plus forwarders into the device)
//! - Define **Properties** (named, typed, observable values)
//! - Define **available actions/events** (templates a thing supports)
//! - Define **Actions** (invocations with a created → pending → completed lifecycle)
//! - Define **Events** (immutable timestamped records)
//! - Define the **Thing** aggregate and the JSON descriptions it renders
//! - Define **Notifications** broadcast to subscribers
//! - Validate JSON documents against a subset of JSON Schema
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and no async runtime.
//! Locking, task spawning and subscriber IO live in the `app` crate.

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod arena;
pub mod available;
pub mod event;
pub mod notification;
pub mod property;
pub mod schema;
pub mod thing;
pub mod value;
