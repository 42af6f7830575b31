//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the orchestration layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod action;
pub mod subscriber;

pub use action::{ActionContext, ActionFactory, ActionHandler, BoxFuture, PerformError};
pub use subscriber::{Subscriber, SubscriberError};
