//! Action port — the runnable part of an action.
//!
//! The domain records *that* an action was requested; an [`ActionHandler`]
//! does the actual work. One handler is created per action instance by the
//! [`ActionFactory`] registered alongside the action's metadata.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use webthing_domain::error::WebThingError;
use webthing_domain::id::ActionId;

use crate::services::thing_handle::ThingHandle;

/// Boxed `Send` future, so handlers stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure of an action's work. Logged by the executor; the action still
/// completes.
#[derive(Debug, thiserror::Error)]
pub enum PerformError {
    /// The handler gave up.
    #[error("{0}")]
    Failed(String),

    /// A thing operation performed by the handler was rejected.
    #[error(transparent)]
    Thing(#[from] WebThingError),

    /// The handler's task panicked.
    #[error("action task panicked")]
    Panicked,
}

/// Everything a handler needs to do its work.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The thing the action runs against.
    pub thing: ThingHandle,
    pub name: String,
    pub id: ActionId,
    pub input: Option<JsonValue>,
}

/// Work bound to one action instance.
pub trait ActionHandler: Send + Sync {
    /// Perform the action. Runs on its own task; may sleep freely.
    fn perform(&self, ctx: ActionContext) -> BoxFuture<'static, Result<(), PerformError>>;

    /// Ask a running `perform` to stop early. Must not block.
    fn cancel(&self) {}
}

/// Produces a fresh [`ActionHandler`] for every requested action.
pub trait ActionFactory: Send + Sync {
    fn create(&self) -> Arc<dyn ActionHandler>;
}

impl<F, H> ActionFactory for F
where
    F: Fn() -> H + Send + Sync,
    H: ActionHandler + 'static,
{
    fn create(&self) -> Arc<dyn ActionHandler> {
        Arc::new(self())
    }
}
