//! Runs actions on the tokio executor.
//!
//! Every started action gets its own task: `created → pending`, then the
//! handler's `perform`, then `→ completed`. The handler runs on a nested
//! task so that a panic surfaces as a [`JoinError`](tokio::task::JoinError)
//! here instead of tearing down the executor. Failures are logged and the
//! action completes regardless.

use tokio::task::JoinHandle;
use tracing::Instrument;
use webthing_domain::action::Action;

use crate::ports::{ActionContext, PerformError};
use crate::services::thing_handle::ThingHandle;

/// Start `action` in the background. Returns immediately.
///
/// The returned handle resolves once the action has completed (or was
/// found to be no longer startable); dropping it detaches the task.
pub fn spawn(thing: ThingHandle, action: &Action) -> JoinHandle<()> {
    let ctx = ActionContext {
        thing,
        name: action.name().to_string(),
        id: action.id(),
        input: action.input().cloned(),
    };
    let span = tracing::info_span!("action", name = %ctx.name, id = %ctx.id);
    tokio::spawn(run(ctx).instrument(span))
}

async fn run(ctx: ActionContext) {
    let thing = ctx.thing.clone();
    let name = ctx.name.clone();
    let id = ctx.id;

    if !thing.mark_started(&name, id) {
        tracing::debug!("action removed or already started, skipping");
        return;
    }

    if let Some(handler) = thing.action_handler(id) {
        let outcome = match tokio::spawn(handler.perform(ctx).in_current_span()).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(PerformError::Panicked),
            Err(err) => Err(PerformError::Failed(err.to_string())),
        };
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "action perform failed");
        }
    }

    thing.mark_finished(&name, id);
    tracing::debug!("action finished");
}
