//! Virtual lamp — on/off plus brightness, with `fade` and `toggle` actions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value as JsonValue, json};
use tokio::sync::Notify;
use webthing_app::ports::{ActionContext, ActionHandler, BoxFuture, PerformError};
use webthing_app::services::thing_handle::ThingHandle;
use webthing_domain::error::{ValidationError, WebThingError};
use webthing_domain::event::Event;
use webthing_domain::property::Property;
use webthing_domain::thing::Thing;
use webthing_domain::value::Value;

/// Temperature reported by the `overheated` event after a fade.
const OVERHEAT_CELSIUS: i64 = 102;

/// Build the lamp thing.
///
/// # Errors
///
/// Returns a validation error if the builder fails (should not happen
/// with hardcoded inputs).
pub fn lamp() -> Result<ThingHandle, ValidationError> {
    let thing = Thing::builder()
        .id("urn:dev:ops:my-lamp-1234")
        .title("My Lamp")
        .at_type("OnOffSwitch")
        .at_type("Light")
        .description("A web connected lamp")
        .build()?;
    let handle = ThingHandle::new(thing);

    handle.add_property(Property::new(
        "on",
        Value::new(true).with_forwarder(|v| {
            tracing::info!(value = %v, "lamp on/off commanded");
            Ok(())
        }),
        json!({
            "@type": "OnOffProperty",
            "title": "On/Off",
            "type": "boolean",
            "description": "Whether the lamp is turned on"
        }),
    ));
    handle.add_property(Property::new(
        "brightness",
        Value::new(50).with_forwarder(|v| {
            tracing::info!(value = %v, "lamp brightness commanded");
            Ok(())
        }),
        json!({
            "@type": "BrightnessProperty",
            "title": "Brightness",
            "type": "integer",
            "description": "The level of light from 0-100",
            "minimum": 0,
            "maximum": 100,
            "unit": "percent"
        }),
    ));

    handle.add_available_action(
        "fade",
        json!({
            "title": "Fade",
            "description": "Fade the lamp to a given level",
            "input": {
                "type": "object",
                "required": ["brightness", "duration"],
                "properties": {
                    "brightness": {"type": "integer", "minimum": 0, "maximum": 100, "unit": "percent"},
                    "duration": {"type": "integer", "minimum": 1, "unit": "milliseconds"}
                }
            }
        }),
        FadeAction::default,
    );
    handle.add_available_action(
        "toggle",
        json!({"title": "Toggle", "description": "Flip the lamp on or off"}),
        || ToggleAction,
    );

    handle.add_available_event(
        "overheated",
        json!({
            "description": "The lamp has exceeded its safe operating temperature",
            "type": "number",
            "unit": "degree celsius"
        }),
    );

    Ok(handle)
}

/// Waits `duration` ms, then sets `brightness` and reports overheating.
#[derive(Default)]
struct FadeAction {
    cancelled: Arc<Notify>,
}

impl ActionHandler for FadeAction {
    fn perform(&self, ctx: ActionContext) -> BoxFuture<'static, Result<(), PerformError>> {
        let cancelled = Arc::clone(&self.cancelled);
        Box::pin(async move {
            let input = ctx.input.unwrap_or(JsonValue::Null);
            let duration = Duration::from_millis(input["duration"].as_u64().unwrap_or(0));

            tokio::select! {
                () = tokio::time::sleep(duration) => {}
                () = cancelled.notified() => {
                    tracing::info!("fade cancelled");
                    return Ok(());
                }
            }

            ctx.thing
                .set_property("brightness", input["brightness"].clone())?;
            ctx.thing
                .add_event(Event::new("overheated", Some(json!(OVERHEAT_CELSIUS))))
                .map_err(WebThingError::from)?;
            Ok::<(), PerformError>(())
        })
    }

    fn cancel(&self) {
        self.cancelled.notify_one();
    }
}

/// Flips `on`.
struct ToggleAction;

impl ActionHandler for ToggleAction {
    fn perform(&self, ctx: ActionContext) -> BoxFuture<'static, Result<(), PerformError>> {
        Box::pin(async move {
            let on = ctx
                .thing
                .property_value("on")
                .map_err(WebThingError::from)?;
            ctx.thing
                .set_property("on", json!(!on.as_bool().unwrap_or(false)))?;
            Ok::<(), PerformError>(())
        })
    }
}
