//! Virtual humidity sensor with a read-only `level` fed by a background task.

use std::f64::consts::TAU;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use webthing_app::services::thing_handle::ThingHandle;
use webthing_domain::error::ValidationError;
use webthing_domain::property::Property;
use webthing_domain::thing::Thing;
use webthing_domain::value::Value;

/// Readings per full simulated humidity cycle.
const CYCLE_STEPS: u32 = 60;

pub struct HumiditySensor {
    thing: ThingHandle,
    level: Value,
}

impl HumiditySensor {
    /// Build the sensor thing.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder fails (should not happen
    /// with hardcoded inputs).
    pub fn new() -> Result<Self, ValidationError> {
        let thing = Thing::builder()
            .id("urn:dev:ops:my-humidity-sensor-1234")
            .title("My Humidity Sensor")
            .at_type("MultiLevelSensor")
            .description("A web connected humidity sensor")
            .build()?;
        let thing = ThingHandle::new(thing);

        let level = Value::new(reading(0));
        thing.add_property(Property::new(
            "level",
            level.clone(),
            json!({
                "@type": "LevelProperty",
                "title": "Humidity",
                "type": "number",
                "description": "The current humidity in %",
                "minimum": 0,
                "maximum": 100,
                "unit": "percent",
                "readOnly": true
            }),
        ));

        Ok(Self { thing, level })
    }

    #[must_use]
    pub fn thing(&self) -> &ThingHandle {
        &self.thing
    }

    /// Push a new reading every `interval` until the task is aborted.
    pub fn spawn_updates(&self, interval: Duration) -> JoinHandle<()> {
        let level = self.level.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately and the seed is already set
            ticker.tick().await;
            let mut step: u32 = 0;
            loop {
                ticker.tick().await;
                step = step.wrapping_add(1);
                let value = reading(step);
                if level.notify_of_external_update(json!(value)) {
                    tracing::debug!(level = value, "humidity reading updated");
                }
            }
        })
    }
}

/// Simulated humidity for a step: a slow wave around 50%, one decimal.
fn reading(step: u32) -> f64 {
    let phase = f64::from(step % CYCLE_STEPS) / f64::from(CYCLE_STEPS) * TAU;
    let raw = 50.0 + 20.0 * phase.sin();
    (raw * 10.0).round() / 10.0
}
