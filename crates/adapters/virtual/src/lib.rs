//! # webthing-adapter-virtual
//!
//! Virtual/demo integration that provides simulated devices for testing and
//! demonstration purposes.
//!
//! ## Provided things
//!
//! | Thing | Id | Behaviour |
//! |-------|----|-----------|
//! | My Lamp | `urn:dev:ops:my-lamp-1234` | `on` / `brightness` properties, `fade` and `toggle` actions, `overheated` event |
//! | My Humidity Sensor | `urn:dev:ops:my-humidity-sensor-1234` | Read-only `level` property updated on an interval |
//!
//! Commanded property values are logged by the value forwarders, standing in
//! for the write to real hardware.
//!
//! ## Dependency rule
//!
//! Depends on `webthing-app` (thing handle, action ports) and
//! `webthing-domain` only.

mod devices;

use std::time::Duration;

use tokio::task::JoinHandle;
use webthing_app::services::thing_handle::ThingHandle;
use webthing_domain::error::ValidationError;

pub use devices::{HumiditySensor, lamp};

/// Virtual integration that creates the simulated things.
pub struct VirtualIntegration {
    lamp: ThingHandle,
    sensor: HumiditySensor,
}

impl VirtualIntegration {
    /// Build every virtual thing.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a thing builder fails (should not
    /// happen with hardcoded inputs).
    pub fn new() -> Result<Self, ValidationError> {
        Ok(Self {
            lamp: lamp()?,
            sensor: HumiditySensor::new()?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        "virtual"
    }

    /// The lamp, served alone in single-thing mode.
    #[must_use]
    pub fn lamp(&self) -> &ThingHandle {
        &self.lamp
    }

    /// Every thing this integration provides, lamp first.
    #[must_use]
    pub fn things(&self) -> Vec<ThingHandle> {
        vec![self.lamp.clone(), self.sensor.thing().clone()]
    }

    /// Start the background task feeding simulated sensor readings.
    pub fn start_background(&self, interval: Duration) -> JoinHandle<()> {
        self.sensor.spawn_updates(interval)
    }
}
