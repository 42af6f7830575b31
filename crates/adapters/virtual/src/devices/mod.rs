//! Simulated devices.

mod humidity_sensor;
mod lamp;

pub use humidity_sensor::HumiditySensor;
pub use lamp::lamp;
