//! Sensor capabilities exposed to the host bridge.
//!
//! Each capability is a read-only characteristic backed by the shared
//! [`ReadingCache`](crate::reading::ReadingCache). The host reads it through
//! [`Capability::read`] and receives live updates through the pusher it
//! registers with [`Capability::set_value_pusher`].

pub mod analog_sensor;

pub use analog_sensor::AnalogSensor;

use std::sync::Arc;
use strum::{Display, EnumIter};

/// Callback the host registers to receive pushed characteristic values.
pub type ValuePusher = Arc<dyn Fn(f64) + Send + Sync>;

/// Kind of sensor capability (determines the characteristic the host exposes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CapabilityKind {
    /// CurrentTemperature in degrees Celsius
    TemperatureSensor,
    /// CurrentRelativeHumidity in percent
    HumiditySensor,
    /// CurrentAmbientLightLevel in lux
    LightSensor,
}

impl CapabilityKind {
    /// Name of the characteristic carrying the value.
    pub fn characteristic(&self) -> &'static str {
        match self {
            Self::TemperatureSensor => "CurrentTemperature",
            Self::HumiditySensor => "CurrentRelativeHumidity",
            Self::LightSensor => "CurrentAmbientLightLevel",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::TemperatureSensor => "°C",
            Self::HumiditySensor => "%",
            Self::LightSensor => "lx",
        }
    }
}

/// Trait for sensors with change detection.
///
/// The version number is incremented each time a new value is pushed, so a
/// host can tell whether it has seen the latest update.
pub trait Sensor: Send + Sync {
    fn version(&self) -> u32;
}

/// A readable capability the host enumerates and exposes to its clients.
pub trait Capability: Sensor {
    fn kind(&self) -> CapabilityKind;

    /// Current cached value. Never blocks on I/O and never fails.
    fn read(&self) -> f64;

    /// Forward a freshly fetched value to the host.
    fn push_update(&self, value: f64);

    /// Register the host callback used by [`Capability::push_update`].
    ///
    /// Called by the host when the accessory is registered.
    fn set_value_pusher(&self, pusher: ValuePusher);
}
