//! Cached sensor readings and response parsing.
//!
//! The three values are always replaced together: a [`Reading`] is parsed in
//! full from one response body before it reaches the [`ReadingCache`], so a
//! bad field rejects the whole update.

use crate::config::FieldNames;
use crate::error::FetchError;
use crate::sensors::CapabilityKind;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TEMPERATURE_CELSIUS: f64 = 20.0;
pub const DEFAULT_HUMIDITY_PERCENT: f64 = 50.0;
pub const DEFAULT_AMBIENT_LIGHT_LUX: f64 = 1000.0;

/// One temperature / humidity / light triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Ambient light in lux
    pub ambient_light: f64,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE_CELSIUS,
            humidity: DEFAULT_HUMIDITY_PERCENT,
            ambient_light: DEFAULT_AMBIENT_LIGHT_LUX,
        }
    }
}

impl Reading {
    /// Parse a response body, reading the three values from `fields`.
    ///
    /// Each value may be a JSON number or a string holding a number.
    pub fn from_json(body: &str, fields: &FieldNames) -> Result<Self, FetchError> {
        let data: Value = serde_json::from_str(body)?;

        Ok(Self {
            temperature: coerce_number(&data, &fields.temperature)?,
            humidity: coerce_number(&data, &fields.humidity)?,
            ambient_light: coerce_number(&data, &fields.light)?,
        })
    }

    /// Value exposed by the capability of the given kind.
    pub fn get(&self, kind: CapabilityKind) -> f64 {
        match kind {
            CapabilityKind::TemperatureSensor => self.temperature,
            CapabilityKind::HumiditySensor => self.humidity,
            CapabilityKind::LightSensor => self.ambient_light,
        }
    }
}

fn coerce_number(data: &Value, field: &str) -> Result<f64, FetchError> {
    let invalid = |reason: String| FetchError::InvalidField {
        field: field.to_string(),
        reason,
    };

    let value = match data.get(field) {
        None => return Err(invalid("missing".to_string())),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("{n} is out of range")))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(format!("{s:?}")))?,
        Some(other) => return Err(invalid(format!("unexpected value {other}"))),
    };

    // f64 parsing accepts "NaN" and "inf"; neither is a reading.
    if !value.is_finite() {
        return Err(invalid(format!("{value} is not finite")));
    }
    Ok(value)
}

/// Last known reading, shared between the poller and the capability services.
#[derive(Debug, Default)]
pub struct ReadingCache {
    current: RwLock<Reading>,
}

impl ReadingCache {
    pub fn new(initial: Reading) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Copy of the whole triple taken under one lock.
    pub fn snapshot(&self) -> Reading {
        *self.current.read()
    }

    /// Replace all three values at once.
    pub fn replace(&self, reading: Reading) {
        *self.current.write() = reading;
    }
}
