//! Input sources for the sensor bridge.
//!
//! Current input sources:
//! - `http`: periodic HTTP polling of a JSON sensor endpoint

pub mod http;

pub use http::{HttpReadingSource, PollerHandle, ReadingSource, SensorPoller};
