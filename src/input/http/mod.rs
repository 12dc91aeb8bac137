//! HTTP polling input source.
//!
//! Periodically fetches a JSON document with temperature, humidity and light
//! values and feeds it into the sensor capabilities.

mod poller;
mod source;

pub use poller::{PollerHandle, PollerStats, SensorPoller};
pub use source::{HttpReadingSource, ReadingSource};
