//! HTTP Sensor Bridge library.
//!
//! Polls an HTTP endpoint for temperature, humidity and ambient light readings
//! and exposes them as read-only sensor capabilities to a host bridge.

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod logging;
pub mod reading;
pub mod sensors;
