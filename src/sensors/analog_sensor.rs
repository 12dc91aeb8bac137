//! Numeric sensor capability backed by the shared reading cache.
//!
//! Supports live host updates - when the poller pushes a new value, it is
//! forwarded to the pusher the host registered.

use super::{Capability, CapabilityKind, Sensor, ValuePusher};
use crate::reading::ReadingCache;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Read-only numeric capability (temperature, humidity or light level).
///
/// Reads go straight to the cache, so they always reflect the last complete
/// reading even while a fetch is in flight.
pub struct AnalogSensor {
    kind: CapabilityKind,
    cache: Arc<ReadingCache>,
    version: AtomicU32,
    /// Set by the host on registration via `set_value_pusher()`.
    pusher: RwLock<Option<ValuePusher>>,
}

impl AnalogSensor {
    pub fn new(kind: CapabilityKind, cache: Arc<ReadingCache>) -> Self {
        Self {
            kind,
            cache,
            version: AtomicU32::new(0),
            pusher: RwLock::new(None),
        }
    }
}

impl Capability for AnalogSensor {
    fn kind(&self) -> CapabilityKind {
        self.kind
    }

    fn read(&self) -> f64 {
        self.cache.snapshot().get(self.kind)
    }

    fn push_update(&self, value: f64) {
        self.version.fetch_add(1, Ordering::SeqCst);
        // Clone out so the host callback never runs under our lock
        let pusher = self.pusher.read().clone();
        if let Some(pusher) = pusher {
            pusher(value);
        }
    }

    fn set_value_pusher(&self, pusher: ValuePusher) {
        *self.pusher.write() = Some(pusher);
    }
}

impl Sensor for AnalogSensor {
    fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
