//! Host side of the accessory contract.
//!
//! A host enumerates an accessory's services, wires a value pusher into each
//! one and reads them on demand. [`AccessoryRegistry`] is the minimal host the
//! bridge binary runs with; it logs every pushed value.

use crate::sensors::{Capability, CapabilityKind, ValuePusher};
use log::info;
use std::sync::Arc;

/// A device exposing one or more capabilities to the host.
pub trait Accessory: Send + Sync {
    fn name(&self) -> &str;

    /// Capabilities in the order the host should present them.
    fn services(&self) -> Vec<Arc<dyn Capability>>;
}

/// Current value of one capability, as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityValue {
    pub accessory: String,
    pub kind: CapabilityKind,
    pub value: f64,
}

/// Holds registered accessories and their services.
#[derive(Default)]
pub struct AccessoryRegistry {
    accessories: Vec<Arc<dyn Accessory>>,
}

impl AccessoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accessory with pushers that log each update.
    pub fn register(&mut self, accessory: Arc<dyn Accessory>) {
        self.register_with(accessory, |name, kind| {
            let name = name.to_string();
            Arc::new(move |value: f64| {
                info!(
                    "[Host] {} {} = {} {}",
                    name,
                    kind.characteristic(),
                    value,
                    kind.unit()
                );
            })
        });
    }

    /// Register an accessory, building one pusher per service with `make_pusher`.
    pub fn register_with<F>(&mut self, accessory: Arc<dyn Accessory>, make_pusher: F)
    where
        F: Fn(&str, CapabilityKind) -> ValuePusher,
    {
        let services = accessory.services();
        for service in &services {
            service.set_value_pusher(make_pusher(accessory.name(), service.kind()));
        }
        info!(
            "[Host] Registered {} with {} service(s)",
            accessory.name(),
            services.len()
        );
        self.accessories.push(accessory);
    }

    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    /// Read every service of every registered accessory.
    pub fn read_all(&self) -> Vec<CapabilityValue> {
        self.accessories
            .iter()
            .flat_map(|accessory| {
                accessory
                    .services()
                    .into_iter()
                    .map(move |service| CapabilityValue {
                        accessory: accessory.name().to_string(),
                        kind: service.kind(),
                        value: service.read(),
                    })
            })
            .collect()
    }
}
