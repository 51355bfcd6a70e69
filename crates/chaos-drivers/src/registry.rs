//! Registry keyed by target service (`spec.md §9` "Polymorphism over
//! drivers/evaluators"). One driver instance per service; the instance
//! itself dispatches on `action.kind` for schema lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::ActionDriver;
use crate::error::DriverError;

#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn ActionDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: impl Into<String>, driver: Arc<dyn ActionDriver>) {
        self.drivers.insert(service.into(), driver);
    }

    pub fn get(&self, service: &str) -> Result<Arc<dyn ActionDriver>, DriverError> {
        self.drivers
            .get(service)
            .cloned()
            .ok_or_else(|| DriverError::UnknownService {
                service: service.to_string(),
            })
    }
}
