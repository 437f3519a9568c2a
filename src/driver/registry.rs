use std::collections::HashMap;
use std::sync::Arc;

use super::{Driver, MemoryDriver};
use crate::error::DriverError;

/// Builds a fresh, unconnected driver.
pub type DriverFactory = fn() -> Box<dyn Driver>;

/// Name-to-factory table used to pick a driver at startup.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in driver: `memory` (alias `none`) and,
    /// with the `sqlite` feature, `sqlite`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("memory", || Box::new(MemoryDriver::new()));
        registry.register("none", || Box::new(MemoryDriver::new()));
        #[cfg(feature = "sqlite")]
        registry.register("sqlite", || Box::new(super::SqliteDriver::new()));
        registry
    }

    /// Add or replace the factory registered under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: DriverFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::debug!(driver = %name, "replaced driver factory");
        }
    }

    /// Instantiate the driver registered under `name`.
    pub fn open(&self, name: &str) -> Result<Arc<dyn Driver>, DriverError> {
        match self.factories.get(name) {
            Some(factory) => Ok(Arc::from(factory())),
            None => {
                tracing::warn!(driver = %name, "unknown database driver");
                Err(DriverError::UnknownDriver(name.to_string()))
            }
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
