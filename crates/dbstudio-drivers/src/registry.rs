//! Driver registry for managing available database drivers

use std::collections::HashMap;
use std::sync::Arc;

use dbstudio_core::{DatabaseDriver, Result, SqlDialect, StudioError};

/// Registry of available database drivers
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "mssql")]
        registry.register(Arc::new(crate::mssql::MssqlDriver::new()));
        registry
    }

    /// Register a driver, replacing any driver with the same name
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_ascii_lowercase();
        tracing::info!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(&name.to_ascii_lowercase()).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Like [`DriverRegistry::get`], failing with a configuration error
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(name)
            .ok_or_else(|| StudioError::Configuration(format!("unknown database driver '{name}'")))
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(&name.to_ascii_lowercase())
    }

    pub fn dialect(&self, name: &str) -> Option<Arc<dyn SqlDialect>> {
        self.drivers.get(&name.to_ascii_lowercase()).map(|d| d.dialect())
    }
}
