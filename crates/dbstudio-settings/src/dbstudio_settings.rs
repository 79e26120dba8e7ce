//! dbstudio settings
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! [[connections]]
//! name = "main"
//! driver = "mssql"
//! connection_string = "server=tcp:localhost,1433;user=sa;password=...;TrustServerCertificate=true"
//!
//! [[column_overrides]]
//! connectionName = "main"
//! schema = "Sales"
//! table = "Order"
//! columnName = "CustomerId"
//! isFK = true
//! schemaFK = "Sales"
//! tableFK = "Customer"
//!
//! [type_aliases]
//! TCode = "String"
//!
//! [logging]
//! filter = "info,dbstudio_services=debug"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use dbstudio_core::{ConnectionRecord, CustomColumnOverride, DataType};
use serde::{Deserialize, Serialize};

pub mod logging;
mod settings_file;

pub use logging::LoggingConfig;
pub use settings_file::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    pub connections: Vec<ConnectionRecord>,
    pub column_overrides: Vec<CustomColumnOverride>,
    /// User-defined native type name to canonical data type
    pub type_aliases: BTreeMap<String, DataType>,
    pub logging: LoggingConfig,
}

impl StudioSettings {
    /// Load from [`settings_file`], or defaults when the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    /// Connection names are unique and every override names a known connection
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for connection in &self.connections {
            if connection.name.trim().is_empty() {
                bail!("connection with an empty name");
            }
            if !names.insert(connection.name.as_str()) {
                bail!("connection {:?} is defined more than once", connection.name);
            }
        }
        for column_override in &self.column_overrides {
            if !names.contains(column_override.connection_name.as_str()) {
                bail!(
                    "override for {}.{}.{} names unknown connection {:?}",
                    column_override.schema,
                    column_override.table,
                    column_override.column_name,
                    column_override.connection_name
                );
            }
        }
        Ok(())
    }
}
