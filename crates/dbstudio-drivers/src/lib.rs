//! dbstudio drivers - database driver implementations
//!
//! Re-exports the concrete drivers enabled by cargo features and the
//! [`DriverRegistry`] that resolves a connection's driver name.

#[cfg(feature = "mssql")]
pub use dbstudio_driver_mssql as mssql;

mod registry;

pub use registry::DriverRegistry;

pub use dbstudio_core::{Database, DatabaseDriver, Result, SqlDialect, StudioError};
