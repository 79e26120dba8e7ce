//! dbstudio core - shared model and seams for the record editing engine
//!
//! This crate holds what every other dbstudio crate agrees on:
//!
//! - `StudioError` / `Result` - the error taxonomy
//! - `ColumnInfo`, `TableInfo`, `CustomColumnOverride` - the schema model
//! - `RecordNode` - the client-submitted record tree
//! - `SqlDialect` - the per-engine SQL capability
//! - `literal` - the value literal codec
//! - `CatalogProvider`, `RowProvider`, `DatabaseDriver` - seams to live databases

mod database;
mod dialect;
mod error;
pub mod literal;
pub mod naming;
mod record;
mod types;

pub use database::{CatalogProvider, Database, DatabaseDriver, RowProvider};
pub use dialect::{IdentityLookup, MergeStatement, SourceColumn, SqlDialect};
pub use error::{Result, StudioError};
pub use record::{ROW_ID_COLUMN, ROW_REPR_COLUMN, RecordNode};
pub use types::{
    ColumnInfo, ConnectionRecord, CustomColumnOverride, DataType, PageRequest, PagedResult,
    RawColumn, Record, TableInfo,
};
