//! Seams to live databases

use async_trait::async_trait;
use std::sync::Arc;

use crate::dialect::SqlDialect;
use crate::error::Result;
use crate::types::{PageRequest, PagedResult, RawColumn, Record, TableInfo};

/// Source of raw per-column catalog metadata
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn load_columns(&self) -> Result<Vec<RawColumn>>;
}

/// Row access for a single connection
#[async_trait]
pub trait RowProvider: Send + Sync {
    /// Point lookup by identity equality. `Ok(None)` when no row matches.
    async fn fetch_record(&self, table: &TableInfo, record_id: &str) -> Result<Option<Record>>;

    /// One page of rows ordered by the identity column, with the total row count
    async fn fetch_page(&self, table: &TableInfo, page: PageRequest)
    -> Result<PagedResult<Record>>;
}

/// An opened connection: catalog, rows and the dialect to talk to it
pub trait Database: CatalogProvider + RowProvider {
    fn dialect(&self) -> Arc<dyn SqlDialect>;

    fn as_catalog_provider(&self) -> &dyn CatalogProvider;

    fn as_row_provider(&self) -> &dyn RowProvider;
}

/// Factory for [`Database`] handles, registered by name
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier used in connection records (e.g. "mssql")
    fn name(&self) -> &'static str;

    fn dialect(&self) -> Arc<dyn SqlDialect>;

    async fn open(&self, connection_string: &str) -> Result<Arc<dyn Database>>;
}
