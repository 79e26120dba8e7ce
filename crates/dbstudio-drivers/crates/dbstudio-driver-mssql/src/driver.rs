//! MS SQL Server driver implementation

use async_trait::async_trait;
use std::sync::Arc;

use dbstudio_core::literal::encode_value;
use dbstudio_core::{
    CatalogProvider, Database, DatabaseDriver, PageRequest, PagedResult, RawColumn, Record,
    Result, RowProvider, SqlDialect, StudioError, TableInfo,
};

use crate::catalog::{CATALOG_QUERY, count_query, page_query, raw_column_from_record, record_query};
use crate::connection::MssqlConnection;
use crate::dialect::MssqlDialect;

/// MS SQL Server database driver
#[derive(Debug, Default)]
pub struct MssqlDriver;

impl MssqlDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseDriver for MssqlDriver {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(MssqlDialect::new())
    }

    #[tracing::instrument(skip(self, connection_string))]
    async fn open(&self, connection_string: &str) -> Result<Arc<dyn Database>> {
        let connection = MssqlConnection::connect(connection_string).await?;
        Ok(Arc::new(MssqlDatabase::new(connection)))
    }
}

/// An open SQL Server database
#[derive(Debug)]
pub struct MssqlDatabase {
    connection: MssqlConnection,
    dialect: MssqlDialect,
}

impl MssqlDatabase {
    pub fn new(connection: MssqlConnection) -> Self {
        Self {
            connection,
            dialect: MssqlDialect::new(),
        }
    }
}

#[async_trait]
impl CatalogProvider for MssqlDatabase {
    #[tracing::instrument(skip(self))]
    async fn load_columns(&self) -> Result<Vec<RawColumn>> {
        let records = self.connection.query_records(CATALOG_QUERY).await?;
        let columns = records
            .iter()
            .map(raw_column_from_record)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(column_count = columns.len(), "loaded catalog columns");
        Ok(columns)
    }
}

#[async_trait]
impl RowProvider for MssqlDatabase {
    #[tracing::instrument(skip(self, table), fields(table = %table.qualified_name()))]
    async fn fetch_record(&self, table: &TableInfo, record_id: &str) -> Result<Option<Record>> {
        let identity = table.identity().ok_or_else(|| {
            StudioError::Configuration(format!(
                "table {} is not editable: no identity column",
                table.qualified_name()
            ))
        })?;
        let id_literal = encode_value(identity.data_type, Some(record_id), &self.dialect)?;
        let sql = record_query(&self.dialect, table, &id_literal)?;
        let mut records = self.connection.query_records(&sql).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    #[tracing::instrument(skip(self, table), fields(table = %table.qualified_name()))]
    async fn fetch_page(
        &self,
        table: &TableInfo,
        page: PageRequest,
    ) -> Result<PagedResult<Record>> {
        let items = self
            .connection
            .query_records(&page_query(&self.dialect, table, page))
            .await?;
        let total_count = self
            .connection
            .query_count(&count_query(&self.dialect, table))
            .await?;
        Ok(PagedResult {
            items,
            total_count,
            page: page.page,
            per_page: page.per_page,
        })
    }
}

impl Database for MssqlDatabase {
    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(self.dialect)
    }

    fn as_catalog_provider(&self) -> &dyn CatalogProvider {
        self
    }

    fn as_row_provider(&self) -> &dyn RowProvider {
        self
    }
}
