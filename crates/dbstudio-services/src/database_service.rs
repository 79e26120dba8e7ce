//! Connection-scoped facade over the record editing engine

use std::collections::HashMap;
use std::sync::Arc;

use dbstudio_core::{
    ConnectionRecord, CustomColumnOverride, Database, PageRequest, Record, RecordNode, Result,
    StudioError, TableInfo,
};
use dbstudio_drivers::DriverRegistry;
use dbstudio_schema::{Catalog, MetadataCache, MetadataEnricher, load_catalog};
use parking_lot::RwLock;

use crate::diff::DiffEngine;
use crate::resolver::RecordGraphResolver;
use crate::store::{ConnectionRegistry, OverrideStore};
use crate::synthesizer::MergeSynthesizer;
use crate::view_models::{ConnectionSummary, MergeSqlResult, TablePage};

/// Service for everything a front-end does with a named connection
///
/// This service owns:
/// - the opened database handle per connection
/// - the per-connection catalog cache, evicted whenever the connection
///   or one of its column overrides is redefined
pub struct DatabaseService {
    drivers: DriverRegistry,
    connections: Arc<dyn ConnectionRegistry>,
    overrides: Arc<dyn OverrideStore>,
    enricher: MetadataEnricher,
    cache: MetadataCache,
    databases: RwLock<HashMap<String, Arc<dyn Database>>>,
}

impl DatabaseService {
    pub fn new(
        drivers: DriverRegistry,
        connections: Arc<dyn ConnectionRegistry>,
        overrides: Arc<dyn OverrideStore>,
    ) -> Self {
        Self {
            drivers,
            connections,
            overrides,
            enricher: MetadataEnricher::new(),
            cache: MetadataCache::new(),
            databases: RwLock::new(HashMap::new()),
        }
    }

    /// Use a custom enricher, e.g. one carrying type aliases
    pub fn with_enricher(mut self, enricher: MetadataEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub async fn get_connections(&self) -> Result<Vec<ConnectionSummary>> {
        let records = self.connections.list().await?;
        Ok(records
            .into_iter()
            .map(|record| ConnectionSummary {
                catalog_loaded: self.cache.get(&record.name).is_some(),
                name: record.name,
                driver: record.driver,
                connection_string: record.connection_string,
            })
            .collect())
    }

    /// Create or replace a connection. Its cached catalog and open handle
    /// are dropped.
    #[tracing::instrument(skip(self, record), fields(connection = %record.name, driver = %record.driver))]
    pub async fn define_connection(&self, record: ConnectionRecord) -> Result<()> {
        self.drivers.resolve(&record.driver)?;
        let name = record.name.clone();
        self.connections.define(record).await?;
        self.invalidate(&name);
        tracing::info!("connection defined");
        Ok(())
    }

    /// Upsert column overrides for a connection and evict its catalog
    #[tracing::instrument(skip(self, overrides), fields(count = overrides.len()))]
    pub async fn define_column_config(
        &self,
        connection: &str,
        overrides: Vec<CustomColumnOverride>,
    ) -> Result<()> {
        self.connection_record(connection).await?;
        self.overrides.upsert(connection, overrides).await?;
        self.cache.invalidate(connection);
        Ok(())
    }

    pub async fn get_database_structure(&self, connection: &str) -> Result<Vec<TableInfo>> {
        let (_, catalog) = self.snapshot(connection).await?;
        Ok(catalog.tables().to_vec())
    }

    pub async fn get_table_info(
        &self,
        connection: &str,
        schema: &str,
        table: &str,
    ) -> Result<TableInfo> {
        let (_, catalog) = self.snapshot(connection).await?;
        catalog.table(schema, table).cloned()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_table_rows(
        &self,
        connection: &str,
        schema: &str,
        table: &str,
        page: u32,
        per_page: u32,
    ) -> Result<TablePage> {
        if page == 0 || per_page == 0 {
            return Err(StudioError::Validation(format!(
                "page and perPage must be at least 1, got {page} and {per_page}"
            )));
        }
        let (database, catalog) = self.snapshot(connection).await?;
        let table = catalog.table(schema, table)?;
        let result = database
            .fetch_page(table, PageRequest::new(page, per_page))
            .await?;
        Ok(result.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_record(
        &self,
        connection: &str,
        schema: &str,
        table: &str,
        record_id: &str,
    ) -> Result<Option<Record>> {
        if record_id.trim().is_empty() {
            return Err(StudioError::Validation("invalid record id".into()));
        }
        let (database, catalog) = self.snapshot(connection).await?;
        let table = catalog.table(schema, table)?;
        if table.identity_column.is_none() {
            return Err(StudioError::Configuration(format!(
                "table {} is not editable: it has no identity column",
                table.qualified_name()
            )));
        }
        database.fetch_record(table, record_id).await
    }

    /// MERGE scripts for the stored and the edited state of a record tree,
    /// and their diff
    #[tracing::instrument(skip(self, record), fields(table = %format!("{}.{}", record.schema, record.table)))]
    pub async fn get_merge_sql(
        &self,
        connection: &str,
        record: &RecordNode,
    ) -> Result<MergeSqlResult> {
        let start = std::time::Instant::now();
        let (database, catalog) = self.snapshot(connection).await?;

        let resolved = RecordGraphResolver::new(&catalog, database.as_row_provider())
            .resolve(record)
            .await?;

        let dialect = database.dialect();
        let synthesizer = MergeSynthesizer::new(&catalog, dialect.as_ref());
        let original_sql = match &resolved.original {
            Some(original) => synthesizer.script(original)?,
            None => String::new(),
        };
        let new_sql = synthesizer.script(&resolved.edited)?;
        let diff_sql = DiffEngine::script_diff(&original_sql, &new_sql);

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            changed = !diff_sql.is_empty(),
            "merge sql generated"
        );
        Ok(MergeSqlResult {
            original_sql,
            new_sql,
            diff_sql,
        })
    }

    /// Drop the cached catalog and open handle of a connection
    pub fn invalidate(&self, connection: &str) -> bool {
        let dropped_handle = self.databases.write().remove(connection).is_some();
        let dropped_catalog = self.cache.invalidate(connection);
        dropped_handle || dropped_catalog
    }

    async fn connection_record(&self, connection: &str) -> Result<ConnectionRecord> {
        self.connections
            .get(connection)
            .await?
            .ok_or_else(|| StudioError::Configuration(format!("connection {connection} not found")))
    }

    async fn database(&self, connection: &str) -> Result<Arc<dyn Database>> {
        let cached = self.databases.read().get(connection).cloned();
        if let Some(database) = cached {
            return Ok(database);
        }

        let record = self.connection_record(connection).await?;
        let driver = self.drivers.resolve(&record.driver)?;
        let database = driver.open(&record.connection_string).await?;
        tracing::info!(connection = %connection, driver = %record.driver, "database opened");

        Ok(self
            .databases
            .write()
            .entry(connection.to_string())
            .or_insert(database)
            .clone())
    }

    /// The database handle and one catalog snapshot, used for a whole request
    async fn snapshot(&self, connection: &str) -> Result<(Arc<dyn Database>, Arc<Catalog>)> {
        let database = self.database(connection).await?;
        let catalog = self
            .cache
            .get_or_load(connection, || async {
                let overrides = self.overrides.overrides_for(connection).await?;
                load_catalog(database.as_catalog_provider(), &self.enricher, &overrides).await
            })
            .await?;
        Ok((database, catalog))
    }
}
