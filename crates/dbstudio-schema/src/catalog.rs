//! Immutable per-connection table catalog

use std::collections::HashMap;

use dbstudio_core::{CatalogProvider, CustomColumnOverride, Result, StudioError, TableInfo};

use crate::enricher::MetadataEnricher;

/// Every table of a connection, built once and never mutated
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableInfo>,
    exact: HashMap<(String, String), usize>,
    folded: HashMap<(String, String), usize>,
}

impl Catalog {
    pub fn new(tables: Vec<TableInfo>) -> Self {
        let mut exact = HashMap::with_capacity(tables.len());
        let mut folded = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            exact.insert((table.schema.clone(), table.table.clone()), idx);
            folded
                .entry((
                    table.schema.to_ascii_lowercase(),
                    table.table.to_ascii_lowercase(),
                ))
                .or_insert(idx);
        }
        Self {
            tables,
            exact,
            folded,
        }
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look a table up by exact name, then case-insensitively
    pub fn find(&self, schema: &str, table: &str) -> Option<&TableInfo> {
        self.exact
            .get(&(schema.to_string(), table.to_string()))
            .or_else(|| {
                self.folded
                    .get(&(schema.to_ascii_lowercase(), table.to_ascii_lowercase()))
            })
            .map(|idx| &self.tables[*idx])
    }

    /// Like [`Catalog::find`], failing with a schema error
    pub fn table(&self, schema: &str, table: &str) -> Result<&TableInfo> {
        self.find(schema, table)
            .ok_or_else(|| StudioError::Schema(format!("table {schema}.{table} not found")))
    }
}

/// Query the provider and enrich the result into a [`Catalog`]
#[tracing::instrument(skip_all)]
pub async fn load_catalog(
    provider: &dyn CatalogProvider,
    enricher: &MetadataEnricher,
    overrides: &[CustomColumnOverride],
) -> Result<Catalog> {
    let start = std::time::Instant::now();
    let raw = provider.load_columns().await?;
    let catalog = Catalog::new(enricher.enrich(raw, overrides));
    tracing::debug!(
        table_count = catalog.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "catalog loaded"
    );
    Ok(catalog)
}
