use dbstudio_core::{PagedResult, Record};
use serde::{Deserialize, Serialize};

/// Generated scripts for one record tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSqlResult {
    /// Statements that reproduce the stored state
    pub original_sql: String,
    /// Statements that apply the edit
    pub new_sql: String,
    /// Line diff of the two, empty when they are equal
    pub diff_sql: String,
}

impl MergeSqlResult {
    pub fn has_changes(&self) -> bool {
        !self.diff_sql.is_empty()
    }
}

/// One page of table rows for browsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub items: Vec<Record>,
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

impl From<PagedResult<Record>> for TablePage {
    fn from(result: PagedResult<Record>) -> Self {
        Self {
            total_pages: result.total_pages(),
            items: result.items,
            total_count: result.total_count,
            page: result.page,
            per_page: result.per_page,
        }
    }
}

/// A configured connection as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub name: String,
    pub driver: String,
    pub connection_string: String,
    /// Whether the connection's catalog is currently cached
    pub catalog_loaded: bool,
}
