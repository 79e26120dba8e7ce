//! Data model shared by the schema, driver and service crates

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A row as exchanged with clients: column name to nullable string value
pub type Record = IndexMap<String, Option<String>>;

/// Canonical data type a native column type is mapped onto
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    #[default]
    Undefined,
    String,
    Char,
    Integer,
    Decimal,
    Float,
    Boolean,
    DateTime,
    DateTimeOffset,
    TimeOnly,
    Binary,
    Json,
    Xml,
    Guid,
}

/// A column row exactly as the catalog provider reports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawColumn {
    pub schema: String,
    pub table: String,
    pub ordinal: i32,
    pub column_name: String,
    pub native_type: String,
    /// System type a user-defined alias type is built on
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default, rename = "isPK")]
    pub is_pk: bool,
    #[serde(default, rename = "isUK")]
    pub is_uk: bool,
    #[serde(default, rename = "isFK")]
    pub is_fk: bool,
    #[serde(default)]
    pub is_extension: bool,
    #[serde(default, rename = "schemaFK")]
    pub fk_schema: Option<String>,
    #[serde(default, rename = "tableFK")]
    pub fk_table: Option<String>,
}

/// Enriched column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub schema: String,
    pub table: String,
    pub column_name: String,
    pub ordinal: i32,
    pub data_type: DataType,
    pub native_type: String,
    pub default_value: Option<String>,
    pub is_nullable: bool,
    pub is_identity: bool,
    #[serde(rename = "isPK")]
    pub is_pk: bool,
    #[serde(rename = "isFK")]
    pub is_fk: bool,
    #[serde(rename = "isUK")]
    pub is_uk: bool,
    pub is_extension: bool,
    pub is_custom: bool,
    #[serde(rename = "schemaFK")]
    pub fk_schema: Option<String>,
    #[serde(rename = "tableFK")]
    pub fk_table: Option<String>,
}

impl ColumnInfo {
    /// Target `(schema, table)` of a foreign key column.
    pub fn fk_target(&self) -> Option<(&str, &str)> {
        if !self.is_fk {
            return None;
        }
        match (self.fk_schema.as_deref(), self.fk_table.as_deref()) {
            (Some(schema), Some(table)) if !schema.is_empty() && !table.is_empty() => {
                Some((schema, table))
            }
            _ => None,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.column_name.eq_ignore_ascii_case(name)
    }
}

/// Enriched table metadata; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub identity_column: Option<String>,
    pub identifier_columns: Vec<String>,
    pub insertable_columns: Vec<String>,
    pub updateable_columns: Vec<String>,
    pub is_entity: bool,
    pub is_extension: bool,
}

impl TableInfo {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.column_name == name)
            .or_else(|| self.columns.iter().find(|c| c.is_named(name)))
    }

    pub fn identity(&self) -> Option<&ColumnInfo> {
        self.identity_column
            .as_deref()
            .and_then(|name| self.column(name))
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.fk_target().is_some())
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }
}

/// A persisted per-column correction. Any field that is present wins over
/// the catalog-derived value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomColumnOverride {
    pub connection_name: String,
    pub schema: String,
    pub table: String,
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_identity: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,
    #[serde(default, rename = "isPK", skip_serializing_if = "Option::is_none")]
    pub is_pk: Option<bool>,
    #[serde(default, rename = "isFK", skip_serializing_if = "Option::is_none")]
    pub is_fk: Option<bool>,
    #[serde(default, rename = "isUK", skip_serializing_if = "Option::is_none")]
    pub is_uk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_extension: Option<bool>,
    #[serde(default, rename = "schemaFK", skip_serializing_if = "Option::is_none")]
    pub fk_schema: Option<String>,
    #[serde(default, rename = "tableFK", skip_serializing_if = "Option::is_none")]
    pub fk_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

impl CustomColumnOverride {
    pub fn new(
        connection_name: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_name: connection_name.into(),
            schema: schema.into(),
            table: table.into(),
            column_name: column_name.into(),
            ..Default::default()
        }
    }

    /// True when the override carries no field at all
    pub fn is_empty(&self) -> bool {
        self.is_identity.is_none()
            && self.is_nullable.is_none()
            && self.is_pk.is_none()
            && self.is_fk.is_none()
            && self.is_uk.is_none()
            && self.is_extension.is_none()
            && self.fk_schema.is_none()
            && self.fk_table.is_none()
            && self.default_value.is_none()
            && self.data_type.is_none()
    }

    /// Whether both overrides address the same column
    pub fn same_key(&self, other: &CustomColumnOverride) -> bool {
        self.connection_name == other.connection_name
            && self.schema.eq_ignore_ascii_case(&other.schema)
            && self.table.eq_ignore_ascii_case(&other.table)
            && self.column_name.eq_ignore_ascii_case(&other.column_name)
    }
}

fn default_driver() -> String {
    "mssql".to_string()
}

/// A named connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub name: String,
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(alias = "connection_string")]
    pub connection_string: String,
}

impl ConnectionRecord {
    pub fn new(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: default_driver(),
            connection_string: connection_string.into(),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }
}

/// One-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 100,
        }
    }
}

/// A page of items with the total count of the underlying set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.per_page))
    }
}
