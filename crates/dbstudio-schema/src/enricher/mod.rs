//! Metadata enrichment
//!
//! Turns raw catalog rows into [`TableInfo`]s: infers identity and
//! extension semantics from naming conventions, maps native types onto
//! [`DataType`] and applies per-column overrides.

use std::collections::{BTreeMap, HashMap};

use dbstudio_core::naming::is_identity_name;
use dbstudio_core::{ColumnInfo, CustomColumnOverride, DataType, RawColumn, TableInfo};

use crate::keys;

/// Map a native SQL Server type name onto its canonical data type.
///
/// Brackets, any `schema.` prefix and a `(length)` suffix are ignored, as is
/// case. Unknown names map to [`DataType::Undefined`].
pub fn builtin_data_type(native_type: &str) -> DataType {
    match normalize_type_name(native_type).as_str() {
        "nvarchar" | "varchar" | "nchar" | "text" | "ntext" | "sysname" => DataType::String,
        "char" => DataType::Char,
        "bit" => DataType::Boolean,
        "time" => DataType::TimeOnly,
        "datetimeoffset" => DataType::DateTimeOffset,
        "date" | "datetime" | "datetime2" | "smalldatetime" => DataType::DateTime,
        "bigint" | "int" | "smallint" | "tinyint" => DataType::Integer,
        "real" | "float" => DataType::Float,
        "numeric" | "decimal" | "money" | "smallmoney" => DataType::Decimal,
        "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => DataType::Binary,
        "uniqueidentifier" => DataType::Guid,
        "xml" => DataType::Xml,
        "json" => DataType::Json,
        _ => DataType::Undefined,
    }
}

fn normalize_type_name(native_type: &str) -> String {
    let stripped: String = native_type
        .chars()
        .filter(|c| *c != '[' && *c != ']')
        .collect();
    let name = stripped.rsplit('.').next().unwrap_or_default();
    let name = name.split('(').next().unwrap_or_default();
    name.trim().to_ascii_lowercase()
}

type ColumnKey = (String, String, String);

fn column_key(schema: &str, table: &str, column: &str) -> ColumnKey {
    (
        schema.to_ascii_lowercase(),
        table.to_ascii_lowercase(),
        column.to_ascii_lowercase(),
    )
}

/// Builds enriched table metadata from raw catalog rows
#[derive(Debug, Clone, Default)]
pub struct MetadataEnricher {
    type_aliases: HashMap<String, DataType>,
}

impl MetadataEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// User-defined type names (e.g. `TCode`) consulted before the built-in map
    pub fn with_type_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: AsRef<str>,
    {
        self.type_aliases.extend(
            aliases
                .into_iter()
                .map(|(name, data_type)| (normalize_type_name(name.as_ref()), data_type)),
        );
        self
    }

    pub fn infer_data_type(&self, native_type: &str, base_type: Option<&str>) -> DataType {
        if let Some(data_type) = self.type_aliases.get(&normalize_type_name(native_type)) {
            return *data_type;
        }
        match builtin_data_type(native_type) {
            DataType::Undefined => base_type.map_or(DataType::Undefined, builtin_data_type),
            data_type => data_type,
        }
    }

    /// Enrich every raw column, apply the connection's overrides and group
    /// the result into tables sorted by schema, then table.
    pub fn enrich(
        &self,
        raw_columns: Vec<RawColumn>,
        overrides: &[CustomColumnOverride],
    ) -> Vec<TableInfo> {
        let overrides: HashMap<ColumnKey, &CustomColumnOverride> = overrides
            .iter()
            .filter(|o| !o.is_empty())
            .map(|o| (column_key(&o.schema, &o.table, &o.column_name), o))
            .collect();

        let mut grouped: BTreeMap<(String, String), Vec<ColumnInfo>> = BTreeMap::new();
        for raw in raw_columns {
            let key = column_key(&raw.schema, &raw.table, &raw.column_name);
            let mut column = self.enrich_column(raw);
            if let Some(column_override) = overrides.get(&key) {
                apply_override(&mut column, column_override);
            }
            normalize(&mut column);
            grouped
                .entry((column.schema.clone(), column.table.clone()))
                .or_default()
                .push(column);
        }

        let tables: Vec<TableInfo> = grouped
            .into_iter()
            .map(|((schema, table), mut columns)| {
                columns.sort_by_key(|c| c.ordinal);
                keys::build_table(schema, table, columns)
            })
            .collect();

        tracing::debug!(
            table_count = tables.len(),
            override_count = overrides.len(),
            "enriched catalog"
        );
        tables
    }

    fn enrich_column(&self, raw: RawColumn) -> ColumnInfo {
        let is_identity =
            raw.is_identity || (raw.is_pk && is_identity_name(&raw.table, &raw.column_name));
        let is_extension = raw.is_fk
            && (raw.is_extension
                || (!is_identity
                    && raw.is_pk
                    && raw
                        .fk_table
                        .as_deref()
                        .is_some_and(|target| is_identity_name(target, &raw.column_name))));
        let data_type = self.infer_data_type(&raw.native_type, raw.base_type.as_deref());

        ColumnInfo {
            schema: raw.schema,
            table: raw.table,
            column_name: raw.column_name,
            ordinal: raw.ordinal,
            data_type,
            native_type: raw.native_type,
            default_value: raw.default_value,
            is_nullable: raw.is_nullable,
            is_identity,
            is_pk: raw.is_pk,
            is_fk: raw.is_fk,
            is_uk: raw.is_uk,
            is_extension,
            is_custom: false,
            fk_schema: raw.fk_schema,
            fk_table: raw.fk_table,
        }
    }
}

fn apply_override(column: &mut ColumnInfo, o: &CustomColumnOverride) {
    if let Some(v) = o.is_identity {
        column.is_identity = v;
    }
    if let Some(v) = o.is_nullable {
        column.is_nullable = v;
    }
    if let Some(v) = o.is_pk {
        column.is_pk = v;
    }
    if let Some(v) = o.is_fk {
        column.is_fk = v;
    }
    if let Some(v) = o.is_uk {
        column.is_uk = v;
    }
    if let Some(v) = o.is_extension {
        column.is_extension = v;
    }
    if let Some(v) = &o.fk_schema {
        column.fk_schema = Some(v.clone());
    }
    if let Some(v) = &o.fk_table {
        column.fk_table = Some(v.clone());
    }
    if let Some(v) = &o.default_value {
        column.default_value = Some(v.clone());
    }
    if let Some(v) = o.data_type {
        column.data_type = v;
    }
    column.is_custom = true;
}

/// Enforce that a foreign key has a target and an extension is a foreign key
fn normalize(column: &mut ColumnInfo) {
    if column.is_fk && column.fk_target().is_none() {
        tracing::warn!(
            table = %format!("{}.{}", column.schema, column.table),
            column = %column.column_name,
            "foreign key without target table, treating as plain column"
        );
        column.is_fk = false;
    }
    if column.is_extension && !column.is_fk {
        tracing::warn!(
            table = %format!("{}.{}", column.schema, column.table),
            column = %column.column_name,
            "extension column is not a foreign key, clearing extension flag"
        );
        column.is_extension = false;
    }
}

#[cfg(test)]
mod tests;
