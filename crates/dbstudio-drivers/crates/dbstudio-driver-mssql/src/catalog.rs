//! Catalog introspection and row queries for SQL Server

use dbstudio_core::{
    PageRequest, RawColumn, Record, Result, SqlDialect, StudioError, TableInfo, ROW_ID_COLUMN,
    ROW_REPR_COLUMN,
};

/// One row per column of every user table, with key and foreign key flags.
///
/// A non-identity first column that takes part in more than one index is
/// reported as an extension column (shared primary/foreign key).
pub const CATALOG_QUERY: &str = r#"
SELECT DISTINCT
    [Schema] = ss.name,
    [Table] = ts.name,
    Ordinal = c.column_id,
    ColumnName = c.name,
    NativeType = t.name,
    BaseType = t_base.name,
    DefaultValue = CASE
        WHEN CHARINDEX('((', OBJECT_DEFINITION(c.default_object_id)) > 0
            THEN SUBSTRING(OBJECT_DEFINITION(c.default_object_id), 3, LEN(OBJECT_DEFINITION(c.default_object_id)) - 4)
        ELSE SUBSTRING(OBJECT_DEFINITION(c.default_object_id), 2, LEN(OBJECT_DEFINITION(c.default_object_id)) - 2)
    END,
    IsIdentity = c.is_identity,
    IsNullable = c.is_nullable,
    IsPK = CASE WHEN pk.column_id IS NOT NULL THEN 1 ELSE 0 END,
    IsUK = CASE WHEN uk.column_id IS NOT NULL THEN 1 ELSE 0 END,
    IsFK = CASE WHEN fkc.constraint_column_id IS NULL THEN 0 ELSE 1 END,
    IsExtension = CASE WHEN (
        SELECT COUNT(ic.column_id) FROM sys.index_columns ic
        WHERE ic.object_id = c.object_id AND ic.column_id = c.column_id
          AND c.column_id = 1 AND c.is_identity = 0
    ) > 1 THEN 1 ELSE 0 END,
    SchemaFK = fks.name,
    TableFK = fkt.name
FROM sys.columns c
    JOIN sys.tables ts ON ts.object_id = c.object_id
    JOIN sys.schemas ss ON ss.schema_id = ts.schema_id
    JOIN sys.types t ON t.user_type_id = c.user_type_id
    JOIN sys.types t_base ON t_base.user_type_id = t.system_type_id
    LEFT JOIN (
        SELECT ic.column_id, ic.object_id
        FROM sys.indexes i
        JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
        JOIN sys.key_constraints kc ON i.name = kc.name AND kc.type = 'PK'
    ) pk ON c.column_id = pk.column_id AND c.object_id = pk.object_id
    LEFT JOIN (
        SELECT DISTINCT ixc.object_id, ixc.column_id
        FROM sys.indexes i
        JOIN sys.index_columns ixc ON i.object_id = ixc.object_id AND i.index_id = ixc.index_id
        WHERE i.is_unique = 1 AND i.is_primary_key = 0
    ) uk ON c.object_id = uk.object_id AND c.column_id = uk.column_id
    LEFT JOIN sys.foreign_key_columns fkc ON fkc.parent_column_id = c.column_id AND fkc.parent_object_id = c.object_id
    LEFT JOIN sys.tables fkt ON fkt.object_id = fkc.referenced_object_id
    LEFT JOIN sys.schemas fks ON fks.schema_id = fkt.schema_id
ORDER BY [Schema], [Table], Ordinal
"#;

fn identity_select(dialect: &dyn SqlDialect, table: &TableInfo) -> Option<String> {
    table
        .identity_column
        .as_deref()
        .filter(|name| !name.eq_ignore_ascii_case(ROW_ID_COLUMN))
        .map(|name| {
            format!(
                "{} AS {}",
                dialect.quote_identifier(name),
                dialect.quote_identifier(ROW_ID_COLUMN)
            )
        })
}

fn repr_select(dialect: &dyn SqlDialect, table: &TableInfo) -> Option<String> {
    let columns: Vec<String> = table
        .identifier_columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect();
    let expr = match columns.len() {
        0 => return None,
        1 => columns[0].clone(),
        _ => format!("CONCAT({})", columns.join(", '-', ")),
    };
    Some(format!("{} AS {}", expr, dialect.quote_identifier(ROW_REPR_COLUMN)))
}

/// Point lookup by identity; `id_literal` is an already encoded literal
pub fn record_query(dialect: &dyn SqlDialect, table: &TableInfo, id_literal: &str) -> Result<String> {
    let identity = table.identity_column.as_deref().ok_or_else(|| {
        StudioError::Configuration(format!(
            "table {} has no identity column",
            table.qualified_name()
        ))
    })?;
    let mut select = Vec::new();
    select.extend(identity_select(dialect, table));
    select.push("*".to_string());
    Ok(format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select.join(", "),
        dialect.qualified_table(&table.schema, &table.table),
        dialect.quote_identifier(identity),
        id_literal
    ))
}

pub fn page_query(dialect: &dyn SqlDialect, table: &TableInfo, page: PageRequest) -> String {
    let mut select = Vec::new();
    select.extend(identity_select(dialect, table));
    select.extend(repr_select(dialect, table));
    select.push("*".to_string());
    let order_by = table
        .identity_column
        .as_deref()
        .map(|c| dialect.quote_identifier(c));
    format!(
        "SELECT {} FROM {} {}",
        select.join(", "),
        dialect.qualified_table(&table.schema, &table.table),
        dialect.build_paging_clause(order_by.as_deref(), page)
    )
}

pub fn count_query(dialect: &dyn SqlDialect, table: &TableInfo) -> String {
    format!(
        "SELECT COUNT_BIG(*) AS total FROM {}",
        dialect.qualified_table(&table.schema, &table.table)
    )
}

fn field<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_deref())
}

fn required(record: &Record, name: &str) -> Result<String> {
    field(record, name)
        .map(str::to_string)
        .ok_or_else(|| StudioError::Driver(format!("catalog row is missing '{name}'")))
}

fn flag(record: &Record, name: &str) -> bool {
    field(record, name).is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn optional(record: &Record, name: &str) -> Option<String> {
    field(record, name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decode one row of [`CATALOG_QUERY`]
pub fn raw_column_from_record(record: &Record) -> Result<RawColumn> {
    let ordinal = required(record, "Ordinal")?;
    let ordinal = ordinal
        .trim()
        .parse::<i32>()
        .map_err(|_| StudioError::Driver(format!("invalid column ordinal '{ordinal}'")))?;

    Ok(RawColumn {
        schema: required(record, "Schema")?,
        table: required(record, "Table")?,
        ordinal,
        column_name: required(record, "ColumnName")?,
        native_type: required(record, "NativeType")?,
        base_type: optional(record, "BaseType"),
        default_value: field(record, "DefaultValue").map(str::to_string),
        is_identity: flag(record, "IsIdentity"),
        is_nullable: flag(record, "IsNullable"),
        is_pk: flag(record, "IsPK"),
        is_uk: flag(record, "IsUK"),
        is_fk: flag(record, "IsFK"),
        is_extension: flag(record, "IsExtension"),
        fk_schema: optional(record, "SchemaFK"),
        fk_table: optional(record, "TableFK"),
    })
}
