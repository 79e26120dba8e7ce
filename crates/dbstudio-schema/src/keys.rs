//! Identifier, insertable and updateable column selection

use dbstudio_core::naming::{ENTITY_CODE_COLUMN, ENTITY_COLUMNS, is_creation_timestamp, is_timestamp};
use dbstudio_core::{ColumnInfo, TableInfo};

fn names<'a>(columns: impl Iterator<Item = &'a ColumnInfo>) -> Vec<String> {
    columns.map(|c| c.column_name.clone()).collect()
}

/// A table with an identity column and `Code`, `Name` and `Description` columns
pub fn is_entity(columns: &[ColumnInfo]) -> bool {
    columns.iter().any(|c| c.is_identity)
        && ENTITY_COLUMNS
            .iter()
            .all(|required| columns.iter().any(|c| c.is_named(required)))
}

/// Columns used to match a row in MERGE, first non-empty choice wins:
///
/// 1. natural keys: non-identity (or extension) PK columns and unique
///    columns, timestamps excluded
/// 2. any unique column
/// 3. `Code` on entity tables
/// 4. identity and extension columns
pub fn identifier_columns(columns: &[ColumnInfo], is_entity: bool) -> Vec<String> {
    let natural = names(columns.iter().filter(|c| {
        (!c.is_identity || c.is_extension)
            && ((c.is_pk && !c.is_identity) || c.is_uk)
            && !is_timestamp(&c.column_name)
    }));
    if !natural.is_empty() {
        return natural;
    }

    let unique = names(columns.iter().filter(|c| c.is_uk));
    if !unique.is_empty() {
        return unique;
    }

    if is_entity {
        if let Some(code) = columns.iter().find(|c| c.is_named(ENTITY_CODE_COLUMN)) {
            return vec![code.column_name.clone()];
        }
    }

    names(columns.iter().filter(|c| c.is_identity || c.is_extension))
}

pub fn insertable_columns(columns: &[ColumnInfo]) -> Vec<String> {
    names(columns.iter().filter(|c| !c.is_identity))
}

/// Insertable columns minus extension and creation timestamp columns
pub fn updateable_columns(columns: &[ColumnInfo]) -> Vec<String> {
    names(columns.iter().filter(|c| {
        !c.is_identity && !c.is_extension && !is_creation_timestamp(&c.column_name)
    }))
}

/// Assemble a [`TableInfo`] and its derived column sets
pub fn build_table(schema: String, table: String, columns: Vec<ColumnInfo>) -> TableInfo {
    let is_entity = is_entity(&columns);
    let identity_column = columns
        .iter()
        .find(|c| c.is_identity)
        .map(|c| c.column_name.clone());
    if columns.iter().filter(|c| c.is_identity).count() > 1 {
        tracing::warn!(
            table = %format!("{schema}.{table}"),
            "more than one identity column, using the first"
        );
    }

    TableInfo {
        identifier_columns: identifier_columns(&columns, is_entity),
        insertable_columns: insertable_columns(&columns),
        updateable_columns: updateable_columns(&columns),
        is_extension: columns.iter().any(|c| c.is_extension),
        identity_column,
        is_entity,
        schema,
        table,
        columns,
    }
}
