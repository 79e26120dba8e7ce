//! Column naming conventions used to infer identity and timestamp semantics

/// Columns stamped once when a row is created
pub const CREATION_TIMESTAMP_COLUMNS: [&str; 2] = ["InsDateTime", "CreatedAt"];

/// Columns stamped on every write
pub const UPDATE_TIMESTAMP_COLUMNS: [&str; 2] = ["UpdDateTime", "UpdatedAt"];

/// Column names that make a table with an identity column an entity
pub const ENTITY_COLUMNS: [&str; 3] = ["Code", "Name", "Description"];

/// Natural key column of entity tables
pub const ENTITY_CODE_COLUMN: &str = "Code";

pub fn is_creation_timestamp(column: &str) -> bool {
    CREATION_TIMESTAMP_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(column))
}

pub fn is_update_timestamp(column: &str) -> bool {
    UPDATE_TIMESTAMP_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(column))
}

pub fn is_timestamp(column: &str) -> bool {
    is_creation_timestamp(column) || is_update_timestamp(column)
}

/// `OrderLine` becomes `Order_line`; case is left to the caller's
/// case-insensitive comparison. Names that already contain an
/// underscore are returned untouched.
pub fn snake_case(name: &str) -> String {
    if name.contains('_') {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Whether `column` follows one of the identity naming patterns relative to
/// `table`: `id`, `id<table>`, `<table>id`, `id_<table>`, `<table>_id`,
/// `id_<snake>`, `<snake>_id`. Comparison is case-insensitive.
pub fn is_identity_name(table: &str, column: &str) -> bool {
    let snake = snake_case(table);
    let candidates = [
        "id".to_string(),
        format!("id{table}"),
        format!("{table}id"),
        format!("id_{table}"),
        format!("{table}_id"),
        format!("id_{snake}"),
        format!("{snake}_id"),
    ];
    candidates.iter().any(|c| c.eq_ignore_ascii_case(column))
}
