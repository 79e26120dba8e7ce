//! SQL dialect capability
//!
//! Everything the synthesizer and the row providers need to know about a
//! target engine's syntax lives behind [`SqlDialect`], so a new engine only
//! has to implement this trait.

use crate::literal::equality_condition;
use crate::types::PageRequest;

/// One computed source column of a MERGE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    /// Rendered SQL literal or parenthesized subquery
    pub literal: String,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            literal: literal.into(),
        }
    }
}

/// Dialect-neutral description of an upsert of a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatement {
    pub schema: String,
    pub table: String,
    pub source: Vec<SourceColumn>,
    /// Columns joined in the `ON` clause
    pub match_columns: Vec<String>,
    pub update_columns: Vec<String>,
    pub insert_columns: Vec<String>,
}

impl MergeStatement {
    pub fn source_literal(&self, column: &str) -> Option<&str> {
        self.source
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
            .map(|c| c.literal.as_str())
    }
}

/// `SELECT <identity> FROM <table> WHERE <conditions>` used to resolve a
/// foreign key value from a dependency's natural key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityLookup {
    pub schema: String,
    pub table: String,
    pub identity_column: String,
    /// `(column, literal)` pairs, AND-joined
    pub conditions: Vec<(String, String)>,
}

pub trait SqlDialect: Send + Sync + std::fmt::Debug {
    /// Driver name this dialect belongs to (e.g. "mssql")
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal, doubling embedded single quotes
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn qualified_table(&self, schema: &str, table: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(table)
        )
    }

    /// Server-side "now" expression used for timestamp columns
    fn current_timestamp(&self) -> &'static str;

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex::encode_upper(bytes))
    }

    fn build_merge_statement(&self, merge: &MergeStatement) -> String;

    /// Parenthesized scalar subquery selecting the identity value of the row
    /// matching `lookup.conditions`.
    fn build_identity_lookup(&self, lookup: &IdentityLookup) -> String {
        let conditions = lookup
            .conditions
            .iter()
            .map(|(column, literal)| equality_condition(&self.quote_identifier(column), literal))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(
            "(SELECT {} FROM {} WHERE {})",
            self.quote_identifier(&lookup.identity_column),
            self.qualified_table(&lookup.schema, &lookup.table),
            conditions
        )
    }

    /// Trailing `ORDER BY ... <paging>` clause. `order_by` is an already
    /// quoted column; `None` means no stable order exists.
    fn build_paging_clause(&self, order_by: Option<&str>, page: PageRequest) -> String;
}
