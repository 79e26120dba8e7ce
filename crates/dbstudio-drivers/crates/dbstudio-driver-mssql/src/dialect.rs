//! T-SQL dialect implementation for MS SQL Server

use dbstudio_core::literal::{NULL_LITERAL, is_null_literal};
use dbstudio_core::{MergeStatement, PageRequest, SqlDialect};

/// T-SQL dialect implementation for MS SQL Server
///
/// # Example
///
/// ```
/// use dbstudio_core::SqlDialect;
/// use dbstudio_driver_mssql::MssqlDialect;
///
/// let dialect = MssqlDialect::new();
/// assert_eq!(dialect.quote_identifier("table"), "[table]");
/// assert_eq!(dialect.qualified_table("Sales", "Order"), "[Sales].[Order]");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    pub fn new() -> Self {
        Self
    }

    /// `ORDER BY <column> OFFSET <n> ROWS FETCH NEXT <m> ROWS ONLY`
    ///
    /// ```
    /// use dbstudio_driver_mssql::MssqlDialect;
    ///
    /// let dialect = MssqlDialect::new();
    /// let clause = dialect.order_by_with_pagination("[CreatedAt] DESC", 10, 20);
    /// assert_eq!(clause, "ORDER BY [CreatedAt] DESC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");
    /// ```
    pub fn order_by_with_pagination(&self, order_by: &str, limit: u64, offset: u64) -> String {
        format!(
            "ORDER BY {} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            order_by, offset, limit
        )
    }

    fn target_column(&self, column: &str) -> String {
        format!("T.{}", self.quote_identifier(column))
    }

    fn source_column(&self, column: &str) -> String {
        format!("S.{}", self.quote_identifier(column))
    }

    fn on_condition(&self, merge: &MergeStatement, column: &str) -> String {
        let target = self.target_column(column);
        match merge.source_literal(column) {
            Some(literal) if is_null_literal(literal) => format!("{target} IS {NULL_LITERAL}"),
            _ => format!("{} = {}", target, self.source_column(column)),
        }
    }

    fn insert_clause(&self, merge: &MergeStatement) -> String {
        if merge.insert_columns.is_empty() {
            return "INSERT DEFAULT VALUES".to_string();
        }
        let columns = merge
            .insert_columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let values = merge
            .insert_columns
            .iter()
            .map(|c| self.source_column(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT ({columns}) VALUES ({values})")
    }
}

impl SqlDialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    /// SQL Server uses `[` and `]` as identifier delimiters; a closing
    /// bracket inside the identifier is doubled.
    fn quote_identifier(&self, ident: &str) -> String {
        let escaped = ident.replace(']', "]]");
        format!("[{}]", escaped)
    }

    fn current_timestamp(&self) -> &'static str {
        "SYSDATETIMEOFFSET()"
    }

    fn build_merge_statement(&self, merge: &MergeStatement) -> String {
        let source = merge
            .source
            .iter()
            .map(|c| format!("    {} AS {}", c.literal, self.quote_identifier(&c.name)))
            .collect::<Vec<_>>()
            .join(",\n");
        let on = merge
            .match_columns
            .iter()
            .map(|c| self.on_condition(merge, c))
            .collect::<Vec<_>>()
            .join(" AND ");
        let update = merge
            .update_columns
            .iter()
            .map(|c| format!("{} = {}", self.target_column(c), self.source_column(c)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "MERGE INTO {table} AS T\nUSING (SELECT\n{source}\n) AS S\nON {on}\nWHEN MATCHED THEN UPDATE SET {update}\nWHEN NOT MATCHED THEN {insert}\n;",
            table = self.qualified_table(&merge.schema, &merge.table),
            insert = self.insert_clause(merge),
        )
    }

    /// OFFSET/FETCH requires an ORDER BY; without a usable column the rows
    /// are ordered by `(SELECT NULL)`.
    fn build_paging_clause(&self, order_by: Option<&str>, page: PageRequest) -> String {
        self.order_by_with_pagination(
            order_by.unwrap_or("(SELECT NULL)"),
            u64::from(page.per_page),
            page.offset(),
        )
    }
}
