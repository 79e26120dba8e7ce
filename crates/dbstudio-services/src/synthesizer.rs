//! MERGE batch synthesis
//!
//! One statement per in-edition node, dependencies first, so every row a
//! statement references has been written by an earlier statement.

use dbstudio_core::literal::column_literal;
use dbstudio_core::{
    ColumnInfo, IdentityLookup, MergeStatement, ROW_ID_COLUMN, RecordNode, Result, SourceColumn,
    SqlDialect, StudioError, TableInfo,
};
use dbstudio_schema::Catalog;

/// Join statements into one script, separated by a blank line
pub fn join_statements(statements: &[String]) -> String {
    statements.join("\n\n")
}

pub struct MergeSynthesizer<'a> {
    catalog: &'a Catalog,
    dialect: &'a dyn SqlDialect,
}

impl<'a> MergeSynthesizer<'a> {
    pub fn new(catalog: &'a Catalog, dialect: &'a dyn SqlDialect) -> Self {
        Self { catalog, dialect }
    }

    /// Statements for every in-edition node of the tree, in post-order.
    ///
    /// A node that is not in edition contributes nothing, and neither does
    /// anything below it.
    pub fn statements(&self, root: &RecordNode) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.collect(root, &mut out)?;
        Ok(out)
    }

    pub fn script(&self, root: &RecordNode) -> Result<String> {
        Ok(join_statements(&self.statements(root)?))
    }

    fn collect(&self, node: &RecordNode, out: &mut Vec<String>) -> Result<()> {
        if !node.is_edition {
            return Ok(());
        }
        for dependency in &node.dependencies {
            self.collect(dependency, out)?;
        }

        let table = self.catalog.table(&node.schema, &node.table)?;
        let merge = self.merge_statement(table, node)?;
        out.push(self.dialect.build_merge_statement(&merge));
        Ok(())
    }

    /// Dialect-neutral MERGE for a single node
    pub fn merge_statement(&self, table: &TableInfo, node: &RecordNode) -> Result<MergeStatement> {
        let source = table
            .columns
            .iter()
            .map(|column| {
                Ok(SourceColumn::new(
                    &column.column_name,
                    self.source_literal(column, node)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MergeStatement {
            schema: table.schema.clone(),
            table: table.table.clone(),
            source,
            match_columns: table.identifier_columns.clone(),
            update_columns: update_columns(table)?,
            insert_columns: table.insertable_columns.clone(),
        })
    }

    /// Subquery for a bound dependency, otherwise the encoded value
    fn source_literal(&self, column: &ColumnInfo, node: &RecordNode) -> Result<String> {
        let value = node.value(&column.column_name);
        if column.fk_target().is_some() {
            if let Some(dependency) = self.bound_dependency(column, node, value)? {
                return self.identity_lookup(dependency);
            }
        }
        column_literal(column, value, self.dialect)
    }

    /// The dependency a foreign key value points at: the one whose row id
    /// equals the value, or for a NULL value an in-edition row that does
    /// not exist yet.
    fn bound_dependency<'n>(
        &self,
        column: &ColumnInfo,
        node: &'n RecordNode,
        value: Option<&str>,
    ) -> Result<Option<&'n RecordNode>> {
        for dependency in node.dependencies_for(&column.column_name) {
            let row_id = self.row_id(dependency)?;
            let bound = match value {
                Some(value) => row_id == Some(value),
                None => dependency.is_edition && row_id.is_none(),
            };
            if bound {
                return Ok(Some(dependency));
            }
        }
        Ok(None)
    }

    fn row_id<'n>(&self, node: &'n RecordNode) -> Result<Option<&'n str>> {
        if let Some(id) = node.value(ROW_ID_COLUMN) {
            return Ok(Some(id));
        }
        let table = self.catalog.table(&node.schema, &node.table)?;
        Ok(table
            .identity_column
            .as_deref()
            .and_then(|identity| node.value(identity)))
    }

    fn identity_lookup(&self, dependency: &RecordNode) -> Result<String> {
        let table = self.catalog.table(&dependency.schema, &dependency.table)?;
        let identity_column = table.identity_column.clone().ok_or_else(|| {
            StudioError::Configuration(format!(
                "table {} is not editable: it has no identity column to reference",
                table.qualified_name()
            ))
        })?;

        let conditions = table
            .identifier_columns
            .iter()
            .map(|name| {
                let column = table.column(name).ok_or_else(|| {
                    StudioError::Schema(format!(
                        "column {name} not found in {}",
                        table.qualified_name()
                    ))
                })?;
                Ok((
                    column.column_name.clone(),
                    self.source_literal(column, dependency)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.dialect.build_identity_lookup(&IdentityLookup {
            schema: table.schema.clone(),
            table: table.table.clone(),
            identity_column,
            conditions,
        }))
    }
}

/// Updateable columns, falling back to the non-identity identifier columns
/// and then to the insertable columns so `WHEN MATCHED` always has a target.
fn update_columns(table: &TableInfo) -> Result<Vec<String>> {
    if !table.updateable_columns.is_empty() {
        return Ok(table.updateable_columns.clone());
    }

    let identifiers: Vec<String> = table
        .identifier_columns
        .iter()
        .filter(|name| {
            table
                .identity_column
                .as_deref()
                .is_none_or(|identity| !identity.eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect();
    if !identifiers.is_empty() {
        return Ok(identifiers);
    }
    if !table.insertable_columns.is_empty() {
        return Ok(table.insertable_columns.clone());
    }

    Err(StudioError::Configuration(format!(
        "table {} has no column a MERGE can write",
        table.qualified_name()
    )))
}
