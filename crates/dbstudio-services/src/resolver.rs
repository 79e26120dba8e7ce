//! Record graph resolution
//!
//! Walks a client-submitted [`RecordNode`] tree against live data and
//! produces two structurally parallel trees: the *original* one, read back
//! from storage, and the *edited* one reflecting the client's changes. Only
//! foreign key edges that carry a concrete value are followed, so the walk
//! is bounded by the data actually stored rather than by the schema graph.

use async_recursion::async_recursion;
use dbstudio_core::{Record, RecordNode, Result, RowProvider, StudioError, TableInfo};
use dbstudio_schema::Catalog;

/// Original and edited views of one record tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    /// `None` when the root row does not exist yet
    pub original: Option<RecordNode>,
    pub edited: RecordNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Original,
    Edited,
}

/// (schema, table, record id) of a row on the current branch
type PathKey = (String, String, String);

/// Resolves record trees against one consistent catalog snapshot
pub struct RecordGraphResolver<'a> {
    catalog: &'a Catalog,
    rows: &'a dyn RowProvider,
}

impl<'a> RecordGraphResolver<'a> {
    pub fn new(catalog: &'a Catalog, rows: &'a dyn RowProvider) -> Self {
        Self { catalog, rows }
    }

    #[tracing::instrument(skip_all, fields(table = %format!("{}.{}", root.schema, root.table)))]
    pub async fn resolve(&self, root: &RecordNode) -> Result<ResolvedRecord> {
        validate_tree(root, true)?;

        let original = self.resolve_node(root, None, Side::Original, &[]).await?;
        let edited = self
            .resolve_node(root, None, Side::Edited, &[])
            .await?
            .unwrap_or_else(|| root.clone());

        tracing::debug!(
            original_nodes = original.as_ref().map_or(0, RecordNode::node_count),
            edited_nodes = edited.node_count(),
            "record graph resolved"
        );
        Ok(ResolvedRecord { original, edited })
    }

    #[async_recursion]
    async fn resolve_node(
        &self,
        node: &RecordNode,
        record_id: Option<String>,
        side: Side,
        path: &[PathKey],
    ) -> Result<Option<RecordNode>> {
        let table = self.catalog.table(&node.schema, &node.table)?;
        let record_id = match record_id {
            Some(id) => Some(id),
            None => table
                .identity_column
                .as_deref()
                .and_then(|identity| node.value(identity))
                .map(str::to_string),
        };

        let fetched = match &record_id {
            Some(id) => self.fetch(table, id).await?,
            None => None,
        };

        let columns = match (side, &fetched) {
            (Side::Original, Some(row)) => row.clone(),
            (Side::Original, None) => return Ok(None),
            (Side::Edited, None) if !node.is_edition => return Ok(None),
            (Side::Edited, _) if !node.columns.is_empty() => node.columns.clone(),
            (Side::Edited, row) => row.clone().unwrap_or_default(),
        };

        let key = record_id.map(|id| (table.schema.clone(), table.table.clone(), id));
        if let Some(key) = &key {
            if path.contains(key) {
                tracing::warn!(
                    table = %table.qualified_name(),
                    record_id = %key.2,
                    "record references itself through its foreign keys, stopping here"
                );
                return Ok(Some(RecordNode {
                    is_edition: false,
                    schema: table.schema.clone(),
                    table: table.table.clone(),
                    parent_column: node.parent_column.clone(),
                    columns,
                    dependencies: Vec::new(),
                }));
            }
        }
        let mut child_path = path.to_vec();
        child_path.extend(key);

        let dependencies = self
            .resolve_dependencies(table, node, fetched.as_ref(), side, &child_path)
            .await?;

        Ok(Some(RecordNode {
            is_edition: node.is_edition,
            schema: table.schema.clone(),
            table: table.table.clone(),
            parent_column: node.parent_column.clone(),
            columns,
            dependencies,
        }))
    }

    async fn resolve_dependencies(
        &self,
        table: &TableInfo,
        node: &RecordNode,
        fetched: Option<&Record>,
        side: Side,
        path: &[PathKey],
    ) -> Result<Vec<RecordNode>> {
        let mut resolved = Vec::new();

        for column in table.foreign_keys() {
            let Some((fk_schema, fk_table)) = column.fk_target() else {
                continue;
            };
            let target = self.catalog.table(fk_schema, fk_table)?;

            let placeholder;
            let dependency = match node.dependencies_for(&column.column_name).next() {
                Some(dependency) => dependency,
                None => {
                    placeholder = RecordNode::new(&target.schema, &target.table)
                        .with_parent_column(&column.column_name);
                    &placeholder
                }
            };

            let persisted = fetched.map(|row| column_value(row, &column.column_name));
            let edited = if node.columns.is_empty() {
                persisted.flatten()
            } else {
                node.value(&column.column_name)
            };
            // The edited tree always follows the value being written. The
            // original tree follows the stored value for lookup-only rows.
            let child_id = match side {
                Side::Original if !dependency.is_edition => persisted.unwrap_or(edited),
                _ => edited,
            };

            let child = self
                .resolve_node(dependency, child_id.map(str::to_string), side, path)
                .await?;
            resolved.extend(child);

            // The row may be detached from its stored parent and attached to
            // another one in the same edit.
            if side == Side::Original {
                if let Some(previous) = persisted.flatten().filter(|p| Some(*p) != child_id) {
                    let detached = self
                        .resolve_node(
                            dependency,
                            Some(previous.to_string()),
                            Side::Original,
                            path,
                        )
                        .await?;
                    if let Some(mut detached) = detached {
                        detached.is_edition = false;
                        resolved.push(detached);
                    }
                }
            }
        }

        let unbound = node
            .dependencies
            .iter()
            .filter(|dep| {
                dep.parent_column
                    .as_deref()
                    .is_none_or(|parent| table.foreign_keys().all(|c| !c.is_named(parent)))
            })
            .count();
        if unbound > 0 {
            tracing::debug!(
                table = %table.qualified_name(),
                unbound,
                "ignoring dependencies that match no foreign key column"
            );
        }

        Ok(resolved)
    }

    async fn fetch(&self, table: &TableInfo, record_id: &str) -> Result<Option<Record>> {
        if record_id.trim().is_empty() {
            return Err(StudioError::Validation(format!(
                "invalid record id for {}",
                table.qualified_name()
            )));
        }
        if table.identity_column.is_none() {
            return Err(StudioError::Configuration(format!(
                "table {} is not editable: it has no identity column",
                table.qualified_name()
            )));
        }
        self.rows.fetch_record(table, record_id).await
    }
}

fn column_value<'r>(row: &'r Record, column: &str) -> Option<&'r str> {
    row.get(column)
        .or_else(|| {
            row.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
        .and_then(|value| value.as_deref())
}

fn validate_tree(node: &RecordNode, is_root: bool) -> Result<()> {
    if node.schema.trim().is_empty() || node.table.trim().is_empty() {
        return Err(StudioError::Validation(
            "record node needs a schema and a table".into(),
        ));
    }
    if !is_root
        && node
            .parent_column
            .as_deref()
            .is_none_or(|parent| parent.trim().is_empty())
    {
        return Err(StudioError::Validation(format!(
            "dependency {}.{} has no parent column",
            node.schema, node.table
        )));
    }
    node.dependencies
        .iter()
        .try_for_each(|dep| validate_tree(dep, false))
}
