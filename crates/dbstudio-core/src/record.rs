//! Client-submitted record tree

use serde::{Deserialize, Serialize};

use crate::types::Record;

/// Synthetic column carrying a row's identity value in fetched rows
pub const ROW_ID_COLUMN: &str = "__id";

/// Synthetic column carrying a row's human readable representation
pub const ROW_REPR_COLUMN: &str = "__repr";

/// A record and the records its foreign keys point at.
///
/// `parent_column` names the foreign key column on the *parent* node that
/// links to this one; it is `None` only at the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordNode {
    #[serde(default)]
    pub is_edition: bool,
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub parent_column: Option<String>,
    #[serde(default)]
    pub columns: Record,
    #[serde(default)]
    pub dependencies: Vec<RecordNode>,
}

impl RecordNode {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn editing(mut self) -> Self {
        self.is_edition = true;
        self
    }

    pub fn with_parent_column(mut self, column: impl Into<String>) -> Self {
        self.parent_column = Some(column.into());
        self
    }

    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.insert(column.into(), Some(value.into()));
        self
    }

    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.columns.insert(column.into(), None);
        self
    }

    pub fn with_dependency(mut self, dependency: RecordNode) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Value of a column, matching the name exactly first and then
    /// case-insensitively. Absent and NULL both yield `None`.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
                    .map(|(_, value)| value)
            })
            .and_then(|value| value.as_deref())
    }

    /// Dependencies linked through the given foreign key column
    pub fn dependencies_for<'a, 'c>(
        &'a self,
        column: &'c str,
    ) -> impl Iterator<Item = &'a RecordNode> + use<'a, 'c> {
        self.dependencies.iter().filter(move |dep| {
            dep.parent_column
                .as_deref()
                .is_some_and(|parent| parent.eq_ignore_ascii_case(column))
        })
    }

    /// Number of nodes in the tree rooted here
    pub fn node_count(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(RecordNode::node_count)
            .sum::<usize>()
    }
}
