//! Line diff between two generated scripts

use similar::{ChangeTag, TextDiff};

/// SQL-unaware line diff engine
pub struct DiffEngine;

impl DiffEngine {
    /// Individual line changes from `old` to `new`
    pub fn changes(old: &str, new: &str) -> Vec<Change> {
        let diff = TextDiff::from_lines(old, new);
        diff.iter_all_changes()
            .map(|change| {
                let tag = match change.tag() {
                    ChangeTag::Delete => ChangeType::Deleted,
                    ChangeTag::Insert => ChangeType::Inserted,
                    ChangeTag::Equal => ChangeType::Unchanged,
                };
                Change {
                    tag,
                    value: change.value().trim_end_matches(['\r', '\n']).to_string(),
                    old_index: change.old_index(),
                    new_index: change.new_index(),
                }
            })
            .collect()
    }

    /// Render every line prefixed with `+ `, `- ` or two spaces.
    ///
    /// Returns an empty string when the trimmed scripts are equal.
    pub fn script_diff(old: &str, new: &str) -> String {
        if old.trim() == new.trim() {
            return String::new();
        }

        let mut out = String::new();
        for change in Self::changes(old, new) {
            out.push_str(change.tag.prefix());
            out.push_str(&change.value);
            out.push('\n');
        }
        out
    }
}

/// Type of change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeType {
    Inserted,
    Deleted,
    Unchanged,
}

impl ChangeType {
    pub fn prefix(self) -> &'static str {
        match self {
            ChangeType::Inserted => "+ ",
            ChangeType::Deleted => "- ",
            ChangeType::Unchanged => "  ",
        }
    }
}

/// A single line of the diff
#[derive(Clone, Debug)]
pub struct Change {
    pub tag: ChangeType,
    pub value: String,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
}
