//! Persisted configuration seams: connection registry and column overrides

use std::collections::HashMap;

use async_trait::async_trait;
use dbstudio_core::{ConnectionRecord, CustomColumnOverride, Result, StudioError};
use parking_lot::RwLock;

/// Resolves connection names to connection records
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<ConnectionRecord>>;

    async fn get(&self, name: &str) -> Result<Option<ConnectionRecord>>;

    /// Insert or replace the record with the same name
    async fn define(&self, record: ConnectionRecord) -> Result<()>;
}

/// Column overrides keyed by (connection, schema, table, column)
#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn overrides_for(&self, connection: &str) -> Result<Vec<CustomColumnOverride>>;

    /// Replace each override with the same key. An override without any
    /// field removes the stored one.
    async fn upsert(&self, connection: &str, overrides: Vec<CustomColumnOverride>) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    records: RwLock<Vec<ConnectionRecord>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ConnectionRecord>) -> Self {
        let registry = Self::new();
        for record in records {
            registry.put(record);
        }
        registry
    }

    fn put(&self, record: ConnectionRecord) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn list(&self) -> Result<Vec<ConnectionRecord>> {
        Ok(self.records.read().clone())
    }

    async fn get(&self, name: &str) -> Result<Option<ConnectionRecord>> {
        Ok(self.records.read().iter().find(|r| r.name == name).cloned())
    }

    async fn define(&self, record: ConnectionRecord) -> Result<()> {
        if record.name.trim().is_empty() {
            return Err(StudioError::Validation("connection name is empty".into()));
        }
        self.put(record);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    overrides: RwLock<HashMap<String, Vec<CustomColumnOverride>>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, grouping overrides by their connection name
    pub fn with_overrides(overrides: impl IntoIterator<Item = CustomColumnOverride>) -> Self {
        let store = Self::new();
        {
            let mut map = store.overrides.write();
            for column_override in overrides {
                upsert_one(
                    map.entry(column_override.connection_name.clone()).or_default(),
                    column_override,
                );
            }
        }
        store
    }
}

fn upsert_one(stored: &mut Vec<CustomColumnOverride>, column_override: CustomColumnOverride) {
    let existing = stored.iter().position(|o| o.same_key(&column_override));
    match (existing, column_override.is_empty()) {
        (Some(idx), true) => {
            stored.remove(idx);
        }
        (Some(idx), false) => stored[idx] = column_override,
        (None, true) => {}
        (None, false) => stored.push(column_override),
    }
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn overrides_for(&self, connection: &str) -> Result<Vec<CustomColumnOverride>> {
        Ok(self
            .overrides
            .read()
            .get(connection)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, connection: &str, overrides: Vec<CustomColumnOverride>) -> Result<()> {
        if overrides
            .iter()
            .any(|o| o.schema.is_empty() || o.table.is_empty() || o.column_name.is_empty())
        {
            return Err(StudioError::Validation(format!(
                "override for connection {connection} needs schema, table and column"
            )));
        }

        let mut map = self.overrides.write();
        let stored = map.entry(connection.to_string()).or_default();
        for mut column_override in overrides {
            column_override.connection_name = connection.to_string();
            upsert_one(stored, column_override);
        }
        Ok(())
    }
}
