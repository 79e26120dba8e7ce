//! Per-connection metadata cache
//!
//! Each connection's [`Catalog`] is built lazily on first access and kept
//! for the process lifetime. Concurrent first accesses share one load.
//! Invalidation evicts the entry; the next access rebuilds it from scratch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dbstudio_core::Result;
use parking_lot::RwLock;
use tokio::sync::OnceCell;

use crate::catalog::Catalog;

type Slot = Arc<OnceCell<Arc<Catalog>>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub invalidations: u64,
}

#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    invalidations: AtomicU64,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, connection: &str) -> Slot {
        if let Some(slot) = self.entries.read().get(connection) {
            return slot.clone();
        }
        self.entries
            .write()
            .entry(connection.to_string())
            .or_default()
            .clone()
    }

    /// Cached catalog for `connection`, running `load` if there is none.
    ///
    /// Only one `load` runs per entry at a time; other callers wait for it.
    /// A failed load leaves the entry empty.
    pub async fn get_or_load<F, Fut>(&self, connection: &str, load: F) -> Result<Arc<Catalog>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Catalog>>,
    {
        let slot = self.slot(connection);
        if let Some(catalog) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(connection = %connection, "cache hit for catalog");
            return Ok(catalog.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(connection = %connection, "cache miss for catalog");
        let catalog = slot
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                load().await.map(Arc::new)
            })
            .await?;
        Ok(catalog.clone())
    }

    /// Cached catalog without loading
    pub fn get(&self, connection: &str) -> Option<Arc<Catalog>> {
        self.entries
            .read()
            .get(connection)
            .and_then(|slot| slot.get().cloned())
    }

    /// Evict a connection's catalog. Returns whether an entry existed.
    pub fn invalidate(&self, connection: &str) -> bool {
        let removed = self.entries.write().remove(connection).is_some();
        if removed {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
            tracing::info!(connection = %connection, "catalog cache invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        tracing::info!(count, "catalog cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
