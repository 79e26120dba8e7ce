//! dbstudio schema - enriched metadata for a connection
//!
//! This crate provides:
//! - `MetadataEnricher` - classifies raw catalog columns and merges overrides
//! - `keys` - identifier, insertable and updateable column selection
//! - `Catalog` - an immutable snapshot of every table of a connection
//! - `MetadataCache` - lazily built, per-connection catalog cache

mod cache;
mod catalog;
mod enricher;
pub mod keys;

pub use cache::{CacheStats, MetadataCache};
pub use catalog::{Catalog, load_catalog};
pub use enricher::{MetadataEnricher, builtin_data_type};
