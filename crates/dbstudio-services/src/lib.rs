//! dbstudio services layer
//!
//! Orchestrates the engine behind record editing:
//!
//! ```text
//! DatabaseService
//!     ↓
//! RecordGraphResolver → MergeSynthesizer → DiffEngine
//!     ↓
//! MetadataCache / Catalog (dbstudio-schema)
//!     ↓
//! DriverRegistry / Database (dbstudio-drivers, dbstudio-core)
//! ```
//!
//! # Services
//!
//! - [`DatabaseService`] - connection-scoped facade used by front-ends
//! - [`RecordGraphResolver`] - reconciles a record tree against live rows
//! - [`MergeSynthesizer`] - turns a resolved tree into an ordered MERGE batch
//! - [`DiffEngine`] - line diff between two generated scripts
//! - [`ConnectionRegistry`], [`OverrideStore`] - seams to persisted configuration

mod database_service;
mod diff;
mod resolver;
mod store;
mod synthesizer;
mod view_models;

pub use database_service::DatabaseService;
pub use diff::{Change, ChangeType, DiffEngine};
pub use resolver::{RecordGraphResolver, ResolvedRecord};
pub use store::{ConnectionRegistry, InMemoryConnectionRegistry, InMemoryOverrideStore, OverrideStore};
pub use synthesizer::{MergeSynthesizer, join_statements};
pub use view_models::{ConnectionSummary, MergeSqlResult, TablePage};
