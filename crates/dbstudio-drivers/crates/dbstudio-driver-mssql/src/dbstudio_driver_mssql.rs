//! MS SQL Server driver for dbstudio
//!
//! Provides the T-SQL dialect (bracket quoting, `MERGE`, `OFFSET ... FETCH`
//! paging), the catalog query and row lookups backed by tiberius.

mod catalog;
mod connection;
mod dialect;
mod driver;

#[cfg(test)]
mod catalog_tests;
#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod dialect_tests;

pub use catalog::{CATALOG_QUERY, count_query, page_query, raw_column_from_record, record_query};
pub use connection::{MssqlConnection, MssqlError};
pub use dialect::MssqlDialect;
pub use driver::{MssqlDatabase, MssqlDriver};
