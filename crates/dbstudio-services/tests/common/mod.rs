//! Common test utilities and mocks

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dbstudio_core::{
    CatalogProvider, Database, DatabaseDriver, PageRequest, PagedResult, ROW_ID_COLUMN,
    ROW_REPR_COLUMN, RawColumn, Record, Result, RowProvider, SqlDialect, StudioError, TableInfo,
};
use dbstudio_drivers::DriverRegistry;
use dbstudio_drivers::mssql::MssqlDialect;
use dbstudio_services::{DatabaseService, InMemoryConnectionRegistry, InMemoryOverrideStore};

/// In-memory database for testing the engine without a server.
///
/// Serves a fixed set of catalog rows and table rows, and counts catalog
/// loads and row lookups so tests can assert on caching.
pub struct MockDatabase {
    pub columns: Vec<RawColumn>,
    pub rows: HashMap<(String, String), Vec<Record>>,
    pub catalog_delay: Option<Duration>,
    pub catalog_loads: AtomicUsize,
    pub fetch_log: parking_lot::Mutex<Vec<String>>,
}

impl MockDatabase {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self {
            columns,
            rows: HashMap::new(),
            catalog_delay: None,
            catalog_loads: AtomicUsize::new(0),
            fetch_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn with_row(mut self, schema: &str, table: &str, values: &[(&str, Option<&str>)]) -> Self {
        let record: Record = values
            .iter()
            .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
            .collect();
        self.rows
            .entry((schema.to_string(), table.to_string()))
            .or_default()
            .push(record);
        self
    }

    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = Some(delay);
        self
    }

    pub fn catalog_loads(&self) -> usize {
        self.catalog_loads.load(Ordering::SeqCst)
    }

    pub fn fetch_log(&self) -> Vec<String> {
        self.fetch_log.lock().clone()
    }

    fn table_rows(&self, table: &TableInfo) -> &[Record] {
        self.rows
            .get(&(table.schema.clone(), table.table.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn with_synthetic_columns(table: &TableInfo, row: &Record, include_repr: bool) -> Record {
    let value = |name: &str| row.get(name).cloned().flatten();
    let mut out = Record::new();
    out.insert(
        ROW_ID_COLUMN.to_string(),
        table.identity_column.as_deref().and_then(value),
    );
    if include_repr {
        let repr = table
            .identifier_columns
            .iter()
            .map(|c| value(c).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("-");
        out.insert(ROW_REPR_COLUMN.to_string(), Some(repr));
    }
    out.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

#[async_trait]
impl CatalogProvider for MockDatabase {
    async fn load_columns(&self) -> Result<Vec<RawColumn>> {
        self.catalog_loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.catalog_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.columns.clone())
    }
}

#[async_trait]
impl RowProvider for MockDatabase {
    async fn fetch_record(&self, table: &TableInfo, record_id: &str) -> Result<Option<Record>> {
        self.fetch_log
            .lock()
            .push(format!("{}#{}", table.qualified_name(), record_id));
        let identity = table
            .identity_column
            .as_deref()
            .ok_or_else(|| StudioError::Configuration("no identity column".into()))?;
        Ok(self
            .table_rows(table)
            .iter()
            .find(|row| row.get(identity).cloned().flatten().as_deref() == Some(record_id))
            .map(|row| with_synthetic_columns(table, row, false)))
    }

    async fn fetch_page(
        &self,
        table: &TableInfo,
        page: PageRequest,
    ) -> Result<PagedResult<Record>> {
        let rows = self.table_rows(table);
        let items = rows
            .iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .map(|row| with_synthetic_columns(table, row, true))
            .collect();
        Ok(PagedResult {
            items,
            total_count: rows.len() as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }
}

impl Database for MockDatabase {
    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(MssqlDialect::new())
    }

    fn as_catalog_provider(&self) -> &dyn CatalogProvider {
        self
    }

    fn as_row_provider(&self) -> &dyn RowProvider {
        self
    }
}

/// Driver handing out one shared [`MockDatabase`]
pub struct MockDriver {
    pub database: Arc<MockDatabase>,
    pub opens: AtomicUsize,
}

impl MockDriver {
    pub fn new(database: Arc<MockDatabase>) -> Self {
        Self {
            database,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(MssqlDialect::new())
    }

    async fn open(&self, _connection_string: &str) -> Result<Arc<dyn Database>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.database.clone() as Arc<dyn Database>)
    }
}

pub fn column(schema: &str, table: &str, ordinal: i32, name: &str, native_type: &str) -> RawColumn {
    RawColumn {
        schema: schema.into(),
        table: table.into(),
        ordinal,
        column_name: name.into(),
        native_type: native_type.into(),
        is_nullable: true,
        ..Default::default()
    }
}

pub fn identity(mut column: RawColumn) -> RawColumn {
    column.is_identity = true;
    column.is_pk = true;
    column.is_nullable = false;
    column
}

pub fn unique(mut column: RawColumn) -> RawColumn {
    column.is_uk = true;
    column
}

pub fn foreign_key(mut column: RawColumn, schema: &str, table: &str) -> RawColumn {
    column.is_fk = true;
    column.fk_schema = Some(schema.into());
    column.fk_table = Some(table.into());
    column
}

/// Sales schema used across the tests:
///
/// - `Customer(CustomerId identity, Email unique, Name)`
/// - `Order(OrderId identity, Number unique, CustomerId -> Customer, Paid bit, UpdatedAt)`
/// - `OrderLine(OrderLineId identity, OrderId -> Order unique, Sku unique, Quantity)`
/// - `Employee(EmployeeId identity, Code unique, ManagerId -> Employee)`
/// - `Log(Message, Level)` without identity
pub fn sales_columns() -> Vec<RawColumn> {
    vec![
        identity(column("Sales", "Customer", 1, "CustomerId", "int")),
        unique(column("Sales", "Customer", 2, "Email", "nvarchar")),
        column("Sales", "Customer", 3, "Name", "nvarchar"),
        identity(column("Sales", "Order", 1, "OrderId", "int")),
        unique(column("Sales", "Order", 2, "Number", "nvarchar")),
        foreign_key(column("Sales", "Order", 3, "CustomerId", "int"), "Sales", "Customer"),
        column("Sales", "Order", 4, "Paid", "bit"),
        column("Sales", "Order", 5, "UpdatedAt", "datetime2"),
        identity(column("Sales", "OrderLine", 1, "OrderLineId", "int")),
        unique(foreign_key(
            column("Sales", "OrderLine", 2, "OrderId", "int"),
            "Sales",
            "Order",
        )),
        unique(column("Sales", "OrderLine", 3, "Sku", "varchar")),
        column("Sales", "OrderLine", 4, "Quantity", "int"),
        identity(column("Sales", "Employee", 1, "EmployeeId", "int")),
        unique(column("Sales", "Employee", 2, "Code", "nvarchar")),
        foreign_key(column("Sales", "Employee", 3, "ManagerId", "int"), "Sales", "Employee"),
        column("Sales", "Log", 1, "Message", "nvarchar"),
        column("Sales", "Log", 2, "Level", "int"),
    ]
}

/// The sales schema with two customers, one order and a self-managed employee
pub fn sales_database() -> MockDatabase {
    MockDatabase::new(sales_columns())
        .with_row(
            "Sales",
            "Customer",
            &[("CustomerId", Some("1")), ("Email", Some("a@b.com")), ("Name", Some("Ann"))],
        )
        .with_row(
            "Sales",
            "Customer",
            &[("CustomerId", Some("2")), ("Email", Some("b@b.com")), ("Name", Some("Bea"))],
        )
        .with_row(
            "Sales",
            "Order",
            &[
                ("OrderId", Some("10")),
                ("Number", Some("SO-10")),
                ("CustomerId", Some("1")),
                ("Paid", Some("1")),
                ("UpdatedAt", Some("2024-05-01T10:00:00")),
            ],
        )
        .with_row(
            "Sales",
            "Employee",
            &[("EmployeeId", Some("7")), ("Code", Some("E7")), ("ManagerId", Some("7"))],
        )
        .with_row("Sales", "Log", &[("Message", Some("started")), ("Level", Some("1"))])
}

/// A service with one connection, `main`, served by `database`
pub fn service_for(database: Arc<MockDatabase>) -> (DatabaseService, Arc<MockDriver>) {
    let driver = Arc::new(MockDriver::new(database));
    let mut drivers = DriverRegistry::new();
    drivers.register(driver.clone());

    let connections = InMemoryConnectionRegistry::with_records([
        dbstudio_core::ConnectionRecord::new("main", "server=mock").with_driver("mock"),
    ]);
    let service = DatabaseService::new(
        drivers,
        Arc::new(connections),
        Arc::new(InMemoryOverrideStore::new()),
    );
    (service, driver)
}
