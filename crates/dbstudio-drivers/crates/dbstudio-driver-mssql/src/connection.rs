//! MS SQL Server connection implementation using tiberius

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use dbstudio_core::{Record, StudioError};
use indexmap::IndexMap;
use tiberius::{Client, ColumnData, Config, FromSql, Row as TiberiusRow};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// MS SQL Server connection errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlError> for StudioError {
    fn from(err: MssqlError) -> Self {
        match err {
            MssqlError::InvalidConnectionString(msg) => StudioError::Configuration(msg),
            MssqlError::QueryFailed(msg) => StudioError::Query(msg),
            other => StudioError::Driver(other.to_string()),
        }
    }
}

/// MS SQL Server connection using tiberius
pub struct MssqlConnection {
    client: Mutex<Client<Compat<TcpStream>>>,
}

impl MssqlConnection {
    /// Connect using an ADO.NET style connection string
    /// (`Server=tcp:host,1433;Database=...;User Id=...;Password=...`)
    #[tracing::instrument(skip(connection_string))]
    pub async fn connect(connection_string: &str) -> Result<Self, MssqlError> {
        let config = Config::from_ado_string(connection_string)
            .map_err(|e| MssqlError::InvalidConnectionString(e.to_string()))?;

        tracing::debug!(addr = %config.get_addr(), "connecting to MS SQL Server");

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| MssqlError::ConnectionFailed(e.to_string()))?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| MssqlError::ConnectionFailed(e.to_string()))?;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    /// Run a query and return the rows of its first result set
    pub async fn query_records(&self, sql: &str) -> Result<Vec<Record>, MssqlError> {
        let start = std::time::Instant::now();
        let mut client = self.client.lock().await;

        let rows = client
            .query(sql, &[])
            .await
            .map_err(|e| MssqlError::QueryFailed(e.to_string()))?
            .into_first_result()
            .await
            .map_err(|e| MssqlError::QueryFailed(e.to_string()))?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            row_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "query completed"
        );
        Ok(records)
    }

    /// Run a query returning a single non-negative integer
    pub async fn query_count(&self, sql: &str) -> Result<u64, MssqlError> {
        let records = self.query_records(sql).await?;
        let value = records
            .first()
            .and_then(|record| record.values().next().cloned().flatten())
            .ok_or_else(|| MssqlError::QueryFailed("count query returned no rows".into()))?;
        value
            .parse::<u64>()
            .map_err(|_| MssqlError::TypeConversion(format!("'{value}' is not a row count")))
    }
}

pub(crate) fn row_to_record(row: &TiberiusRow) -> Result<Record, MssqlError> {
    let mut record = IndexMap::with_capacity(row.len());
    for (column, data) in row.cells() {
        // `SELECT [Id] AS [__id], *` can repeat a name; the first occurrence wins.
        if record.contains_key(column.name()) {
            continue;
        }
        record.insert(column.name().to_string(), column_data_to_string(data)?);
    }
    Ok(record)
}

fn temporal<'a, T: FromSql<'a>>(
    data: &'a ColumnData<'static>,
    format: impl FnOnce(T) -> String,
) -> Result<Option<String>, MssqlError> {
    Ok(T::from_sql(data)?.map(format))
}

/// Convert tiberius ColumnData to the string form exchanged with clients.
///
/// Binary data is decoded as UTF-8 so it round-trips through the binary
/// literal codec.
pub(crate) fn column_data_to_string(
    data: &ColumnData<'static>,
) -> Result<Option<String>, MssqlError> {
    let text = match data {
        ColumnData::Bit(v) => v.map(|b| if b { "1" } else { "0" }.to_string()),
        ColumnData::U8(v) => v.map(|n| n.to_string()),
        ColumnData::I16(v) => v.map(|n| n.to_string()),
        ColumnData::I32(v) => v.map(|n| n.to_string()),
        ColumnData::I64(v) => v.map(|n| n.to_string()),
        ColumnData::F32(v) => v.map(|n| n.to_string()),
        ColumnData::F64(v) => v.map(|n| n.to_string()),
        ColumnData::String(v) => v.as_ref().map(|s| s.to_string()),
        ColumnData::Guid(v) => v.as_ref().map(|g| g.to_string().to_uppercase()),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned()),
        ColumnData::Numeric(v) => v.as_ref().map(|n| n.to_string()),
        ColumnData::Xml(v) => v.as_ref().map(|x| x.clone().into_owned().into_string()),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            return temporal(data, |dt: NaiveDateTime| {
                dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
            });
        }
        ColumnData::Date(_) => {
            return temporal(data, |d: NaiveDate| d.format("%Y-%m-%d").to_string());
        }
        ColumnData::Time(_) => {
            return temporal(data, |t: NaiveTime| t.format("%H:%M:%S%.f").to_string());
        }
        ColumnData::DateTimeOffset(_) => {
            return temporal(data, |dt: DateTime<FixedOffset>| {
                dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string()
            });
        }
    };
    Ok(text)
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection").finish_non_exhaustive()
    }
}
