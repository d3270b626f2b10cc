//! SQL Server backend over TDS
//!
//! Every operation opens its own connection and drops it when the call
//! returns, on success and on error alike.

use super::Database;
use crate::error::{PinnError, Result};
use crate::schema::{SchemaDescription, TableSchema};
use crate::table::QueryTable;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};
use tiberius::{Client, ColumnData, Config, FromSql, Row, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

const BASE_TABLES_SQL: &str =
    "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'";

const TABLE_COLUMNS_SQL: &str = "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_NAME = @P1 ORDER BY ORDINAL_POSITION";

type MssqlClient = Client<Compat<TcpStream>>;

pub struct MssqlDatabase {
    config: Config,
}

impl MssqlDatabase {
    /// Parse an ADO.NET-style connection string, e.g.
    /// `server=localhost\SQLEXPRESS;database=Shop;IntegratedSecurity=true`.
    pub fn new(connection_string: String) -> Result<Self> {
        let config = Config::from_ado_string(&connection_string)
            .map_err(|e| PinnError::Config(format!("Invalid SQL Server connection string: {}", e)))?;
        Ok(Self { config })
    }

    async fn open(&self) -> Result<MssqlClient> {
        debug!("Opening SQL Server connection to {}", self.config.get_addr());

        // Resolves named instances through SQL Browser when one is given.
        let tcp = TcpStream::connect_named(&self.config)
            .await
            .map_err(|e| PinnError::Connection(format!("Cannot reach SQL Server: {}", e)))?;
        tcp.set_nodelay(true)?;

        Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| PinnError::Connection(format!("SQL Server login failed: {}", e)))
    }
}

fn query_error(e: tiberius::error::Error) -> PinnError {
    PinnError::Query(e.to_string())
}

#[async_trait]
impl Database for MssqlDatabase {
    fn dialect(&self) -> &'static str {
        "MSSQL"
    }

    async fn get_schema(&self) -> Result<SchemaDescription> {
        let mut client = self.open().await?;

        let table_rows = client
            .simple_query(BASE_TABLES_SQL)
            .await
            .map_err(query_error)?
            .into_first_result()
            .await
            .map_err(query_error)?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for row in &table_rows {
            let Some(name) = row.try_get::<&str, _>(0).map_err(query_error)? else {
                continue;
            };

            let column_rows = client
                .query(TABLE_COLUMNS_SQL, &[&name])
                .await
                .map_err(query_error)?
                .into_first_result()
                .await
                .map_err(query_error)?;

            let mut columns = Vec::with_capacity(column_rows.len());
            for column in &column_rows {
                if let Some(col) = column.try_get::<&str, _>(0).map_err(query_error)? {
                    columns.push(col.to_string());
                }
            }

            tables.push(TableSchema {
                name: name.to_string(),
                columns,
            });
        }

        info!("📋 Read schema: {} base tables", tables.len());
        Ok(SchemaDescription::new(tables))
    }

    async fn run_query(&self, sql: &str) -> Result<QueryTable> {
        let mut client = self.open().await?;
        let mut stream = client.simple_query(sql).await.map_err(query_error)?;

        let columns: Vec<String> = stream
            .columns()
            .await
            .map_err(query_error)?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = stream.into_first_result().await.map_err(query_error)?;
        let rows: Vec<Vec<Value>> = rows.into_iter().map(row_to_cells).collect();

        info!("✅ Query returned {} rows", rows.len());
        Ok(QueryTable::new(columns, rows))
    }
}

fn row_to_cells(row: Row) -> Vec<Value> {
    row.into_iter().map(|data| column_to_json(&data)).collect()
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn text<T: ToString>(value: Option<T>) -> Value {
    value.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
}

/// Convert one TDS cell into a JSON scalar.
fn column_to_json(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|f| float(f as f64)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(float).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => text(*v),
        // DECIMAL and MONEY stay exact decimal text.
        ColumnData::Numeric(v) => text(v.as_ref()),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|bytes| {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                Value::String(format!("0x{}", hex))
            })
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            text(NaiveDateTime::from_sql(data).ok().flatten())
        }
        ColumnData::Date(_) => text(NaiveDate::from_sql(data).ok().flatten()),
        ColumnData::Time(_) => text(NaiveTime::from_sql(data).ok().flatten()),
        ColumnData::DateTimeOffset(_) => text(DateTime::<FixedOffset>::from_sql(data).ok().flatten()),
        other => Value::String(format!("{:?}", other)),
    }
}
