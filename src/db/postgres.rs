//! PostgreSQL backend using an sqlx connection pool
//!
//! Queries go through the simple-query protocol so arbitrary statements run
//! as typed, and every value comes back in text format regardless of its
//! column type. When several statements are sent, only the first result set
//! that carries rows is kept.

use super::Database;
use crate::error::{PinnError, Result};
use crate::schema::{SchemaDescription, TableSchema};
use crate::table::QueryTable;
use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use serde_json::{Number, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Either, Row, TypeInfo};
use std::time::Duration;
use tracing::{debug, info};

pub struct PostgresDatabase {
    pool: PgPool,
}

/// Column names and cells of one result row.
#[derive(Debug, Clone, PartialEq)]
struct RowCells {
    columns: Vec<String>,
    values: Vec<Value>,
}

/// Initialize the database connection pool
pub async fn init_pool(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

impl PostgresDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = init_pool(database_url).await.map_err(db_error)?;
        Ok(Self { pool })
    }
}

fn db_error(e: sqlx::Error) -> PinnError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => PinnError::Connection(e.to_string()),
        other => PinnError::Query(other.to_string()),
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    fn dialect(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn get_schema(&self) -> Result<SchemaDescription> {
        // information_schema identifiers are `sql_identifier`; cast for decoding.
        let names: Vec<(String, String)> = sqlx::query_as(
            "SELECT table_schema::text, table_name::text FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' \
             AND table_schema NOT IN ('pg_catalog', 'information_schema')",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut tables = Vec::with_capacity(names.len());
        for (schema, table) in names {
            let columns: Vec<String> = sqlx::query_scalar(
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
            )
            .bind(&schema)
            .bind(&table)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            tables.push(TableSchema {
                name: qualified_name(&schema, &table),
                columns,
            });
        }

        info!("📋 Read schema: {} base tables", tables.len());
        Ok(SchemaDescription::new(tables))
    }

    async fn run_query(&self, sql: &str) -> Result<QueryTable> {
        let items = sqlx::raw_sql(sql)
            .fetch_many(&self.pool)
            .map(|item| -> Result<Either<_, RowCells>> {
                match item.map_err(db_error)? {
                    Either::Left(done) => Ok(Either::Left(done)),
                    Either::Right(row) => read_row(&row).map(Either::Right),
                }
            });

        let rows = first_result_set(items).await?;
        let table = rows_to_table(rows)?;

        info!("✅ Query returned {} rows", table.row_count());
        Ok(table)
    }
}

/// Tables in `public` keep their bare name; others are schema-qualified.
fn qualified_name(schema: &str, table: &str) -> String {
    if schema == "public" {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

fn read_row(row: &PgRow) -> Result<RowCells> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw: Option<String> = row.try_get_unchecked(i).map_err(db_error)?;
        columns.push(column.name().to_string());
        values.push(text_cell(column.type_info().name(), raw));
    }
    Ok(RowCells { columns, values })
}

/// Collect rows up to the end of the first statement that returned any.
async fn first_result_set<S, D>(mut items: S) -> Result<Vec<RowCells>>
where
    S: Stream<Item = Result<Either<D, RowCells>>> + Unpin,
{
    let mut rows = Vec::new();
    while let Some(item) = items.try_next().await? {
        match item {
            Either::Left(_) if !rows.is_empty() => {
                debug!("Ignoring result sets after the first");
                break;
            }
            Either::Left(_) => {}
            Either::Right(row) => rows.push(row),
        }
    }
    Ok(rows)
}

/// Every row must carry the header of the first one.
fn rows_to_table(rows: Vec<RowCells>) -> Result<QueryTable> {
    let Some(first) = rows.first() else {
        return Ok(QueryTable::default());
    };
    let columns = first.columns.clone();

    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        if row.columns != columns {
            return Err(PinnError::Query(format!(
                "Result rows disagree on columns: expected {:?}, got {:?}",
                columns, row.columns
            )));
        }
        cells.push(row.values);
    }
    Ok(QueryTable::new(columns, cells))
}

/// Convert a text-format value into a JSON scalar using its column type.
fn text_cell(type_name: &str, raw: Option<String>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };

    match type_name {
        "BOOL" if raw == "t" => Value::Bool(true),
        "BOOL" if raw == "f" => Value::Bool(false),
        "INT2" | "INT4" | "INT8" | "OID" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw)),
        "FLOAT4" | "FLOAT8" => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(raw)),
        // NUMERIC and MONEY stay exact decimal text.
        _ => Value::String(raw),
    }
}
