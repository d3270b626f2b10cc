//! Database access: schema introspection and query execution
//!
//! Two backends implement [`Database`]: SQL Server over TDS (`tiberius`),
//! opening one connection per call, and PostgreSQL through an `sqlx` pool.
//! Both read the standard `INFORMATION_SCHEMA` catalog views.

pub mod mssql;
pub mod postgres;

pub use mssql::MssqlDatabase;
pub use postgres::PostgresDatabase;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::schema::SchemaDescription;
use crate::table::QueryTable;
use async_trait::async_trait;

#[async_trait]
pub trait Database: Send + Sync {
    /// SQL dialect name put into the model prompt.
    fn dialect(&self) -> &'static str;

    /// Base tables and their columns; no caching between calls.
    async fn get_schema(&self) -> Result<SchemaDescription>;

    /// Execute `sql` and materialize the full result set.
    async fn run_query(&self, sql: &str) -> Result<QueryTable>;
}

/// Build the backend named by the configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn Database>> {
    match config {
        DatabaseConfig::Mssql { connection_string } => {
            Ok(Box::new(MssqlDatabase::new(connection_string.clone())?))
        }
        DatabaseConfig::Postgres { url } => Ok(Box::new(PostgresDatabase::connect(url).await?)),
    }
}
