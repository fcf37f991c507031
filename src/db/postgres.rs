//! PostgreSQL client implementation.
//!
//! Implements the `DatabaseClient` trait for PostgreSQL using sqlx, with
//! every statement wrapped in an explicitly read-only transaction.

use crate::config::ConnectionConfig;
use crate::db::{codec, DatabaseClient, QueryOutput, Row};
use crate::error::{QuerycraftError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column as SqlxColumn, Executor, Statement};
use std::time::Duration;
use tracing::debug;

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database described by the configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        debug!("Connecting to {}", config.display_string());

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        Ok(Self { pool })
    }

    /// Creates a new PostgresClient from an existing connection pool.
    ///
    /// This is primarily useful for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| QuerycraftError::execution(format_query_error(e)))?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| QuerycraftError::execution(format_query_error(e)))?;

        // Prepare first so column names survive an empty result set.
        let statement = (&mut *tx)
            .prepare(sql)
            .await
            .map_err(|e| QuerycraftError::execution(format_query_error(e)))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let pg_rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            statement.query().fetch_all(&mut *tx),
        )
        .await
        .map_err(|_| {
            QuerycraftError::execution(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| QuerycraftError::execution(format_query_error(e)))?;

        let rows: Vec<Row> = pg_rows.iter().map(codec::convert_row).collect();

        tx.commit()
            .await
            .map_err(|e| QuerycraftError::execution(format_query_error(e)))?;

        Ok(QueryOutput { columns, rows })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> QuerycraftError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        QuerycraftError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        QuerycraftError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        QuerycraftError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        QuerycraftError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        QuerycraftError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        QuerycraftError::connection(error.to_string())
    }
}

/// Formats a query error with Postgres detail and hint fields when present.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        let mut result = format!("ERROR: {}", db_error.message());

        if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
            if let Some(detail) = pg_error.detail() {
                result.push_str("\nDETAIL: ");
                result.push_str(detail);
            }
            if let Some(hint) = pg_error.hint() {
                result.push_str("\nHINT: ");
                result.push_str(hint);
            }
        }

        return result;
    }

    error.to_string()
}
