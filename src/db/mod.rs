//! Database abstraction layer for QueryCraft.
//!
//! Provides a trait-based interface for read-only query execution, allowing
//! the live Postgres store and test doubles to be used interchangeably.

pub mod codec;
mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{QueryOutput, Row, SqlValue};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Connects to the analytics store described by the configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for read-only database clients.
///
/// All operations are async and return Results with QuerycraftError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes exactly one statement inside a transaction explicitly
    /// marked read-only, so the store itself rejects any mutation the
    /// safety validator failed to catch.
    ///
    /// Values in the returned rows have already passed the codec.
    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
