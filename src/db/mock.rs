//! Mock database clients for testing.
//!
//! Provide in-memory stand-ins for the Postgres client so the pipeline can
//! be exercised without a live database.

use super::{DatabaseClient, QueryOutput, Row, SqlValue};
use crate::error::{QuerycraftError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    output: QueryOutput,
    last_sql: Mutex<Option<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock client with a small canned customer result.
    pub fn new() -> Self {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            row(&[("id", SqlValue::Int(1)), ("name", SqlValue::from("Alice"))]),
            row(&[("id", SqlValue::Int(2)), ("name", SqlValue::from("Bob"))]),
        ];
        Self::with_output(QueryOutput::with_data(columns, rows))
    }

    /// Creates a mock client returning the given output for every statement.
    pub fn with_output(output: QueryOutput) -> Self {
        Self {
            output,
            last_sql: Mutex::new(None),
        }
    }

    /// Creates a mock client with an empty result set.
    pub fn empty() -> Self {
        Self::with_output(QueryOutput::default())
    }

    /// Returns the last statement this client was asked to execute.
    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().expect("mock lock poisoned").clone()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput> {
        *self.last_sql.lock().expect("mock lock poisoned") = Some(sql.to_string());
        Ok(self.output.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client that fails every statement, for error-path testing.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client that reports the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingDatabaseClient {
    fn default() -> Self {
        Self::new("connection refused")
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_read_only(&self, _sql: &str) -> Result<QueryOutput> {
        Err(QuerycraftError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_canned_rows() {
        let client = MockDatabaseClient::new();
        let output = client
            .execute_read_only("SELECT id, name FROM customers LIMIT 5")
            .await
            .unwrap();

        assert_eq!(output.columns, vec!["id", "name"]);
        assert_eq!(output.rows.len(), 2);
        assert_eq!(
            client.last_sql().as_deref(),
            Some("SELECT id, name FROM customers LIMIT 5")
        );
    }

    #[tokio::test]
    async fn test_failing_client_reports_message() {
        let client = FailingDatabaseClient::new("db down");
        let err = client.execute_read_only("SELECT 1").await.unwrap_err();
        assert_eq!(err.to_string(), "Execution error: db down");
    }
}
