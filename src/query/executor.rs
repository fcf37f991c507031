//! Query execution wrapper.
//!
//! Runs an already-sanitized statement against the store and reports the
//! wall-clock cost of the execution stage. Every store fault is returned as
//! an error value so the orchestrator can always reach its error-capture
//! step.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::db::{DatabaseClient, QueryOutput};
use crate::error::Result;

/// Result of executing a sanitized statement.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Codec-converted rows.
    pub rows: Vec<crate::db::Row>,
    /// The statement exactly as executed.
    pub sql: String,
    /// Wall-clock duration of the execute+fetch phase, in milliseconds.
    ///
    /// Transaction setup happens inside the store client, so it is included
    /// in the measured window.
    pub execution_ms: f64,
}

/// Executor that runs validated statements through a `DatabaseClient`.
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
}

impl QueryExecutor {
    /// Creates a new query executor over the given store client.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Executes exactly one sanitized statement and times it.
    pub async fn execute(&self, sql: &str) -> Result<Execution> {
        let start = Instant::now();
        let result = self.db.execute_read_only(sql).await;
        let execution_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(QueryOutput { columns, rows }) => {
                debug!(
                    rows = rows.len(),
                    execution_ms, "Statement executed"
                );
                Ok(Execution {
                    columns,
                    rows,
                    sql: sql.to_string(),
                    execution_ms,
                })
            }
            Err(e) => {
                warn!(error = %e, "Statement execution failed");
                Err(e)
            }
        }
    }
}
