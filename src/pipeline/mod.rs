//! Pipeline orchestration for QueryCraft.
//!
//! Sequences generation, safety validation, execution, and response shaping
//! as an explicit state machine:
//!
//! ```text
//! Generate -> Validate -> { Execute | Capture } -> Format
//!                 Execute -> { Format | Capture }
//!                 Capture -> Format
//! ```
//!
//! Each state carries exactly the data the next step needs, so an illegal
//! transition (executing unvalidated SQL, formatting half a result) does not
//! typecheck. Format is terminal and runs on every path.

mod envelope;
mod request;
mod state;

pub use envelope::{format_response, Envelope};
pub use request::{handle_query, QueryRequest, DEFAULT_LANGUAGE, MAX_LANGUAGE_LEN};
pub use state::{Metadata, RunOutcome, Stage, StageFailure};

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::db::DatabaseClient;
use crate::error::{QuerycraftError, Result};
use crate::llm::prompt::DEFAULT_SCHEMA_CONTEXT;
use crate::llm::{LlmClient, SqlGenerator};
use crate::query::QueryExecutor;
use crate::safety::sanitize_sql;

/// The states a run moves through, with the data each one needs.
enum Flow {
    /// Ask the LLM for SQL text.
    Generate,
    /// Run the safety allow-list on generated text.
    Validate { sql: String },
    /// Execute sanitized text against the store.
    Execute { sql: String },
    /// Normalize a stage failure before formatting.
    Capture { failure: StageFailure },
    /// Shape the terminal envelope.
    Format { outcome: RunOutcome },
}

/// The query pipeline as a dependency-injected service object.
///
/// Constructed once at process start and shared (read-only) across
/// concurrent requests; per-run state lives on the stack of [`run`].
///
/// [`run`]: QueryAgent::run
pub struct QueryAgent {
    generator: SqlGenerator,
    executor: QueryExecutor,
    default_max_rows: u32,
}

impl QueryAgent {
    /// Builds an agent from already-constructed collaborators.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        db: Arc<dyn DatabaseClient>,
        config: &Config,
    ) -> Result<Self> {
        let schema = config
            .query
            .load_schema_context()?
            .unwrap_or_else(|| DEFAULT_SCHEMA_CONTEXT.to_string());

        Ok(Self {
            generator: SqlGenerator::new(llm, config.llm.model.clone(), schema),
            executor: QueryExecutor::new(db),
            default_max_rows: config.query.default_max_rows,
        })
    }

    /// Builds an agent by constructing both external collaborators from
    /// the configuration: the LLM client and the database pool.
    pub async fn connect(config: &Config) -> Result<Self> {
        let llm = crate::llm::create_client(&config.llm)?;
        let db: Arc<dyn DatabaseClient> = Arc::from(crate::db::connect(&config.database).await?);
        Self::new(llm, db, config)
    }

    /// Runs one question through the pipeline.
    ///
    /// Returns `Err` only for the entry-contract violation (blank
    /// question). Every in-pipeline failure is captured as data and comes
    /// back as an `Ok` error-shaped envelope.
    pub async fn run(&self, request: QueryRequest) -> Result<Envelope> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(QuerycraftError::input("`question` is required."));
        }

        let language = request.language;
        let max_rows = request.max_rows.unwrap_or(self.default_max_rows);
        let mut metadata = request.metadata;

        info!(question = %question, max_rows, "Pipeline run started");

        let mut flow = Flow::Generate;
        loop {
            flow = match flow {
                Flow::Generate => match self.generator.generate(&question, &language).await {
                    Ok(generated) => {
                        metadata.insert("endpoint", generated.endpoint);
                        metadata.insert("model", generated.model);
                        Flow::Validate { sql: generated.sql }
                    }
                    Err(e) => Flow::Capture {
                        failure: StageFailure::new(Stage::Generation, e.message()),
                    },
                },

                Flow::Validate { sql } => match sanitize_sql(&sql, max_rows) {
                    Ok(sanitized) => {
                        // Reflects the cap actually enforced on the text;
                        // later stages may only fill, never override.
                        metadata.insert("max_rows", max_rows);
                        Flow::Execute { sql: sanitized }
                    }
                    Err(e) => Flow::Capture {
                        failure: StageFailure::new(Stage::ValidateSql, e.message()),
                    },
                },

                Flow::Execute { sql } => match self.executor.execute(&sql).await {
                    Ok(execution) => {
                        metadata.fill("max_rows", max_rows);
                        metadata.insert("row_count", execution.rows.len());
                        Flow::Format {
                            outcome: RunOutcome::Executed {
                                sql: execution.sql,
                                columns: execution.columns,
                                rows: execution.rows,
                                execution_ms: execution.execution_ms,
                            },
                        }
                    }
                    Err(e) => Flow::Capture {
                        failure: StageFailure::new(Stage::ExecuteSql, e.message()),
                    },
                },

                Flow::Capture { failure } => {
                    warn!(stage = %failure.stage, message = %failure.message, "Pipeline run failed");
                    Flow::Format {
                        outcome: RunOutcome::Failed(failure),
                    }
                }

                Flow::Format { outcome } => {
                    return Ok(format_response(outcome, metadata));
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};
    use crate::llm::MockLlmClient;

    fn agent_with(llm: MockLlmClient, db: Arc<dyn DatabaseClient>) -> QueryAgent {
        QueryAgent::new(Arc::new(llm), db, &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_successful_run_produces_ok_envelope() {
        let db = Arc::new(MockDatabaseClient::new());
        let agent = agent_with(MockLlmClient::new(), db.clone());

        let request = QueryRequest::new("List customers").unwrap().with_max_rows(5);
        let envelope = agent.run(request).await.unwrap();

        assert!(envelope.is_ok());
        // The sanitized, capped statement is what reached the store.
        assert_eq!(
            db.last_sql().as_deref(),
            Some("SELECT id, name, email FROM customers LIMIT 5")
        );
    }

    #[tokio::test]
    async fn test_generation_failure_routes_to_error_envelope() {
        let agent = agent_with(
            MockLlmClient::new().with_empty_responses(),
            Arc::new(MockDatabaseClient::new()),
        );

        let envelope = agent
            .run(QueryRequest::new("List customers").unwrap())
            .await
            .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["stage"], "generation");
    }

    #[tokio::test]
    async fn test_validation_failure_skips_execution() {
        let db = Arc::new(MockDatabaseClient::new());
        let agent = agent_with(
            MockLlmClient::new().with_response("purge", "```sql\nDELETE FROM customers\n```"),
            db.clone(),
        );

        let envelope = agent
            .run(QueryRequest::new("purge the customers").unwrap())
            .await
            .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["stage"], "validate_sql");
        // The store was never touched.
        assert_eq!(db.last_sql(), None);
    }

    #[tokio::test]
    async fn test_execution_failure_routes_to_error_envelope() {
        let agent = agent_with(
            MockLlmClient::new(),
            Arc::new(FailingDatabaseClient::new("db down")),
        );

        let envelope = agent
            .run(QueryRequest::new("List customers").unwrap())
            .await
            .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["stage"], "execute_sql");
        assert_eq!(json["message"], "db down");
        assert!(json.get("rows").is_none());
    }

    #[tokio::test]
    async fn test_blank_question_rejected_before_pipeline() {
        let agent = agent_with(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

        let mut request = QueryRequest::new("placeholder").unwrap();
        request.question = "   ".to_string();

        let err = agent.run(request).await.unwrap_err();
        assert!(matches!(err, QuerycraftError::Input(_)));
    }

    #[tokio::test]
    async fn test_metadata_accumulates_across_stages() {
        let agent = agent_with(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

        let request = QueryRequest::new("List customers").unwrap().with_max_rows(5);
        let envelope = agent.run(request).await.unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["metadata"]["model"], "gpt-5");
        assert_eq!(json["metadata"]["endpoint"], "mock://local");
        assert_eq!(json["metadata"]["max_rows"], 5);
        assert_eq!(json["metadata"]["row_count"], 2);
    }

    #[tokio::test]
    async fn test_default_max_rows_applied_when_absent() {
        let db = Arc::new(MockDatabaseClient::new());
        let agent = agent_with(MockLlmClient::new(), db.clone());

        let envelope = agent
            .run(QueryRequest::new("List customers").unwrap())
            .await
            .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["metadata"]["max_rows"], 200);
        assert_eq!(
            db.last_sql().as_deref(),
            Some("SELECT id, name, email FROM customers LIMIT 200")
        );
    }

    #[tokio::test]
    async fn test_inbound_metadata_survives_the_run() {
        let agent = agent_with(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

        let request = QueryRequest::from_json(
            r#"{"question": "List customers", "metadata": {"caller": "dashboard"}}"#,
        )
        .unwrap();
        let envelope = agent.run(request).await.unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["metadata"]["caller"], "dashboard");
        assert_eq!(json["metadata"]["model"], "gpt-5");
    }
}
