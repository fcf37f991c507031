//! End-to-end pipeline tests over mock collaborators.
//!
//! These exercise the full question -> SQL -> validation -> execution ->
//! envelope flow without a live LLM or database.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use querycraft::config::Config;
use querycraft::db::{
    DatabaseClient, FailingDatabaseClient, MockDatabaseClient, QueryOutput, Row, SqlValue,
};
use querycraft::error::QuerycraftError;
use querycraft::llm::MockLlmClient;
use querycraft::pipeline::{handle_query, QueryAgent, QueryRequest};

fn agent(llm: MockLlmClient, db: Arc<dyn DatabaseClient>) -> QueryAgent {
    QueryAgent::new(Arc::new(llm), db, &Config::default()).unwrap()
}

fn customer_row(id: i64, name: &str) -> Row {
    vec![
        ("id".to_string(), SqlValue::Int(id)),
        ("name".to_string(), SqlValue::from(name)),
    ]
    .into_iter()
    .collect()
}

#[tokio::test]
async fn successful_question_returns_ok_envelope_with_capped_sql() {
    let llm = MockLlmClient::new()
        .with_response("latest customers", "```sql\nSELECT id, name FROM customers\n```");
    let db = Arc::new(MockDatabaseClient::with_output(QueryOutput::with_data(
        vec!["id".to_string(), "name".to_string()],
        vec![customer_row(1, "Alice"), customer_row(2, "Bob")],
    )));
    let agent = agent(llm, db.clone());

    let request = QueryRequest::new("Show the latest customers")
        .unwrap()
        .with_max_rows(5);
    let envelope = agent.run(request).await.unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["sql"], "SELECT id, name FROM customers LIMIT 5");
    assert_eq!(payload["columns"], json!(["id", "name"]));
    assert_eq!(payload["rows"], json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]));
    assert!(payload["execution_ms"].as_f64().unwrap() >= 0.0);
    assert_eq!(
        db.last_sql().as_deref(),
        Some("SELECT id, name FROM customers LIMIT 5")
    );
}

#[tokio::test]
async fn existing_limit_under_cap_passes_through_unchanged() {
    let llm = MockLlmClient::new()
        .with_response("ten customers", "```sql\nSELECT id FROM customers LIMIT 10\n```");
    let db = Arc::new(MockDatabaseClient::empty());
    let agent = agent(llm, db.clone());

    let request = QueryRequest::new("first ten customers")
        .unwrap()
        .with_max_rows(50);
    let envelope = agent.run(request).await.unwrap();

    assert!(envelope.is_ok());
    assert_eq!(
        db.last_sql().as_deref(),
        Some("SELECT id FROM customers LIMIT 10")
    );
}

#[tokio::test]
async fn over_cap_limit_is_rejected_naming_both_values() {
    let llm = MockLlmClient::new()
        .with_response("everything", "```sql\nSELECT id FROM customers LIMIT 9999\n```");
    let db = Arc::new(MockDatabaseClient::empty());
    let agent = agent(llm, db.clone());

    let request = QueryRequest::new("give me everything")
        .unwrap()
        .with_max_rows(100);
    let envelope = agent.run(request).await.unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["stage"], "validate_sql");
    let message = payload["message"].as_str().unwrap();
    assert!(message.contains("100"));
    assert!(message.contains("9999"));
    assert_eq!(db.last_sql(), None);
}

#[tokio::test]
async fn mutating_statement_is_rejected_at_validate_stage() {
    let llm = MockLlmClient::new();
    let db = Arc::new(MockDatabaseClient::empty());
    let agent = agent(llm, db.clone());

    let envelope = agent
        .run(QueryRequest::new("delete every customer").unwrap())
        .await
        .unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["stage"], "validate_sql");
    assert_eq!(payload["message"], "Only SELECT statements are permitted.");
    assert_eq!(db.last_sql(), None);
}

#[tokio::test]
async fn empty_generation_reports_generation_stage() {
    let agent = agent(
        MockLlmClient::new().with_empty_responses(),
        Arc::new(MockDatabaseClient::empty()),
    );

    let envelope = agent
        .run(QueryRequest::new("List customers").unwrap())
        .await
        .unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["stage"], "generation");
    assert_eq!(envelope.http_status(), 400);
}

#[tokio::test]
async fn store_fault_after_validation_reports_execute_stage() {
    let agent = agent(
        MockLlmClient::new(),
        Arc::new(FailingDatabaseClient::new("connection refused")),
    );

    let envelope = agent
        .run(QueryRequest::new("List customers").unwrap())
        .await
        .unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["stage"], "execute_sql");
    assert_eq!(payload["message"], "connection refused");
    // No partial result fields on the error shape.
    assert!(payload.get("rows").is_none());
    assert!(payload.get("columns").is_none());
}

#[tokio::test]
async fn empty_result_set_yields_empty_sequences_not_error() {
    let agent = agent(MockLlmClient::new(), Arc::new(MockDatabaseClient::empty()));

    let envelope = agent
        .run(QueryRequest::new("List customers").unwrap())
        .await
        .unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["rows"], json!([]));
    assert_eq!(payload["metadata"]["row_count"], 0);
}

#[tokio::test]
async fn validation_owns_the_max_rows_metadata_key() {
    let db = Arc::new(MockDatabaseClient::new());
    let agent = agent(MockLlmClient::new(), db);

    let request = QueryRequest::new("List customers")
        .unwrap()
        .with_max_rows(7);
    let envelope = agent.run(request).await.unwrap();

    let payload = serde_json::to_value(&envelope).unwrap();
    // Written by validation; execution may only fill, never override.
    assert_eq!(payload["metadata"]["max_rows"], 7);
}

#[tokio::test]
async fn handle_query_maps_success_to_200() {
    let agent = agent(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

    let (status, envelope) =
        handle_query(&agent, r#"{"question": "List customers"}"#).await;

    assert_eq!(status, 200);
    assert!(envelope.is_ok());
}

#[tokio::test]
async fn handle_query_maps_pipeline_error_to_400() {
    let agent = agent(
        MockLlmClient::new().with_empty_responses(),
        Arc::new(MockDatabaseClient::new()),
    );

    let (status, envelope) =
        handle_query(&agent, r#"{"question": "List customers"}"#).await;

    assert_eq!(status, 400);
    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["stage"], "generation");
}

#[tokio::test]
async fn handle_query_maps_bad_body_to_request_stage_400() {
    let agent = agent(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

    let (status, envelope) = handle_query(&agent, "{not json").await;
    assert_eq!(status, 400);
    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["stage"], "request");
    assert_eq!(payload["message"], "Invalid JSON payload.");

    let (status, envelope) = handle_query(&agent, r#"{"question": ""}"#).await;
    assert_eq!(status, 400);
    let payload = serde_json::to_value(&envelope).unwrap();
    assert_eq!(payload["message"], "`question` is required.");
}

#[tokio::test]
async fn blank_question_is_an_input_error_not_an_envelope() {
    let agent = agent(MockLlmClient::new(), Arc::new(MockDatabaseClient::new()));

    let mut request = QueryRequest::new("x").unwrap();
    request.question = " ".to_string();

    let err = agent.run(request).await.unwrap_err();
    assert!(matches!(err, QuerycraftError::Input(_)));
}

#[tokio::test]
async fn language_hint_travels_to_the_generator() {
    // The mock echoes based on the user message, which carries the hint.
    let llm = MockLlmClient::new().with_response(
        "[language: fa]",
        "```sql\nSELECT name FROM customers\n```",
    );
    let db = Arc::new(MockDatabaseClient::empty());
    let agent = agent(llm, db.clone());

    let request = QueryRequest::new("لیست مشتریان")
        .unwrap()
        .with_language("fa");
    let envelope = agent.run(request).await.unwrap();

    assert!(envelope.is_ok());
    assert_eq!(
        db.last_sql().as_deref(),
        Some("SELECT name FROM customers LIMIT 200")
    );
}
