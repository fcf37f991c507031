//! Response formatting: the single normalized envelope.
//!
//! The formatter is the only stage guaranteed to run on every path and it
//! never fails; it only reads what the run already produced.

use serde::Serialize;

use crate::db::Row;
use crate::pipeline::state::{Metadata, RunOutcome, Stage};

/// The normalized response shape returned for every request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum Envelope {
    /// Successful run: sanitized SQL, results, and timing.
    #[serde(rename = "ok")]
    Ok {
        /// The statement exactly as executed.
        sql: String,
        /// Column names in result order.
        columns: Vec<String>,
        /// Result rows as ordered column-name to value objects.
        rows: Vec<Row>,
        /// Wall-clock duration of the execution stage, milliseconds.
        execution_ms: f64,
        /// Accumulated run metadata; omitted when empty.
        #[serde(skip_serializing_if = "Metadata::is_empty")]
        metadata: Metadata,
    },
    /// Failed run: message plus the stage the failure is attributed to.
    #[serde(rename = "error")]
    Error {
        /// Human-readable failure message.
        message: String,
        /// Failing stage in wire spelling.
        stage: Stage,
        /// Accumulated run metadata; omitted when empty.
        #[serde(skip_serializing_if = "Metadata::is_empty")]
        metadata: Metadata,
    },
}

impl Envelope {
    /// Creates an error envelope for the given stage.
    pub fn error(stage: Stage, message: impl Into<String>, metadata: Metadata) -> Self {
        Self::Error {
            message: message.into(),
            stage,
            metadata,
        }
    }

    /// Returns true for the success shape.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Maps the envelope to an HTTP status code.
    ///
    /// Pipeline-reported errors are the caller's fault (400); only an
    /// unanticipated internal fault reports 500, tagged `server`.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Ok { .. } => 200,
            Self::Error { stage, .. } if *stage == Stage::Server => 500,
            Self::Error { .. } => 400,
        }
    }
}

/// Shapes the final state of a run into the envelope.
///
/// Infallible by construction: both outcome arms carry everything their
/// shape needs.
pub fn format_response(outcome: RunOutcome, metadata: Metadata) -> Envelope {
    match outcome {
        RunOutcome::Executed {
            sql,
            columns,
            rows,
            execution_ms,
        } => Envelope::Ok {
            sql,
            columns,
            rows,
            execution_ms,
            metadata,
        },
        RunOutcome::Failed(failure) => Envelope::Error {
            message: failure.message,
            stage: failure.stage,
            metadata,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlValue;
    use crate::pipeline::state::StageFailure;

    fn sample_metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("max_rows", 5);
        metadata
    }

    #[test]
    fn test_success_envelope_shape() {
        let row: Row = vec![("id".to_string(), SqlValue::Int(1))]
            .into_iter()
            .collect();
        let outcome = RunOutcome::Executed {
            sql: "SELECT id FROM customers LIMIT 5".to_string(),
            columns: vec!["id".to_string()],
            rows: vec![row],
            execution_ms: 12.5,
        };

        let envelope = format_response(outcome, sample_metadata());
        assert!(envelope.is_ok());
        assert_eq!(envelope.http_status(), 200);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sql"], "SELECT id FROM customers LIMIT 5");
        assert_eq!(json["columns"][0], "id");
        assert_eq!(json["rows"][0]["id"], 1);
        assert_eq!(json["execution_ms"], 12.5);
        assert_eq!(json["metadata"]["max_rows"], 5);
    }

    #[test]
    fn test_error_envelope_shape() {
        let outcome = RunOutcome::Failed(StageFailure::new(
            Stage::ExecuteSql,
            "Database timeout",
        ));

        let envelope = format_response(outcome, sample_metadata());
        assert!(!envelope.is_ok());
        assert_eq!(envelope.http_status(), 400);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Database timeout");
        assert_eq!(json["stage"], "execute_sql");
        assert_eq!(json["metadata"]["max_rows"], 5);
        // No partial results on the error shape.
        assert!(json.get("rows").is_none());
        assert!(json.get("columns").is_none());
    }

    #[test]
    fn test_empty_metadata_omitted() {
        let envelope = Envelope::error(Stage::Request, "`question` is required.", Metadata::new());
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_server_stage_maps_to_500() {
        let envelope = Envelope::error(Stage::Server, "Internal server error.", Metadata::new());
        assert_eq!(envelope.http_status(), 500);
    }

    #[test]
    fn test_empty_result_serializes_empty_sequences() {
        let outcome = RunOutcome::Executed {
            sql: "SELECT id FROM customers LIMIT 5".to_string(),
            columns: vec![],
            rows: vec![],
            execution_ms: 0.4,
        };
        let json = serde_json::to_value(format_response(outcome, Metadata::new())).unwrap();
        assert_eq!(json["columns"], serde_json::json!([]));
        assert_eq!(json["rows"], serde_json::json!([]));
    }
}
