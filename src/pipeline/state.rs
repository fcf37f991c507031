//! Per-run pipeline state: stages, metadata, and stage outcomes.
//!
//! Stage outcomes are tagged unions rather than one struct of optional
//! fields, so a run cannot simultaneously carry a validation error and an
//! execution result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::Row;

/// Named steps of the orchestrator, in wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Request parsing/validation, before a run exists.
    Request,
    /// LLM call turning the question into SQL text.
    Generation,
    /// Safety allow-list and row-cap rewrite.
    ValidateSql,
    /// Read-only execution against the store.
    ExecuteSql,
    /// Envelope shaping; terminal and infallible.
    FormatResponse,
    /// Error-capture step.
    Error,
    /// Unanticipated internal fault in the host surface.
    Server,
}

impl Stage {
    /// Returns the stage's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Generation => "generation",
            Self::ValidateSql => "validate_sql",
            Self::ExecuteSql => "execute_sql",
            Self::FormatResponse => "format_response",
            Self::Error => "error",
            Self::Server => "server",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accumulating key/value side-channel threaded through a run.
///
/// Stages may add keys; keys written by an earlier stage are never silently
/// dropped. `insert` overwrites (for a stage that owns a key), `fill` only
/// writes when the key is absent (first writer wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object, e.g. a request passthrough.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Sets a key, overwriting any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Sets a key only if it is absent: first writer wins.
    pub fn fill(&mut self, key: &str, value: impl Into<Value>) {
        if !self.0.contains_key(key) {
            self.0.insert(key.to_string(), value.into());
        }
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A captured stage failure: message plus the stage it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// Stage where the failure occurred.
    pub stage: Stage,
    /// Human-readable message; never empty.
    pub message: String,
}

impl StageFailure {
    /// Creates a failure attributed to the given stage.
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Final outcome of a run, consumed by the formatter.
///
/// Exactly one of the two arms exists per run; the mutual exclusivity the
/// envelope contract requires is carried by the type.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Validated SQL executed; results ready for shaping.
    Executed {
        /// The statement exactly as executed.
        sql: String,
        /// Column names in result order.
        columns: Vec<String>,
        /// Codec-converted rows (possibly empty).
        rows: Vec<Row>,
        /// Wall-clock duration of the execution stage, milliseconds.
        execution_ms: f64,
    },
    /// Some stage failed; the capture step normalized it.
    Failed(StageFailure),
}
