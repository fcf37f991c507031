//! Inbound request parsing and validation.
//!
//! Contract violations here are input errors: they abort before a pipeline
//! run exists and are the only failures not captured as run data.

use serde_json::Value;

use crate::error::{QuerycraftError, Result};
use crate::pipeline::envelope::Envelope;
use crate::pipeline::state::{Metadata, Stage};
use crate::pipeline::QueryAgent;

/// Default locale hint applied when a request carries none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Upper bound on the locale hint, in characters, to keep junk out of the
/// prompt.
pub const MAX_LANGUAGE_LEN: usize = 10;

/// A validated inbound question.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Trimmed, non-empty question text.
    pub question: String,
    /// Locale hint; generation context only.
    pub language: String,
    /// Row cap override; the configured default applies when absent.
    pub max_rows: Option<u32>,
    /// Opaque caller metadata, merged into the run's metadata.
    pub metadata: Metadata,
}

impl QueryRequest {
    /// Creates a request from a question, applying defaults everywhere else.
    pub fn new(question: impl Into<String>) -> Result<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(QuerycraftError::input("`question` is required."));
        }

        Ok(Self {
            question,
            language: DEFAULT_LANGUAGE.to_string(),
            max_rows: None,
            metadata: Metadata::new(),
        })
    }

    /// Sets the locale hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the row cap override.
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Parses and validates a raw JSON request body.
    ///
    /// Field rules follow the external interface: `question` required and
    /// non-blank, `language` optional and length-bounded, `max_rows`
    /// optional positive integer, `metadata` an opaque object passthrough.
    pub fn from_json(body: &str) -> Result<Self> {
        let payload: Value = if body.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(body)
                .map_err(|_| QuerycraftError::input("Invalid JSON payload."))?
        };

        let Value::Object(payload) = payload else {
            return Err(QuerycraftError::input("JSON payload must be an object."));
        };

        let question = match payload.get("question") {
            None | Some(Value::Null) => {
                return Err(QuerycraftError::input("`question` is required."))
            }
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => return Err(QuerycraftError::input("`question` must be a string.")),
        };
        if question.is_empty() {
            return Err(QuerycraftError::input("`question` is required."));
        }

        let language = match payload.get("language") {
            None | Some(Value::Null) => DEFAULT_LANGUAGE.to_string(),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    DEFAULT_LANGUAGE.to_string()
                } else if trimmed.chars().count() > MAX_LANGUAGE_LEN {
                    return Err(QuerycraftError::input("`language` value is too long."));
                } else {
                    trimmed.to_string()
                }
            }
            Some(_) => return Err(QuerycraftError::input("`language` must be a string.")),
        };

        let max_rows = match payload.get("max_rows") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let parsed = value
                    .as_i64()
                    .ok_or_else(|| QuerycraftError::input("`max_rows` must be an integer."))?;
                if parsed <= 0 {
                    return Err(QuerycraftError::input(
                        "`max_rows` must be greater than zero.",
                    ));
                }
                Some(parsed.min(i64::from(u32::MAX)) as u32)
            }
        };

        let metadata = match payload.get("metadata") {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(map)) => Metadata::from_map(map.clone()),
            Some(_) => return Err(QuerycraftError::input("`metadata` must be an object.")),
        };

        Ok(Self {
            question,
            language,
            max_rows,
            metadata,
        })
    }
}

/// Bridges a raw JSON body to the pipeline and back to wire terms.
///
/// Input errors become a `request`-stage envelope with status 400; any
/// unanticipated fault becomes a `server`-stage envelope with status 500.
/// Everything else carries the status the envelope itself maps to.
pub async fn handle_query(agent: &QueryAgent, body: &str) -> (u16, Envelope) {
    let request = match QueryRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => {
            let envelope = Envelope::error(Stage::Request, e.message(), Metadata::new());
            return (400, envelope);
        }
    };

    match agent.run(request).await {
        Ok(envelope) => (envelope.http_status(), envelope),
        Err(e @ QuerycraftError::Input(_)) => {
            let envelope = Envelope::error(Stage::Request, e.message(), Metadata::new());
            (400, envelope)
        }
        Err(_) => {
            let envelope =
                Envelope::error(Stage::Server, "Internal server error.", Metadata::new());
            (500, envelope)
        }
    }
}
