//! SQL generation adapter.
//!
//! Bridges the pipeline to the generation service: sends the fixed system
//! instruction plus the question, normalizes the reply to plain SQL, and
//! fails fast when nothing usable comes back. Safety is not this adapter's
//! job; it only guarantees non-empty text.

use std::sync::Arc;

use tracing::debug;

use crate::error::{QuerycraftError, Result};
use crate::llm::{parser, prompt, LlmClient};

/// A generated statement plus its provenance.
///
/// Provenance is informational only; correctness never depends on it.
#[derive(Debug, Clone)]
pub struct GeneratedSql {
    /// Normalized SQL text (non-empty).
    pub sql: String,
    /// Model identity that produced the text.
    pub model: String,
    /// Service endpoint the request went to.
    pub endpoint: String,
}

/// Adapter that turns a question into raw SQL text via the LLM.
pub struct SqlGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    schema: String,
}

impl SqlGenerator {
    /// Creates a generator over the given client and static schema context.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            schema: schema.into(),
        }
    }

    /// Generates SQL text for the question, or fails with a generation error.
    pub async fn generate(&self, question: &str, language: &str) -> Result<GeneratedSql> {
        let messages = prompt::build_messages(&self.schema, question, language);

        let reply = self.client.complete(&messages).await?;
        let sql = parser::extract_sql(&reply);

        if sql.is_empty() {
            return Err(QuerycraftError::generation(
                "LLM returned an empty response.",
            ));
        }

        debug!(sql = %sql, "Generated SQL candidate");

        Ok(GeneratedSql {
            sql,
            model: self.model.clone(),
            endpoint: self.client.endpoint(),
        })
    }
}
