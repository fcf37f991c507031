//! LLM integration for QueryCraft.
//!
//! Provides the client trait and implementations for the text-generation
//! service that proposes SQL. The pipeline only consumes a single complete
//! reply per question; prompt construction and model selection live in
//! configuration, not pipeline logic.

pub mod generator;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use generator::SqlGenerator;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::extract_sql;
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{QuerycraftError, Result};

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync); one client is shared
/// across concurrent pipeline runs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string. Failures are not
    /// retried at this layer.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Identifies the service endpoint, for provenance metadata.
    fn endpoint(&self) -> String;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI (GPT-4, etc.)
    #[default]
    OpenAi,
    /// Mock client for testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an LLM client for the configured provider.
///
/// This is the central factory function for generation-service clients;
/// it is called once at startup and the client is reused for the life of
/// the process.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider: LlmProvider = config
        .provider
        .parse()
        .map_err(QuerycraftError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            let mut openai_config = OpenAiConfig::from_env(&config.model)?;
            openai_config.timeout_secs = config.timeout_secs;
            if let Some(endpoint) = &config.endpoint {
                openai_config.endpoint = endpoint.clone();
            }
            Ok(Arc::new(OpenAiClient::new(openai_config)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
