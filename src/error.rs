//! Error types for QueryCraft.
//!
//! Defines the main error enum used throughout the gateway.

use thiserror::Error;

/// Main error type for QueryCraft operations.
#[derive(Error, Debug)]
pub enum QuerycraftError {
    /// Request-contract violations (blank question, malformed body).
    ///
    /// The only error kind allowed to abort processing before a pipeline
    /// run starts; everything else is captured as data on the run.
    #[error("Input error: {0}")]
    Input(String),

    /// LLM produced empty or unusable text.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generated SQL failed the safety allow-list.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Data-store failure while executing a validated statement.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuerycraftError {
    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the bare message without the category prefix.
    ///
    /// This is what travels in response envelopes; the prefixed `Display`
    /// form is for logs.
    pub fn message(&self) -> &str {
        match self {
            Self::Input(msg)
            | Self::Generation(msg)
            | Self::Validation(msg)
            | Self::Execution(msg)
            | Self::Connection(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Input(_) => "Input Error",
            Self::Generation(_) => "Generation Error",
            Self::Validation(_) => "Validation Error",
            Self::Execution(_) => "Execution Error",
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using QuerycraftError.
pub type Result<T> = std::result::Result<T, QuerycraftError>;
