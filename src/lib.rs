//! QueryCraft - a natural-language analytics gateway.
//!
//! Turns a free-text question into a bounded, read-only SQL query via an LLM,
//! validates the generated text against a SELECT-only allow-list, executes it
//! inside a read-only transaction, and shapes the result into a single
//! normalized response envelope.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod safety;
