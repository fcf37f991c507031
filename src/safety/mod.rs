//! SQL safety validation for QueryCraft.
//!
//! The sole barrier between free-form generated text and the live database:
//! a narrow allow-list check plus a row-cap rewrite. This is deliberately
//! lexical, not grammar-aware - it blocks the common cases and leaves the
//! read-only transaction as the backstop. A terminator or limit-like token
//! inside a string literal will fool it; that statement still cannot mutate
//! anything.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{QuerycraftError, Result};

/// Lexical match for an existing row-limiting clause.
static LIMIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blimit\s+(\d+)\b").expect("limit regex is valid"));

/// Validates SQL text against the read-only allow-list and bounds it to
/// `max_rows`, returning the sanitized statement.
///
/// Idempotent: running the result through again with the same cap yields
/// the same text. The pipeline relies on this when re-validating text that
/// was already sanitized.
pub fn sanitize_sql(sql: &str, max_rows: u32) -> Result<String> {
    if max_rows == 0 {
        return Err(QuerycraftError::internal(
            "max_rows must be a positive integer.",
        ));
    }

    let cleaned = ensure_select_statement(sql)?;
    enforce_limit(&cleaned, max_rows)
}

/// Allow-list check: trimmed, single, SELECT-leading statement.
fn ensure_select_statement(sql: &str) -> Result<String> {
    if sql.trim().is_empty() {
        return Err(QuerycraftError::validation("SQL text cannot be empty."));
    }

    // One trailing terminator is tolerated; more than one leaves a ';'
    // behind and fails the stacking check below.
    let trimmed = sql.trim();
    let cleaned = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();

    if !starts_with_select(cleaned) {
        return Err(QuerycraftError::validation(
            "Only SELECT statements are permitted.",
        ));
    }

    if cleaned.contains(';') {
        return Err(QuerycraftError::validation(
            "Multiple SQL statements are not allowed.",
        ));
    }

    Ok(cleaned.to_string())
}

fn starts_with_select(sql: &str) -> bool {
    // get() rather than slicing: the first six bytes of generated text are
    // not guaranteed to sit on a char boundary.
    matches!(sql.get(..6), Some(prefix) if prefix.eq_ignore_ascii_case("select"))
}

/// Caps an existing `LIMIT` clause or appends one equal to the cap.
fn enforce_limit(sql: &str, max_rows: u32) -> Result<String> {
    if let Some(captures) = LIMIT_REGEX.captures(sql) {
        let requested = &captures[1];
        match requested.parse::<u64>() {
            Ok(value) if value <= u64::from(max_rows) => Ok(sql.to_string()),
            _ => Err(QuerycraftError::validation(format!(
                "Queries are limited to {max_rows} rows; requested {requested}."
            ))),
        }
    } else {
        Ok(format!("{sql} LIMIT {max_rows}"))
    }
}
