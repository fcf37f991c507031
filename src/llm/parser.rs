//! Response normalization for LLM outputs.
//!
//! The generation service replies with free text that usually wraps the SQL
//! in markdown code fences or sentinel tokens. This module collapses such a
//! reply to plain SQL text; emptiness checks belong to the caller.

/// Sentinel tokens some prompt styles use to bracket the statement.
const BEGIN_SENTINEL: &str = "BEGIN_SQL";
const END_SENTINEL: &str = "END_SQL";

/// Normalizes an LLM reply into plain SQL text.
///
/// Handles, in order of preference:
/// - a ```sql fenced block (first one wins),
/// - a generic ``` fenced block without a language tag,
/// - `BEGIN_SQL` / `END_SQL` sentinel tokens around the statement,
/// - otherwise the trimmed reply as-is.
///
/// The result may be empty; callers decide whether that is an error.
pub fn extract_sql(response: &str) -> String {
    let text = response.trim();

    let body = if let Some(block) = extract_code_block(text, "sql") {
        block
    } else if let Some(block) = extract_code_block(text, "") {
        block
    } else {
        text.to_string()
    };

    strip_sentinels(&body).trim().to_string()
}

/// Extracts content from a markdown code block with the specified language.
///
/// Pass an empty string for `lang` to match blocks without a language tag.
/// The tag must match exactly up to the end of the fence line, so a
/// `sqlite` fence is not mistaken for an `sql` one.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(found) = text[search_from..].find("```") {
        let tag_start = search_from + found + 3;
        let newline = text[tag_start..].find('\n')?;
        let tag = text[tag_start..tag_start + newline].trim();
        let content_start = tag_start + newline + 1;
        let end_idx = text[content_start..].find("```")?;

        if tag == lang {
            return Some(text[content_start..content_start + end_idx].to_string());
        }

        // Skip past this block's closing fence before trying the next one.
        search_from = content_start + end_idx + 3;
    }
    None
}

/// Strips a leading `BEGIN_SQL` and trailing `END_SQL` token, if present.
fn strip_sentinels(text: &str) -> &str {
    let mut out = text.trim();

    if let Some(prefix) = out.get(..BEGIN_SENTINEL.len()) {
        if prefix.eq_ignore_ascii_case(BEGIN_SENTINEL) {
            out = out[BEGIN_SENTINEL.len()..].trim_start();
        }
    }

    if let Some(suffix) = out.get(out.len().saturating_sub(END_SENTINEL.len())..) {
        if suffix.eq_ignore_ascii_case(END_SENTINEL) {
            out = out[..out.len() - END_SENTINEL.len()].trim_end();
        }
    }

    out
}
