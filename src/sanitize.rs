use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Query fragment recovered from structured-mode LLM output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuery {
    pub entity: String,
    pub filter: String,
}

/// Clean up raw LLM text into a bare OData path+query suffix.
///
/// Strips surrounding whitespace and code-fence backticks, removes embedded
/// newlines, then closes an unterminated single-quoted string literal: if the
/// text contains an odd number of single quotes (typically truncated model
/// output), one quote is appended at the end. This is a best-effort repair,
/// not a parser; it cannot tell an intentionally odd quote count from a
/// truncation artifact, and it does not touch parentheses or double quotes.
pub fn sanitize_suffix(text: &str) -> String {
    let mut query = text.trim().trim_matches('`').replace('\n', "");

    // Close unbalanced single quotes
    if query.matches('\'').count() % 2 != 0 {
        query.push('\'');
    }

    query
}

/// Locate and parse the first brace-delimited JSON object in raw LLM text.
///
/// Models routinely wrap the object in prose or markdown, so the match is
/// non-greedy from the first `{` to the first subsequent `}`. Anything that
/// fails to parse, or parses without both `entity` and `filter` string
/// fields, is a malformed-output error carrying the full raw text so the
/// caller can see what the model actually said.
pub fn extract_query_object(text: &str) -> Result<ExtractedQuery, QueryError> {
    // Fixed literal pattern, compilation cannot fail at runtime
    let object_pattern = regex::Regex::new(r"(?s)\{.*?\}").expect("brace pattern compiles");

    let matched = object_pattern
        .find(text)
        .ok_or_else(|| QueryError::MalformedOutput {
            reason: "no JSON object found in response".to_string(),
            raw: text.to_string(),
        })?;

    serde_json::from_str::<ExtractedQuery>(matched.as_str()).map_err(|e| {
        QueryError::MalformedOutput {
            reason: e.to_string(),
            raw: text.to_string(),
        }
    })
}
