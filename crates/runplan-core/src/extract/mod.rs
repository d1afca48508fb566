//! Isolates the JSON object embedded in a model's free-text reply.
//!
//! Code fences are stripped first, then the text is scanned for a balanced
//! `{ ... }` object. The scan tracks string and escape context so braces
//! inside string values do not end the object early.

use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON object found in model reply")]
    NoJsonFound,
}

/// Return the JSON object candidate contained in `text`.
///
/// The scan starts at the first `{` and ends where its depth returns to zero.
/// The span is returned whether or not it parses, so the validator reports a
/// malformed object as such. A span that never closes is `NoJsonFound`.
pub fn extract_json(text: &str) -> Result<String, ExtractError> {
    let stripped = strip_code_fences(text);
    let body = stripped.as_ref();

    let start = body.find('{').ok_or(ExtractError::NoJsonFound)?;
    let candidate = balanced_object(&body[start..]).ok_or(ExtractError::NoJsonFound)?;
    debug!(offset = start, len = candidate.len(), "extracted JSON object");
    Ok(candidate.to_owned())
}

/// Remove markdown fence lines (```` ``` ```` or ```` ```json ````).
///
/// Text without a fence is returned untouched.
fn strip_code_fences(text: &str) -> Cow<'_, str> {
    if !text.contains("```") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            // A fence line may carry a language tag and, rarely, content on
            // the same line ("```json {").
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            let rest = rest.strip_suffix('\n').unwrap_or(rest).trim_end();
            let rest = rest.strip_suffix("```").unwrap_or(rest);
            if !rest.trim().is_empty() {
                out.push_str(rest);
                out.push('\n');
            }
            continue;
        }
        match line.trim_end().strip_suffix("```") {
            Some(content) => {
                out.push_str(content);
                out.push('\n');
            }
            None => out.push_str(line),
        }
    }
    Cow::Owned(out)
}

/// Scan from a leading `{` to its matching `}`.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
