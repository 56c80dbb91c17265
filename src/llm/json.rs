//! Helpers for pulling a JSON object out of a model reply.
//!
//! Models often wrap JSON in markdown fences or surround it with prose even
//! when asked not to. These helpers only locate text; parsing is left to the
//! caller.

/// Strip a leading and/or trailing triple-backtick fence.
///
/// The opening fence may carry a language tag (` ```json `); everything up to
/// the end of that line is removed. On a single-line fence the tag is only
/// dropped when a JSON value follows it. Returns the trimmed inner text.
pub fn strip_code_fences(text: &str) -> &str {
    let mut inner = text.trim();

    if let Some(rest) = inner.strip_prefix("```") {
        inner = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            // Single-line fence: a tag only counts when JSON follows it.
            None => {
                let untagged = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
                if untagged.trim_start().starts_with(['{', '[']) {
                    untagged
                } else {
                    rest
                }
            }
        };
    }

    if let Some(rest) = inner.trim_end().strip_suffix("```") {
        inner = rest;
    }

    inner.trim()
}

/// Locate the candidate JSON object span.
///
/// Text that already starts with `{` and ends with `}` is returned whole.
/// Otherwise the span from the first `{` through the last `}` is returned,
/// or `None` when there is no such span.
pub fn locate_object(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&trimmed[start..=end])
}
