//! Locates the JSON object inside a model reply.
//!
//! Models are told to answer with bare JSON but regularly wrap it in a code
//! fence or add a sentence before or after it.

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Remove one leading fence marker (```` ```json ```` or ```` ``` ````) and
/// one trailing ```` ``` ````, trimming whitespace around the result.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Slice from the first `{` to the last `}`, after fence stripping.
///
/// Returns `None` when the reply has no brace pair at all.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let text = strip_code_fence(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
