// Helpers for turning raw provider text into JSON payloads

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```").expect("code fence pattern is valid")
});

/// Parse the JSON object a model produced.
///
/// Models constrained to a schema normally return bare JSON, but some local
/// servers still wrap it in a Markdown code fence or surround it with prose.
/// Tries, in order: the whole text, the first fenced block, the outermost
/// `{ ... }` span.
pub fn extract_json_payload(text: &str) -> Result<Value, serde_json::Error> {
    let trimmed = text.trim();
    let first_err = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(inner) = CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.as_str()) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(first_err)
}
