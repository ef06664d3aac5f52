//! Content extraction for fetched API pages
//!
//! WordPress endpoints normally answer with bare JSON, but a rendering browser
//! hands back the JSON wrapped in an HTML document, and some sites serve the
//! payload inside interstitial or error boilerplate. Extraction therefore tries
//! progressively looser strategies before giving up:
//!
//! 1. Parse the content directly as JSON
//! 2. For HTML documents, strip the leading opening tags and trailing closing
//!    tags, then parse the remainder
//! 3. Parse the span from the first `[`/`{` to the last matching `]`/`}`

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// No parseable JSON payload was found in page content
#[derive(Debug, Clone, Error)]
#[error("Could not extract JSON from page content: {reason}")]
pub struct ExtractionError {
    pub reason: String,
}

impl ExtractionError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

fn leading_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:<[^>]+>\s*)+").expect("valid leading-tag pattern"))
}

fn trailing_closing_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\s*</[^>]+>)+\s*$").expect("valid trailing-tag pattern")
    })
}

/// Extracts structured JSON data from raw page content
///
/// # Returns
///
/// * `Ok(Value)` - The parsed payload (usually an array of posts)
/// * `Err(ExtractionError)` - No strategy produced valid JSON
///
/// # Example
///
/// ```
/// use wp_harvest::crawler::extract_json;
///
/// let page = r#"<html><head></head><body><pre>[{"id": 1}]</pre></body></html>"#;
/// let data = extract_json(page).unwrap();
/// assert_eq!(data[0]["id"], 1);
/// ```
pub fn extract_json(content: &str) -> Result<Value, ExtractionError> {
    let direct_error = match serde_json::from_str::<Value>(content) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if looks_like_html_document(content) {
        if let Some(value) = parse_stripped_document(content) {
            return Ok(value);
        }
    }

    match bracketed_span(content) {
        Some(span) => serde_json::from_str(span).map_err(|e| {
            ExtractionError::new(format!("embedded JSON span is malformed: {}", e))
        }),
        None => Err(ExtractionError::new(format!(
            "no JSON array or object found ({})",
            direct_error
        ))),
    }
}

/// Returns true if the content starts like an HTML document
fn looks_like_html_document(content: &str) -> bool {
    let head: String = content
        .trim_start()
        .chars()
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<html") || head.starts_with("<!doctype")
}

/// Strips wrapping tags from an HTML document and parses what is left
///
/// Entities inside the payload are kept as they are; stored posts must match
/// what the site sent byte for byte.
fn parse_stripped_document(content: &str) -> Option<Value> {
    let stripped = leading_tags().replace(content, "");
    let stripped = trailing_closing_tags().replace(&stripped, "");
    serde_json::from_str(stripped.trim()).ok()
}

/// Finds the candidate JSON span in arbitrary content
///
/// An array span is preferred when `[` occurs before the first `{`.
fn bracketed_span(content: &str) -> Option<&str> {
    let array_start = content.find('[');
    let object_start = content.find('{');

    let prefer_array = match (array_start, object_start) {
        (Some(a), Some(o)) => a < o,
        (Some(_), None) => true,
        _ => false,
    };

    if prefer_array {
        let start = array_start?;
        let end = content.rfind(']')?;
        return (end > start).then(|| &content[start..=end]);
    }

    let start = object_start?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_posts() -> Value {
        json!([
            {"id": 1, "title": {"rendered": "First"}, "content": {"rendered": "<p>a &amp; b</p>"}},
            {"id": 2, "title": "Second", "link": "https://example.com/2"}
        ])
    }

    #[test]
    fn test_plain_json() {
        let text = sample_posts().to_string();
        assert_eq!(extract_json(&text).unwrap(), sample_posts());
    }

    #[test]
    fn test_plain_json_object() {
        let data = extract_json(r#"{"code": "rest_no_route"}"#).unwrap();
        assert_eq!(data["code"], "rest_no_route");
    }

    #[test]
    fn test_json_wrapped_in_html_document() {
        let json_text = serde_json::to_string_pretty(&sample_posts()).unwrap();
        let wrappers = [
            ("<html><body>", "</body></html>"),
            (
                "<!DOCTYPE html><html><head><meta name=\"color-scheme\" content=\"light dark\"></head><body><pre style=\"word-wrap: break-word;\">",
                "</pre></body></html>",
            ),
            ("<html>\n  <head></head>\n  <body>\n<div><pre>", "</pre></div>\n</body>\n</html>\n"),
        ];

        for (open, close) in wrappers {
            let page = format!("{}{}{}", open, json_text, close);
            assert_eq!(extract_json(&page).unwrap(), sample_posts(), "wrapper {}", open);
        }
    }

    #[test]
    fn test_entities_survive_html_wrapper() {
        let original = json!([{
            "title": {"rendered": "Fish &amp; Chips"},
            "content": {"rendered": "&lt;p&gt;x&lt;/p&gt;"},
            "link": "https://a.com/?x=1&amp;y=2"
        }]);
        let page = format!("<html><body>{}</body></html>", original);

        let data = extract_json(&page).unwrap();
        assert_eq!(data, original);
        assert_eq!(data[0]["link"], "https://a.com/?x=1&amp;y=2");
        assert_eq!(data[0]["title"]["rendered"], "Fish &amp; Chips");
    }

    #[test]
    fn test_uppercase_doctype() {
        let page = "<!DOCTYPE HTML><HTML><BODY>[1, 2, 3]</BODY></HTML>";
        assert_eq!(extract_json(page).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_fallback_span_in_fragment() {
        let page = "<div class=\"notice\">Loading…</div><pre>[{\"id\": 5}]</pre><footer>bye</footer>";
        assert_eq!(extract_json(page).unwrap(), json!([{"id": 5}]));
    }

    #[test]
    fn test_array_preferred_when_first() {
        let text = "prefix [{\"id\": 1}] suffix";
        assert_eq!(extract_json(text).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn test_object_span_when_brace_first() {
        let text = "garbage {\"posts\": [1, 2]} trailing";
        assert_eq!(extract_json(text).unwrap(), json!({"posts": [1, 2]}));
    }

    #[test]
    fn test_no_json_fails() {
        let err = extract_json("<html><body>Access denied</body></html>").unwrap_err();
        assert!(err.to_string().contains("Could not extract JSON"));
    }

    #[test]
    fn test_malformed_span_fails() {
        let err = extract_json("<p>[1, 2,, 3]</p>").unwrap_err();
        assert!(err.reason.contains("malformed"));
    }

    #[test]
    fn test_empty_content_fails() {
        assert!(extract_json("").is_err());
        assert!(extract_json("   ").is_err());
    }

    #[test]
    fn test_looks_like_html_document() {
        assert!(looks_like_html_document("  <html lang=\"en\">"));
        assert!(looks_like_html_document("<!doctype html>"));
        assert!(!looks_like_html_document("<pre>[]</pre>"));
        assert!(!looks_like_html_document("[]"));
    }
}
