use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z]*[ \t]*\r?\n?").expect("valid regex"));
static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?[ \t]*```$").expect("valid regex"));

/// Outcome of reading a model reply as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    Parsed(Value),
    Unparsable,
}

/// Parse a free-text model reply.
///
/// The reply is first stripped of code fences and parsed directly. If that
/// fails, the first balanced `{...}` span is parsed instead, which recovers
/// objects the model wrapped in prose.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return ParsedReply::Parsed(value);
    }

    match first_object_span(cleaned) {
        Some(span) => match serde_json::from_str::<Value>(span) {
            Ok(value) => ParsedReply::Parsed(value),
            Err(_) => ParsedReply::Unparsable,
        },
        None => ParsedReply::Unparsable,
    }
}

/// Remove a leading ```` ``` ```` or ```` ```json ```` marker and a trailing
/// ```` ``` ```` marker.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_leading = match LEADING_FENCE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    let without_trailing = match TRAILING_FENCE.find(without_leading) {
        Some(m) => &without_leading[..m.start()],
        None => without_leading,
    };
    without_trailing.trim()
}

/// Locate the first balanced `{...}` span. Braces inside JSON strings are
/// ignored.
pub fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
