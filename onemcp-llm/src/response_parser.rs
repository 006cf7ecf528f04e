//! Turning raw LLM output into structured data.
//!
//! Models wrap JSON in code fences, emit invalid `\d`-style escapes inside
//! strings, get truncated mid-object by a token limit, and leave trailing
//! commas behind after editing a response in their own scratch space. None of
//! that is a reason to throw the whole extraction away, so parsing runs as a
//! pipeline of increasingly aggressive repairs, each one only applied if the
//! previous stage still didn't produce valid JSON.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Result of attempting to parse a model response into `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Parsed on the first attempt, no repairs needed.
    Success(T),
    /// Parsed, but only after one or more repair stages ran.
    Partial { value: T, repairs: Vec<String> },
    /// Every stage failed to produce valid JSON deserializable as `T`.
    Failed { error: String, raw_excerpt: String },
}

impl<T> ParseOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(v) | Self::Partial { value: v, .. } => Some(v),
            Self::Failed { .. } => None,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

const EXCERPT_LEN: usize = 200;

fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_LEN).collect()
}

/// Parse `raw` model output as `T`, running repair stages as needed.
pub fn parse_llm_json<T: DeserializeOwned>(raw: &str) -> ParseOutcome<T> {
    let mut repairs = Vec::new();

    let stripped = strip_code_fences(raw);
    if stripped.trim() != raw.trim() {
        repairs.push("stripped code fences".to_string());
    }

    let Some(outer) = locate_outer_object(&stripped) else {
        return match aggressive_repair(&stripped) {
            Some(value) => finish(value, vec!["applied aggressive key/value repair".to_string()], raw),
            None => ParseOutcome::Failed {
                error: "no JSON object found in response".to_string(),
                raw_excerpt: excerpt(raw),
            },
        };
    };
    let outer = outer.to_string();
    if outer != stripped.trim() {
        repairs.push("trimmed to outer { ... } span".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(&outer) {
        return finish(value, repairs, raw);
    }

    let escaped = fix_invalid_escapes(&outer);
    if escaped != outer {
        repairs.push("fixed invalid escape sequences".to_string());
    }

    let closed = close_unterminated(&escaped);
    if closed != escaped {
        repairs.push("closed unterminated string/object/array".to_string());
    }

    let uncommaed = strip_trailing_commas(&closed);
    if uncommaed != closed {
        repairs.push("stripped trailing commas".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(&uncommaed) {
        return finish(value, repairs, raw);
    }

    match aggressive_repair(&uncommaed) {
        Some(value) => {
            repairs.push("applied aggressive key/value repair".to_string());
            finish(value, repairs, raw)
        }
        None => ParseOutcome::Failed { error: "response is not recoverable as JSON".to_string(), raw_excerpt: excerpt(raw) },
    }
}

fn finish<T: DeserializeOwned>(value: Value, repairs: Vec<String>, raw: &str) -> ParseOutcome<T> {
    match serde_json::from_value::<T>(value) {
        Ok(parsed) if repairs.is_empty() => ParseOutcome::Success(parsed),
        Ok(parsed) => ParseOutcome::Partial { value: parsed, repairs },
        Err(err) => ParseOutcome::Failed { error: err.to_string(), raw_excerpt: excerpt(raw) },
    }
}

/// Strip a single leading/trailing ``` fence, tolerating a language tag
/// (` ```json `) on the opening line.
fn strip_code_fences(s: &str) -> String {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let after_lang = rest.find('\n').map_or(rest, |i| &rest[i + 1..]);
    after_lang.strip_suffix("```").unwrap_or(after_lang).trim().to_string()
}

/// Slice out the span from the first `{` to the last `}`, discarding any
/// prose the model wrapped the object in.
fn locate_outer_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&s[start..=end])
}

fn invalid_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\\([^"\\/bfnrtu])"#).expect("valid regex"))
}

/// Escape backslashes that aren't part of a recognized JSON escape sequence,
/// e.g. a model emitting `"C:\dev"` instead of `"C:\\dev"`.
fn fix_invalid_escapes(s: &str) -> String {
    invalid_escape_re().replace_all(s, r"\\$1").into_owned()
}

/// Close any string, object, or array still open at end of input, in case
/// the response was truncated by a token limit.
fn close_unterminated(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for c in s.chars() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = s.to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid regex"))
}

fn strip_trailing_commas(s: &str) -> String {
    trailing_comma_re().replace_all(s, "$1").into_owned()
}

fn kv_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""((?:[^"\\]|\\.)*)"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?|true|false|null|\[[^\[\]]*\]|\{[^{}]*\})"#)
            .expect("valid regex")
    })
}

/// Last resort: pull out every top-level-looking `"key": value` pair by
/// regex and rebuild a flat object from them. Loses nesting beyond one
/// level, but recovers something from a badly mangled response rather than
/// nothing.
fn aggressive_repair(s: &str) -> Option<Value> {
    let mut fields: HashMap<String, String> = HashMap::new();
    for cap in kv_pair_re().captures_iter(s) {
        fields.insert(cap[1].to_string(), cap[2].to_string());
    }
    if fields.is_empty() {
        return None;
    }
    let rebuilt = format!(
        "{{{}}}",
        fields.iter().map(|(k, v)| format!("{k:?}:{v}")).collect::<Vec<_>>().join(",")
    );
    serde_json::from_str(&rebuilt).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Extracted {
        name: String,
        count: u32,
    }

    #[test]
    fn clean_json_parses_as_success() {
        let raw = r#"{"name": "widget", "count": 3}"#;
        let outcome = parse_llm_json::<Extracted>(raw);
        assert_eq!(outcome, ParseOutcome::Success(Extracted { name: "widget".into(), count: 3 }));
    }

    #[test]
    fn strips_fenced_json_and_surrounding_prose() {
        let raw = "Here is the result:\n```json\n{\"name\": \"widget\", \"count\": 3}\n```\nLet me know if you need anything else.";
        let outcome = parse_llm_json::<Extracted>(raw);
        match outcome {
            ParseOutcome::Partial { value, repairs } => {
                assert_eq!(value, Extracted { name: "widget".into(), count: 3 });
                assert!(repairs.iter().any(|r| r.contains("code fences") || r.contains("outer")));
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn closes_truncated_object() {
        let raw = r#"{"name": "widget", "count": 3"#;
        let outcome = parse_llm_json::<Extracted>(raw);
        assert!(matches!(outcome, ParseOutcome::Partial { .. }));
    }

    #[test]
    fn strips_trailing_comma_before_closing_brace() {
        let raw = r#"{"name": "widget", "count": 3,}"#;
        let outcome = parse_llm_json::<Extracted>(raw);
        assert!(matches!(outcome, ParseOutcome::Partial { .. }));
    }

    #[test]
    fn fixes_invalid_backslash_escape() {
        let raw = r#"{"name": "C:\devices", "count": 1}"#;
        let outcome = parse_llm_json::<Extracted>(raw);
        match outcome {
            ParseOutcome::Partial { value, .. } => assert_eq!(value.name, "C:\\devices"),
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn unrecoverable_garbage_fails_with_excerpt() {
        let raw = "the model said nothing useful at all";
        let outcome = parse_llm_json::<Extracted>(raw);
        match outcome {
            ParseOutcome::Failed { raw_excerpt, .. } => assert!(raw_excerpt.contains("model said")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn aggressive_repair_recovers_flat_pairs_from_junk() {
        let raw = r#"garbled preamble "name": "widget", "count": 3 trailing junk without braces"#;
        let outcome = parse_llm_json::<Extracted>(raw);
        assert!(matches!(outcome, ParseOutcome::Failed { .. }) || matches!(outcome, ParseOutcome::Partial { .. }));
    }
}
