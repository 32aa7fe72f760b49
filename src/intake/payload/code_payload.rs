use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Keys that may carry a route id inside a JSON code payload.
const STRUCTURED_KEYS: [&str; 3] = ["linha", "numero", "line"];
/// Keys that may carry a route id inside a `key=value&...` code payload.
const QUERY_KEYS: [&str; 2] = ["linha", "bus"];

/// The shape a decoded machine-readable code was recognised as, carrying the
/// route id candidate extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePayload {
    /// A bare identifier such as `3` or `201-A`.
    Identifier(String),
    /// A JSON object such as `{"linha": "3"}`.
    Structured(String),
    /// Query parameters such as `linha=3` or `https://host/x?bus=3`.
    KeyValue(String),
    /// Nothing matched; the trimmed text itself.
    Verbatim(String),
}

type Classifier = fn(&str) -> Option<CodePayload>;

const CLASSIFIERS: [Classifier; 3] = [identifier, structured, key_value];

impl CodePayload {
    /// Runs the classifiers in order; the first match wins.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        CLASSIFIERS
            .iter()
            .find_map(|classify| classify(trimmed))
            .unwrap_or_else(|| CodePayload::Verbatim(trimmed.to_string()))
    }

    pub fn candidate(&self) -> &str {
        match self {
            CodePayload::Identifier(id)
            | CodePayload::Structured(id)
            | CodePayload::KeyValue(id)
            | CodePayload::Verbatim(id) => id,
        }
    }

    /// Key used against the route table. Identifier-shaped candidates are
    /// case-folded to upper case; anything else is used as is.
    pub fn lookup_key(&self) -> String {
        let candidate = self.candidate().trim();
        if is_identifier(candidate) {
            candidate.to_uppercase()
        } else {
            candidate.to_string()
        }
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn identifier(text: &str) -> Option<CodePayload> {
    is_identifier(text).then(|| CodePayload::Identifier(text.to_string()))
}

fn structured(text: &str) -> Option<CodePayload> {
    if !text.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => STRUCTURED_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(CodePayload::Structured),
        Ok(_) => None,
        Err(_) => lenient_linha(text).map(CodePayload::Structured),
    }
}

/// Pulls `"linha": "<id>"` out of JSON that failed to parse.
fn lenient_linha(text: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#""linha"\s*:\s*"([^"]+)""#).expect("static pattern is valid")
    });
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}

fn key_value(text: &str) -> Option<CodePayload> {
    if !text.contains('=') {
        return None;
    }
    let query = text.split_once('?').map_or(text, |(_, query)| query);
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();
    QUERY_KEYS
        .iter()
        .find_map(|wanted| {
            pairs
                .iter()
                .find(|(key, value)| key == wanted && !value.is_empty())
                .map(|(_, value)| value.clone())
        })
        .map(CodePayload::KeyValue)
}
