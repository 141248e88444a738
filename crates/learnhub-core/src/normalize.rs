//! Request normalization.
//!
//! Forms posted as `multipart/form-data` flatten nested records into keys
//! like `qualification.degree`, `qualification[degree]` or
//! `questions[0][question]`, and frequently ship whole sub-records as
//! JSON-encoded strings. JSON clients send the same records natively.
//!
//! [`normalize`] turns either form into one canonical nested
//! [`serde_json::Value`] that a DTO can be deserialized from. What is special
//! about each entity lives in a declarative [`FieldTable`]; the algorithm is
//! the same for all of them:
//!
//! 1. plain keys are copied, declared fields given as strings are JSON-parsed
//!    according to their [`OnInvalidJson`] policy,
//! 2. dotted and bracketed keys are folded into nested objects and arrays,
//! 3. `null`, empty strings and empty-object placeholders are pruned so they
//!    never overwrite stored values,
//! 4. list-shaped fields holding a single object become a one-element list.

use serde_json::{Map, Value};
use thiserror::Error;

/// Largest array index accepted in a bracketed key.
pub const MAX_LIST_INDEX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnInvalidJson {
    /// Malformed JSON is a validation error.
    Reject,
    /// Malformed JSON is kept as the raw string and left to validation.
    PassThrough,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub shape: Shape,
    pub on_invalid_json: OnInvalidJson,
}

impl FieldRule {
    pub const fn object(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Object,
            on_invalid_json: OnInvalidJson::Reject,
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::List,
            on_invalid_json: OnInvalidJson::Reject,
        }
    }

    pub const fn lenient(self) -> Self {
        Self {
            on_invalid_json: OnInvalidJson::PassThrough,
            ..self
        }
    }
}

/// Nested wire fields of one entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    pub fields: &'static [FieldRule],
}

impl FieldTable {
    pub const fn new(fields: &'static [FieldRule]) -> Self {
        Self { fields }
    }

    fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid {field} format")]
    InvalidJson { field: String },

    #[error("Invalid field name {key}")]
    InvalidKey { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    /// `None` for an empty `[]`, meaning "append".
    Index(Option<usize>),
}

/// Splits `a.b[0][c]` into segments. Returns `None` for plain keys.
fn parse_path(key: &str) -> Result<Option<Vec<Segment>>, NormalizeError> {
    if !key.contains(['.', '[']) {
        return Ok(None);
    }

    let invalid = || NormalizeError::InvalidKey {
        key: key.to_string(),
    };
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(segment_from_dotted(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(segment_from_dotted(std::mem::take(&mut current)));
                }
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(c) => inner.push(c),
                        None => return Err(invalid()),
                    }
                }
                let inner = inner.trim();
                if inner.is_empty() {
                    segments.push(Segment::Index(None));
                } else if let Ok(index) = inner.parse::<usize>() {
                    if index > MAX_LIST_INDEX {
                        return Err(invalid());
                    }
                    segments.push(Segment::Index(Some(index)));
                } else {
                    segments.push(Segment::Key(inner.to_string()));
                }
            }
            ']' => return Err(invalid()),
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(segment_from_dotted(current));
    }

    match segments.first() {
        Some(Segment::Key(_)) => Ok(Some(segments)),
        _ => Err(invalid()),
    }
}

fn segment_from_dotted(part: String) -> Segment {
    match part.parse::<usize>() {
        Ok(index) if index <= MAX_LIST_INDEX => Segment::Index(Some(index)),
        _ => Segment::Key(part),
    }
}

fn insert(target: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    match head {
        Segment::Key(key) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                insert(slot, rest, value);
            }
        }
        Segment::Index(index) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(items) = target {
                let i = index.unwrap_or(items.len());
                if items.len() <= i {
                    items.resize(i + 1, Value::Null);
                }
                insert(&mut items[i], rest, value);
            }
        }
    }
}

fn parse_declared(rule: &FieldRule, value: Value) -> Result<Value, NormalizeError> {
    let Value::String(raw) = value else {
        return Ok(value);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::String(raw));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed) => Ok(parsed),
        Err(_) => match rule.on_invalid_json {
            OnInvalidJson::Reject => Err(NormalizeError::InvalidJson {
                field: rule.name.to_string(),
            }),
            OnInvalidJson::PassThrough => Ok(Value::String(raw)),
        },
    }
}

fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s == "{}"
        }
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Removes nulls, empty strings and empty objects, innermost first.
fn prune(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                prune(child);
            }
            map.retain(|_, child| !is_placeholder(child));
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                prune(child);
            }
            items.retain(|child| !is_placeholder(child));
        }
        _ => {}
    }
}

fn apply_shape(rule: &FieldRule, value: Value) -> Value {
    match (rule.shape, value) {
        (Shape::List, Value::Object(map)) => Value::Array(vec![Value::Object(map)]),
        (_, value) => value,
    }
}

/// Rebuilds a canonical nested payload from flattened form fields.
pub fn normalize(table: &FieldTable, input: Map<String, Value>) -> Result<Value, NormalizeError> {
    let mut root = Value::Object(Map::new());
    let mut nested = Vec::new();

    for (key, value) in input {
        match parse_path(&key)? {
            None => {
                let value = match table.rule(&key) {
                    Some(rule) => parse_declared(rule, value)?,
                    None => value,
                };
                if let Value::Object(map) = &mut root {
                    map.insert(key, value);
                }
            }
            Some(segments) => nested.push((segments, value)),
        }
    }

    for (segments, value) in nested {
        match (segments.last(), value) {
            (Some(Segment::Index(None)), Value::Array(items)) => {
                for item in items {
                    insert(&mut root, &segments, item);
                }
            }
            (_, value) => insert(&mut root, &segments, value),
        }
    }

    prune(&mut root);

    if let Value::Object(map) = &mut root {
        for rule in table.fields {
            if let Some(value) = map.remove(rule.name) {
                map.insert(rule.name.to_string(), apply_shape(rule, value));
            }
        }
    }

    Ok(root)
}

/// Convenience for multipart text parts collected as `(name, value)` pairs.
/// Repeated names become arrays.
pub fn collect_fields<I>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = Map::new();
    for (name, text) in pairs {
        let value = Value::String(text);
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TABLE: FieldTable = FieldTable::new(&[
        FieldRule::object("qualification"),
        FieldRule::object("emergencyContact").lenient(),
        FieldRule::list("questions"),
    ]);

    fn form(pairs: &[(&str, &str)]) -> Map<String, Value> {
        collect_fields(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_dotted_and_bracketed_keys_agree() {
        let dotted = normalize(
            &TABLE,
            form(&[("qualification.degree", "BSc"), ("qualification.institute", "NUST")]),
        )
        .unwrap();
        let bracketed = normalize(
            &TABLE,
            form(&[("qualification[degree]", "BSc"), ("qualification[institute]", "NUST")]),
        )
        .unwrap();

        assert_eq!(dotted, bracketed);
        assert_eq!(dotted["qualification"]["degree"], "BSc");
        assert_eq!(dotted["qualification"]["institute"], "NUST");
    }

    #[test]
    fn test_indexed_keys_build_lists() {
        let out = normalize(
            &TABLE,
            form(&[
                ("questions[0][question]", "2 + 2?"),
                ("questions[0][type]", "short"),
                ("questions[1][question]", "Pick one"),
                ("questions[1][choices][0]", "a"),
                ("questions[1][choices][1]", "b"),
            ]),
        )
        .unwrap();

        assert_eq!(
            out["questions"],
            json!([
                { "question": "2 + 2?", "type": "short" },
                { "question": "Pick one", "choices": ["a", "b"] }
            ])
        );
    }

    #[test]
    fn test_dotted_numeric_segments_are_indexes() {
        let out = normalize(&TABLE, form(&[("questions.0.question", "Why?")])).unwrap();
        assert_eq!(out["questions"], json!([{ "question": "Why?" }]));
    }

    #[test]
    fn test_json_string_fields_are_parsed() {
        let out = normalize(
            &TABLE,
            form(&[
                ("qualification", r#"{"degree":"MSc","passingYear":2019}"#),
                ("questions", r#"[{"type":"mcq","question":"Q1"}]"#),
            ]),
        )
        .unwrap();
        assert_eq!(out["qualification"]["passingYear"], 2019);
        assert_eq!(out["questions"][0]["type"], "mcq");
    }

    #[test]
    fn test_invalid_json_rejected_for_strict_field() {
        let err = normalize(&TABLE, form(&[("questions", "[{not json")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid questions format");
    }

    #[test]
    fn test_invalid_json_passes_through_for_lenient_field() {
        let out = normalize(&TABLE, form(&[("emergencyContact", "call mum")])).unwrap();
        assert_eq!(out["emergencyContact"], "call mum");
    }

    #[test]
    fn test_single_object_wrapped_into_list() {
        let out = normalize(
            &TABLE,
            form(&[("questions", r#"{"type":"short","question":"Only one"}"#)]),
        )
        .unwrap();
        assert_eq!(out["questions"], json!([{ "type": "short", "question": "Only one" }]));
    }

    #[test]
    fn test_placeholders_are_dropped() {
        let mut input = form(&[("title", "Quiz"), ("description", ""), ("photo", "{}")]);
        input.insert("file".to_string(), json!({}));
        input.insert("validTill".to_string(), Value::Null);
        input.insert("qualification".to_string(), json!({ "degree": "", "institute": null }));

        let out = normalize(&TABLE, input).unwrap();
        assert_eq!(out, json!({ "title": "Quiz" }));
    }

    #[test]
    fn test_plain_json_and_dotted_keys_merge() {
        let out = normalize(
            &TABLE,
            form(&[
                ("qualification", r#"{"degree":"BSc"}"#),
                ("qualification.institute", "FAST"),
            ]),
        )
        .unwrap();
        assert_eq!(out["qualification"], json!({ "degree": "BSc", "institute": "FAST" }));
    }

    #[test]
    fn test_native_json_payload_untouched() {
        let mut input = Map::new();
        input.insert("courseName".to_string(), json!("Rust 101"));
        input.insert("totalLectures".to_string(), json!(24));
        input.insert("questions".to_string(), json!([{ "question": "a" }]));

        let out = normalize(&TABLE, input).unwrap();
        assert_eq!(out["totalLectures"], 24);
        assert_eq!(out["questions"], json!([{ "question": "a" }]));
    }

    #[test]
    fn test_malformed_keys_rejected() {
        assert!(normalize(&TABLE, form(&[("questions[0", "x")])).is_err());
        assert!(normalize(&TABLE, form(&[("[0]", "x")])).is_err());
        assert!(normalize(&TABLE, form(&[("questions[100000][q]", "x")])).is_err());
    }

    #[test]
    fn test_append_brackets_and_repeated_names() {
        let out = normalize(&TABLE, form(&[("tags[]", "a"), ("tags[]", "b")])).unwrap();
        assert_eq!(out["tags"], json!(["a", "b"]));

        let out = normalize(&TABLE, form(&[("skill", "a"), ("skill", "b")])).unwrap();
        assert_eq!(out["skill"], json!(["a", "b"]));
    }
}
