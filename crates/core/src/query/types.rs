//! Types for building search requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised when a search request has the wrong shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search terms must be a string or a list of strings, {0} given")]
    InvalidTerms(String),

    #[error("search options must be a map, {0} given")]
    InvalidOptions(String),

    #[error("option {name} must be a string, number, boolean or list, {given} given")]
    InvalidOption { name: String, given: String },
}

/// Short description of a JSON value's shape for error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "map".to_string(),
    }
}

/// The free-text part of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    pub fn new(terms: Vec<String>) -> Self {
        Self(terms)
    }

    /// Accept nothing, a single string, or a (possibly nested) list.
    ///
    /// Lists are flattened and every element that is not a string is dropped.
    /// Any other shape is rejected.
    pub fn from_value(value: &Value) -> Result<Self, QueryError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(s) => Ok(Self(vec![s.clone()])),
            Value::Array(items) => {
                let mut terms = Vec::new();
                flatten_strings(items, &mut terms);
                Ok(Self(terms))
            }
            other => Err(QueryError::InvalidTerms(describe(other))),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn flatten_strings(items: &[Value], out: &mut Vec<String>) {
    for item in items {
        match item {
            Value::String(s) => out.push(s.clone()),
            Value::Array(nested) => flatten_strings(nested, out),
            _ => {}
        }
    }
}

/// A single option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    /// Only an explicit `false` is falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, OptionValue::Flag(false))
    }

    /// Integer coercion: leading digits of the rendered value, 0 if none.
    pub fn to_int(&self) -> i64 {
        match self {
            OptionValue::Int(n) => *n,
            OptionValue::Text(s) => leading_int(s),
            OptionValue::Flag(_) | OptionValue::List(_) => 0,
        }
    }

    /// The value's items when used as a word list.
    pub fn items(&self) -> Vec<String> {
        match self {
            OptionValue::List(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }

    fn from_value(name: &str, value: &Value) -> Result<Option<Self>, QueryError> {
        Ok(match value {
            Value::Null => None,
            Value::Bool(b) => Some(OptionValue::Flag(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => OptionValue::Int(i),
                None => OptionValue::Text(n.to_string()),
            }),
            Value::String(s) => Some(OptionValue::Text(s.clone())),
            Value::Array(items) => Some(OptionValue::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::Object(_) => {
                return Err(QueryError::InvalidOption {
                    name: name.to_string(),
                    given: describe(value),
                })
            }
        })
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(b) => write!(f, "{b}"),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Named search options. Unknown names are kept but have no effect on the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchOptions(BTreeMap<String, OptionValue>);

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON map of options. A `null` value means "unset".
    pub fn from_value(value: &Value) -> Result<Self, QueryError> {
        let mut options = Self::default();
        options.merge_value(value)?;
        Ok(options)
    }

    /// Merge a JSON map into these options, replacing existing keys and
    /// removing keys set to `null`. Nothing changes if the map is rejected.
    pub fn merge_value(&mut self, value: &Value) -> Result<(), QueryError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(QueryError::InvalidOptions(describe(other))),
        };

        let mut parsed = Vec::with_capacity(map.len());
        for (name, value) in map {
            parsed.push((name.clone(), OptionValue::from_value(name, value)?));
        }

        for (name, value) in parsed {
            match value {
                Some(v) => {
                    self.0.insert(name, v);
                }
                None => {
                    self.0.remove(&name);
                }
            }
        }
        Ok(())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// The value if present and truthy.
    pub fn truthy(&self, name: &str) -> Option<&OptionValue> {
        self.get(name).filter(|v| v.is_truthy())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Terms plus options: everything that determines the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub terms: SearchTerms,
    #[serde(default)]
    pub options: SearchOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terms_from_string() {
        let terms = SearchTerms::from_value(&json!("test")).unwrap();
        assert_eq!(terms.as_slice(), ["test"]);
    }

    #[test]
    fn test_terms_from_null() {
        assert!(SearchTerms::from_value(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_terms_flatten_and_drop_non_text() {
        let terms = SearchTerms::from_value(&json!([0, {}, ["test", 1, ["user:foo"]]])).unwrap();
        assert_eq!(terms.as_slice(), ["test", "user:foo"]);
    }

    #[test]
    fn test_terms_reject_other_shapes() {
        assert!(matches!(
            SearchTerms::from_value(&json!(0)),
            Err(QueryError::InvalidTerms(_))
        ));
        assert!(matches!(
            SearchTerms::from_value(&json!({"a": "b"})),
            Err(QueryError::InvalidTerms(_))
        ));
        assert!(SearchTerms::from_value(&json!(true)).is_err());
    }

    #[test]
    fn test_options_reject_non_map() {
        let err = SearchOptions::from_value(&json!("foobar")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOptions(_)));
        assert!(err.to_string().contains("foobar"));
    }

    #[test]
    fn test_options_reject_nested_map() {
        let err = SearchOptions::from_value(&json!({"user": {"a": 1}})).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidOption {
                name: "user".to_string(),
                given: "map".to_string()
            }
        );
    }

    #[test]
    fn test_options_merge_and_unset() {
        let mut options = SearchOptions::from_value(&json!({"files": 2, "safe": true})).unwrap();
        options
            .merge_value(&json!({"files": null, "user": "foobar"}))
            .unwrap();
        assert!(options.get("files").is_none());
        assert_eq!(options.get("safe"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.get("user"), Some(&OptionValue::Text("foobar".into())));
    }

    #[test]
    fn test_rejected_merge_leaves_options_untouched() {
        let mut options = SearchOptions::new().with("files", 2);
        let result = options.merge_value(&json!({"user": "x", "bad": {}}));
        assert!(result.is_err());
        assert_eq!(options, SearchOptions::new().with("files", 2));
    }

    #[test]
    fn test_truthiness() {
        assert!(OptionValue::Flag(true).is_truthy());
        assert!(!OptionValue::Flag(false).is_truthy());
        assert!(OptionValue::Int(0).is_truthy());
        assert!(OptionValue::Text(String::new()).is_truthy());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(OptionValue::Int(2).to_int(), 2);
        assert_eq!(OptionValue::from("12abc").to_int(), 12);
        assert_eq!(OptionValue::from("books").to_int(), 0);
        assert_eq!(OptionValue::from(" -3").to_int(), -3);
        assert_eq!(OptionValue::Flag(true).to_int(), 0);
    }

    #[test]
    fn test_option_items() {
        let list = OptionValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(list.items(), vec!["a", "b"]);
        assert_eq!(OptionValue::from("single").items(), vec!["single"]);
    }

    #[test]
    fn test_search_request_deserialize_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"terms": ["ubuntu"]}"#).unwrap();
        assert_eq!(request.terms.as_slice(), ["ubuntu"]);
        assert!(request.options.is_empty());
    }
}
