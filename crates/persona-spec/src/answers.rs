use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::document::SubmissionDocument;

/// Current value of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(Number),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Empty strings and empty lists count as unanswered.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Number(_) => false,
            AnswerValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts a JSON value, returning `None` for null or unsupported shapes.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(text) => write!(f, "{}", text),
            AnswerValue::Number(number) => write!(f, "{}", number),
            AnswerValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Number(Number::from(value))
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::List(value)
    }
}

/// Answers keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerState {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges both buckets of an existing document into one mapping.
    pub fn from_document(document: &SubmissionDocument) -> Self {
        let values = document
            .compulsory_fields
            .iter()
            .chain(document.optional_fields.iter())
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        Self { values }
    }

    /// Builds answers from a JSON object, skipping nulls.
    ///
    /// Booleans, nested objects and lists holding anything but strings are
    /// rejected with the offending key rather than silently dropped.
    pub fn from_json(value: &Value) -> Result<Self, UnsupportedAnswer> {
        let Some(map) = value.as_object() else {
            return Ok(Self::default());
        };
        let mut values = BTreeMap::new();
        for (id, raw) in map {
            if raw.is_null() {
                continue;
            }
            let value = AnswerValue::from_json(raw).ok_or_else(|| UnsupportedAnswer(id.clone()))?;
            values.insert(id.clone(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: AnswerValue) -> Option<AnswerValue> {
        self.values.insert(id.into(), value)
    }

    pub fn remove(&mut self, id: &str) -> Option<AnswerValue> {
        self.values.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.values).unwrap_or(Value::Null)
    }
}

/// An answer whose JSON shape is not a string, number or list of strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer '{0}' must be a string, a number or a list of strings")]
pub struct UnsupportedAnswer(pub String);

/// Machine-readable category of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    TypeMismatch,
    ExactSelections,
    MaxSelections,
    NumberOutOfRange,
    TooLong,
    UnknownOption,
}

/// Inline error shown next to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors currently displayed, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn get(&self, id: &str) -> Option<&FieldError> {
        self.errors.get(id)
    }

    pub fn clear_field(&mut self, id: &str) -> Option<FieldError> {
        self.errors.remove(id)
    }

    /// Drops every error for `field_ids` and installs `fresh` in their place.
    pub fn replace_for<'a>(
        &mut self,
        field_ids: impl IntoIterator<Item = &'a String>,
        fresh: BTreeMap<String, FieldError>,
    ) {
        for id in field_ids {
            self.errors.remove(id);
        }
        self.errors.extend(fresh);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
