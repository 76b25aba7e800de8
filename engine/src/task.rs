//! Finished task results, as handed over by the task runner.

use crate::{error::Result, Error, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Strings(Vec<String>),
    Null,
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::String(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::String(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Int(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Float(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::Strings(value)
    }
}

impl From<AnswerValue> for serde_json::Value {
    fn from(value: AnswerValue) -> Self {
        match value {
            AnswerValue::Bool(b) => b.into(),
            AnswerValue::Int(i) => i.into(),
            AnswerValue::Float(f) => f.into(),
            AnswerValue::String(s) => s.into(),
            AnswerValue::Strings(v) => v.into(),
            AnswerValue::Null => serde_json::Value::Null,
        }
    }
}

/// The flattened result of one run of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Task identifier, e.g. `JointCounting`
    pub identifier: String,
    /// When the participant finished the task
    pub end_date: Timestamp,
    /// Answers keyed by result identifier
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerValue>,
}

impl TaskResult {
    pub fn new(identifier: impl Into<String>, end_date: Timestamp) -> Self {
        Self {
            identifier: identifier.into(),
            end_date,
            answers: BTreeMap::new(),
        }
    }

    /// Builder-style answer insertion.
    pub fn with_answer(mut self, identifier: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.answers.insert(identifier.into(), value.into());
        self
    }

    pub fn answer(&self, identifier: &str) -> Option<&AnswerValue> {
        self.answers.get(identifier)
    }

    pub fn string(&self, identifier: &str) -> Option<&str> {
        match self.answer(identifier)? {
            AnswerValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn strings(&self, identifier: &str) -> Option<&[String]> {
        match self.answer(identifier)? {
            AnswerValue::Strings(v) => Some(v),
            _ => None,
        }
    }

    pub fn bool(&self, identifier: &str) -> Option<bool> {
        match self.answer(identifier)? {
            AnswerValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn int(&self, identifier: &str) -> Option<i64> {
        match self.answer(identifier)? {
            AnswerValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, identifier: &str) -> Option<f64> {
        match self.answer(identifier)? {
            AnswerValue::Float(f) => Some(*f),
            AnswerValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Like [`TaskResult::string`], but missing or mistyped answers are errors.
    pub fn require_string(&self, identifier: &str) -> Result<&str> {
        require(self.answer(identifier), identifier, "string", |v| match v {
            AnswerValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn require_bool(&self, identifier: &str) -> Result<bool> {
        require(self.answer(identifier), identifier, "boolean", |v| match v {
            AnswerValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn require_int(&self, identifier: &str) -> Result<i64> {
        require(self.answer(identifier), identifier, "integer", |v| match v {
            AnswerValue::Int(i) => Some(*i),
            _ => None,
        })
    }
}

fn require<'a, T>(
    answer: Option<&'a AnswerValue>,
    identifier: &str,
    expected: &'static str,
    extract: impl FnOnce(&'a AnswerValue) -> Option<T>,
) -> Result<T> {
    let value = answer.ok_or_else(|| Error::MissingAnswer(identifier.to_string()))?;
    extract(value).ok_or_else(|| Error::AnswerType {
        identifier: identifier.to_string(),
        expected,
    })
}
