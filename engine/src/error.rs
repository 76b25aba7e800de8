//! Error types for the Psorcast engine.

use crate::ReportIdentifier;
use thiserror::Error;

/// All possible errors from the Psorcast engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Task result errors
    #[error("missing answer: {0}")]
    MissingAnswer(String),

    #[error("answer '{identifier}' has the wrong type: expected {expected}")]
    AnswerType {
        identifier: String,
        expected: &'static str,
    },

    #[error("first treatment requires treatments, status and symptoms")]
    IncompleteInitialTreatment,

    #[error("report '{0}' is not written from task results")]
    NotAppendable(ReportIdentifier),

    // Payload errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid weekday: {0}")]
    InvalidWeekday(i64),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
