//! Item types stored in singleton reports.
//!
//! Every item that takes part in a keyed merge implements [`VersionedItem`]:
//! a stable identity key plus an optional timestamp used for recency.

use crate::{error::Result, Error, Timestamp};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// A record with a stable identity key and a recency timestamp.
pub trait VersionedItem {
    /// Identity used for de-duplication.
    type Key: Eq + Hash + Clone;

    /// The identity key of this item.
    fn key(&self) -> Self::Key;

    /// The timestamp used for recency comparison, if any.
    fn timestamp(&self) -> Option<Timestamp>;

    /// The timestamp, with a missing one treated as the Unix epoch.
    fn timestamp_or_epoch(&self) -> Timestamp {
        self.timestamp().unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// One treatment change: the treatments started at `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentItem {
    pub treatments: Vec<String>,
    pub start_date: Timestamp,
}

impl TreatmentItem {
    pub fn new(treatments: Vec<String>, start_date: Timestamp) -> Self {
        Self {
            treatments,
            start_date,
        }
    }
}

impl VersionedItem for TreatmentItem {
    type Key = Timestamp;

    fn key(&self) -> Timestamp {
        self.start_date
    }

    fn timestamp(&self) -> Option<Timestamp> {
        Some(self.start_date)
    }
}

/// Self-reported psoriasis diagnosis status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsoriasisStatus {
    pub status: String,
    pub start_date: Timestamp,
}

/// Self-reported psoriasis symptoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsoriasisSymptoms {
    pub symptoms: String,
    pub start_date: Timestamp,
}

/// The value of the treatment report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentTask {
    pub psoriasis_status: PsoriasisStatus,
    pub psoriasis_symptoms: PsoriasisSymptoms,
    pub treatments: Vec<TreatmentItem>,
}

impl TreatmentTask {
    /// The most recent treatment entry. Only meaningful on a sorted value.
    pub fn current_treatment(&self) -> Option<&TreatmentItem> {
        self.treatments.last()
    }
}

/// Day of the week, numbered 1 (Sunday) through 7 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl TryFrom<i64> for Weekday {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Ok(match value {
            1 => Weekday::Sunday,
            2 => Weekday::Monday,
            3 => Weekday::Tuesday,
            4 => Weekday::Wednesday,
            5 => Weekday::Thursday,
            6 => Weekday::Friday,
            7 => Weekday::Saturday,
            other => return Err(Error::InvalidWeekday(other)),
        })
    }
}

impl From<Weekday> for i64 {
    fn from(day: Weekday) -> i64 {
        day as i64
    }
}

/// Weekly reminder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_do_not_remind_me: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_weekday: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
}

/// An insight the participant has viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightItemViewed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
}

impl InsightItemViewed {
    pub fn new(insight_identifier: impl Into<String>, date: Timestamp) -> Self {
        Self {
            insight_identifier: Some(insight_identifier.into()),
            date: Some(date),
        }
    }
}

impl VersionedItem for InsightItemViewed {
    type Key = Option<String>;

    fn key(&self) -> Option<String> {
        self.insight_identifier.clone()
    }

    fn timestamp(&self) -> Option<Timestamp> {
        self.date
    }
}

/// Enrollment in a linker study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerStudy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

impl LinkerStudy {
    pub fn new(identifier: impl Into<String>, start_date: Timestamp) -> Self {
        Self {
            identifier: Some(identifier.into()),
            start_date: Some(start_date),
            verification_code: None,
        }
    }

    /// Attach the verification code used when joining the study.
    pub fn with_verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = Some(code.into());
        self
    }
}

impl VersionedItem for LinkerStudy {
    type Key = Option<String>;

    fn key(&self) -> Option<String> {
        self.identifier.clone()
    }

    fn timestamp(&self) -> Option<Timestamp> {
        self.start_date
    }
}

/// A linker study together with the participant's current week in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerStudyDetailed {
    pub identifier: Option<String>,
    pub start_date: Option<Timestamp>,
    pub verification_code: Option<String>,
    pub week_in_study: Option<i64>,
}

impl LinkerStudyDetailed {
    /// Build the detailed view, asking `week_for` for the study week.
    pub fn from_study(study: &LinkerStudy, week_for: impl Fn(&str) -> Option<i64>) -> Self {
        Self {
            identifier: study.identifier.clone(),
            start_date: study.start_date,
            verification_code: study.verification_code.clone(),
            week_in_study: week_for(study.identifier.as_deref().unwrap_or_default()),
        }
    }
}
