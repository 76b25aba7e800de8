//! Per-category report rules.
//!
//! Each singleton report category owns its merge rule. The rules look alike
//! but differ in tie-breaks and in which fields are merged independently, so
//! they are kept apart rather than folded into one generic rule.

use crate::item::{
    InsightItemViewed, LinkerStudy, PsoriasisStatus, PsoriasisSymptoms, ReminderItem,
    TreatmentItem, TreatmentTask, VersionedItem, Weekday,
};
use crate::merge::{replace_if_newer, sort_chronologically, union_unique};
use crate::{error::Result, Error, TaskResult};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer identifiers read from finished tasks.
pub mod answers {
    pub const TREATMENT_SELECTION: &str = "treatmentSelection";
    pub const PSORIASIS_STATUS: &str = "psoriasisStatus";
    pub const PSORIASIS_SYMPTOMS: &str = "psoriasisSymptoms";
    pub const WEEKLY_TIME: &str = "weeklyTime";
    pub const WEEKLY_DAY: &str = "weeklyDay";
    pub const WEEKLY_DO_NOT_REMIND_ME: &str = "weeklyDoNotRemindMe";
    pub const INSIGHT_VIEWED: &str = "insightViewedIdentifier";
}

/// Identifier of the study every participant is enrolled in at sign up.
pub const DEFAULT_LINKER_STUDY: &str = "Psorcast";

/// Event broadcast when a category's cached value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeEvent {
    TreatmentChanged,
    RemindersChanged,
    InsightsChanged,
    StudyDatesChanged,
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeEvent::TreatmentChanged => "treatmentChanged",
            ChangeEvent::RemindersChanged => "remindersChanged",
            ChangeEvent::InsightsChanged => "insightsChanged",
            ChangeEvent::StudyDatesChanged => "studyDatesChanged",
        };
        f.write_str(name)
    }
}

/// The rules of one singleton report category.
pub trait ReportCategory: Send + Sync + 'static {
    /// The cached value held for this category.
    type Value: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Report identifier, also the identifier of the task that writes it.
    const IDENTIFIER: &'static str;

    /// Event published whenever the cached value is set.
    const CHANGE_EVENT: ChangeEvent;

    /// Canonical form applied to every value before it is cached.
    fn normalize(value: Self::Value) -> Self::Value {
        value
    }

    /// Remote value to merge when the store has no payload for this report.
    ///
    /// `None` means a missing report is a first-time participant and nothing
    /// is merged.
    fn absent_remote() -> Option<Self::Value> {
        None
    }

    /// Merge the remote value into the cached one.
    ///
    /// Returns `None` when the cached value should be kept untouched.
    fn merge_remote(cached: Option<&Self::Value>, remote: Self::Value) -> Option<Self::Value>;

    /// Produce the new value after the participant finished this category's task.
    fn apply_task_result(current: Option<&Self::Value>, result: &TaskResult) -> Result<Self::Value>;
}

/// Treatments, psoriasis status and psoriasis symptoms.
#[derive(Debug, Clone, Copy)]
pub struct Treatments;

impl ReportCategory for Treatments {
    type Value = TreatmentTask;

    const IDENTIFIER: &'static str = "Treatment";
    const CHANGE_EVENT: ChangeEvent = ChangeEvent::TreatmentChanged;

    fn normalize(mut value: TreatmentTask) -> TreatmentTask {
        sort_chronologically(&mut value.treatments);
        value
    }

    fn merge_remote(cached: Option<&TreatmentTask>, remote: TreatmentTask) -> Option<TreatmentTask> {
        // Freshly signed in, take the remote value as is
        let Some(cached) = cached else {
            return Some(remote);
        };

        let mut merged = cached.clone();
        if remote.psoriasis_status.start_date > cached.psoriasis_status.start_date {
            merged.psoriasis_status = remote.psoriasis_status;
        }
        if remote.psoriasis_symptoms.start_date > cached.psoriasis_symptoms.start_date {
            merged.psoriasis_symptoms = remote.psoriasis_symptoms;
        }
        merged.treatments = union_unique(&cached.treatments, &remote.treatments);
        Some(merged)
    }

    fn apply_task_result(current: Option<&TreatmentTask>, result: &TaskResult) -> Result<TreatmentTask> {
        let end_date = result.end_date;
        let treatment = result
            .strings(answers::TREATMENT_SELECTION)
            .map(|t| TreatmentItem::new(t.to_vec(), end_date));
        let status = result
            .string(answers::PSORIASIS_STATUS)
            .map(|status| PsoriasisStatus {
                status: status.to_string(),
                start_date: end_date,
            });
        let symptoms = result
            .string(answers::PSORIASIS_SYMPTOMS)
            .map(|symptoms| PsoriasisSymptoms {
                symptoms: symptoms.to_string(),
                start_date: end_date,
            });

        let mut task = match (current, &treatment, &status, &symptoms) {
            (Some(current), _, _, _) => current.clone(),
            (None, Some(_), Some(status), Some(symptoms)) => TreatmentTask {
                psoriasis_status: status.clone(),
                psoriasis_symptoms: symptoms.clone(),
                treatments: Vec::new(),
            },
            (None, _, _, _) => return Err(Error::IncompleteInitialTreatment),
        };

        if let Some(treatment) = treatment {
            task.treatments = union_unique(&task.treatments, &[treatment]);
        }
        if let Some(status) = status {
            task.psoriasis_status = status;
        }
        if let Some(symptoms) = symptoms {
            task.psoriasis_symptoms = symptoms;
        }
        Ok(task)
    }
}

/// Weekly reminder settings.
#[derive(Debug, Clone, Copy)]
pub struct Reminders;

impl ReportCategory for Reminders {
    type Value = ReminderItem;

    const IDENTIFIER: &'static str = "Reminders";
    const CHANGE_EVENT: ChangeEvent = ChangeEvent::RemindersChanged;

    fn merge_remote(cached: Option<&ReminderItem>, remote: ReminderItem) -> Option<ReminderItem> {
        match cached.and_then(|c| c.date) {
            Some(cached_date) => {
                let remote_date = remote.date.unwrap_or(DateTime::UNIX_EPOCH);
                (remote_date > cached_date).then_some(remote)
            }
            None => Some(remote),
        }
    }

    fn apply_task_result(_current: Option<&ReminderItem>, result: &TaskResult) -> Result<ReminderItem> {
        let time = result.require_string(answers::WEEKLY_TIME)?;
        let do_not_remind = result.require_bool(answers::WEEKLY_DO_NOT_REMIND_ME)?;
        let day = Weekday::try_from(result.require_int(answers::WEEKLY_DAY)?)?;

        Ok(ReminderItem {
            reminder_do_not_remind_me: Some(do_not_remind),
            reminder_weekday: Some(day),
            reminder_time: Some(time.to_string()),
            date: Some(result.end_date),
        })
    }
}

/// Insights the participant has viewed, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct InsightsViewed;

impl InsightsViewed {
    fn merge_sorted(cached: &[InsightItemViewed], incoming: &[InsightItemViewed]) -> Vec<InsightItemViewed> {
        let mut merged = replace_if_newer(cached, incoming);
        sort_chronologically(&mut merged);
        merged
    }
}

impl ReportCategory for InsightsViewed {
    type Value = Vec<InsightItemViewed>;

    const IDENTIFIER: &'static str = "Insights";
    const CHANGE_EVENT: ChangeEvent = ChangeEvent::InsightsChanged;

    fn absent_remote() -> Option<Self::Value> {
        Some(Vec::new())
    }

    fn merge_remote(
        cached: Option<&Vec<InsightItemViewed>>,
        remote: Vec<InsightItemViewed>,
    ) -> Option<Vec<InsightItemViewed>> {
        Some(Self::merge_sorted(cached.map(Vec::as_slice).unwrap_or_default(), &remote))
    }

    fn apply_task_result(
        current: Option<&Vec<InsightItemViewed>>,
        result: &TaskResult,
    ) -> Result<Vec<InsightItemViewed>> {
        let insight = result.require_string(answers::INSIGHT_VIEWED)?;
        let item = InsightItemViewed::new(insight, result.end_date);
        Ok(Self::merge_sorted(
            current.map(Vec::as_slice).unwrap_or_default(),
            &[item],
        ))
    }
}

/// Linker studies the participant is enrolled in.
#[derive(Debug, Clone, Copy)]
pub struct LinkerStudies;

impl LinkerStudies {
    /// Union new studies into the current ones.
    pub fn append(current: Option<&Vec<LinkerStudy>>, items: &[LinkerStudy]) -> Vec<LinkerStudy> {
        union_unique(current.map(Vec::as_slice).unwrap_or_default(), items)
    }

    /// The enrollment created when a participant signs up.
    pub fn initial(start_date: crate::Timestamp) -> LinkerStudy {
        LinkerStudy::new(DEFAULT_LINKER_STUDY, start_date)
    }

    /// Whether the participant is enrolled in `identifier`.
    pub fn contains(studies: &[LinkerStudy], identifier: &str) -> bool {
        studies
            .iter()
            .any(|s| s.key().as_deref() == Some(identifier))
    }
}

impl ReportCategory for LinkerStudies {
    type Value = Vec<LinkerStudy>;

    const IDENTIFIER: &'static str = "StudyDates";
    const CHANGE_EVENT: ChangeEvent = ChangeEvent::StudyDatesChanged;

    fn absent_remote() -> Option<Self::Value> {
        Some(Vec::new())
    }

    fn merge_remote(cached: Option<&Vec<LinkerStudy>>, remote: Vec<LinkerStudy>) -> Option<Vec<LinkerStudy>> {
        Some(Self::append(cached, &remote))
    }

    fn apply_task_result(_current: Option<&Vec<LinkerStudy>>, _result: &TaskResult) -> Result<Vec<LinkerStudy>> {
        Err(Error::NotAppendable(Self::IDENTIFIER.to_string()))
    }
}
