//! Treatment ranges derived from the treatment history.

use crate::{item::TreatmentItem, Timestamp};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Label used for the end of the range that is still ongoing.
pub const OPEN_RANGE_END: &str = "Today";

/// The span during which one set of treatments was in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRange {
    pub treatments: Vec<String>,
    pub start_date: Timestamp,
    /// `None` for the most recent treatment
    pub end_date: Option<Timestamp>,
}

impl TreatmentRange {
    /// The closed span, or `None` while the range is still open.
    pub fn closed_range(&self) -> Option<RangeInclusive<Timestamp>> {
        self.end_date.map(|end| self.start_date..=end)
    }

    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }

    /// Whether both ranges cover the same span, regardless of treatments.
    pub fn same_span(&self, other: &TreatmentRange) -> bool {
        self.start_date == other.start_date && self.end_date == other.end_date
    }

    /// Whether `date` falls within this range. Open ranges extend forever.
    pub fn contains(&self, date: Timestamp) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Human readable span such as `May 2020 to Jul 2020`.
    ///
    /// Uses day precision when both ends share a month or are less than 30
    /// days apart, and adds the time of day when both fall on the same date.
    /// An open range is measured against `now` and ends in [`OPEN_RANGE_END`].
    pub fn label(&self, now: Timestamp) -> String {
        let end = self.end_date.unwrap_or(now);
        let start = self.start_date;

        let same_month = start.year() == end.year() && start.month() == end.month();
        let same_date = start.date_naive() == end.date_naive();
        let within_month = (end - start).num_days().abs() < 30;

        let format = if same_month || within_month {
            if same_date {
                "%b %-d %Y %-H:%-M"
            } else {
                "%b %-d %Y"
            }
        } else {
            "%b %Y"
        };

        let end_label = match self.end_date {
            Some(end) => end.format(format).to_string(),
            None => OPEN_RANGE_END.to_string(),
        };
        format!("{} to {}", start.format(format), end_label)
    }
}

/// Build ranges from treatments sorted ascending by start date.
///
/// Each range ends where the next begins; the last one stays open.
pub fn compute_ranges(sorted: &[TreatmentItem]) -> Vec<TreatmentRange> {
    sorted
        .iter()
        .enumerate()
        .map(|(idx, item)| TreatmentRange {
            treatments: item.treatments.clone(),
            start_date: item.start_date,
            end_date: sorted.get(idx + 1).map(|next| next.start_date),
        })
        .collect()
}
