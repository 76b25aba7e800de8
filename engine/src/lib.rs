//! # Psorcast Engine
//!
//! Deterministic merge rules for the participant reports of the Psorcast
//! study client.
//!
//! The study keeps a handful of "singleton reports" (treatments, weekly
//! reminders, insights viewed, linker-study enrollment): one logical value per
//! category that lives both in a local cache and in a remote report store.
//! This crate holds the pure part of keeping those two in agreement.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about stores, files or the network
//! - **Deterministic**: the same inputs always produce the same outputs
//! - **Per-category rules**: each report category owns its merge rule
//!
//! ## Core Concepts
//!
//! ### Versioned items
//!
//! Merged collections hold [`VersionedItem`]s: values with an identity key and
//! an optional timestamp. A missing timestamp counts as the Unix epoch.
//!
//! ### Merge strategies
//!
//! - [`MergeStrategy::ReplaceIfNewer`] - strictly newer incoming items replace cached ones
//! - [`MergeStrategy::UnionUnique`] - first seen wins, incoming items only fill gaps
//!
//! ### Report categories
//!
//! [`ReportCategory`] ties a value type to its identifier, change event, merge
//! rule and task-result handling. See [`Treatments`], [`Reminders`],
//! [`InsightsViewed`] and [`LinkerStudies`].
//!
//! ## Quick Start
//!
//! ```rust
//! use psorcast_engine::{InsightItemViewed, InsightsViewed, ReportCategory};
//! use chrono::{TimeZone, Utc};
//!
//! let day = |d| Utc.with_ymd_and_hms(2020, 5, d, 0, 0, 0).unwrap();
//! let cached = vec![InsightItemViewed::new("A", day(10))];
//! let remote = vec![
//!     InsightItemViewed::new("A", day(20)),
//!     InsightItemViewed::new("B", day(5)),
//! ];
//!
//! let merged = InsightsViewed::merge_remote(Some(&cached), remote).unwrap();
//! assert_eq!(merged[0].insight_identifier.as_deref(), Some("B"));
//! assert_eq!(merged[1].date, Some(day(20)));
//! ```
//!
//! ## Beyond reports
//!
//! [`navigator`] synthesizes step sequences from prior answers, [`history`]
//! decodes task history reports and [`treatment`] derives treatment ranges.

pub mod category;
pub mod error;
pub mod history;
pub mod item;
pub mod merge;
pub mod navigator;
pub mod task;
pub mod treatment;

// Re-export main types at crate root
pub use category::{
    ChangeEvent, InsightsViewed, LinkerStudies, Reminders, ReportCategory, Treatments,
    DEFAULT_LINKER_STUDY,
};
pub use error::Error;
pub use history::{HistoryDetail, HistoryHeader, HistoryItem, HISTORY_REPORT};
pub use item::{
    InsightItemViewed, LinkerStudy, LinkerStudyDetailed, PsoriasisStatus, PsoriasisSymptoms,
    ReminderItem, TreatmentItem, TreatmentTask, VersionedItem, Weekday,
};
pub use merge::{sort_chronologically, MergeStrategy};
pub use navigator::{PastTreatmentsNavigator, Step, StepBack, SymptomHistory, SymptomHistoryConfig};
pub use task::{AnswerValue, TaskResult};
pub use treatment::{compute_ranges, TreatmentRange};

/// Type aliases for clarity
pub type ReportIdentifier = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
