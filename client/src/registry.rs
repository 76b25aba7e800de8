//! The participant's singleton reports, wired to shared stores.
//!
//! A [`ReportRegistry`] is built once per signed-in participant and passed
//! to whatever needs report data.

use crate::config::Config;
use crate::error::Result;
use crate::local::{FileLocalStore, LocalStore, MemoryLocalStore};
use crate::notify::ChangeBus;
use crate::report::{SingletonReport, SyncOutcome};
use crate::store::{Report, ReportStore};
use psorcast_engine::history::{self, decode_history_item, history_client_data, HISTORY_REPORT};
use psorcast_engine::{
    HistoryItem, InsightItemViewed, InsightsViewed, LinkerStudies, LinkerStudy, PsoriasisStatus,
    PsoriasisSymptoms, ReminderItem, Reminders, ReportCategory, TaskResult, TreatmentRange,
    Treatments,
};
use serde_json::Value;
use std::sync::Arc;

/// Outcome of reloading every report.
#[derive(Debug)]
pub struct ReloadSummary {
    pub treatments: Result<SyncOutcome>,
    pub reminders: Result<SyncOutcome>,
    pub insights: Result<SyncOutcome>,
    pub linker_studies: Result<SyncOutcome>,
}

impl ReloadSummary {
    pub fn all_succeeded(&self) -> bool {
        [
            &self.treatments,
            &self.reminders,
            &self.insights,
            &self.linker_studies,
        ]
        .iter()
        .all(|result| result.is_ok())
    }
}

/// Every singleton report of one participant.
pub struct ReportRegistry {
    remote: Arc<dyn ReportStore>,
    bus: ChangeBus,
    pub treatments: SingletonReport<Treatments>,
    pub reminders: SingletonReport<Reminders>,
    pub insights: SingletonReport<InsightsViewed>,
    pub linker_studies: SingletonReport<LinkerStudies>,
}

impl ReportRegistry {
    pub fn new(remote: Arc<dyn ReportStore>, local: Arc<dyn LocalStore>, bus: ChangeBus) -> Self {
        Self {
            treatments: SingletonReport::new(remote.clone(), local.clone(), bus.clone()),
            reminders: SingletonReport::new(remote.clone(), local.clone(), bus.clone()),
            insights: SingletonReport::new(remote.clone(), local.clone(), bus.clone()),
            linker_studies: SingletonReport::new(remote.clone(), local, bus.clone()),
            remote,
            bus,
        }
    }

    /// Build a registry with the local store and bus described by `config`.
    pub fn from_config(config: &Config, remote: Arc<dyn ReportStore>) -> Result<Self> {
        let local: Arc<dyn LocalStore> = match &config.local_store_dir {
            Some(dir) => Arc::new(FileLocalStore::open(dir)?),
            None => Arc::new(MemoryLocalStore::new()),
        };
        Ok(Self::new(remote, local, ChangeBus::new(config.event_capacity)))
    }

    /// Build from `config`, reloading every report if it asks for a sync at start.
    pub async fn start(config: &Config, remote: Arc<dyn ReportStore>) -> Result<Self> {
        let registry = Self::from_config(config, remote)?;
        if config.sync_on_start {
            let summary = registry.force_reload().await;
            if !summary.all_succeeded() {
                tracing::warn!(?summary, "Initial reload incomplete");
            }
        }
        Ok(registry)
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Reload every report from the remote store concurrently.
    pub async fn force_reload(&self) -> ReloadSummary {
        let (treatments, reminders, insights, linker_studies) = futures::join!(
            self.treatments.load_from_remote(),
            self.reminders.load_from_remote(),
            self.insights.load_from_remote(),
            self.linker_studies.load_from_remote(),
        );

        let summary = ReloadSummary {
            treatments,
            reminders,
            insights,
            linker_studies,
        };
        tracing::info!(ok = summary.all_succeeded(), "Reloaded reports");
        summary
    }

    /// Route a finished task to the report it writes.
    ///
    /// History tasks are saved as dated history reports and the decoded
    /// history item is returned. Tasks with no report are ignored.
    pub async fn upload(&self, result: &TaskResult) -> Result<Option<HistoryItem>> {
        let task = result.identifier.as_str();

        if task == Treatments::IDENTIFIER {
            self.treatments.append(result).await?;
        } else if task == Reminders::IDENTIFIER {
            self.reminders.append(result).await?;
        } else if task == InsightsViewed::IDENTIFIER {
            self.insights.append(result).await?;
        } else if history::is_history_task(task) {
            return self.upload_history(result).await.map(Some);
        } else {
            tracing::debug!(task, "No report for task");
        }
        Ok(None)
    }

    async fn upload_history(&self, result: &TaskResult) -> Result<HistoryItem> {
        let data = Value::Object(history_client_data(result));
        let report = Report::dated(HISTORY_REPORT, result.end_date, data.to_string());
        self.remote.save_report(report).await?;

        tracing::info!(task = %result.identifier, "Saved history report");
        Ok(decode_history_item(
            &result.identifier,
            HISTORY_REPORT,
            result.end_date,
            &data,
        ))
    }

    pub fn reminder_item(&self) -> Option<ReminderItem> {
        self.reminders.current()
    }

    pub fn have_weekly_reminders_been_set(&self) -> bool {
        self.reminder_item()
            .is_some_and(|item| item.reminder_do_not_remind_me.is_some())
    }

    pub fn has_set_treatment(&self) -> bool {
        self.treatments.current().is_some()
    }

    pub fn current_treatment_range(&self) -> Option<TreatmentRange> {
        self.treatments.current_treatment_range()
    }

    /// Every treatment range, oldest first.
    pub fn all_treatments(&self) -> Vec<TreatmentRange> {
        self.treatments.treatment_ranges()
    }

    pub fn linker_studies(&self) -> Vec<LinkerStudy> {
        self.linker_studies.current().unwrap_or_default()
    }

    pub fn psoriasis_status(&self) -> Option<PsoriasisStatus> {
        self.treatments.current().map(|task| task.psoriasis_status)
    }

    pub fn psoriasis_symptoms(&self) -> Option<PsoriasisSymptoms> {
        self.treatments.current().map(|task| task.psoriasis_symptoms)
    }

    pub fn past_insights_viewed(&self) -> Vec<InsightItemViewed> {
        self.insights.current().unwrap_or_default()
    }

    /// The newest viewed insight.
    pub fn most_recent_insight_viewed(&self) -> Option<InsightItemViewed> {
        self.past_insights_viewed().pop()
    }
}
