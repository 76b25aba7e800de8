//! A singleton report: one cached value per category, persisted locally and
//! reconciled with the remote store.
//!
//! The cached value lives in memory once read, is mirrored to the local
//! store under `<identifier>JsonValue`, and a `<identifier>SyncedToBridge`
//! flag records whether the last push reached the remote store. A sync in
//! flight refuses further syncs until its fetch and merge complete.

use crate::error::{Result, SyncError};
use crate::local::LocalStore;
use crate::notify::ChangeBus;
use crate::store::{Report, ReportStore};
use psorcast_engine::{
    compute_ranges, LinkerStudies, LinkerStudy, LinkerStudyDetailed, ReportCategory, TaskResult,
    Timestamp, TreatmentItem, TreatmentRange, Treatments, DEFAULT_LINKER_STUDY,
};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const SYNCED_TRUE: &[u8] = b"true";
const SYNCED_FALSE: &[u8] = b"false";

/// How a call to [`SingletonReport::load_from_remote`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync was in flight; nothing was fetched.
    AlreadySyncing,
    /// Fetched, but the cached value did not change.
    Unchanged,
    /// The merged value replaced the cached one.
    Merged,
}

impl SyncOutcome {
    /// Whether this call performed a sync.
    pub fn started(self) -> bool {
        self != SyncOutcome::AlreadySyncing
    }
}

/// Clears the syncing flag when dropped.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cache and sync coordinator for the category `C`.
pub struct SingletonReport<C: ReportCategory> {
    remote: Arc<dyn ReportStore>,
    local: Arc<dyn LocalStore>,
    bus: ChangeBus,
    cached: Mutex<Option<C::Value>>,
    syncing: AtomicBool,
    _category: PhantomData<fn() -> C>,
}

impl<C: ReportCategory> SingletonReport<C> {
    pub fn new(remote: Arc<dyn ReportStore>, local: Arc<dyn LocalStore>, bus: ChangeBus) -> Self {
        Self {
            remote,
            local,
            bus,
            cached: Mutex::new(None),
            syncing: AtomicBool::new(false),
            _category: PhantomData,
        }
    }

    pub fn identifier(&self) -> &'static str {
        C::IDENTIFIER
    }

    fn value_key() -> String {
        format!("{}JsonValue", C::IDENTIFIER)
    }

    fn synced_key() -> String {
        format!("{}SyncedToBridge", C::IDENTIFIER)
    }

    /// The cached value, read through from the local store on first access.
    ///
    /// An undecodable local value is logged and treated as absent.
    pub fn current(&self) -> Option<C::Value> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if cached.is_none() {
            *cached = self.read_local();
        }
        cached.clone()
    }

    fn read_local(&self) -> Option<C::Value> {
        let bytes = self.local.get(&Self::value_key())?;
        match serde_json::from_slice::<C::Value>(&bytes) {
            Ok(value) => Some(C::normalize(value)),
            Err(err) => {
                tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to decode local value");
                None
            }
        }
    }

    /// Replace the cached value, persist it, and notify observers.
    pub fn set_current(&self, value: C::Value) {
        let value = C::normalize(value);
        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if let Err(err) = self.local.set(&Self::value_key(), &bytes) {
                    tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to persist local value");
                }
            }
            Err(err) => {
                tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to encode local value");
            }
        }

        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.bus.publish(C::CHANGE_EVENT);
    }

    /// Whether the last push reached the remote store. True until a push is attempted.
    pub fn is_synced(&self) -> bool {
        self.local
            .get(&Self::synced_key())
            .map_or(true, |bytes| bytes == SYNCED_TRUE)
    }

    fn set_synced(&self, synced: bool) {
        let value = if synced { SYNCED_TRUE } else { SYNCED_FALSE };
        if let Err(err) = self.local.set(&Self::synced_key(), value) {
            tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to persist synced flag");
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Fetch the remote value, merge it into the cache, and push the result
    /// back if an earlier push never landed.
    ///
    /// Fetch and decode errors leave the cache untouched.
    pub async fn load_from_remote(&self) -> Result<SyncOutcome> {
        let outcome = {
            let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
                tracing::debug!(report = C::IDENTIFIER, "Sync already in progress");
                return Ok(SyncOutcome::AlreadySyncing);
            };

            let report = self.remote.get_report(C::IDENTIFIER).await.inspect_err(|err| {
                tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to fetch report");
            })?;

            let remote = match report.and_then(|r| r.client_data) {
                Some(payload) => Some(self.decode_remote(&payload)?),
                None => C::absent_remote(),
            };

            let Some(remote) = remote else {
                tracing::debug!(report = C::IDENTIFIER, "No remote value, first time participant");
                return Ok(SyncOutcome::Unchanged);
            };

            self.merge(remote)
        };

        if !self.is_synced() {
            tracing::info!(report = C::IDENTIFIER, "Pushing unsynced local value");
            self.push_logged().await;
        }

        Ok(outcome)
    }

    fn decode_remote(&self, payload: &str) -> Result<C::Value> {
        serde_json::from_str(payload).map_err(|source| {
            tracing::warn!(report = C::IDENTIFIER, error = %source, "Failed to decode remote payload");
            SyncError::Decode {
                report: C::IDENTIFIER,
                source,
            }
        })
    }

    fn merge(&self, remote: C::Value) -> SyncOutcome {
        let cached = self.current();
        let Some(merged) = C::merge_remote(cached.as_ref(), remote) else {
            return SyncOutcome::Unchanged;
        };

        let merged = C::normalize(merged);
        if cached.as_ref() == Some(&merged) {
            return SyncOutcome::Unchanged;
        }

        tracing::info!(report = C::IDENTIFIER, "Merged remote value");
        self.set_current(merged);
        SyncOutcome::Merged
    }

    /// Push the cached value to the remote store.
    ///
    /// The synced flag is cleared before the save and set again only once it
    /// succeeds. Without a cached value this does nothing.
    pub async fn sync_to_remote(&self) -> Result<()> {
        let Some(value) = self.current() else {
            return Ok(());
        };
        let payload = serde_json::to_string(&value).map_err(|source| SyncError::Encode {
            report: C::IDENTIFIER,
            source,
        })?;

        self.set_synced(false);
        self.remote
            .save_report(Report::singleton(C::IDENTIFIER, payload))
            .await?;
        self.set_synced(true);

        tracing::debug!(report = C::IDENTIFIER, "Pushed report");
        Ok(())
    }

    async fn push_logged(&self) {
        if let Err(err) = self.sync_to_remote().await {
            tracing::warn!(report = C::IDENTIFIER, error = %err, "Failed to push report");
        }
    }

    /// Fold a finished task into the cached value and push it.
    ///
    /// A failed push is logged; the value stays unsynced and is pushed again
    /// after the next load.
    pub async fn append(&self, result: &TaskResult) -> Result<()> {
        let value = C::apply_task_result(self.current().as_ref(), result)?;
        self.set_current(value);
        self.push_logged().await;
        Ok(())
    }
}

impl SingletonReport<Treatments> {
    /// The participant's current treatment, if any.
    pub fn current_treatment(&self) -> Option<TreatmentItem> {
        self.current()
            .and_then(|task| task.current_treatment().cloned())
    }

    /// Treatment history as consecutive ranges, the last one open.
    pub fn treatment_ranges(&self) -> Vec<TreatmentRange> {
        self.current()
            .map(|task| compute_ranges(&task.treatments))
            .unwrap_or_default()
    }

    pub fn current_treatment_range(&self) -> Option<TreatmentRange> {
        self.treatment_ranges().pop()
    }

    /// The treatment range covering `date`.
    pub fn treatment_range_at(&self, date: Timestamp) -> Option<TreatmentRange> {
        self.treatment_ranges()
            .into_iter()
            .find(|range| range.contains(date))
    }
}

impl SingletonReport<LinkerStudies> {
    /// Union `items` into the enrolled studies and push.
    pub async fn append_items(&self, items: &[LinkerStudy]) {
        let merged = LinkerStudies::append(self.current().as_ref(), items);
        self.set_current(merged);
        self.push_logged().await;
    }

    /// Enroll in the default study unless already enrolled in it.
    pub async fn initialize_study_dates(&self, start_date: Timestamp) {
        if self.is_enrolled(DEFAULT_LINKER_STUDY) {
            return;
        }
        self.append_items(&[LinkerStudies::initial(start_date)]).await;
    }

    pub fn is_enrolled(&self, identifier: &str) -> bool {
        self.current()
            .is_some_and(|studies| LinkerStudies::contains(&studies, identifier))
    }

    /// Enrolled studies with the participant's week in each.
    pub fn detailed(&self, week_for: impl Fn(&str) -> Option<i64>) -> Vec<LinkerStudyDetailed> {
        self.current()
            .unwrap_or_default()
            .iter()
            .map(|study| LinkerStudyDetailed::from_study(study, &week_for))
            .collect()
    }
}
