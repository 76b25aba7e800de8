//! Remote report storage.
//!
//! Reports are opaque JSON strings keyed by identifier. Singleton reports
//! are always saved under [`singleton_date`] so each identifier holds one
//! current value; history reports carry the task's end date.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::DateTime;
use dashmap::DashMap;
use psorcast_engine::{ReportIdentifier, Timestamp};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// 2018-01-01T00:00:00Z
const SINGLETON_EPOCH_SECS: i64 = 1_514_764_800;

/// The fixed date every singleton report is saved under.
pub fn singleton_date() -> Timestamp {
    DateTime::from_timestamp(SINGLETON_EPOCH_SECS, 0).unwrap_or_default()
}

/// A report as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub identifier: ReportIdentifier,
    pub date: Timestamp,
    pub client_data: Option<String>,
}

impl Report {
    /// A singleton report holding `payload`.
    pub fn singleton(identifier: impl Into<ReportIdentifier>, payload: String) -> Self {
        Self::dated(identifier, singleton_date(), payload)
    }

    pub fn dated(identifier: impl Into<ReportIdentifier>, date: Timestamp, payload: String) -> Self {
        Self {
            identifier: identifier.into(),
            date,
            client_data: Some(payload),
        }
    }
}

/// Asynchronous remote report store.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// The most recent report for `identifier`, if any.
    async fn get_report(&self, identifier: &str) -> Result<Option<Report>>;

    /// Save `report`, replacing any report with the same identifier and date.
    async fn save_report(&self, report: Report) -> Result<()>;
}

/// In-memory report store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: DashMap<ReportIdentifier, BTreeMap<Timestamp, Report>>,
    fail_gets: AtomicBool,
    fail_saves: AtomicBool,
    get_calls: AtomicUsize,
    save_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Store a raw payload under the singleton date.
    pub fn put_singleton(&self, identifier: &str, payload: impl Into<String>) {
        self.insert(Report::singleton(identifier, payload.into()));
    }

    /// Every report saved under `identifier`, oldest first.
    pub fn reports(&self, identifier: &str) -> Vec<Report> {
        self.reports
            .get(identifier)
            .map(|dated| dated.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Payload of the most recent report for `identifier`.
    pub fn payload(&self, identifier: &str) -> Option<String> {
        self.latest(identifier).and_then(|report| report.client_data)
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn insert(&self, report: Report) {
        self.reports
            .entry(report.identifier.clone())
            .or_default()
            .insert(report.date, report);
    }

    fn latest(&self, identifier: &str) -> Option<Report> {
        self.reports
            .get(identifier)
            .and_then(|dated| dated.values().next_back().cloned())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn get_report(&self, identifier: &str) -> Result<Option<Report>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(SyncError::Remote(format!("get {identifier} failed")));
        }
        Ok(self.latest(identifier))
    }

    async fn save_report(&self, report: Report) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SyncError::Remote(format!("save {} failed", report.identifier)));
        }
        self.insert(report);
        Ok(())
    }
}
