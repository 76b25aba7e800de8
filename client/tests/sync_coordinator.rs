//! Integration tests for report syncing
//!
//! These tests drive the registry against in-memory and file-backed stores.

use chrono::{TimeZone, Utc};
use psorcast_client::{
    ChangeBus, Config, FileLocalStore, LocalStore, MemoryLocalStore, MemoryReportStore,
    ReportRegistry, SingletonReport, SyncError, SyncOutcome,
};
use psorcast_engine::{
    ChangeEvent, InsightItemViewed, InsightsViewed, LinkerStudy, ReminderItem, Reminders,
    TaskResult, Timestamp, Weekday,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

fn date(day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2020, 6, day, 12, 0, 0).unwrap()
}

fn setup(remote: MemoryReportStore) -> (Arc<MemoryReportStore>, Arc<MemoryLocalStore>, ReportRegistry) {
    let remote = Arc::new(remote);
    let local = Arc::new(MemoryLocalStore::new());
    let registry = ReportRegistry::new(remote.clone(), local.clone(), ChangeBus::default());
    (remote, local, registry)
}

fn reminders_at(day: u32, time: &str) -> ReminderItem {
    ReminderItem {
        reminder_do_not_remind_me: Some(false),
        reminder_weekday: Some(Weekday::Monday),
        reminder_time: Some(time.to_string()),
        date: Some(date(day)),
    }
}

// ============================================================================
// Sync flag
// ============================================================================

#[tokio::test]
async fn reentrant_load_is_refused() {
    let (remote, _, registry) = setup(MemoryReportStore::with_latency(Duration::from_millis(50)));
    let viewed = vec![InsightItemViewed::new("a", date(3))];
    remote.put_singleton("Insights", serde_json::to_string(&viewed).unwrap());
    let mut events = registry.bus().subscribe();

    let (first, second) = tokio::join!(
        registry.insights.load_from_remote(),
        registry.insights.load_from_remote(),
    );

    assert_eq!(first.unwrap(), SyncOutcome::Merged);
    assert_eq!(second.unwrap(), SyncOutcome::AlreadySyncing);
    assert_eq!(remote.get_calls(), 1);
    assert!(!registry.insights.is_syncing());

    assert_eq!(events.try_recv(), Ok(ChangeEvent::InsightsChanged));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(registry.past_insights_viewed(), viewed);
}

#[tokio::test]
async fn sync_allowed_again_after_completion() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    remote.put_singleton("Insights", "[]");

    registry.insights.load_from_remote().await.unwrap();
    assert!(registry.insights.load_from_remote().await.unwrap().started());
    assert_eq!(remote.get_calls(), 2);
}

#[tokio::test]
async fn categories_sync_independently() {
    let (remote, _, registry) = setup(MemoryReportStore::with_latency(Duration::from_millis(20)));

    let (insights, linker) = tokio::join!(
        registry.insights.load_from_remote(),
        registry.linker_studies.load_from_remote(),
    );

    assert!(insights.unwrap().started());
    assert!(linker.unwrap().started());
    assert_eq!(remote.get_calls(), 2);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn decode_failure_leaves_cache_untouched() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    registry.reminders.set_current(reminders_at(1, "9:00 AM"));
    let mut events = registry.bus().subscribe();

    remote.put_singleton("Reminders", "{not json");
    let err = registry.reminders.load_from_remote().await.unwrap_err();

    assert!(matches!(err, SyncError::Decode { report: "Reminders", .. }));
    assert_eq!(registry.reminder_item(), Some(reminders_at(1, "9:00 AM")));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert!(!registry.reminders.is_syncing());
}

#[tokio::test]
async fn fetch_failure_leaves_cache_untouched() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    registry.insights.set_current(vec![InsightItemViewed::new("a", date(1))]);
    remote.set_fail_gets(true);

    assert!(matches!(
        registry.insights.load_from_remote().await,
        Err(SyncError::Remote(_))
    ));
    assert_eq!(registry.past_insights_viewed().len(), 1);
}

#[tokio::test]
async fn unsynced_value_is_pushed_after_load() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    remote.set_fail_saves(true);

    let viewed = TaskResult::new("Insights", date(2)).with_answer("insightViewedIdentifier", "a");
    registry.upload(&viewed).await.unwrap();
    assert!(!registry.insights.is_synced());

    remote.set_fail_saves(false);
    registry.insights.load_from_remote().await.unwrap();

    assert!(registry.insights.is_synced());
    let pushed: Vec<InsightItemViewed> =
        serde_json::from_str(&remote.payload("Insights").unwrap()).unwrap();
    assert_eq!(pushed, vec![InsightItemViewed::new("a", date(2))]);
}

#[tokio::test]
async fn failed_push_after_merge_does_not_fail_load() {
    let (remote, local, registry) = setup(MemoryReportStore::new());
    local.set("StudyDatesSyncedToBridge", b"false").unwrap();
    remote.set_fail_saves(true);

    let outcome = registry.linker_studies.load_from_remote().await.unwrap();

    assert_eq!(outcome, SyncOutcome::Merged);
    assert!(!registry.linker_studies.is_synced());
    assert!(!registry.linker_studies.is_syncing());
}

#[tokio::test]
async fn synced_value_is_not_pushed_after_load() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    remote.put_singleton("Insights", "[]");

    registry.insights.load_from_remote().await.unwrap();
    assert_eq!(remote.save_calls(), 0);
}

// ============================================================================
// Change notifications
// ============================================================================

#[tokio::test]
async fn merge_notifies_once() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    registry.reminders.set_current(reminders_at(1, "9:00 AM"));
    let mut events = registry.bus().subscribe();

    let newer = serde_json::to_string(&reminders_at(5, "6:00 PM")).unwrap();
    remote.put_singleton("Reminders", newer);

    assert_eq!(
        registry.reminders.load_from_remote().await.unwrap(),
        SyncOutcome::Merged
    );
    assert_eq!(events.try_recv(), Ok(ChangeEvent::RemindersChanged));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(registry.reminder_item(), Some(reminders_at(5, "6:00 PM")));
}

#[tokio::test]
async fn unchanged_merge_is_silent() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    registry.reminders.set_current(reminders_at(5, "9:00 AM"));
    let mut events = registry.bus().subscribe();

    let older = serde_json::to_string(&reminders_at(1, "6:00 PM")).unwrap();
    remote.put_singleton("Reminders", older);

    assert_eq!(
        registry.reminders.load_from_remote().await.unwrap(),
        SyncOutcome::Unchanged
    );
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(registry.reminder_item(), Some(reminders_at(5, "9:00 AM")));
}

// ============================================================================
// Category rules through the coordinator
// ============================================================================

#[tokio::test]
async fn treatment_merge_unions_history() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    let first = TaskResult::new("Treatment", date(1))
        .with_answer("treatmentSelection", vec!["Cream".to_string()])
        .with_answer("psoriasisStatus", "Mild")
        .with_answer("psoriasisSymptoms", "Itching");
    registry.upload(&first).await.unwrap();

    let remote_value = serde_json::json!({
        "psoriasisStatus": {"status": "Severe", "startDate": "2020-06-09T12:00:00Z"},
        "psoriasisSymptoms": {"symptoms": "Itching", "startDate": "2020-05-01T00:00:00Z"},
        "treatments": [
            {"treatments": ["Biologic"], "startDate": "2020-06-10T12:00:00Z"},
            {"treatments": ["Other"], "startDate": "2020-06-01T12:00:00Z"}
        ]
    });
    remote.put_singleton("Treatment", remote_value.to_string());

    registry.treatments.load_from_remote().await.unwrap();

    assert_eq!(registry.psoriasis_status().unwrap().status, "Severe");
    assert_eq!(registry.psoriasis_symptoms().unwrap().start_date, date(1));
    let ranges = registry.treatments.treatment_ranges();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].treatments, vec!["Cream".to_string()]);
    assert_eq!(ranges[1].treatments, vec!["Biologic".to_string()]);
}

#[tokio::test]
async fn missing_treatment_report_keeps_cache_empty() {
    let (_, _, registry) = setup(MemoryReportStore::new());
    let outcome = registry.treatments.load_from_remote().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert!(!registry.has_set_treatment());
}

#[tokio::test]
async fn linker_studies_union_with_remote() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    registry.linker_studies.initialize_study_dates(date(1)).await;

    let remote_studies = vec![
        LinkerStudy::new("Psorcast", date(20)),
        LinkerStudy::new("Partner", date(3)),
    ];
    remote.put_singleton("StudyDates", serde_json::to_string(&remote_studies).unwrap());

    registry.linker_studies.load_from_remote().await.unwrap();

    let studies = registry.linker_studies.current().unwrap();
    assert_eq!(
        studies,
        vec![
            LinkerStudy::new("Psorcast", date(1)),
            LinkerStudy::new("Partner", date(3)),
        ]
    );
}

#[tokio::test]
async fn linker_studies_reject_task_results() {
    let (_, _, registry) = setup(MemoryReportStore::new());
    let result = TaskResult::new("StudyDates", date(1));
    assert!(matches!(
        registry.linker_studies.append(&result).await,
        Err(SyncError::Engine(_))
    ));
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(MemoryReportStore::new());
    let config = Config {
        local_store_dir: Some(dir.path().to_path_buf()),
        sync_on_start: false,
        ..Config::default()
    };

    {
        let registry = ReportRegistry::from_config(&config, remote.clone()).unwrap();
        registry.reminders.set_current(reminders_at(2, "7:30 AM"));
    }

    let registry = ReportRegistry::from_config(&config, remote.clone()).unwrap();
    assert_eq!(registry.reminder_item(), Some(reminders_at(2, "7:30 AM")));
}

#[tokio::test]
async fn reports_share_one_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let local: Arc<dyn LocalStore> = Arc::new(FileLocalStore::open(dir.path()).unwrap());
    let remote = Arc::new(MemoryReportStore::new());

    let writer: SingletonReport<InsightsViewed> =
        SingletonReport::new(remote.clone(), local.clone(), ChangeBus::default());
    writer.set_current(vec![InsightItemViewed::new("a", date(1))]);

    let reader: SingletonReport<InsightsViewed> =
        SingletonReport::new(remote.clone(), local.clone(), ChangeBus::default());
    assert_eq!(reader.current(), writer.current());

    let other: SingletonReport<Reminders> = SingletonReport::new(remote, local, ChangeBus::default());
    assert_eq!(other.current(), None);
}

#[tokio::test]
async fn force_reload_reports_each_category() {
    let (remote, _, registry) = setup(MemoryReportStore::new());
    remote.put_singleton("Treatment", "garbage");

    let summary = registry.force_reload().await;

    assert!(!summary.all_succeeded());
    assert!(matches!(summary.treatments, Err(SyncError::Decode { .. })));
    assert_eq!(summary.reminders.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(summary.insights.unwrap(), SyncOutcome::Merged);
    assert_eq!(summary.linker_studies.unwrap(), SyncOutcome::Merged);
}
