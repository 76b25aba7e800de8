//! Edge case tests for psorcast-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use chrono::{TimeZone, Utc};
use psorcast_engine::{
    compute_ranges, InsightItemViewed, InsightsViewed, LinkerStudies, LinkerStudy, MergeStrategy,
    ReminderItem, Reminders, ReportCategory, Timestamp, TreatmentItem, TreatmentTask, Treatments,
    VersionedItem,
};

fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn insight(id: Option<&str>, secs: Option<i64>) -> InsightItemViewed {
    InsightItemViewed {
        insight_identifier: id.map(str::to_string),
        date: secs.map(at),
    }
}

// ============================================================================
// Missing identifiers and dates
// ============================================================================

#[test]
fn items_without_identifier_share_one_key() {
    let cached = vec![insight(None, Some(1))];
    let incoming = vec![insight(None, Some(2)), insight(None, Some(3))];

    let merged = MergeStrategy::ReplaceIfNewer.merge(&cached, &incoming);
    assert_eq!(merged, vec![insight(None, Some(2))]);
}

#[test]
fn undated_insights_sort_first() {
    let merged = InsightsViewed::merge_remote(
        None,
        vec![insight(Some("late"), Some(100)), insight(Some("undated"), None)],
    )
    .unwrap();
    assert_eq!(merged[0].insight_identifier.as_deref(), Some("undated"));
}

#[test]
fn pre_epoch_dates_are_older_than_missing_ones() {
    let cached = vec![insight(Some("a"), None)];
    let merged = MergeStrategy::ReplaceIfNewer.merge(&cached, &[insight(Some("a"), Some(-10))]);
    assert_eq!(merged[0].date, None);
}

// ============================================================================
// Payload decoding
// ============================================================================

#[test]
fn empty_object_decodes_to_default_reminder() {
    let item: ReminderItem = serde_json::from_str("{}").unwrap();
    assert_eq!(item, ReminderItem::default());
}

#[test]
fn linker_study_unknown_fields_ignored() {
    let json = r#"[{"identifier": "Psorcast", "startDate": "2021-01-04T00:00:00Z", "extra": 1}]"#;
    let studies: Vec<LinkerStudy> = serde_json::from_str(json).unwrap();
    assert_eq!(studies[0].key().as_deref(), Some("Psorcast"));
}

#[test]
fn treatment_task_missing_status_fails_decode() {
    let json = r#"{"psoriasisSymptoms": {"symptoms": "x", "startDate": "2020-01-01T00:00:00Z"}, "treatments": []}"#;
    assert!(serde_json::from_str::<TreatmentTask>(json).is_err());
}

#[test]
fn treatment_start_with_fractional_seconds() {
    let json = r#"{"treatments": ["Topicals"], "startDate": "2020-01-01T00:00:00.123Z"}"#;
    let item: TreatmentItem = serde_json::from_str(json).unwrap();
    assert_eq!(item.start_date.timestamp_subsec_millis(), 123);
}

// ============================================================================
// Large inputs
// ============================================================================

#[test]
fn large_union_stays_unique() {
    let cached: Vec<LinkerStudy> = (0..5_000)
        .map(|i| LinkerStudy::new(format!("study-{}", i), at(i)))
        .collect();
    let incoming: Vec<LinkerStudy> = (2_500..7_500)
        .map(|i| LinkerStudy::new(format!("study-{}", i), at(i)))
        .collect();

    let merged = LinkerStudies::merge_remote(Some(&cached), incoming).unwrap();
    assert_eq!(merged.len(), 7_500);
}

#[test]
fn many_treatments_produce_chained_ranges() {
    let treatments: Vec<TreatmentItem> = (0..100)
        .rev()
        .map(|i| TreatmentItem::new(vec![format!("t{}", i)], at(i * 86_400)))
        .collect();
    let task = Treatments::normalize(TreatmentTask {
        psoriasis_status: psorcast_engine::PsoriasisStatus {
            status: "Psoriasis".into(),
            start_date: at(0),
        },
        psoriasis_symptoms: psorcast_engine::PsoriasisSymptoms {
            symptoms: "Skin symptoms".into(),
            start_date: at(0),
        },
        treatments,
    });

    let ranges = compute_ranges(&task.treatments);
    assert_eq!(ranges.len(), 100);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].end_date, Some(pair[1].start_date));
    }
    assert!(ranges[99].is_open());
}

// ============================================================================
// Reminder tie breaks
// ============================================================================

#[test]
fn reminder_equal_dates_keep_cached() {
    let cached = ReminderItem {
        reminder_time: Some("9:00 AM".into()),
        date: Some(at(50)),
        ..Default::default()
    };
    let remote = ReminderItem {
        reminder_time: Some("10:00 AM".into()),
        date: Some(at(50)),
        ..Default::default()
    };
    assert_eq!(Reminders::merge_remote(Some(&cached), remote), None);
}

#[test]
fn reminder_cached_without_date_takes_remote() {
    let cached = ReminderItem {
        reminder_time: Some("9:00 AM".into()),
        ..Default::default()
    };
    let remote = ReminderItem {
        reminder_time: Some("10:00 AM".into()),
        ..Default::default()
    };
    assert_eq!(
        Reminders::merge_remote(Some(&cached), remote.clone()),
        Some(remote)
    );
}
