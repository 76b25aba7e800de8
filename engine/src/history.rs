//! History items built from timestamped `History` reports.
//!
//! A history item is a tagged variant keyed by the task that produced it.
//! Client data is decoded through a lookup table from task identifier to
//! decode function; tasks without an entry decode to [`HistoryDetail::Generic`].

use crate::{ReportIdentifier, TaskResult, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Report identifier shared by all history reports.
pub const HISTORY_REPORT: &str = "History";

/// Task identifiers that produce history reports.
pub mod tasks {
    pub const PSORIASIS_DRAW: &str = "PsoriasisDraw";
    pub const PSORIASIS_AREA_PHOTO: &str = "PsoriasisAreaPhoto";
    pub const JOINT_COUNTING: &str = "JointCounting";
    pub const DIGITAL_JAR_OPEN: &str = "DigitalJarOpen";
    pub const HAND_IMAGING: &str = "HandImaging";
    pub const FOOT_IMAGING: &str = "FootImaging";
    pub const WALKING: &str = "Walk30Seconds";
}

/// Client data keys carried by history reports.
pub mod keys {
    pub const TASK_IDENTIFIER: &str = "taskIdentifier";
    pub const IMAGE_NAME: &str = "imageName";
    pub const COVERAGE: &str = "coverage";
    pub const JOINT_COUNT: &str = "jointCount";
    pub const SELECTED_ZONE_IDENTIFIER: &str = "selectedZoneIdentifier";
    pub const LEFT_CLOCKWISE_ROTATION: &str = "leftClockwiseRotation";
    pub const RIGHT_CLOCKWISE_ROTATION: &str = "rightClockwiseRotate";
    pub const LEFT_COUNTER_ROTATION: &str = "leftCounterRotation";
    pub const RIGHT_COUNTER_ROTATION: &str = "rightCounterRotation";
}

pub const HISTORY_TASKS: [&str; 7] = [
    tasks::PSORIASIS_DRAW,
    tasks::PSORIASIS_AREA_PHOTO,
    tasks::DIGITAL_JAR_OPEN,
    tasks::HAND_IMAGING,
    tasks::FOOT_IMAGING,
    tasks::WALKING,
    tasks::JOINT_COUNTING,
];

pub const HISTORY_CLIENT_DATA_KEYS: [&str; 9] = [
    keys::TASK_IDENTIFIER,
    keys::IMAGE_NAME,
    keys::COVERAGE,
    keys::JOINT_COUNT,
    keys::SELECTED_ZONE_IDENTIFIER,
    keys::LEFT_CLOCKWISE_ROTATION,
    keys::RIGHT_CLOCKWISE_ROTATION,
    keys::LEFT_COUNTER_ROTATION,
    keys::RIGHT_COUNTER_ROTATION,
];

pub fn is_history_task(identifier: &str) -> bool {
    HISTORY_TASKS.contains(&identifier)
}

/// Fields shared by every history item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryHeader {
    pub report_date: Timestamp,
    pub report_identifier: ReportIdentifier,
    pub task_identifier: Option<String>,
    pub image_name: Option<String>,
}

/// Task specific history data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HistoryDetail {
    #[serde(rename_all = "camelCase")]
    PsoriasisDraw { coverage: f64 },
    #[serde(rename_all = "camelCase")]
    JointCounting { joint_count: i32 },
    #[serde(rename_all = "camelCase")]
    PsoriasisAreaPhoto {
        selected_zone_identifier: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DigitalJarOpen {
        left_clockwise_rotation: i32,
        left_counter_rotation: i32,
        right_clockwise_rotation: i32,
        right_counter_rotation: i32,
    },
    Generic,
}

/// One entry of the participant's task history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub header: HistoryHeader,
    pub detail: HistoryDetail,
}

type DecodeFn = fn(&Map<String, Value>) -> HistoryDetail;

const DECODERS: &[(&str, DecodeFn)] = &[
    (tasks::PSORIASIS_DRAW, decode_psoriasis_draw),
    (tasks::JOINT_COUNTING, decode_joint_counting),
    (tasks::PSORIASIS_AREA_PHOTO, decode_area_photo),
    (tasks::DIGITAL_JAR_OPEN, decode_digital_jar_open),
];

fn int_field(data: &Map<String, Value>, key: &str) -> i32 {
    data.get(key)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or_default()
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn decode_psoriasis_draw(data: &Map<String, Value>) -> HistoryDetail {
    HistoryDetail::PsoriasisDraw {
        coverage: data
            .get(keys::COVERAGE)
            .and_then(Value::as_f64)
            .unwrap_or_default(),
    }
}

fn decode_joint_counting(data: &Map<String, Value>) -> HistoryDetail {
    HistoryDetail::JointCounting {
        joint_count: int_field(data, keys::JOINT_COUNT),
    }
}

fn decode_area_photo(data: &Map<String, Value>) -> HistoryDetail {
    HistoryDetail::PsoriasisAreaPhoto {
        selected_zone_identifier: string_field(data, keys::SELECTED_ZONE_IDENTIFIER),
    }
}

fn decode_digital_jar_open(data: &Map<String, Value>) -> HistoryDetail {
    HistoryDetail::DigitalJarOpen {
        left_clockwise_rotation: int_field(data, keys::LEFT_CLOCKWISE_ROTATION),
        left_counter_rotation: int_field(data, keys::LEFT_COUNTER_ROTATION),
        right_clockwise_rotation: int_field(data, keys::RIGHT_CLOCKWISE_ROTATION),
        right_counter_rotation: int_field(data, keys::RIGHT_COUNTER_ROTATION),
    }
}

/// Decode a history report produced by `task_identifier`.
///
/// Non-object client data yields the header alone with a generic detail;
/// missing or mistyped fields fall back to their defaults.
pub fn decode_history_item(
    task_identifier: &str,
    report_identifier: impl Into<ReportIdentifier>,
    report_date: Timestamp,
    client_data: &Value,
) -> HistoryItem {
    let data = client_data.as_object();

    let header = HistoryHeader {
        report_date,
        report_identifier: report_identifier.into(),
        task_identifier: data.and_then(|d| string_field(d, keys::TASK_IDENTIFIER)),
        image_name: data.and_then(|d| string_field(d, keys::IMAGE_NAME)),
    };

    let detail = match data {
        Some(data) => DECODERS
            .iter()
            .find(|(task, _)| *task == task_identifier)
            .map_or(HistoryDetail::Generic, |(_, decode)| decode(data)),
        None => HistoryDetail::Generic,
    };

    HistoryItem { header, detail }
}

/// Client data for the history report of a finished task.
///
/// Only answers whose identifiers are history keys are kept, so an image
/// name travels as the `imageName` answer.
///
/// Wire format difference: `taskIdentifier` is always recorded, even when
/// the task did not answer it. Older clients wrote answered keys only;
/// decoders must not rely on its absence.
pub fn history_client_data(result: &TaskResult) -> Map<String, Value> {
    let mut data: Map<String, Value> = result
        .answers
        .iter()
        .filter(|(id, _)| HISTORY_CLIENT_DATA_KEYS.contains(&id.as_str()))
        .map(|(id, value)| (id.clone(), Value::from(value.clone())))
        .collect();

    data.entry(keys::TASK_IDENTIFIER)
        .or_insert_with(|| Value::String(result.identifier.clone()));
    data
}
