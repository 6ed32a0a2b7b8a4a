//! Maps the classifier's schema-variable payloads onto one canonical
//! record. Implemented as an ordered chain of typed extraction rules,
//! first match wins; the function is total and never fails, degrading to
//! documented defaults instead.

use serde_json::Value;

use crate::models::detection::{DetectionResult, Keypoint};

/// Used when the payload carries no usable confidence at all.
pub const DEFAULT_CONFIDENCE_PERCENT: u8 = 75;

/// Feedback shown to the user is capped at this many lines; excess is
/// truncated, order preserved.
pub const MAX_FEEDBACK_LINES: usize = 3;

const FALLBACK_POSE_LABEL: &str = "Unknown Pose";

/// Label fields probed in order.
const LABEL_FIELDS: &[&str] = &["predicted_pose", "pose_name", "pose"];

/// Recognized list-valued sub-keys of an object-shaped `feedback`, probed
/// in order.
const FEEDBACK_LIST_FIELDS: &[&str] = &["suggestions", "tips", "corrections"];

pub fn normalize(raw: &Value) -> DetectionResult {
    DetectionResult {
        pose_label: extract_label(raw),
        confidence_percent: extract_confidence(raw),
        feedback_lines: extract_feedback(raw),
        keypoints: extract_keypoints(raw),
    }
}

fn extract_label(raw: &Value) -> String {
    LABEL_FIELDS
        .iter()
        .find_map(|field| raw.get(field).and_then(Value::as_str))
        .map(str::to_owned)
        .unwrap_or_else(|| FALLBACK_POSE_LABEL.to_owned())
}

/// `confidence_percent` is taken as-is when present; `confidence` is a 0-1
/// fraction when <= 1, otherwise already a percentage. Absent or
/// non-numeric falls back to the default. Always clamped to [0, 100].
fn extract_confidence(raw: &Value) -> u8 {
    if let Some(percent) = raw.get("confidence_percent").and_then(Value::as_f64) {
        return clamp_percent(percent.round());
    }
    match raw.get("confidence").and_then(Value::as_f64) {
        Some(fraction) if fraction <= 1.0 => clamp_percent((fraction * 100.0).round()),
        Some(percent) => clamp_percent(percent.round()),
        None => DEFAULT_CONFIDENCE_PERCENT,
    }
}

fn clamp_percent(value: f64) -> u8 {
    value.clamp(0.0, 100.0) as u8
}

fn extract_feedback(raw: &Value) -> Vec<String> {
    let mut lines = match raw.get("feedback") {
        Some(Value::Object(map)) => {
            let recognized = FEEDBACK_LIST_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_array));
            match recognized {
                Some(list) => list.iter().filter_map(scalar_to_line).collect(),
                // No recognized sub-key: flatten every value in insertion
                // order, spreading arrays and keeping scalars.
                None => map
                    .values()
                    .flat_map(|value| match value {
                        Value::Array(items) => {
                            items.iter().filter_map(scalar_to_line).collect::<Vec<_>>()
                        }
                        other => scalar_to_line(other).into_iter().collect(),
                    })
                    .collect(),
            }
        }
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_line).collect(),
        // Absent, null, or scalar feedback: no lines. The caller shows the
        // positive fallback message instead.
        _ => Vec::new(),
    };
    lines.truncate(MAX_FEEDBACK_LINES);
    lines
}

fn scalar_to_line(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// A non-empty `keypoints` array passes through slot-for-slot. Entries
/// without numeric coordinates become `None` so downstream index pairs
/// stay aligned; `visibility` defaults to fully visible.
fn extract_keypoints(raw: &Value) -> Option<Vec<Option<Keypoint>>> {
    let items = raw.get("keypoints").and_then(Value::as_array)?;
    if items.is_empty() {
        return None;
    }
    Some(items.iter().map(keypoint_from_value).collect())
}

fn keypoint_from_value(value: &Value) -> Option<Keypoint> {
    let x = value.get("x").and_then(Value::as_f64)?;
    let y = value.get("y").and_then(Value::as_f64)?;
    let visibility = value
        .get("visibility")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    Some(Keypoint {
        x: x as f32,
        y: y as f32,
        visibility: visibility as f32,
    })
}
