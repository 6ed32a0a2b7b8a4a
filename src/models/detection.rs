use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown by the hosting UI when a detection carries no feedback lines.
pub const GOOD_FORM_MESSAGE: &str = "Great form! Keep it up.";

/// One landmark in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

/// Canonical detection record, post-normalization. Immutable once built.
///
/// `keypoints` preserves the raw sequence's indexing: a `None` slot stands
/// for an entry whose coordinates were missing, so the skeletal connection
/// graph (index pairs) stays aligned and the renderer can skip the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub pose_label: String,
    pub confidence_percent: u8,
    pub feedback_lines: Vec<String>,
    pub keypoints: Option<Vec<Option<Keypoint>>>,
}

impl DetectionResult {
    pub fn has_keypoints(&self) -> bool {
        matches!(&self.keypoints, Some(points) if !points.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub pose_label: String,
    pub confidence_percent: u8,
    pub timestamp: DateTime<Utc>,
}
