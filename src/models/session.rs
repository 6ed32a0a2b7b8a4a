use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Streaming,
    Stopped,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Streaming => "Streaming",
            SessionStatus::Stopped => "Stopped",
        }
    }
}

/// Live view of one detection session. Snapshots of this struct are what
/// the hosting UI renders; field names serialize camelCase for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    /// True while an inference call is in flight (the "Analyzing..."
    /// indicator).
    pub analyzing: bool,
    pub detected_pose: Option<String>,
    pub accuracy_percent: u8,
    pub feedback: Vec<String>,
    /// Single user-visible error message; each new error replaces it.
    pub last_error: Option<String>,
    #[serde(skip)]
    pub clock_anchor: Option<Instant>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            started_at: None,
            elapsed_seconds: 0,
            analyzing: false,
            detected_pose: None,
            accuracy_percent: 0,
            feedback: Vec::new(),
            last_error: None,
            clock_anchor: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_elapsed_from_anchor(&mut self) {
        if let (SessionStatus::Streaming, Some(anchor)) = (self.status, self.clock_anchor) {
            self.elapsed_seconds = anchor.elapsed().as_secs();
        }
    }

    pub fn begin_session(&mut self, session_id: String, started_at: DateTime<Utc>, now: Instant) {
        *self = Self {
            status: SessionStatus::Streaming,
            session_id: Some(session_id),
            started_at: Some(started_at),
            clock_anchor: Some(now),
            ..Self::default()
        };
    }

    /// Clears every live field; the next start begins from a blank slate.
    pub fn end_session(&mut self) {
        *self = Self {
            status: SessionStatus::Stopped,
            ..Self::default()
        };
    }
}
