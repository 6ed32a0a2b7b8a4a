pub mod detection;
pub mod session;

pub use detection::{DetectionResult, HistoryEntry, Keypoint, GOOD_FORM_MESSAGE};
pub use session::{SessionState, SessionStatus};
