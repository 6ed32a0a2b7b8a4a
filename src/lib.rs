//! Live pose-detection session engine. Owns a continuous camera stream,
//! samples frames on a fixed cadence, dispatches them single-flight to a
//! remote classifier, normalizes its schema-variable responses, and keeps
//! an overlay, a bounded detection history, and a session clock in sync —
//! recovering from transient analysis failures without ending the session.
//!
//! The hosting UI supplies the camera through [`capture::CameraSource`]
//! and observes the engine through [`SessionController`] snapshots and its
//! broadcast event stream.

pub mod capture;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod overlay;
pub mod session;

pub use capture::{CameraSource, CaptureController, PixelFrame, SampledFrame, StreamConstraints, VideoStream};
pub use config::EngineConfig;
pub use error::{InferenceError, SessionError};
pub use inference::{normalize, HttpInferenceClient, PoseClassifier};
pub use models::detection::{DetectionResult, HistoryEntry, Keypoint, GOOD_FORM_MESSAGE};
pub use models::session::{SessionState, SessionStatus};
pub use overlay::Canvas;
pub use session::{format_elapsed, HistoryBuffer, SessionController, SessionEvent};
