use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capture::{CameraSource, CaptureController, Facing, StreamConstraints};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::inference::PoseClassifier;
use crate::models::detection::{DetectionResult, HistoryEntry};
use crate::models::session::{SessionState, SessionStatus};
use crate::overlay::Canvas;

use super::clock::clock_loop;
use super::history::HistoryBuffer;
use super::loop_worker::{detection_loop, LoopContext};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    StateChanged(SessionState),
    DetectionUpdated(DetectionResult),
    TransientError { message: String },
    ClockTick { elapsed_seconds: u64, display: String },
}

struct SessionTasks {
    cancel_token: CancellationToken,
    sampler: JoinHandle<()>,
    clock: JoinHandle<()>,
}

/// Owns one live-detection session end to end: the media stream, the
/// sampling scheduler, the session clock, the overlay canvas, and the
/// detection history. Stopping (or dropping) the controller tears all of
/// them down; the camera is released on every exit path.
pub struct SessionController<C: PoseClassifier> {
    state: Arc<Mutex<SessionState>>,
    capture: Arc<Mutex<CaptureController>>,
    canvas: Arc<Mutex<Option<Canvas>>>,
    history: Arc<Mutex<HistoryBuffer>>,
    classifier: Arc<C>,
    events: broadcast::Sender<SessionEvent>,
    tasks: StdMutex<Option<SessionTasks>>,
    config: EngineConfig,
}

impl<C: PoseClassifier> SessionController<C> {
    pub fn new(classifier: C, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            capture: Arc::new(Mutex::new(CaptureController::new())),
            canvas: Arc::new(Mutex::new(None)),
            history: Arc::new(Mutex::new(HistoryBuffer::new(config.history_capacity))),
            classifier: Arc::new(classifier),
            events,
            tasks: StdMutex::new(None),
            config,
        }
    }

    /// Acquires the camera and starts the sampling scheduler and session
    /// clock. On permission failure nothing is held and the session stays
    /// idle; the user may retry.
    pub async fn start_session(
        &self,
        source: &dyn CameraSource,
    ) -> Result<SessionState, SessionError> {
        {
            let mut state = self.state.lock().await;
            if state.status == SessionStatus::Streaming {
                return Err(SessionError::AlreadyStreaming);
            }
            state.last_error = None;
        }

        let constraints = StreamConstraints {
            width: self.config.preferred_width,
            height: self.config.preferred_height,
            facing: Facing::User,
        };
        if let Err(err) = self.capture.lock().await.start(source, &constraints) {
            let mut state = self.state.lock().await;
            state.last_error = Some(err.to_string());
            let _ = self.events.send(SessionEvent::StateChanged(state.clone()));
            return Err(err);
        }

        let session_id = Uuid::new_v4().to_string();
        info!("starting live session {session_id}");
        {
            let mut state = self.state.lock().await;
            state.begin_session(session_id, Utc::now(), Instant::now());
        }

        let cancel_token = CancellationToken::new();
        let sampler = tokio::spawn(detection_loop(
            LoopContext {
                state: self.state.clone(),
                capture: self.capture.clone(),
                canvas: self.canvas.clone(),
                history: self.history.clone(),
                classifier: self.classifier.clone(),
                events: self.events.clone(),
                config: self.config.clone(),
            },
            cancel_token.clone(),
        ));
        let clock = tokio::spawn(clock_loop(
            self.state.clone(),
            self.events.clone(),
            self.config.clock_period,
            cancel_token.clone(),
        ));

        {
            let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *tasks = Some(SessionTasks {
                cancel_token,
                sampler,
                clock,
            });
        }

        let snapshot = self.snapshot().await;
        let _ = self.events.send(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Ends the session: cancels both tasks, discards any in-flight
    /// analysis, releases the camera, and clears the live state. Safe to
    /// call when nothing is running.
    pub async fn stop_session(&self) {
        let tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.take()
        };

        if let Some(tasks) = tasks {
            tasks.cancel_token.cancel();
            if let Err(err) = tasks.sampler.await {
                if !err.is_cancelled() {
                    error!("detection loop failed to join: {err}");
                }
            }
            tasks.clock.abort();
        }

        self.capture.lock().await.stop();

        let changed = {
            let mut state = self.state.lock().await;
            if state.status == SessionStatus::Streaming {
                state.end_session();
                true
            } else {
                false
            }
        };
        if changed {
            info!("live session stopped");
            let snapshot = self.snapshot().await;
            let _ = self.events.send(SessionEvent::StateChanged(snapshot));
        }
    }

    /// Current state, with elapsed time synced from the clock anchor.
    pub async fn snapshot(&self) -> SessionState {
        let mut guard = self.state.lock().await;
        guard.sync_elapsed_from_anchor();
        guard.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Binds an overlay canvas. Until one is attached, rendering is a
    /// no-op.
    pub async fn attach_canvas(&self, width: u32, height: u32) {
        *self.canvas.lock().await = Some(Canvas::new(width, height));
    }

    pub async fn detach_canvas(&self) {
        *self.canvas.lock().await = None;
    }

    /// Copy of the overlay pixels, if a canvas is attached.
    pub async fn overlay_rgba(&self) -> Option<(u32, u32, Vec<u8>)> {
        self.canvas
            .lock()
            .await
            .as_ref()
            .map(|canvas| (canvas.width(), canvas.height(), canvas.pixels().to_vec()))
    }

    /// Last `n` detections, oldest first.
    pub async fn recent_detections(&self, n: usize) -> Vec<HistoryEntry> {
        self.history.lock().await.recent(n)
    }

    pub async fn detections_count(&self) -> usize {
        self.history.lock().await.len()
    }
}

impl<C: PoseClassifier> Drop for SessionController<C> {
    fn drop(&mut self) {
        // Best effort: cancelling is enough — both tasks select on the
        // token and the detection loop releases the camera on its way out.
        let mut guard = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tasks) = guard.take() {
            tasks.cancel_token.cancel();
        }
    }
}
