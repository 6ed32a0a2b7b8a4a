//! Drives the live session engine end to end through its public seams: a
//! synthetic camera source and scripted classifiers stand in for the real
//! webcam and remote endpoint, and the tokio clock is paused so the 2 s
//! sampling cadence and 1 s session clock advance deterministically.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::time::advance;

use poselive::{
    CameraSource, EngineConfig, InferenceError, PixelFrame, PoseClassifier, SampledFrame,
    SessionController, SessionError, SessionEvent, SessionStatus, StreamConstraints, VideoStream,
};

const FRAME_WIDTH: u32 = 64;
const FRAME_HEIGHT: u32 = 48;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone)]
struct TestSource {
    stopped: Arc<AtomicBool>,
}

impl TestSource {
    fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct TestStream {
    stopped: Arc<AtomicBool>,
}

impl VideoStream for TestStream {
    fn current_frame(&mut self) -> Option<PixelFrame> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }
        Some(PixelFrame {
            rgba: vec![40; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize],
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        })
    }

    fn dimensions(&self) -> (u32, u32) {
        (FRAME_WIDTH, FRAME_HEIGHT)
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl CameraSource for TestSource {
    fn open(&self, _constraints: &StreamConstraints) -> anyhow::Result<Box<dyn VideoStream>> {
        self.stopped.store(false, Ordering::SeqCst);
        Ok(Box::new(TestStream {
            stopped: self.stopped.clone(),
        }))
    }
}

struct DenyingSource;

impl CameraSource for DenyingSource {
    fn open(&self, _constraints: &StreamConstraints) -> anyhow::Result<Box<dyn VideoStream>> {
        Err(anyhow!("permission denied by user"))
    }
}

/// Replays a queue of responses, then keeps answering with a bland default.
struct ScriptedClassifier {
    calls: Arc<AtomicUsize>,
    script: Mutex<VecDeque<Result<Value, InferenceError>>>,
}

impl ScriptedClassifier {
    fn new(script: Vec<Result<Value, InferenceError>>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            script: Mutex::new(script.into()),
        }
    }
}

impl PoseClassifier for ScriptedClassifier {
    fn classify(
        &self,
        _frame: SampledFrame,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"predicted_pose": "Mountain", "confidence": 60})));
        async move { next }
    }
}

/// Completion is held back until the test releases a permit, which lets a
/// test keep a call in flight across several timer boundaries.
struct GatedClassifier {
    calls: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

impl GatedClassifier {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

impl PoseClassifier for GatedClassifier {
    fn classify(
        &self,
        _frame: SampledFrame,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.clone();
        async move {
            let permit = gate.acquire_owned().await.expect("gate closed");
            permit.forget();
            Ok(json!({"predicted_pose": "Tree", "confidence": 0.91}))
        }
    }
}

fn tree_response() -> Value {
    json!({
        "predicted_pose": "Tree",
        "confidence": 0.91,
        "feedback": {"tips": ["Engage core", "Fix gaze"]}
    })
}

/// Lets spawned engine tasks run without advancing the clock.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

async fn advance_one_period() {
    advance(Duration::from_millis(2050)).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn single_flight_holds_across_timer_boundaries() {
    init_logging();
    let classifier = GatedClassifier::new();
    let calls = classifier.calls.clone();
    let gate = classifier.gate.clone();
    let controller = SessionController::new(classifier, EngineConfig::default());

    controller
        .start_session(&TestSource::new())
        .await
        .expect("session should start");

    // Three boundaries elapse while the first call is still in flight.
    advance(Duration::from_millis(6500)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Releasing the call re-arms the loop; the next boundary fires again.
    gate.add_permits(10);
    settle().await;
    advance_one_period().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn detection_updates_state_history_and_overlay() {
    init_logging();
    let classifier = ScriptedClassifier::new(vec![Ok(tree_response())]);
    let controller = SessionController::new(classifier, EngineConfig::default());
    controller.attach_canvas(FRAME_WIDTH, FRAME_HEIGHT).await;
    let mut events = controller.subscribe();

    controller
        .start_session(&TestSource::new())
        .await
        .expect("session should start");

    advance_one_period().await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Streaming);
    assert_eq!(snapshot.detected_pose.as_deref(), Some("Tree"));
    assert_eq!(snapshot.accuracy_percent, 91);
    assert_eq!(snapshot.feedback, vec!["Engage core", "Fix gaze"]);
    assert!(!snapshot.analyzing);

    let history = controller.recent_detections(5).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].pose_label, "Tree");
    assert_eq!(history[0].confidence_percent, 91);

    // No keypoints in the response, so the overlay painted the frame and a
    // badge in the top-left corner.
    let (width, height, pixels) = controller.overlay_rgba().await.expect("canvas attached");
    assert_eq!((width, height), (FRAME_WIDTH, FRAME_HEIGHT));
    let badge_idx = ((15 * width + 15) * 4) as usize;
    assert_eq!(&pixels[badge_idx..badge_idx + 4], &[79, 70, 229, 230]);

    let mut saw_detection = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::DetectionUpdated(result) = event {
            assert_eq!(result.pose_label, "Tree");
            saw_detection = true;
        }
    }
    assert!(saw_detection);

    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn transient_error_is_reported_and_the_loop_recovers() {
    init_logging();
    let classifier = ScriptedClassifier::new(vec![
        Err(InferenceError::Timeout(Duration::from_secs(10))),
        Ok(tree_response()),
    ]);
    let calls = classifier.calls.clone();
    let controller = SessionController::new(classifier, EngineConfig::default());

    controller
        .start_session(&TestSource::new())
        .await
        .expect("session should start");

    advance_one_period().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Streaming);
    let message = snapshot.last_error.expect("error should surface");
    assert!(message.contains("timed out"), "unexpected message: {message}");
    assert!(controller.recent_detections(5).await.is_empty());

    // Next tick proceeds normally; the session never left Streaming.
    advance_one_period().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.detected_pose.as_deref(), Some("Tree"));
    assert_eq!(controller.detections_count().await, 1);

    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn stopping_discards_an_in_flight_result() {
    init_logging();
    let classifier = GatedClassifier::new();
    let calls = classifier.calls.clone();
    let gate = classifier.gate.clone();
    let controller = SessionController::new(classifier, EngineConfig::default());
    controller.attach_canvas(FRAME_WIDTH, FRAME_HEIGHT).await;

    controller
        .start_session(&TestSource::new())
        .await
        .expect("session should start");

    advance_one_period().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    controller.stop_session().await;
    assert_eq!(controller.snapshot().await.status, SessionStatus::Stopped);

    // The held-back call "resolving" now must not touch history or state.
    gate.add_permits(10);
    settle().await;
    assert!(controller.recent_detections(5).await.is_empty());
    let snapshot = controller.snapshot().await;
    assert!(snapshot.detected_pose.is_none());
}

#[tokio::test(start_paused = true)]
async fn permission_failure_keeps_the_session_idle_and_is_retryable() {
    init_logging();
    let classifier = ScriptedClassifier::new(Vec::new());
    let controller = SessionController::new(classifier, EngineConfig::default());

    let result = controller.start_session(&DenyingSource).await;
    assert!(matches!(result, Err(SessionError::Permission(_))));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Idle);
    let message = snapshot.last_error.expect("error should surface");
    assert!(message.contains("could not access camera"));

    // The user grants access and retries.
    controller
        .start_session(&TestSource::new())
        .await
        .expect("retry should start");
    assert_eq!(controller.snapshot().await.status, SessionStatus::Streaming);

    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_the_session_restarts_cleanly() {
    init_logging();
    let classifier = ScriptedClassifier::new(vec![Ok(tree_response())]);
    let controller = SessionController::new(classifier, EngineConfig::default());
    let source = TestSource::new();

    controller
        .start_session(&source)
        .await
        .expect("session should start");
    advance_one_period().await;

    controller.stop_session().await;
    assert!(source.stopped.load(Ordering::SeqCst));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert!(snapshot.detected_pose.is_none());
    assert_eq!(snapshot.elapsed_seconds, 0);

    controller.stop_session().await;
    assert_eq!(controller.snapshot().await.status, SessionStatus::Stopped);

    controller
        .start_session(&source)
        .await
        .expect("restart should work");
    assert_eq!(controller.snapshot().await.status, SessionStatus::Streaming);
    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn starting_twice_is_rejected() {
    init_logging();
    let classifier = ScriptedClassifier::new(Vec::new());
    let controller = SessionController::new(classifier, EngineConfig::default());
    let source = TestSource::new();

    controller
        .start_session(&source)
        .await
        .expect("session should start");
    let second = controller.start_session(&source).await;
    assert!(matches!(second, Err(SessionError::AlreadyStreaming)));

    controller.stop_session().await;
}

#[tokio::test(start_paused = true)]
async fn clock_counts_independently_of_sampling_outcomes() {
    init_logging();
    // Every call fails; the clock must keep ticking regardless.
    let classifier = ScriptedClassifier::new(
        (0..40)
            .map(|_| Err(InferenceError::Timeout(Duration::from_secs(10))))
            .collect(),
    );
    let controller = SessionController::new(classifier, EngineConfig::default());

    controller
        .start_session(&TestSource::new())
        .await
        .expect("session should start");

    advance(Duration::from_secs(65)).await;
    settle().await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Streaming);
    assert_eq!(snapshot.elapsed_seconds, 65);
    assert_eq!(poselive::format_elapsed(snapshot.elapsed_seconds), "01:05");

    controller.stop_session().await;
}
