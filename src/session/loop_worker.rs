use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{broadcast, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureController;
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::inference::{normalize, PoseClassifier};
use crate::models::detection::{DetectionResult, HistoryEntry};
use crate::models::session::SessionState;
use crate::overlay::{renderer, Canvas};

use super::controller::SessionEvent;
use super::history::HistoryBuffer;

/// Shared handles the detection loop works against.
pub(crate) struct LoopContext<C: PoseClassifier> {
    pub state: Arc<Mutex<SessionState>>,
    pub capture: Arc<Mutex<CaptureController>>,
    pub canvas: Arc<Mutex<Option<Canvas>>>,
    pub history: Arc<Mutex<HistoryBuffer>>,
    pub classifier: Arc<C>,
    pub events: broadcast::Sender<SessionEvent>,
    pub config: EngineConfig,
}

/// The sampling scheduler. Fires on a fixed cadence; each boundary either
/// runs one capture+classify pass or, while a previous pass is still in
/// flight, elapses as a no-op (single-flight: the pass is awaited inline,
/// so the ticker cannot fire again until it finishes, and skipped
/// boundaries are dropped rather than replayed).
pub(crate) async fn detection_loop<C: PoseClassifier>(
    ctx: LoopContext<C>,
    cancel_token: CancellationToken,
) {
    let period = ctx.config.sample_period;
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ctx.state.lock().await.analyzing = true;

                // Race the pass against cancellation so a stop neither
                // waits for a slow call nor lets its result land.
                let outcome = tokio::select! {
                    outcome = perform_detection(&ctx) => outcome,
                    _ = cancel_token.cancelled() => {
                        info!("session stopped with an analysis in flight; discarding its result");
                        break;
                    }
                };

                // Liveness check: a stop that raced the pass wins, and the
                // completed outcome has no observable side effect.
                if cancel_token.is_cancelled() {
                    break;
                }

                match outcome {
                    Ok(Some(result)) => apply_detection(&ctx, result).await,
                    Ok(None) => debug!("capture surface not ready, skipping tick"),
                    Err(err) => {
                        warn!("pose analysis failed this tick: {err}");
                        let message = err.to_string();
                        ctx.state.lock().await.last_error = Some(message.clone());
                        let _ = ctx.events.send(SessionEvent::TransientError { message });
                    }
                }

                // Every outcome re-arms the loop; one failure never wedges it.
                ctx.state.lock().await.analyzing = false;
            }
            _ = cancel_token.cancelled() => {
                info!("detection loop shutting down");
                break;
            }
        }
    }

    // The stream is released on the way out as well, so teardown does not
    // depend on the controller's stop path having run.
    ctx.capture.lock().await.stop();
}

/// One sampling pass: capture a frame, classify it remotely, normalize the
/// payload. `Ok(None)` means the surface was not ready; no remote call is
/// made.
async fn perform_detection<C: PoseClassifier>(
    ctx: &LoopContext<C>,
) -> Result<Option<DetectionResult>, SessionError> {
    let frame = {
        let mut capture = ctx.capture.lock().await;
        capture.sample(ctx.config.jpeg_quality)
    };
    let Some(frame) = frame else {
        return Ok(None);
    };

    let raw = ctx.classifier.classify(frame).await?;
    Ok(Some(normalize(&raw)))
}

/// Publishes one successful detection: overlay redraw against the current
/// frame, history append, state update, event.
async fn apply_detection<C: PoseClassifier>(ctx: &LoopContext<C>, result: DetectionResult) {
    let current_frame = {
        let mut capture = ctx.capture.lock().await;
        capture.current_frame()
    };
    if let Some(frame) = current_frame {
        if let Some(canvas) = ctx.canvas.lock().await.as_mut() {
            renderer::render(canvas, &frame, &result);
        }
    }

    ctx.history.lock().await.push(HistoryEntry {
        pose_label: result.pose_label.clone(),
        confidence_percent: result.confidence_percent,
        timestamp: Utc::now(),
    });

    {
        let mut state = ctx.state.lock().await;
        state.detected_pose = Some(result.pose_label.clone());
        state.accuracy_percent = result.confidence_percent;
        state.feedback = result.feedback_lines.clone();
    }

    let _ = ctx.events.send(SessionEvent::DetectionUpdated(result));
}
