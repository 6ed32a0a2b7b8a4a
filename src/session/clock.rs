use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::session::{SessionState, SessionStatus};

use super::controller::SessionEvent;

/// Elapsed-time ticker. Independent of the sampling scheduler: it keeps
/// counting across transient inference errors and only ends with the
/// session itself.
pub(crate) async fn clock_loop(
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let elapsed = {
                    let mut guard = state.lock().await;
                    if guard.status != SessionStatus::Streaming {
                        break;
                    }
                    guard.sync_elapsed_from_anchor();
                    guard.elapsed_seconds
                };
                let _ = events.send(SessionEvent::ClockTick {
                    elapsed_seconds: elapsed,
                    display: format_elapsed(elapsed),
                });
            }
            _ = cancel_token.cancelled() => {
                info!("session clock shutting down");
                break;
            }
        }
    }
}

/// `MM:SS`, zero-padded; minutes are not capped at 59.
pub fn format_elapsed(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(5), "00:05");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[test]
    fn minutes_run_past_an_hour() {
        assert_eq!(format_elapsed(3750), "62:30");
    }
}
