//! Buffering monitor
//!
//! Drives a file from "start buffering" to "ready to play": issues the
//! buffer request, then polls the file status once per second, feeding a
//! progress sink with percent, state label and rate until the daemon
//! reports the buffering window complete, the user cancels, or the
//! session timeout elapses.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::api::{DaemonClient, DaemonError};
use crate::models::{sizeof_fmt, FileStatus};
use crate::stream::rate::RateEstimator;

/// Progress presentation surface driven by the buffering loop.
///
/// The TUI backs this with a channel into the render loop; the CLI backs
/// it with an indicatif bar. Cancellation is polled, never pushed.
pub trait ProgressSink: Send {
    /// Present a progress update: percent complete plus a short and a
    /// detailed label.
    fn update(&mut self, percent: u8, title: &str, detail: &str);

    /// Whether the user asked to cancel the session
    fn is_cancelled(&self) -> bool;

    /// Dismiss the progress presentation (buffering finished)
    fn close(&mut self);
}

/// How a buffering session ended, errors aside.
///
/// Cancellation and timeout are normal early exits, not errors; only a
/// failed status fetch aborts the session with `DaemonError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferingOutcome {
    /// Buffering window complete; playback may start
    Ready,
    /// User cancelled through the progress sink
    Cancelled,
    /// Configured session timeout elapsed
    TimedOut,
}

/// Polling loop that supervises one buffering session.
pub struct BufferingMonitor {
    timeout: Duration,
    poll_interval: Duration,
}

impl BufferingMonitor {
    /// Create a monitor with the given session timeout. A zero timeout
    /// disables the deadline entirely.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Override the poll period (tests use a few milliseconds)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the session: request buffering, then poll until completion,
    /// cancellation or timeout. The sink is closed only on the ready path;
    /// a fetch failure propagates immediately and aborts the session.
    pub async fn run(
        &self,
        client: &DaemonClient,
        info_hash: &str,
        file_id: u64,
        sink: &mut dyn ProgressSink,
    ) -> Result<BufferingOutcome, DaemonError> {
        client.download_file(info_hash, file_id, true).await?;

        let start = Instant::now();
        let mut estimator = RateEstimator::new();

        loop {
            let status = client.file_status(info_hash, file_id).await?;
            if status.buffering_progress >= 100.0 {
                debug!(info_hash, file_id, "buffering complete");
                sink.close();
                return Ok(BufferingOutcome::Ready);
            }

            let rate = estimator.sample(Instant::now(), status.total_done);
            let (title, detail) = progress_labels(&status, rate);
            sink.update(status.buffering_progress as u8, &title, &detail);

            if sink.is_cancelled() {
                debug!(info_hash, file_id, "buffering cancelled by user");
                return Ok(BufferingOutcome::Cancelled);
            }
            if !self.timeout.is_zero() && start.elapsed() > self.timeout {
                debug!(info_hash, file_id, "buffering timed out");
                return Ok(BufferingOutcome::TimedOut);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Short and detailed progress labels for one poll tick
fn progress_labels(status: &FileStatus, rate: f64) -> (String, String) {
    let title = format!("{} - {:.2}%", status.state_label(), status.buffering_progress);
    let detail = format!(
        "{} of {} - {}/s",
        sizeof_fmt(status.total_done as f64),
        sizeof_fmt(status.total as f64),
        sizeof_fmt(rate)
    );
    (title, detail)
}
