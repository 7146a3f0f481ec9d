//! Playback supervision
//!
//! Watches a live player expected to be playing a known URL and fires
//! lifecycle hooks exactly once per state transition, until playback ends
//! naturally or the host requests an abort.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

// =============================================================================
// Capability Traits
// =============================================================================

/// Minimal view of a media player needed for supervision.
///
/// Implemented by the mpv adapter; tests use scripted fakes.
#[async_trait]
pub trait Player: Send + Sync {
    /// Player holds an active playback session (playing or paused)
    async fn is_active(&self) -> bool;

    async fn is_paused(&self) -> bool;

    async fn is_playing(&self) -> bool;

    /// URL/path of the resource currently loaded, if any
    async fn playing_file(&self) -> Option<String>;
}

/// Lifecycle hooks fired by the supervisor. All default to no-ops so
/// listeners implement only what they care about.
#[async_trait]
pub trait PlayerEvents: Send {
    async fn on_playback_started(&mut self) {}
    async fn on_playback_paused(&mut self) {}
    async fn on_playback_resumed(&mut self) {}
    async fn on_playback_stopped(&mut self) {}
    async fn on_abort_requested(&mut self) {}
}

// =============================================================================
// Abort Signal
// =============================================================================

/// Host-level abort signal, polled by the supervision loops every tick.
///
/// Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Supervisor
// =============================================================================

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("playback did not start within {0} seconds")]
    StartTimeout(u64),
}

/// Last discrete event fired, kept to avoid duplicate callbacks for a
/// sustained state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastEvent {
    Paused,
    Playing,
}

/// Event loop supervising one playback session.
pub struct PlaybackSupervisor {
    start_timeout: Duration,
    start_poll_interval: Duration,
    event_interval: Duration,
}

impl Default for PlaybackSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSupervisor {
    pub fn new() -> Self {
        Self {
            start_timeout: Duration::from_secs(60),
            start_poll_interval: Duration::from_millis(500),
            event_interval: Duration::from_millis(200),
        }
    }

    /// Override the start-wait timeout. Zero disables the deadline.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Override the poll periods (tests use a few milliseconds)
    pub fn with_intervals(mut self, start_poll: Duration, event: Duration) -> Self {
        self.start_poll_interval = start_poll;
        self.event_interval = event;
        self
    }

    /// Supervise a playback session.
    ///
    /// Waits for the player to become active, verifies it picked up
    /// `expected_url`, then fires lifecycle hooks on `events` until the
    /// player goes inactive or `abort` is set. Pause is evaluated before
    /// play on every tick, and a hook fires only when the observed state
    /// differs from the last fired event.
    pub async fn handle_events(
        &self,
        player: &dyn Player,
        expected_url: Option<&str>,
        events: &mut dyn PlayerEvents,
        abort: &AbortFlag,
    ) -> Result<(), PlayerError> {
        let start = Instant::now();
        while !player.is_active().await {
            if !self.start_timeout.is_zero() && start.elapsed() > self.start_timeout {
                return Err(PlayerError::StartTimeout(self.start_timeout.as_secs()));
            }
            if abort.is_set() {
                debug!("abort requested while waiting for playback start");
                return Ok(());
            }
            tokio::time::sleep(self.start_poll_interval).await;
        }

        if let Some(expected) = expected_url {
            let playing = player.playing_file().await;
            if playing.as_deref() != Some(expected) {
                warn!(
                    expected,
                    playing = playing.as_deref().unwrap_or("<none>"),
                    "active playback does not match the expected url, aborting"
                );
                return Ok(());
            }
        }

        debug!("calling on_playback_started");
        events.on_playback_started().await;

        let mut current: Option<LastEvent> = None;
        while player.is_active().await {
            if player.is_paused().await {
                if current != Some(LastEvent::Paused) {
                    current = Some(LastEvent::Paused);
                    debug!("calling on_playback_paused");
                    events.on_playback_paused().await;
                }
            } else if player.is_playing().await && current != Some(LastEvent::Playing) {
                current = Some(LastEvent::Playing);
                debug!("calling on_playback_resumed");
                events.on_playback_resumed().await;
            }

            if abort.is_set() {
                debug!("abort requested during playback");
                events.on_abort_requested().await;
                return Ok(());
            }
            tokio::time::sleep(self.event_interval).await;
        }

        debug!("calling on_playback_stopped");
        events.on_playback_stopped().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_flag_is_shared_between_clones() {
        let flag = AbortFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_set());
        flag.set();
        assert!(clone.is_set());
    }
}
