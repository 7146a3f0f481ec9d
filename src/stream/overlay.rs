//! Paused-playback status overlay
//!
//! While playback is paused the UI shows a small text overlay with live
//! torrent status. A background task refreshes the text once per second,
//! but only while the overlay is visible; pausing forces an immediate
//! refresh so the user never stares at stale numbers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::stream::playback::PlayerEvents;

// =============================================================================
// Capability Traits
// =============================================================================

/// On-screen text overlay: visibility plus a single text slot.
pub trait Overlay: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn set_text(&self, text: &str);
    fn is_shown(&self) -> bool;
}

/// Producer of the live status text. The implementation performs a fresh
/// status fetch per call and formats the multi-line summary.
#[async_trait]
pub trait StatusText: Send + Sync {
    async fn status_text(&self) -> anyhow::Result<String>;
}

// =============================================================================
// TextOverlay
// =============================================================================

/// Shared overlay state rendered by the TUI's playing screen.
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    pub shown: bool,
    pub text: String,
}

/// Mutex-guarded overlay implementation. The supervisor thread writes
/// show/hide and the refresh task writes text; one tick of staleness is
/// tolerable, so a plain mutex is enough.
#[derive(Debug, Default)]
pub struct TextOverlay {
    state: Mutex<OverlayState>,
}

impl TextOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> OverlayState {
        self.state.lock().expect("overlay state poisoned").clone()
    }
}

impl Overlay for TextOverlay {
    fn show(&self) {
        self.state.lock().expect("overlay state poisoned").shown = true;
    }

    fn hide(&self) {
        self.state.lock().expect("overlay state poisoned").shown = false;
    }

    fn set_text(&self, text: &str) {
        self.state.lock().expect("overlay state poisoned").text = text.to_string();
    }

    fn is_shown(&self) -> bool {
        self.state.lock().expect("overlay state poisoned").shown
    }
}

// =============================================================================
// OverlayController
// =============================================================================

/// Playback-event listener that keeps the overlay in sync with the pause
/// state. With no text handler configured (overlay disabled by the user)
/// every hook is a no-op and the refresh task never starts.
pub struct OverlayController {
    overlay: Arc<dyn Overlay>,
    text_handler: Option<Arc<dyn StatusText>>,
    stopped: Arc<AtomicBool>,
    refresh_interval: Duration,
}

impl OverlayController {
    pub fn new(overlay: Arc<dyn Overlay>, text_handler: Option<Arc<dyn StatusText>>) -> Self {
        Self {
            overlay,
            text_handler,
            stopped: Arc::new(AtomicBool::new(false)),
            refresh_interval: Duration::from_secs(1),
        }
    }

    /// Override the background refresh period (tests use milliseconds)
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// Recompute and set the overlay text; failures are logged and skipped so
/// the refresh loop survives transient daemon errors.
async fn refresh_text(overlay: &Arc<dyn Overlay>, handler: &Arc<dyn StatusText>) {
    match handler.status_text().await {
        Ok(text) => overlay.set_text(&text),
        Err(e) => warn!(error = %e, "status overlay refresh failed"),
    }
}

#[async_trait]
impl PlayerEvents for OverlayController {
    async fn on_playback_started(&mut self) {
        let Some(handler) = self.text_handler.clone() else {
            return;
        };
        let overlay = self.overlay.clone();
        let stopped = self.stopped.clone();
        let interval = self.refresh_interval;
        tokio::spawn(async move {
            while !stopped.load(Ordering::SeqCst) {
                if overlay.is_shown() {
                    refresh_text(&overlay, &handler).await;
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    async fn on_playback_paused(&mut self) {
        let Some(handler) = self.text_handler.clone() else {
            return;
        };
        self.overlay.show();
        // Immediate refresh, without waiting for the next background tick
        refresh_text(&self.overlay, &handler).await;
    }

    async fn on_playback_resumed(&mut self) {
        if self.text_handler.is_some() {
            self.overlay.hide();
        }
    }

    async fn on_playback_stopped(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.on_playback_resumed().await;
    }

    async fn on_abort_requested(&mut self) {
        self.on_playback_stopped().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_overlay_visibility() {
        let overlay = TextOverlay::new();
        assert!(!overlay.is_shown());
        overlay.show();
        assert!(overlay.is_shown());
        overlay.hide();
        assert!(!overlay.is_shown());
    }

    #[test]
    fn test_text_overlay_snapshot() {
        let overlay = TextOverlay::new();
        overlay.show();
        overlay.set_text("Downloading (42.00%)");
        let state = overlay.snapshot();
        assert!(state.shown);
        assert_eq!(state.text, "Downloading (42.00%)");
    }
}
