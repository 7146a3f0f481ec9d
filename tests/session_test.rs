//! Streaming session tests
//!
//! Drives the buffering monitor against a mock daemon and the playback
//! supervisor / overlay controller against scripted fakes. Components run
//! with millisecond intervals here; production defaults are 1s / 0.5s /
//! 0.2s.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockito::{Matcher, Server, ServerGuard};
use tokio::time::sleep;

use swarmplay::api::{DaemonClient, DaemonError};
use swarmplay::stream::{
    AbortFlag, BufferingMonitor, BufferingOutcome, Overlay, OverlayController,
    PlaybackSupervisor, Player, PlayerError, PlayerEvents, ProgressSink, StatusText,
    StreamSession, TextOverlay,
};

// =============================================================================
// Fakes
// =============================================================================

/// Progress sink recording updates; can self-cancel after N updates
#[derive(Default)]
struct RecordingSink {
    updates: Vec<(u8, String, String)>,
    cancel_after: Option<usize>,
    closed: bool,
}

impl RecordingSink {
    fn cancelling_after(updates: usize) -> Self {
        Self {
            cancel_after: Some(updates),
            ..Self::default()
        }
    }
}

impl ProgressSink for RecordingSink {
    fn update(&mut self, percent: u8, title: &str, detail: &str) {
        self.updates
            .push((percent, title.to_string(), detail.to_string()));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after
            .map(|n| self.updates.len() >= n)
            .unwrap_or(false)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Discrete player state for one supervision tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeState {
    Inactive,
    Playing,
    Paused,
}

/// Player whose state follows a scripted timeline; each `is_active` call
/// advances one tick, and the timeline's last state repeats forever
struct FakePlayer {
    timeline: Vec<FakeState>,
    cursor: AtomicUsize,
    url: String,
}

impl FakePlayer {
    fn new(url: &str, timeline: Vec<FakeState>) -> Self {
        Self {
            timeline,
            cursor: AtomicUsize::new(0),
            url: url.to_string(),
        }
    }

    fn state_at(&self, index: usize) -> FakeState {
        self.timeline
            .get(index)
            .or_else(|| self.timeline.last())
            .copied()
            .unwrap_or(FakeState::Inactive)
    }

    /// State observed by the tick that last called `is_active`
    fn current(&self) -> FakeState {
        let cursor = self.cursor.load(Ordering::SeqCst);
        self.state_at(cursor.saturating_sub(1))
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn is_active(&self) -> bool {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.state_at(index) != FakeState::Inactive
    }

    async fn is_paused(&self) -> bool {
        self.current() == FakeState::Paused
    }

    async fn is_playing(&self) -> bool {
        self.current() == FakeState::Playing
    }

    async fn playing_file(&self) -> Option<String> {
        Some(self.url.clone())
    }
}

/// Event listener recording every fired hook in order
#[derive(Default)]
struct RecordingEvents {
    events: Vec<&'static str>,
}

#[async_trait]
impl PlayerEvents for RecordingEvents {
    async fn on_playback_started(&mut self) {
        self.events.push("started");
    }
    async fn on_playback_paused(&mut self) {
        self.events.push("paused");
    }
    async fn on_playback_resumed(&mut self) {
        self.events.push("resumed");
    }
    async fn on_playback_stopped(&mut self) {
        self.events.push("stopped");
    }
    async fn on_abort_requested(&mut self) {
        self.events.push("abort");
    }
}

/// Overlay recording show/hide calls and set texts
#[derive(Default)]
struct RecordingOverlay {
    shown: Mutex<bool>,
    calls: Mutex<Vec<&'static str>>,
    texts: Mutex<Vec<String>>,
}

impl RecordingOverlay {
    fn call_log(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn text_count(&self) -> usize {
        self.texts.lock().unwrap().len()
    }
}

impl Overlay for RecordingOverlay {
    fn show(&self) {
        *self.shown.lock().unwrap() = true;
        self.calls.lock().unwrap().push("show");
    }

    fn hide(&self) {
        *self.shown.lock().unwrap() = false;
        self.calls.lock().unwrap().push("hide");
    }

    fn set_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }

    fn is_shown(&self) -> bool {
        *self.shown.lock().unwrap()
    }
}

/// Status text source counting how often it was asked
#[derive(Default)]
struct CountingText {
    calls: AtomicUsize,
}

#[async_trait]
impl StatusText for CountingText {
    async fn status_text(&self) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Downloading (42.00%)\nD:1.00MB/s U:0.00B/s S:1/2 P:3/4\nmovie.mkv".to_string())
    }
}

// =============================================================================
// Mock daemon helpers
// =============================================================================

fn file_status_body(buffering_progress: f64, total_done: u64) -> String {
    format!(
        r#"{{"total": 700000000, "total_done": {}, "buffering_progress": {},
            "priority": 4, "progress": 10.0, "state": 3}}"#,
        total_done, buffering_progress
    )
}

/// Mock daemon kept alive for the duration of a test
struct MockDaemon {
    _server: ServerGuard,
    _mocks: Vec<mockito::Mock>,
}

/// Mock the buffer request plus a fixed file-status response
async fn mock_buffering_daemon(buffering_progress: f64) -> (MockDaemon, DaemonClient) {
    let mut server = Server::new_async().await;
    let download = server
        .mock("GET", "/torrents/abc/files/0/download")
        .match_query(Matcher::UrlEncoded("buffer".into(), "true".into()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let status = server
        .mock("GET", "/torrents/abc/files/0/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(file_status_body(buffering_progress, 140_000_000))
        .create_async()
        .await;
    let client = DaemonClient::with_base_url(server.url());
    (
        MockDaemon {
            _server: server,
            _mocks: vec![download, status],
        },
        client,
    )
}

fn fast_monitor(timeout: Duration) -> BufferingMonitor {
    BufferingMonitor::new(timeout).with_poll_interval(Duration::from_millis(5))
}

// =============================================================================
// Buffering Monitor
// =============================================================================

#[tokio::test]
async fn test_buffering_ready_on_first_poll_emits_no_updates() {
    let (_server, client) = mock_buffering_daemon(100.0).await;
    let mut sink = RecordingSink::default();

    let outcome = fast_monitor(Duration::from_secs(60))
        .run(&client, "abc", 0, &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, BufferingOutcome::Ready);
    assert!(sink.updates.is_empty());
    assert!(sink.closed);
}

#[tokio::test]
async fn test_buffering_cancellation_exits_without_closing() {
    let (_server, client) = mock_buffering_daemon(50.0).await;
    let mut sink = RecordingSink::cancelling_after(1);

    let outcome = fast_monitor(Duration::from_secs(60))
        .run(&client, "abc", 0, &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, BufferingOutcome::Cancelled);
    assert_eq!(sink.updates.len(), 1);
    assert!(!sink.closed);

    // The update carried the state label and formatted sizes
    let (percent, title, detail) = &sink.updates[0];
    assert_eq!(*percent, 50);
    assert!(title.starts_with("Downloading - 50.00%"), "got: {}", title);
    assert!(detail.contains("140.00MB of 700.00MB"), "got: {}", detail);
}

#[tokio::test]
async fn test_buffering_timeout_aborts_session() {
    let (_server, client) = mock_buffering_daemon(50.0).await;
    let mut sink = RecordingSink::default();

    let outcome = fast_monitor(Duration::from_millis(25))
        .run(&client, "abc", 0, &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, BufferingOutcome::TimedOut);
    assert!(!sink.updates.is_empty());
    assert!(!sink.closed);
}

#[tokio::test]
async fn test_buffering_zero_timeout_never_expires() {
    let (_server, client) = mock_buffering_daemon(50.0).await;
    // With the timeout disabled the session keeps polling well past any
    // tiny deadline; cancellation is what finally ends it
    let mut sink = RecordingSink::cancelling_after(4);

    let outcome = fast_monitor(Duration::ZERO)
        .run(&client, "abc", 0, &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, BufferingOutcome::Cancelled);
    assert_eq!(sink.updates.len(), 4);
}

#[tokio::test]
async fn test_buffering_fetch_error_propagates() {
    let mut server = Server::new_async().await;
    let _download = server
        .mock("GET", "/torrents/abc/files/0/download")
        .match_query(Matcher::UrlEncoded("buffer".into(), "true".into()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/torrents/abc/files/0/status")
        .with_status(500)
        .with_body(r#"{"error": "session exploded"}"#)
        .create_async()
        .await;

    let client = DaemonClient::with_base_url(server.url());
    let mut sink = RecordingSink::default();

    let result = fast_monitor(Duration::from_secs(60))
        .run(&client, "abc", 0, &mut sink)
        .await;

    match result {
        Err(DaemonError::Remote(msg)) => assert_eq!(msg, "session exploded"),
        other => panic!("expected Remote error, got {:?}", other),
    }
}

// =============================================================================
// Playback Supervisor
// =============================================================================

fn fast_supervisor() -> PlaybackSupervisor {
    PlaybackSupervisor::new().with_intervals(Duration::from_millis(1), Duration::from_millis(1))
}

#[tokio::test]
async fn test_full_lifecycle_fires_each_transition_once() {
    use FakeState::*;
    let player = FakePlayer::new(
        "http://daemon/serve",
        vec![Inactive, Playing, Playing, Paused, Paused, Playing, Inactive],
    );
    let mut events = RecordingEvents::default();

    fast_supervisor()
        .handle_events(
            &player,
            Some("http://daemon/serve"),
            &mut events,
            &AbortFlag::new(),
        )
        .await
        .unwrap();

    // Two consecutive Paused ticks fire a single paused event
    assert_eq!(
        events.events,
        vec!["started", "resumed", "paused", "resumed", "stopped"]
    );
}

#[tokio::test]
async fn test_started_fires_before_any_other_event() {
    use FakeState::*;
    let player = FakePlayer::new("u", vec![Playing, Paused, Inactive]);
    let mut events = RecordingEvents::default();

    fast_supervisor()
        .handle_events(&player, Some("u"), &mut events, &AbortFlag::new())
        .await
        .unwrap();

    assert_eq!(events.events.first(), Some(&"started"));
    assert_eq!(events.events.iter().filter(|e| **e == "started").count(), 1);
}

#[tokio::test]
async fn test_start_wait_timeout() {
    use FakeState::*;
    let player = FakePlayer::new("u", vec![Inactive]);
    let mut events = RecordingEvents::default();

    let result = fast_supervisor()
        .with_start_timeout(Duration::from_millis(20))
        .handle_events(&player, Some("u"), &mut events, &AbortFlag::new())
        .await;

    assert!(matches!(result, Err(PlayerError::StartTimeout(_))));
    assert!(events.events.is_empty());
}

#[tokio::test]
async fn test_abort_during_start_wait_returns_silently() {
    use FakeState::*;
    let player = FakePlayer::new("u", vec![Inactive]);
    let mut events = RecordingEvents::default();
    let abort = AbortFlag::new();
    abort.set();

    fast_supervisor()
        .handle_events(&player, Some("u"), &mut events, &abort)
        .await
        .unwrap();

    assert!(events.events.is_empty());
}

#[tokio::test]
async fn test_abort_during_playback_skips_stop_path() {
    use FakeState::*;
    let player = FakePlayer::new("u", vec![Playing]);
    let mut events = RecordingEvents::default();
    let abort = AbortFlag::new();
    abort.set();

    fast_supervisor()
        .handle_events(&player, Some("u"), &mut events, &abort)
        .await
        .unwrap();

    assert_eq!(events.events.last(), Some(&"abort"));
    assert!(!events.events.contains(&"stopped"));
}

#[tokio::test]
async fn test_url_mismatch_aborts_before_started() {
    use FakeState::*;
    let player = FakePlayer::new("http://daemon/other-file", vec![Playing]);
    let mut events = RecordingEvents::default();

    fast_supervisor()
        .handle_events(
            &player,
            Some("http://daemon/expected-file"),
            &mut events,
            &AbortFlag::new(),
        )
        .await
        .unwrap();

    assert!(events.events.is_empty());
}

// =============================================================================
// Overlay Controller
// =============================================================================

#[tokio::test]
async fn test_overlay_without_text_handler_does_nothing() {
    let overlay = Arc::new(RecordingOverlay::default());
    let mut controller = OverlayController::new(overlay.clone(), None)
        .with_refresh_interval(Duration::from_millis(2));

    controller.on_playback_started().await;
    controller.on_playback_paused().await;
    controller.on_playback_resumed().await;
    sleep(Duration::from_millis(20)).await;

    assert!(overlay.call_log().is_empty());
    assert_eq!(overlay.text_count(), 0);
}

#[tokio::test]
async fn test_pause_shows_overlay_and_refreshes_immediately() {
    let overlay = Arc::new(RecordingOverlay::default());
    let text = Arc::new(CountingText::default());
    // Hour-long refresh period isolates the immediate on-pause refresh
    let mut controller = OverlayController::new(overlay.clone(), Some(text.clone()))
        .with_refresh_interval(Duration::from_secs(3600));

    controller.on_playback_started().await;
    controller.on_playback_paused().await;

    assert_eq!(overlay.call_log(), vec!["show"]);
    assert_eq!(overlay.text_count(), 1);
    assert_eq!(text.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_background_loop_refreshes_only_while_shown() {
    let overlay = Arc::new(RecordingOverlay::default());
    let text = Arc::new(CountingText::default());
    let mut controller = OverlayController::new(overlay.clone(), Some(text.clone()))
        .with_refresh_interval(Duration::from_millis(2));

    controller.on_playback_started().await;
    sleep(Duration::from_millis(25)).await;
    // Hidden: the loop ticks but never refreshes
    assert_eq!(overlay.text_count(), 0);

    controller.on_playback_paused().await;
    sleep(Duration::from_millis(25)).await;
    let while_shown = overlay.text_count();
    assert!(while_shown > 1, "expected background refreshes, got {}", while_shown);

    controller.on_playback_resumed().await;
    sleep(Duration::from_millis(10)).await;
    let after_hide = overlay.text_count();
    sleep(Duration::from_millis(25)).await;
    assert_eq!(overlay.text_count(), after_hide);
}

#[tokio::test]
async fn test_stop_ends_background_loop_and_hides() {
    let overlay = Arc::new(RecordingOverlay::default());
    let text = Arc::new(CountingText::default());
    let mut controller = OverlayController::new(overlay.clone(), Some(text.clone()))
        .with_refresh_interval(Duration::from_millis(2));

    controller.on_playback_started().await;
    controller.on_playback_paused().await;
    controller.on_playback_stopped().await;
    assert!(!overlay.is_shown());

    // Give any in-flight tick time to drain, then confirm the loop is dead
    sleep(Duration::from_millis(15)).await;
    let settled = overlay.text_count();
    sleep(Duration::from_millis(25)).await;
    assert_eq!(overlay.text_count(), settled);
}

#[tokio::test]
async fn test_abort_behaves_like_stop() {
    let overlay = Arc::new(RecordingOverlay::default());
    let text = Arc::new(CountingText::default());
    let mut controller = OverlayController::new(overlay.clone(), Some(text.clone()))
        .with_refresh_interval(Duration::from_millis(2));

    controller.on_playback_started().await;
    controller.on_playback_paused().await;
    controller.on_abort_requested().await;

    assert!(!overlay.is_shown());
    assert_eq!(overlay.call_log().last(), Some(&"hide"));
}

// =============================================================================
// Session Orchestration
// =============================================================================

const MISSING_PLAYER: &str = "swarmplay-test-missing-player";

fn test_session(client: DaemonClient) -> StreamSession {
    StreamSession::new(
        Arc::new(client),
        Arc::new(TextOverlay::new()),
        AbortFlag::new(),
    )
    .with_player_binary(MISSING_PLAYER)
}

#[tokio::test]
async fn test_cancelled_session_never_starts_playback() {
    let (_server, client) = mock_buffering_daemon(50.0).await;
    let mut sink = RecordingSink::cancelling_after(1);
    let notices = AtomicUsize::new(0);
    let notify = |_: &str| {
        notices.fetch_add(1, Ordering::SeqCst);
    };

    // The player binary does not exist; reaching playback would error
    test_session(client)
        .buffer_and_play("abc", 0, "movie.mkv", 60, &mut sink, &notify)
        .await
        .unwrap();

    assert_eq!(notices.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timed_out_session_notifies_once_and_skips_playback() {
    let (_server, client) = mock_buffering_daemon(50.0).await;
    let mut sink = RecordingSink::default();
    let notices = AtomicUsize::new(0);
    let notify = |_: &str| {
        notices.fetch_add(1, Ordering::SeqCst);
    };

    // 1s timeout with the default 1s poll period expires on the second tick
    test_session(client)
        .buffer_and_play("abc", 0, "movie.mkv", 1, &mut sink, &notify)
        .await
        .unwrap();

    assert_eq!(notices.load(Ordering::SeqCst), 1);
    assert!(!sink.closed);
}

#[tokio::test]
async fn test_ready_session_hands_off_to_playback() {
    let (_server, client) = mock_buffering_daemon(100.0).await;
    let mut sink = RecordingSink::default();
    let notify = |_: &str| {};

    // Buffering completes and the session tries to spawn the (missing)
    // player, which is exactly the handoff point
    let result = test_session(client)
        .buffer_and_play("abc", 0, "movie.mkv", 60, &mut sink, &notify)
        .await;

    assert!(sink.closed);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("not found"), "got: {}", err);
}
