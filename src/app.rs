//! App state and core application logic
//!
//! Manages the screen state machine and keyboard handling for the TUI.
//! Key handling only mutates state and returns an `Action`; the event
//! loop in `main` owns the daemon client and spawns the async work, so
//! this module stays synchronous and testable.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::models::{Torrent, TorrentFile};
use crate::stream::{AbortFlag, ProgressSink, TextOverlay};

// =============================================================================
// Screens
// =============================================================================

/// Current screen of the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Torrent list (entry screen)
    #[default]
    Torrents,
    /// Files of the selected torrent
    Files,
    /// Magnet URI input
    AddMagnet,
    /// Buffering progress / now playing
    Transfer,
}

/// Current input mode for keyboard handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

// =============================================================================
// Async Events and Actions
// =============================================================================

/// Messages sent from background tasks to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    TorrentsLoaded(Vec<Torrent>),
    FilesLoaded(Vec<TorrentFile>),
    BufferProgress {
        percent: u8,
        title: String,
        detail: String,
    },
    /// Buffering finished; playback is starting
    BufferClosed,
    /// The streaming session ended (stop, cancel, timeout or abort)
    SessionEnded,
    Notice(String),
    Error(String),
}

/// Work the event loop must perform in response to a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    LoadTorrents,
    LoadFiles(String),
    AddMagnet(String),
    PauseTorrent(String),
    ResumeTorrent(String),
    DownloadTorrent(String),
    StopTorrent(String),
    RemoveTorrent(String),
    DownloadFile(String, u64),
    StopFile(String, u64),
    Play {
        info_hash: String,
        file_id: u64,
        name: String,
    },
}

// =============================================================================
// List Selection State
// =============================================================================

/// Selection state for list views. Windowing is computed at render time
/// from the selected index, so only selection and length live here.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub selected: usize,
    pub len: usize,
}

impl ListState {
    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update length, clamping the selection into range
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Transfer State
// =============================================================================

/// Phase of the transfer screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Buffering,
    Playing,
}

/// State backing the buffering/now-playing screen
#[derive(Debug, Clone)]
pub struct TransferState {
    pub phase: TransferPhase,
    pub display_name: String,
    pub percent: u8,
    pub title: String,
    pub detail: String,
}

impl TransferState {
    fn new(display_name: String) -> Self {
        Self {
            phase: TransferPhase::Buffering,
            display_name,
            percent: 0,
            title: String::new(),
            detail: String::new(),
        }
    }
}

// =============================================================================
// Channel Progress Sink
// =============================================================================

/// Progress sink that forwards buffering updates into the UI loop. The
/// Esc key flips the shared flag, observed here as cancellation.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AppEvent>,
    cancelled: AbortFlag,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>, cancelled: AbortFlag) -> Self {
        Self { tx, cancelled }
    }
}

impl ProgressSink for ChannelSink {
    fn update(&mut self, percent: u8, title: &str, detail: &str) {
        let _ = self.tx.send(AppEvent::BufferProgress {
            percent,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.is_set()
    }

    fn close(&mut self) {
        let _ = self.tx.send(AppEvent::BufferClosed);
    }
}

// =============================================================================
// App
// =============================================================================

/// Top-level TUI state
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    pub torrents: Vec<Torrent>,
    pub torrents_list: ListState,

    pub files: Vec<TorrentFile>,
    pub files_list: ListState,
    pub current_torrent: Option<Torrent>,

    pub magnet_input: String,

    pub transfer: Option<TransferState>,
    /// Cancellation for the in-flight buffering session (Esc)
    pub session_cancel: Option<AbortFlag>,
    /// Abort for the in-flight playback session (quit / Esc while playing)
    pub session_abort: Option<AbortFlag>,
    /// Overlay rendered on the playing screen while paused
    pub overlay: Arc<TextOverlay>,

    pub notice: Option<String>,
    pub error: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            screen: Screen::Torrents,
            input_mode: InputMode::Normal,
            torrents: Vec::new(),
            torrents_list: ListState::default(),
            files: Vec::new(),
            files_list: ListState::default(),
            current_torrent: None,
            magnet_input: String::new(),
            transfer: None,
            session_cancel: None,
            session_abort: None,
            overlay: Arc::new(TextOverlay::new()),
            notice: None,
            error: None,
        }
    }

    /// Currently selected torrent, if any
    pub fn selected_torrent(&self) -> Option<&Torrent> {
        self.torrents.get(self.torrents_list.selected)
    }

    /// Currently selected file, if any
    pub fn selected_file(&self) -> Option<&TorrentFile> {
        self.files.get(self.files_list.selected)
    }

    // -------------------------------------------------------------------------
    // Async event handling
    // -------------------------------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TorrentsLoaded(torrents) => {
                self.torrents_list.set_len(torrents.len());
                self.torrents = torrents;
            }
            AppEvent::FilesLoaded(files) => {
                self.files_list.set_len(files.len());
                self.files = files;
                self.screen = Screen::Files;
            }
            AppEvent::BufferProgress {
                percent,
                title,
                detail,
            } => {
                if let Some(transfer) = &mut self.transfer {
                    transfer.percent = percent;
                    transfer.title = title;
                    transfer.detail = detail;
                }
            }
            AppEvent::BufferClosed => {
                if let Some(transfer) = &mut self.transfer {
                    transfer.phase = TransferPhase::Playing;
                }
            }
            AppEvent::SessionEnded => {
                self.transfer = None;
                self.session_cancel = None;
                self.session_abort = None;
                if self.screen == Screen::Transfer {
                    self.screen = Screen::Files;
                }
            }
            AppEvent::Notice(msg) => self.notice = Some(msg),
            AppEvent::Error(msg) => self.error = Some(msg),
        }
    }

    // -------------------------------------------------------------------------
    // Key handling
    // -------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.quit();
        }

        // Any key clears a pending notice/error popup first
        if self.error.take().is_some() || self.notice.take().is_some() {
            return Action::None;
        }

        if self.input_mode == InputMode::Editing {
            return self.handle_editing_key(key);
        }

        match self.screen {
            Screen::Torrents => self.handle_torrents_key(key),
            Screen::Files => self.handle_files_key(key),
            Screen::AddMagnet => Action::None,
            Screen::Transfer => self.handle_transfer_key(key),
        }
    }

    fn handle_torrents_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.torrents_list.up();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.torrents_list.down();
                Action::None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.torrents_list.first();
                Action::None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.torrents_list.last();
                Action::None
            }
            KeyCode::Char('a') => {
                self.screen = Screen::AddMagnet;
                self.input_mode = InputMode::Editing;
                self.magnet_input.clear();
                Action::None
            }
            KeyCode::Char('R') => Action::LoadTorrents,
            KeyCode::Enter => match self.selected_torrent().cloned() {
                Some(torrent) => {
                    let info_hash = torrent.info_hash.clone();
                    self.current_torrent = Some(torrent);
                    Action::LoadFiles(info_hash)
                }
                None => Action::None,
            },
            KeyCode::Char('p') => self.torrent_action(Action::PauseTorrent),
            KeyCode::Char('r') => self.torrent_action(Action::ResumeTorrent),
            KeyCode::Char('d') => self.torrent_action(Action::DownloadTorrent),
            KeyCode::Char('s') => self.torrent_action(Action::StopTorrent),
            KeyCode::Char('x') => self.torrent_action(Action::RemoveTorrent),
            _ => Action::None,
        }
    }

    fn torrent_action(&self, make: fn(String) -> Action) -> Action {
        match self.selected_torrent() {
            Some(torrent) => make(torrent.info_hash.clone()),
            None => Action::None,
        }
    }

    fn handle_files_key(&mut self, key: KeyEvent) -> Action {
        let info_hash = match &self.current_torrent {
            Some(t) => t.info_hash.clone(),
            None => return Action::None,
        };
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Esc => {
                self.screen = Screen::Torrents;
                Action::LoadTorrents
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.files_list.up();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.files_list.down();
                Action::None
            }
            KeyCode::Char('d') => match self.selected_file() {
                Some(file) => Action::DownloadFile(info_hash, file.id),
                None => Action::None,
            },
            KeyCode::Char('s') => match self.selected_file() {
                Some(file) => Action::StopFile(info_hash, file.id),
                None => Action::None,
            },
            KeyCode::Enter => match self.selected_file() {
                Some(file) if file.media_kind().is_playable() => {
                    let name = file.name.clone();
                    let file_id = file.id;
                    self.transfer = Some(TransferState::new(name.clone()));
                    self.screen = Screen::Transfer;
                    Action::Play {
                        info_hash,
                        file_id,
                        name,
                    }
                }
                Some(_) => {
                    self.notice = Some("Not a playable file".to_string());
                    Action::None
                }
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    fn handle_transfer_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                // Cancel during buffering, abort during playback
                match self.transfer.as_ref().map(|t| t.phase) {
                    Some(TransferPhase::Buffering) => {
                        if let Some(cancel) = &self.session_cancel {
                            cancel.set();
                        }
                    }
                    Some(TransferPhase::Playing) | None => {
                        if let Some(abort) = &self.session_abort {
                            abort.set();
                        }
                    }
                }
                Action::None
            }
            KeyCode::Char('q') => self.quit(),
            _ => Action::None,
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.screen = Screen::Torrents;
                Action::None
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.screen = Screen::Torrents;
                let uri = self.magnet_input.trim().to_string();
                if uri.is_empty() {
                    Action::None
                } else {
                    Action::AddMagnet(uri)
                }
            }
            KeyCode::Backspace => {
                self.magnet_input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                self.magnet_input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn quit(&mut self) -> Action {
        self.running = false;
        if let Some(cancel) = &self.session_cancel {
            cancel.set();
        }
        if let Some(abort) = &self.session_abort {
            abort.set();
        }
        Action::Quit
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn torrent(info_hash: &str, name: &str) -> Torrent {
        Torrent {
            info_hash: info_hash.to_string(),
            name: name.to_string(),
            size: 1000,
            status: None,
        }
    }

    fn video_file(id: u64, name: &str) -> TorrentFile {
        TorrentFile {
            id,
            length: 1000,
            name: name.to_string(),
            path: name.to_string(),
            status: None,
        }
    }

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::default();
        list.set_len(3);
        assert_eq!(list.selected, 0);
        list.down();
        list.down();
        assert_eq!(list.selected, 2);
        list.down();
        assert_eq!(list.selected, 2);
        list.up();
        assert_eq!(list.selected, 1);
    }

    #[test]
    fn test_list_state_clamps_on_shrink() {
        let mut list = ListState::default();
        list.set_len(5);
        list.last();
        assert_eq!(list.selected, 4);
        list.set_len(2);
        assert_eq!(list.selected, 1);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_enter_on_torrent_loads_files() {
        let mut app = App::new();
        app.handle_event(AppEvent::TorrentsLoaded(vec![torrent("abc", "Some")]));
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Action::LoadFiles("abc".to_string()));
    }

    #[test]
    fn test_enter_on_playable_file_starts_transfer() {
        let mut app = App::new();
        app.current_torrent = Some(torrent("abc", "Some"));
        app.screen = Screen::Files;
        app.handle_event(AppEvent::FilesLoaded(vec![video_file(0, "movie.mkv")]));

        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Action::Play {
                info_hash: "abc".to_string(),
                file_id: 0,
                name: "movie.mkv".to_string(),
            }
        );
        assert_eq!(app.screen, Screen::Transfer);
        assert!(app.transfer.is_some());
    }

    #[test]
    fn test_enter_on_unplayable_file_shows_notice() {
        let mut app = App::new();
        app.current_torrent = Some(torrent("abc", "Some"));
        app.screen = Screen::Files;
        app.handle_event(AppEvent::FilesLoaded(vec![video_file(0, "notes.txt")]));

        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Action::None);
        assert!(app.notice.is_some());
        assert_eq!(app.screen, Screen::Files);
    }

    #[test]
    fn test_escape_during_buffering_sets_cancel_flag() {
        let mut app = App::new();
        app.screen = Screen::Transfer;
        app.transfer = Some(TransferState::new("movie.mkv".to_string()));
        let cancel = AbortFlag::new();
        app.session_cancel = Some(cancel.clone());

        app.handle_key(key(KeyCode::Esc));
        assert!(cancel.is_set());
    }

    #[test]
    fn test_escape_during_playback_sets_abort_flag() {
        let mut app = App::new();
        app.screen = Screen::Transfer;
        let mut transfer = TransferState::new("movie.mkv".to_string());
        transfer.phase = TransferPhase::Playing;
        app.transfer = Some(transfer);
        let abort = AbortFlag::new();
        app.session_abort = Some(abort.clone());

        app.handle_key(key(KeyCode::Esc));
        assert!(abort.is_set());
    }

    #[test]
    fn test_session_ended_returns_to_files() {
        let mut app = App::new();
        app.screen = Screen::Transfer;
        app.transfer = Some(TransferState::new("movie.mkv".to_string()));
        app.handle_event(AppEvent::SessionEnded);
        assert_eq!(app.screen, Screen::Files);
        assert!(app.transfer.is_none());
    }

    #[test]
    fn test_magnet_input_flow() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.screen, Screen::AddMagnet);
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "magnet:?xt=abc".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Action::AddMagnet("magnet:?xt=abc".to_string()));
        assert_eq!(app.screen, Screen::Torrents);
    }

    #[test]
    fn test_quit_sets_session_flags() {
        let mut app = App::new();
        let cancel = AbortFlag::new();
        let abort = AbortFlag::new();
        app.session_cancel = Some(cancel.clone());
        app.session_abort = Some(abort.clone());

        let action = app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(action, Action::Quit);
        assert!(!app.running);
        assert!(cancel.is_set());
        assert!(abort.is_set());
    }

    #[test]
    fn test_channel_sink_forwards_updates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx, AbortFlag::new());
        sink.update(42, "Downloading - 42.00%", "1.00MB of 2.00MB - 500.00kB/s");
        sink.close();

        match rx.try_recv().unwrap() {
            AppEvent::BufferProgress { percent, .. } => assert_eq!(percent, 42),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(rx.try_recv().unwrap(), AppEvent::BufferClosed));
    }
}
