//! swarmplay - terminal client for a local torrent-streaming daemon
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! swarmplay
//!
//! # CLI mode (for automation)
//! swarmplay add "magnet:?xt=urn:btih:..."
//! swarmplay torrents --json
//! swarmplay play <info-hash> <file-id>
//! ```

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use swarmplay::api::DaemonClient;
use swarmplay::app::{Action, App, AppEvent, ChannelSink, InputMode, Screen};
use swarmplay::cli::{Cli, Command, ExitCode, Output};
use swarmplay::commands::{self, TorrentAction};
use swarmplay::config::Config;
use swarmplay::stream::{AbortFlag, Overlay, StreamSession};
use swarmplay::ui::{self, Theme};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr and stay silent unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    if cli.is_cli_mode() {
        let exit_code = run_cli(cli, config).await;
        std::process::exit(exit_code.into());
    } else {
        run_tui(cli, config).await
    }
}

/// Build the daemon client from config plus CLI overrides
fn make_client(cli: &Cli, config: &Config) -> DaemonClient {
    let host = cli.host.as_deref().unwrap_or(&config.daemon_host);
    let port = cli.port.unwrap_or(config.daemon_port);
    DaemonClient::new(host, port)
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config) -> ExitCode {
    let output = Output::new(&cli);
    let client = make_client(&cli, &config);

    match cli.command {
        Some(Command::Add(cmd)) => commands::add_cmd(cmd, &client, &output).await,
        Some(Command::Torrents(cmd)) => commands::torrents_cmd(cmd, &client, &output).await,
        Some(Command::Files(cmd)) => commands::files_cmd(cmd, &client, &output).await,
        Some(Command::Pause(cmd)) => {
            commands::torrent_action_cmd(TorrentAction::Pause, cmd, &client, &output).await
        }
        Some(Command::Resume(cmd)) => {
            commands::torrent_action_cmd(TorrentAction::Resume, cmd, &client, &output).await
        }
        Some(Command::Download(cmd)) => {
            commands::torrent_action_cmd(TorrentAction::Download, cmd, &client, &output).await
        }
        Some(Command::Stop(cmd)) => {
            commands::torrent_action_cmd(TorrentAction::Stop, cmd, &client, &output).await
        }
        Some(Command::Remove(cmd)) => commands::remove_cmd(cmd, &client, &output).await,
        Some(Command::Status(cmd)) => commands::status_cmd(cmd, &client, &output).await,
        Some(Command::FileDownload(cmd)) => {
            commands::file_download_cmd(cmd, &client, &output).await
        }
        Some(Command::FileStop(cmd)) => commands::file_stop_cmd(cmd, &client, &output).await,
        Some(Command::Play(cmd)) => commands::play_cmd(cmd, client, &config, &output).await,
        Some(Command::Url(cmd)) => commands::url_cmd(cmd, &client, &output),
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive TUI
async fn run_tui(cli: Cli, config: Config) -> Result<()> {
    let mut terminal = init_terminal()?;

    let client = Arc::new(make_client(&cli, &config));
    let mut app = App::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Populate the torrent list right away
    dispatch(Action::LoadTorrents, &client, &config, &mut app, &tx);

    let result = run_event_loop(&mut terminal, &mut app, &mut rx, &tx, &client, &config).await;

    restore_terminal(&mut terminal)?;
    result
}

/// Main event loop - handles input, applies async events, renders UI
async fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    tx: &mpsc::UnboundedSender<AppEvent>,
    client: &Arc<DaemonClient>,
    config: &Config,
) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    while app.running {
        terminal.draw(|frame| render_ui(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    let action = app.handle_key(key);
                    dispatch(action, client, config, app, tx);
                }
            }
        }

        while let Ok(app_event) = rx.try_recv() {
            app.handle_event(app_event);
        }
    }

    Ok(())
}

/// Perform the async work behind a key action by spawning a task that
/// reports back through the event channel
fn dispatch(
    action: Action,
    client: &Arc<DaemonClient>,
    config: &Config,
    app: &mut App,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let client = client.clone();
    let tx = tx.clone();
    match action {
        Action::None | Action::Quit => {}

        Action::LoadTorrents => {
            tokio::spawn(async move {
                match client.torrents(true).await {
                    Ok(torrents) => {
                        let _ = tx.send(AppEvent::TorrentsLoaded(torrents));
                    }
                    Err(e) => {
                        let _ = tx.send(AppEvent::Error(e.to_string()));
                    }
                }
            });
        }

        Action::LoadFiles(info_hash) => {
            tokio::spawn(async move {
                match client.files(&info_hash, true).await {
                    Ok(files) => {
                        let _ = tx.send(AppEvent::FilesLoaded(files));
                    }
                    Err(e) => {
                        let _ = tx.send(AppEvent::Error(e.to_string()));
                    }
                }
            });
        }

        Action::AddMagnet(uri) => {
            tokio::spawn(async move {
                match client.add_magnet(&uri).await {
                    Ok(()) => {
                        let _ = tx.send(AppEvent::Notice("Magnet added".to_string()));
                        if let Ok(torrents) = client.torrents(true).await {
                            let _ = tx.send(AppEvent::TorrentsLoaded(torrents));
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(AppEvent::Error(e.to_string()));
                    }
                }
            });
        }

        Action::PauseTorrent(hash) => {
            spawn_torrent_action(TorrentActionKind::Pause, hash, client, tx)
        }
        Action::ResumeTorrent(hash) => {
            spawn_torrent_action(TorrentActionKind::Resume, hash, client, tx)
        }
        Action::DownloadTorrent(hash) => {
            spawn_torrent_action(TorrentActionKind::Download, hash, client, tx)
        }
        Action::StopTorrent(hash) => {
            spawn_torrent_action(TorrentActionKind::Stop, hash, client, tx)
        }
        Action::RemoveTorrent(hash) => {
            spawn_torrent_action(TorrentActionKind::Remove, hash, client, tx)
        }

        Action::DownloadFile(hash, file_id) => {
            spawn_file_action(true, hash, file_id, client, tx)
        }
        Action::StopFile(hash, file_id) => {
            spawn_file_action(false, hash, file_id, client, tx)
        }

        Action::Play {
            info_hash,
            file_id,
            name,
        } => {
            let cancel = AbortFlag::new();
            let abort = AbortFlag::new();
            app.session_cancel = Some(cancel.clone());
            app.session_abort = Some(abort.clone());

            let overlay: Arc<dyn Overlay> = app.overlay.clone();
            let timeout = config.buffering_timeout_secs;
            let show_overlay = config.show_status_overlay;
            let player_binary = config.player_binary.clone();

            tokio::spawn(async move {
                let session = StreamSession::new(client, overlay, abort)
                    .with_player_binary(player_binary)
                    .with_status_overlay(show_overlay);

                let mut sink = ChannelSink::new(tx.clone(), cancel);
                let notify_tx = tx.clone();
                let notify = move |msg: &str| {
                    let _ = notify_tx.send(AppEvent::Notice(msg.to_string()));
                };

                if let Err(e) = session
                    .buffer_and_play(&info_hash, file_id, &name, timeout, &mut sink, &notify)
                    .await
                {
                    let _ = tx.send(AppEvent::Error(e.to_string()));
                }
                let _ = tx.send(AppEvent::SessionEnded);
            });
        }
    }
}

/// Torrent lifecycle action kinds for the dispatch task
#[derive(Clone, Copy)]
enum TorrentActionKind {
    Pause,
    Resume,
    Download,
    Stop,
    Remove,
}

/// Run a file action, then refresh the file listing
fn spawn_file_action(
    download: bool,
    hash: String,
    file_id: u64,
    client: Arc<DaemonClient>,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = if download {
            client.download_file(&hash, file_id, false).await
        } else {
            client.stop_file(&hash, file_id).await
        };
        match result {
            Ok(()) => match client.files(&hash, true).await {
                Ok(files) => {
                    let _ = tx.send(AppEvent::FilesLoaded(files));
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::Error(e.to_string()));
                }
            },
            Err(e) => {
                let _ = tx.send(AppEvent::Error(e.to_string()));
            }
        }
    });
}

/// Run a lifecycle action, then refresh the torrent listing
fn spawn_torrent_action(
    kind: TorrentActionKind,
    hash: String,
    client: Arc<DaemonClient>,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = match kind {
            TorrentActionKind::Pause => client.pause_torrent(&hash).await,
            TorrentActionKind::Resume => client.resume_torrent(&hash).await,
            TorrentActionKind::Download => client.download_torrent(&hash).await,
            TorrentActionKind::Stop => client.stop_torrent(&hash).await,
            TorrentActionKind::Remove => client.remove_torrent(&hash, true).await,
        };
        match result {
            Ok(()) => match client.torrents(true).await {
                Ok(torrents) => {
                    let _ = tx.send(AppEvent::TorrentsLoaded(torrents));
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::Error(e.to_string()));
                }
            },
            Err(e) => {
                let _ = tx.send(AppEvent::Error(e.to_string()));
            }
        }
    });
}

// =============================================================================
// UI Rendering
// =============================================================================

/// Main render function - dispatches to screen-specific renderers
fn render_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default().style(ratatui::style::Style::default().bg(Theme::BACKGROUND)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0]);
    match app.screen {
        Screen::Torrents => ui::torrents::render(frame, chunks[1], app),
        Screen::Files => ui::files::render(frame, chunks[1], app),
        Screen::AddMagnet => render_magnet_input(frame, chunks[1], app),
        Screen::Transfer => ui::transfer::render(frame, chunks[1], app),
    }
    render_status_bar(frame, chunks[2], app);

    if let Some(ref error) = app.error {
        render_popup(frame, area, " ✗ ERROR ", error, Theme::error());
    } else if let Some(ref notice) = app.notice {
        render_popup(frame, area, " NOTICE ", notice, Theme::accent());
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled("SWARM", Theme::title()),
        Span::styled("PLAY", Theme::accent()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(header, area);
}

fn render_magnet_input(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" ADD MAGNET ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("⌕ {}│", app.magnet_input),
            Theme::text(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↵ ", Theme::keybind()),
            Span::styled(" Add  ", Theme::dimmed()),
            Span::styled(" ESC ", Theme::keybind()),
            Span::styled(" Cancel", Theme::dimmed()),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(content, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let help = match app.screen {
        Screen::Torrents => " ↵:files  a:add  p:pause  r:resume  d:download  s:stop  x:remove  R:refresh  q:quit ",
        Screen::Files => " ↵:play  d:download  s:stop  ESC:back  q:quit ",
        Screen::AddMagnet => " ↵:add  ESC:cancel ",
        Screen::Transfer => " ESC:cancel/stop  q:quit ",
    };

    let mode = if app.input_mode == InputMode::Editing {
        Span::styled(
            " INSERT ",
            ratatui::style::Style::default()
                .fg(Theme::BACKGROUND)
                .bg(Theme::ACCENT),
        )
    } else {
        Span::styled(
            " NORMAL ",
            ratatui::style::Style::default()
                .fg(Theme::BACKGROUND)
                .bg(Theme::PRIMARY),
        )
    };

    let status = Paragraph::new(Line::from(vec![
        mode,
        Span::raw(" "),
        Span::styled(help, Theme::dimmed()),
    ]));
    frame.render_widget(status, area);
}

fn render_popup(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    message: &str,
    style: ratatui::style::Style,
) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), style)),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(style)
            .title(Span::styled(title.to_string(), style))
            .style(ratatui::style::Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(popup, popup_area);
}
