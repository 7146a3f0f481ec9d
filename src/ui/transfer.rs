//! Buffering progress and now-playing screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use crate::app::{App, TransferPhase, TransferState};
use crate::ui::Theme;

/// Render the transfer screen: a buffering gauge first, then the
/// now-playing view with the paused status overlay on top
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(transfer) = &app.transfer else {
        let idle = Paragraph::new("No active session")
            .style(Theme::dimmed())
            .alignment(Alignment::Center);
        frame.render_widget(idle, area);
        return;
    };

    match transfer.phase {
        TransferPhase::Buffering => render_buffering(frame, area, transfer),
        TransferPhase::Playing => render_playing(frame, area, app, transfer),
    }
}

fn render_buffering(frame: &mut Frame, area: Rect, transfer: &TransferState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" BUFFERING ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // name
            Constraint::Length(1), // gauge
            Constraint::Length(2), // labels
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let name = Paragraph::new(transfer.display_name.clone())
        .style(Theme::text())
        .alignment(Alignment::Center);
    frame.render_widget(name, chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(Theme::accent())
        .percent(u16::from(transfer.percent));
    frame.render_widget(gauge, chunks[1]);

    let labels = Paragraph::new(vec![
        Line::from(Span::styled(transfer.title.clone(), Theme::text())),
        Line::from(Span::styled(transfer.detail.clone(), Theme::dimmed())),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(labels, chunks[2]);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled(" ESC ", Theme::keybind()),
        Span::styled(" Cancel", Theme::dimmed()),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(hint, chunks[3]);
}

fn render_playing(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    transfer: &TransferState,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" ▶ NOW PLAYING ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(transfer.display_name.clone(), Theme::selected())),
        Line::from(""),
        Line::from(Span::styled(
            "Playback runs in the external player",
            Theme::dimmed(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ESC ", Theme::keybind()),
            Span::styled(" Stop session", Theme::dimmed()),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(content, inner);

    // Status overlay, visible only while the player is paused
    let overlay = app.overlay.snapshot();
    if overlay.shown && !overlay.text.is_empty() {
        render_overlay(frame, area, &overlay.text);
    }
}

fn render_overlay(frame: &mut Frame, area: Rect, text: &str) {
    let lines: Vec<Line> = text
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Theme::text())))
        .collect();

    let width = (text.lines().map(str::len).max().unwrap_or(20) as u16 + 4)
        .min(area.width.saturating_sub(2));
    let height = lines.len() as u16 + 2;

    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::accent())
            .title(Span::styled(" PAUSED ", Theme::accent())),
    );
    frame.render_widget(paragraph, popup);
}
