//! Torrent list screen

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::sizeof_fmt;
use crate::ui::Theme;

/// Render the torrent list with per-row state and progress
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(
            format!(" TORRENTS ({}) ", app.torrents.len()),
            Theme::title(),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.torrents.is_empty() {
        let empty = Paragraph::new("No torrents — press 'a' to add a magnet")
            .style(Theme::dimmed())
            .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    // Keep the selection visible without tracking scroll state
    let visible = inner.height as usize;
    let skip = app.torrents_list.selected.saturating_sub(visible.saturating_sub(1));

    let items: Vec<ListItem> = app
        .torrents
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible.max(1))
        .map(|(i, torrent)| {
            let is_selected = i == app.torrents_list.selected;
            let marker = if is_selected { "▸ " } else { "  " };

            let mut spans = vec![
                Span::styled(
                    marker,
                    if is_selected {
                        Theme::accent()
                    } else {
                        Theme::dimmed()
                    },
                ),
                Span::styled(
                    &torrent.name,
                    if is_selected {
                        Theme::selected()
                    } else {
                        Theme::text()
                    },
                ),
                Span::raw(" "),
                Span::styled(sizeof_fmt(torrent.size as f64), Theme::dimmed()),
            ];

            if let Some(status) = &torrent.status {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("{} {:.1}%", status.state_label(), status.progress),
                    if status.paused {
                        Theme::dimmed()
                    } else {
                        Theme::accent()
                    },
                ));
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!(
                        "↓{}/s ↑{}/s",
                        sizeof_fmt(status.download_rate as f64),
                        sizeof_fmt(status.upload_rate as f64)
                    ),
                    Theme::dimmed(),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).style(Theme::text());
    frame.render_widget(list, inner);
}
