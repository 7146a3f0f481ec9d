//! File list screen for the selected torrent

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::sizeof_fmt;
use crate::ui::Theme;

/// Render the files of the current torrent; playable files get a marker
/// and per-file status rows show fetch state and progress
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let title = app
        .current_torrent
        .as_ref()
        .map(|t| t.name.as_str())
        .unwrap_or("FILES");

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(format!(" {} ", title), Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.files.is_empty() {
        let empty = Paragraph::new("No files")
            .style(Theme::dimmed())
            .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let visible = inner.height as usize;
    let skip = app.files_list.selected.saturating_sub(visible.saturating_sub(1));

    let items: Vec<ListItem> = app
        .files
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible.max(1))
        .map(|(i, file)| {
            let is_selected = i == app.files_list.selected;
            let marker = if is_selected { "▸ " } else { "  " };
            let play_marker = if file.media_kind().is_playable() {
                "▶ "
            } else {
                "  "
            };

            let mut spans = vec![
                Span::styled(
                    marker,
                    if is_selected {
                        Theme::accent()
                    } else {
                        Theme::dimmed()
                    },
                ),
                Span::styled(play_marker, Theme::accent()),
                Span::styled(
                    &file.name,
                    if is_selected {
                        Theme::selected()
                    } else {
                        Theme::text()
                    },
                ),
                Span::raw(" "),
                Span::styled(sizeof_fmt(file.length as f64), Theme::dimmed()),
            ];

            if let Some(status) = &file.status {
                let label = if status.is_downloading() {
                    format!("{} {:.1}%", status.state_label(), status.progress)
                } else {
                    "not fetching".to_string()
                };
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    label,
                    if status.is_downloading() {
                        Theme::accent()
                    } else {
                        Theme::dimmed()
                    },
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).style(Theme::text());
    frame.render_widget(list, inner);
}
