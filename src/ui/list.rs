use crate::app::{App, InputMode};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_width::UnicodeWidthStr;

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    // Layout: header(3) + search(3) + list(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let reviewed = app
        .list
        .items()
        .iter()
        .filter(|i| i.reviewed_indicator_visible())
        .count();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " Movie Browser",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   [{} movies, {} rated]", app.list.len(), reviewed),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .alignment(Alignment::Left)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    // ── Search bar ──
    let search_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let search_label = if app.input_mode == InputMode::Editing {
        " 🔍 Search (Enter to apply, Esc to cancel): "
    } else {
        " 🔍 Search (/): "
    };
    let search_text = format!("{}{}", search_label, app.search_input);
    let search_bar = Paragraph::new(search_text).style(search_style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" Search "),
    );
    frame.render_widget(search_bar, chunks[1]);

    if app.input_mode == InputMode::Editing {
        let cursor_x = chunks[1].x + search_cursor_offset(search_label, &app.search_input);
        let cursor_y = chunks[1].y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    // ── List ──
    let row_width = chunks[2].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app.list.items().iter().map(|item| item.render(row_width)).collect();

    let list_widget = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Movies ")
                .title_bottom(
                    Line::from(format!(" {} ", app.address.fragment())).alignment(Alignment::Right),
                ),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    if !app.list.is_empty() {
        list_state.select(Some(app.list.selected()));
    }
    frame.render_stateful_widget(list_widget, chunks[2], &mut list_state);

    // ── Status bar ──
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let status_line = Line::from(vec![
        Span::styled(" ↑↓", key),
        Span::raw(" Navigate  "),
        Span::styled("/", key),
        Span::raw(" Search  "),
        Span::styled("Enter", key),
        Span::raw(" Detail  "),
        Span::styled("H", key),
        Span::raw(" Home  "),
        Span::styled("?", key),
        Span::raw(" Help  "),
        Span::styled("q", key),
        Span::raw(" Quit  "),
        Span::styled(&app.status_msg, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[3]);
}

/// Columns from the left edge of the bordered search box to the cursor.
fn search_cursor_offset(label: &str, input: &str) -> u16 {
    (1 + label.width() + input.width()) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_cursor_counts_terminal_columns() {
        assert_eq!(search_cursor_offset(" 🔍 Search (/): ", ""), 17);
        assert_eq!(search_cursor_offset("", "abc"), 4);
        assert_eq!(search_cursor_offset("", "기생충"), 7);
    }
}
