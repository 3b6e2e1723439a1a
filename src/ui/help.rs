use super::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn binding(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(keys, Style::default().fg(Color::Yellow)),
        Span::raw(action),
    ])
}

fn help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        section("  Global"),
        binding("    ?         ", "Toggle this help"),
        binding("    Ctrl+C    ", "Quit from anywhere"),
        Line::from(""),
        section("  Movie List"),
        binding("    ↑/k ↓/j   ", "Navigate up/down"),
        binding("    PgUp/PgDn ", "Jump a page"),
        binding("    g/G       ", "First/last movie"),
        binding("    Enter     ", "Open movie detail"),
        binding("    /         ", "Search (Enter applies)"),
        binding("    H         ", "Back to popular movies"),
        binding("    Esc       ", "Clear search"),
        binding("    q         ", "Quit application"),
        Line::from(""),
        section("  Movie Detail"),
        binding("    ←/h →/l   ", "Preview star rating"),
        binding("    Enter     ", "Save previewed rating"),
        binding("    1-5       ", "Rate with that many stars"),
        binding("    0         ", "Stop previewing"),
        binding("    Esc/q     ", "Close detail"),
        Line::from(""),
    ]
}

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let help = Paragraph::new(help_lines())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press any key to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
