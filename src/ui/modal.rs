use super::centered_rect;
use crate::app::App;
use crate::domain::{format_score, poster_url};
use crate::list::truncate_str;
use crate::modal::ModalState;
use crate::ratings::Score;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

const SKELETON: &str = "░░░░░░░░░░";

pub fn render(app: &App, frame: &mut Frame) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);

    let (title, body) = match app.modal.state() {
        ModalState::Closed => return,
        ModalState::Loading { .. } => (String::new(), skeleton_lines()),
        ModalState::Populated(detail) => {
            let label = Style::default().fg(Color::DarkGray);
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(" Category: ", label),
                    Span::styled(detail.categories_text().to_string(), Style::default().fg(Color::Cyan)),
                    Span::raw("   "),
                    Span::styled("Score: ", label),
                    Span::styled(format!("★ {}", format_score(detail.score)), Style::default().fg(Color::Yellow)),
                ]),
                Line::from(vec![
                    Span::styled(" Released: ", label),
                    Span::raw(detail.release_date_text()),
                    Span::raw("   "),
                    Span::styled("Running time: ", label),
                    Span::raw(detail.running_time_text()),
                ]),
            ];
            let poster = poster_url(&app.config.image_base_url, &detail.poster_path);
            if !poster.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled(" Poster: ", label),
                    Span::styled(poster, Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(format!(" {}", detail.description)));
            (detail.title.clone(), lines)
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", truncate_str(&title, area.width.saturating_sub(6) as usize)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(" Esc Close ").style(Style::default().fg(Color::DarkGray)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // content(min) + my score(3)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(inner);

    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), chunks[0]);
    frame.render_widget(my_score(app), chunks[1]);
}

fn skeleton_lines() -> Vec<Line<'static>> {
    let placeholder = Style::default().fg(Color::DarkGray);
    vec![
        Line::from(vec![
            Span::styled(" Category: ", placeholder),
            Span::styled(SKELETON, placeholder.add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(Span::styled(" Loading...", placeholder)),
    ]
}

fn my_score(app: &App) -> Paragraph<'static> {
    let lit = app.modal.rendered_stars();
    let previewing = app.modal.hovered().is_some();
    let mut spans = vec![Span::styled(" My rating  ", Style::default().fg(Color::DarkGray))];

    for star in 1..=Score::MAX_STARS {
        let (glyph, color) = match (star <= lit, previewing) {
            (true, true) => ("★ ", Color::LightYellow),
            (true, false) => ("★ ", Color::Yellow),
            (false, _) => ("☆ ", Color::DarkGray),
        };
        spans.push(Span::styled(glyph, Style::default().fg(color)));
    }

    if app.modal.is_open() {
        let score = app.modal.shown_score();
        spans.push(Span::styled(
            format!(" {score}"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!("  {}", app.modal.score_comment())));
    }

    Paragraph::new(vec![
        Line::from(spans),
        Line::from(Span::styled(
            " ←/→ preview  Enter rate  1-5 rate directly",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
}
