use crate::address::AddressState;
use crate::domain::{MovieSummary, format_score};
use crate::modal::ReviewedIndicators;
use crate::ratings::RatingStore;
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
    widgets::ListItem,
};
use std::collections::HashMap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// One rendered entry of the movie list.
#[derive(Debug, Clone)]
pub struct ListItemSync {
    summary: MovieSummary,
    reviewed: bool,
}

impl ListItemSync {
    pub fn new(summary: MovieSummary, ratings: &RatingStore) -> Self {
        let mut item = Self {
            summary,
            reviewed: false,
        };
        item.update_reviewed_indicator(ratings);
        item
    }

    pub fn movie_id(&self) -> i64 {
        self.summary.id
    }

    pub fn reviewed_indicator_visible(&self) -> bool {
        self.reviewed
    }

    /// Re-read the store for this movie. Safe to call any number of times.
    pub fn update_reviewed_indicator(&mut self, ratings: &RatingStore) {
        self.reviewed = ratings.is_reviewed(self.summary.id);
    }

    /// Ask the address to open this movie. Nothing else changes here.
    pub fn activate(&self, address: &AddressState) {
        address.select_movie(&self.summary.id.to_string());
    }

    pub fn render(&self, width: usize) -> ListItem<'static> {
        ListItem::new(self.line(width))
    }

    /// `✔` when reviewed, `▣` when the catalog has a poster, then title and score.
    fn line(&self, width: usize) -> Line<'static> {
        let check = if self.reviewed { "✔" } else { " " };
        let poster = if self.summary.poster_path.is_empty() { " " } else { "▣" };
        let title_width = width.saturating_sub(22);
        Line::from(vec![
            Span::styled(format!("{check} "), Style::default().fg(Color::Green)),
            Span::styled(format!("{poster} "), Style::default().fg(Color::Blue)),
            Span::raw(pad_str(&truncate_str(&self.summary.title, title_width), title_width)),
            Span::styled(
                format!("  ★ {}", format_score(self.summary.score)),
                Style::default().fg(Color::Yellow),
            ),
        ])
    }
}

/// The list entries in display order, addressable by movie id.
#[derive(Debug, Default)]
pub struct MovieList {
    items: Vec<ListItemSync>,
    by_id: HashMap<i64, usize>,
    selected: usize,
}

impl MovieList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new result page. Repeated ids keep their first position.
    pub fn replace(&mut self, results: Vec<MovieSummary>, ratings: &RatingStore) {
        self.items.clear();
        self.by_id.clear();
        for summary in results {
            if self.by_id.contains_key(&summary.id) {
                continue;
            }
            self.by_id.insert(summary.id, self.items.len());
            self.items.push(ListItemSync::new(summary, ratings));
        }
        self.selected = 0;
    }

    pub fn items(&self) -> &[ListItemSync] {
        &self.items
    }

    pub fn get(&self, movie_id: i64) -> Option<&ListItemSync> {
        self.by_id.get(&movie_id).map(|&i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&ListItemSync> {
        self.items.get(self.selected)
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self, page_size: usize) {
        let last = self.items.len().saturating_sub(1);
        self.selected = (self.selected + page_size.max(1)).min(last);
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size.max(1));
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }
}

impl ReviewedIndicators for MovieList {
    fn update_reviewed_indicator(&mut self, movie_id: i64, ratings: &RatingStore) {
        if let Some(&i) = self.by_id.get(&movie_id) {
            self.items[i].update_reviewed_indicator(ratings);
        }
    }
}

/// Truncate to `max_width` terminal columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}

fn pad_str(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}
