use crate::address::{AddressQuery, AddressState};
use crate::catalog::{Catalog, LookupError};
use crate::config::Config;
use crate::domain::MovieSummary;
use crate::list::MovieList;
use crate::modal::ModalController;
use crate::ratings::{RatingStore, Score};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A finished search request.
#[derive(Debug)]
pub struct SearchOutcome {
    pub token: u64,
    pub word: String,
    pub result: Result<Vec<MovieSummary>, LookupError>,
}

pub const LIST_OVERHEAD: u16 = 9;

/// Main application state.
pub struct App {
    pub config: Config,
    pub should_quit: bool,
    pub show_help: bool,
    pub input_mode: InputMode,
    pub search_input: String,
    pub status_msg: String,
    pub page_size: usize,

    pub address: AddressState,
    pub ratings: RatingStore,
    pub list: MovieList,
    pub modal: ModalController,

    catalog: Arc<dyn Catalog>,
    address_rx: watch::Receiver<AddressQuery>,
    // Search word of the newest request, shown or in flight
    requested_search: Option<String>,
    search_token: u64,
    search_tx: mpsc::UnboundedSender<SearchOutcome>,
    search_rx: mpsc::UnboundedReceiver<SearchOutcome>,
}

impl App {
    pub fn new(config: Config, catalog: Arc<dyn Catalog>, ratings: RatingStore, address: AddressState) -> Self {
        let modal = ModalController::new(Arc::clone(&catalog), &address);
        let address_rx = address.subscribe();
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        Self {
            config,
            should_quit: false,
            show_help: false,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            status_msg: "Loading movies...".to_string(),
            page_size: 20, // Updated on first render/resize

            address,
            ratings,
            list: MovieList::new(),
            modal,

            catalog,
            address_rx,
            requested_search: None,
            search_token: 0,
            search_tx,
            search_rx,
        }
    }

    /// Act on whatever the starting address asks for.
    pub fn init(&mut self) {
        let query = self.address.read();
        self.search_input = query.search_word.clone();
        self.request_search(&query.search_word);
        self.modal.on_address(&query, &self.address);
    }

    /// One turn of the event loop: apply finished work, then follow the address.
    pub fn tick(&mut self) {
        self.modal.poll_lookups(&self.address, &self.ratings);
        self.poll_searches();
        self.sync_address();
    }

    pub fn sync_address(&mut self) {
        if self.address_rx.has_changed().unwrap_or(false) {
            let word = self.address_rx.borrow_and_update().search_word.clone();
            if self.requested_search.as_deref() != Some(word.as_str()) {
                self.request_search(&word);
            }
        }
        self.modal.sync_with_address(&self.address);
    }

    fn request_search(&mut self, word: &str) {
        self.search_token += 1;
        self.requested_search = Some(word.to_string());
        self.status_msg = if word.is_empty() {
            "Loading popular movies...".to_string()
        } else {
            format!("Searching \"{word}\"...")
        };
        tracing::info!(word, token = self.search_token, "searching catalog");

        let catalog = Arc::clone(&self.catalog);
        let tx = self.search_tx.clone();
        let token = self.search_token;
        let word = word.to_string();
        tokio::spawn(async move {
            let result = catalog.search(&word).await;
            let _ = tx.send(SearchOutcome { token, word, result });
        });
    }

    fn poll_searches(&mut self) {
        while let Ok(outcome) = self.search_rx.try_recv() {
            if outcome.token != self.search_token {
                tracing::debug!(word = %outcome.word, "discarding stale search results");
                continue;
            }
            match outcome.result {
                Ok(results) => {
                    self.list.replace(results, &self.ratings);
                    self.status_msg = format!(
                        "{} movies for \"{}\"",
                        self.list.len(),
                        if outcome.word.is_empty() { "popular" } else { &outcome.word }
                    );
                }
                Err(e) => {
                    tracing::warn!(word = %outcome.word, error = %e, "search failed");
                    self.status_msg = format!("Could not load movies: {e}");
                }
            }
        }
    }

    /// Open the highlighted movie by pointing the address at it.
    pub fn open_selected(&mut self) {
        if self.modal.scroll_locked() {
            return;
        }
        if let Some(item) = self.list.selected_item() {
            item.activate(&self.address);
        }
    }

    pub fn commit_search(&mut self) {
        self.input_mode = InputMode::Normal;
        let word = self.search_input.trim().to_string();
        self.address.set_search_word(&word);
    }

    /// Back to the popular list, like clicking the logo.
    pub fn go_home(&mut self) {
        self.search_input.clear();
        self.address.set_search_word("");
    }

    pub fn close_detail(&mut self) {
        self.modal.request_close(&self.address);
    }

    pub fn hover_next_star(&mut self) {
        let from = self.modal.hovered().unwrap_or(self.modal.shown_score());
        self.modal.hover_star(from.next_star());
    }

    pub fn hover_prev_star(&mut self) {
        let from = self.modal.hovered().unwrap_or(self.modal.shown_score());
        self.modal.hover_star(from.prev_star());
    }

    pub fn commit_hovered(&mut self) {
        if let Some(score) = self.modal.hovered() {
            self.commit_score(score);
        }
    }

    pub fn commit_stars(&mut self, stars: u8) {
        if let Some(score) = Score::from_stars(stars) {
            self.commit_score(score);
        }
    }

    fn commit_score(&mut self, score: Score) {
        match self.modal.commit_score(score, &self.ratings, &mut self.list) {
            Ok(()) => {
                if self.modal.is_open() {
                    self.status_msg = format!("Rated {} / 10", self.modal.shown_score());
                }
            }
            Err(e) => {
                self.status_msg = format!("Rating kept for this session only: {e}");
            }
        }
    }

    pub fn list_next(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.next();
        }
    }

    pub fn list_prev(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.prev();
        }
    }

    pub fn list_page_down(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.page_down(self.page_size);
        }
    }

    pub fn list_page_up(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.page_up(self.page_size);
        }
    }

    pub fn list_first(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.first();
        }
    }

    pub fn list_last(&mut self) {
        if !self.modal.scroll_locked() {
            self.list.last();
        }
    }

    /// Update page size based on terminal height.
    pub fn update_page_size(&mut self, terminal_height: u16) {
        let new_size = terminal_height.saturating_sub(LIST_OVERHEAD) as usize;
        self.page_size = new_size.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_utils::FixtureCatalog;

    fn app_with(catalog: FixtureCatalog, fragment: &str) -> App {
        let mut app = App::new(
            Config::default(),
            Arc::new(catalog),
            RatingStore::new(MemoryStorage::new()),
            AddressState::from_fragment(fragment),
        );
        app.init();
        app
    }

    /// Let spawned lookups finish and feed them through the loop.
    async fn settle(app: &mut App) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
            app.tick();
        }
    }

    fn select(app: &mut App, movie_id: i64) {
        let index = app
            .list
            .items()
            .iter()
            .position(|i| i.movie_id() == movie_id)
            .unwrap();
        app.list.first();
        for _ in 0..index {
            app.list_next();
        }
    }

    #[tokio::test]
    async fn test_rating_marks_only_that_list_item() {
        let mut app = app_with(FixtureCatalog::with_movies(&[10, 11, 12]), "");
        settle(&mut app).await;
        assert_eq!(app.list.len(), 3);
        assert!(!app.ratings.is_reviewed(10));

        select(&mut app, 10);
        app.open_selected();
        assert_eq!(app.address.read().selected_movie_id, "10");
        settle(&mut app).await;
        assert!(app.modal.is_open());

        app.commit_stars(3);

        assert!(app.ratings.is_reviewed(10));
        assert_eq!(app.ratings.get_score(10).value(), 6);
        assert!(app.list.get(10).unwrap().reviewed_indicator_visible());
        assert!(!app.list.get(11).unwrap().reviewed_indicator_visible());
        assert!(!app.list.get(12).unwrap().reviewed_indicator_visible());
        assert_eq!(app.modal.score_comment(), "Average");
    }

    #[tokio::test]
    async fn test_keyboard_hover_then_commit() {
        let mut app = app_with(FixtureCatalog::with_movies(&[7]), "#?id=7");
        settle(&mut app).await;

        app.hover_next_star();
        app.hover_next_star();
        assert_eq!(app.modal.rendered_stars(), 2);
        assert!(!app.ratings.is_reviewed(7));

        app.commit_hovered();
        assert_eq!(app.ratings.get_score(7).value(), 4);
        assert_eq!(app.modal.hovered(), None);
    }

    #[tokio::test]
    async fn test_failed_lookup_returns_to_list() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1]).failing_on(99), "#?q=Movie");
        settle(&mut app).await;

        app.address.select_movie("99");
        settle(&mut app).await;

        assert!(!app.modal.is_active());
        assert_eq!(app.address.read().selected_movie_id, "");
        assert_eq!(app.address.read().search_word, "Movie");
    }

    #[tokio::test]
    async fn test_rapid_reselection_shows_latest_movie() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1, 2]), "");
        settle(&mut app).await;

        app.address.select_movie("1");
        app.sync_address();
        app.address.select_movie("2");
        settle(&mut app).await;

        assert_eq!(app.modal.detail().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_does_not_clear_newer_selection() {
        let mut app = app_with(FixtureCatalog::with_movies(&[2]).failing_on(1), "#?q=x");
        settle(&mut app).await;

        app.address.select_movie("1");
        app.sync_address();
        app.address.select_movie("2");
        settle(&mut app).await;

        assert_eq!(app.address.read().selected_movie_id, "2");
        assert!(app.modal.is_open());
        assert_eq!(app.modal.detail().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_list_does_not_scroll_behind_open_detail() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1, 2, 3]), "");
        settle(&mut app).await;
        app.open_selected();
        settle(&mut app).await;
        assert!(app.modal.scroll_locked());

        app.list_next();
        app.list_last();
        assert_eq!(app.list.selected(), 0);

        app.close_detail();
        app.list_next();
        assert_eq!(app.list.selected(), 1);
    }

    #[tokio::test]
    async fn test_search_replaces_list_and_keeps_selection_in_address() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1, 2, 21]), "#?id=2");
        settle(&mut app).await;
        assert_eq!(app.list.len(), 3);

        app.search_input = "Movie 2".to_string();
        app.commit_search();
        settle(&mut app).await;

        assert_eq!(app.address.fragment(), "#?q=Movie%202&id=2");
        let ids: Vec<i64> = app.list.items().iter().map(|i| i.movie_id()).collect();
        assert_eq!(ids, vec![2, 21]);
        assert!(app.modal.is_open());
    }

    #[tokio::test]
    async fn test_stale_search_results_are_dropped() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1, 2]), "");
        app.address.set_search_word("Movie 1");
        app.sync_address();
        app.address.set_search_word("Movie 2");
        settle(&mut app).await;

        let ids: Vec<i64> = app.list.items().iter().map(|i| i.movie_id()).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_go_home_clears_search() {
        let mut app = app_with(FixtureCatalog::with_movies(&[1, 2]), "#?q=Movie 1");
        settle(&mut app).await;
        assert_eq!(app.list.len(), 1);

        app.go_home();
        settle(&mut app).await;
        assert_eq!(app.address.fragment(), "#");
        assert_eq!(app.list.len(), 2);
    }
}
