//! Lifecycle of the movie detail overlay.
//!
//! The overlay follows the navigation address and nothing else: a non-empty
//! `id` starts a lookup, an empty one closes it, and every close path writes
//! the empty `id` back so the address stays authoritative.
//!
//! ```text
//! Closed ──id set──▶ Loading ──lookup ok──▶ Populated
//!   ▲                  │                      │
//!   └──lookup failed───┘◀──close / Esc / id cleared
//! ```

use crate::address::{AddressQuery, AddressState};
use crate::catalog::{Catalog, LookupError};
use crate::domain::MovieDetail;
use crate::ratings::{RatingStore, Score};
use crate::storage::StorageError;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Anything that shows a per-movie "reviewed" marker and can refresh it on demand.
pub trait ReviewedIndicators {
    fn update_reviewed_indicator(&mut self, movie_id: i64, ratings: &RatingStore);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    /// Skeleton shown while the detail lookup for `movie_id` is in flight.
    Loading { movie_id: i64 },
    Populated(Box<MovieDetail>),
}

/// Result of one detail lookup, tagged with the request token it answers.
#[derive(Debug)]
pub struct LookupOutcome {
    pub token: u64,
    pub movie_id: i64,
    pub result: Result<MovieDetail, LookupError>,
}

pub struct ModalController {
    catalog: Arc<dyn Catalog>,
    address_rx: watch::Receiver<AddressQuery>,
    state: ModalState,
    /// Token of the lookup currently awaited. Bumped on every new request.
    token: u64,
    hover: Option<Score>,
    /// Score as last read back from the store.
    shown_score: Score,
    scroll_locked: bool,
    outcome_tx: mpsc::UnboundedSender<LookupOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<LookupOutcome>,
}

impl ModalController {
    pub fn new(catalog: Arc<dyn Catalog>, address: &AddressState) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            catalog,
            address_rx: address.subscribe(),
            state: ModalState::Closed,
            token: 0,
            hover: None,
            shown_score: Score::UNRATED,
            scroll_locked: false,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// The overlay is visible once the detail has arrived.
    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Populated(_))
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ModalState::Closed)
    }

    pub fn detail(&self) -> Option<&MovieDetail> {
        match &self.state {
            ModalState::Populated(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn current_movie_id(&self) -> Option<i64> {
        match &self.state {
            ModalState::Closed => None,
            ModalState::Loading { movie_id } => Some(*movie_id),
            ModalState::Populated(detail) => Some(detail.id),
        }
    }

    /// While set, the list behind the overlay must not scroll.
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn shown_score(&self) -> Score {
        self.shown_score
    }

    pub fn hovered(&self) -> Option<Score> {
        self.hover
    }

    /// Stars to light up: the hovered preview if any, otherwise the stored score.
    pub fn rendered_stars(&self) -> u8 {
        self.hover.unwrap_or(self.shown_score).stars()
    }

    pub fn score_comment(&self) -> &'static str {
        self.shown_score.comment()
    }

    /// React to the address if it changed since the last call.
    pub fn sync_with_address(&mut self, address: &AddressState) {
        if !self.address_rx.has_changed().unwrap_or(false) {
            return;
        }
        let query = self.address_rx.borrow_and_update().clone();
        self.on_address(&query, address);
    }

    pub fn on_address(&mut self, query: &AddressQuery, address: &AddressState) {
        if !query.has_selection() {
            if self.is_active() {
                self.close(address);
            }
            return;
        }

        let Ok(movie_id) = query.selected_movie_id.parse::<i64>() else {
            tracing::warn!(id = %query.selected_movie_id, "unusable movie id in address");
            self.close(address);
            return;
        };

        if self.current_movie_id() == Some(movie_id) {
            return;
        }
        self.begin_loading(movie_id);
    }

    fn begin_loading(&mut self, movie_id: i64) {
        self.token += 1;
        self.state = ModalState::Loading { movie_id };
        self.hover = None;
        tracing::info!(movie_id, token = self.token, "loading movie detail");

        let catalog = Arc::clone(&self.catalog);
        let tx = self.outcome_tx.clone();
        let token = self.token;
        tokio::spawn(async move {
            let result = catalog.lookup(movie_id).await;
            // The receiver lives as long as the controller.
            let _ = tx.send(LookupOutcome {
                token,
                movie_id,
                result,
            });
        });
    }

    /// Apply every lookup that finished since the last call.
    pub fn poll_lookups(&mut self, address: &AddressState, ratings: &RatingStore) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.handle_lookup(outcome, address, ratings);
        }
    }

    /// Wait for the next finished lookup without applying it.
    pub async fn next_outcome(&mut self) -> Option<LookupOutcome> {
        self.outcome_rx.recv().await
    }

    pub fn handle_lookup(&mut self, outcome: LookupOutcome, address: &AddressState, ratings: &RatingStore) {
        // The address may already point elsewhere even if this controller has
        // not caught up with it yet.
        let still_selected = address.read().selected_movie_id.parse::<i64>().ok() == Some(outcome.movie_id);
        let awaited = still_selected
            && outcome.token == self.token
            && matches!(self.state, ModalState::Loading { movie_id } if movie_id == outcome.movie_id);
        if !awaited {
            tracing::debug!(
                movie_id = outcome.movie_id,
                token = outcome.token,
                current = self.token,
                "discarding stale detail response"
            );
            return;
        }

        match outcome.result {
            Ok(detail) => self.populate(detail, ratings),
            Err(e) => {
                tracing::warn!(movie_id = outcome.movie_id, error = %e, "detail lookup failed, closing overlay");
                self.close(address);
            }
        }
    }

    fn populate(&mut self, detail: MovieDetail, ratings: &RatingStore) {
        self.shown_score = ratings.get_score(detail.id);
        self.hover = None;
        self.scroll_locked = true;
        tracing::info!(movie_id = detail.id, "detail overlay open");
        self.state = ModalState::Populated(Box::new(detail));
    }

    /// Close affordance and Escape both land here.
    pub fn request_close(&mut self, address: &AddressState) {
        if self.is_active() {
            self.close(address);
        }
    }

    fn close(&mut self, address: &AddressState) {
        if let Some(movie_id) = self.current_movie_id() {
            tracing::info!(movie_id, "closing detail overlay");
        }
        self.scroll_locked = false;
        self.state = ModalState::Closed;
        self.hover = None;
        self.shown_score = Score::UNRATED;
        address.clear_selection();
    }

    /// Preview `score` on the stars without touching the store.
    pub fn hover_star(&mut self, score: Score) {
        if self.is_open() {
            self.hover = Some(score);
        }
    }

    pub fn hover_exit(&mut self) {
        self.hover = None;
    }

    /// Persist `score` for the open movie, re-read it for display, then refresh
    /// that movie's list indicator.
    ///
    /// A failed durable write is returned after the display and indicator have
    /// been refreshed from the store's in-memory state.
    pub fn commit_score(
        &mut self,
        score: Score,
        ratings: &RatingStore,
        indicators: &mut dyn ReviewedIndicators,
    ) -> Result<(), StorageError> {
        let Some(movie_id) = self.detail().map(|d| d.id) else {
            return Ok(());
        };

        let written = ratings.set_score(movie_id, score);
        self.shown_score = ratings.get_score(movie_id);
        self.hover = None;
        indicators.update_reviewed_indicator(movie_id, ratings);
        written
    }
}
