use crate::storage::{DurableStorage, StorageError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Name of the durable entry holding every rating.
pub const STORAGE_KEY: &str = "user_movie_scores";

/// Comment shown next to the numeric score, indexed by star count.
const SCORE_COMMENTS: [&str; 6] = [
    "",
    "Terrible",
    "Not great",
    "Average",
    "Good",
    "Masterpiece",
];

/// A personal rating: twice the number of stars, or 0 for "not rated".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const UNRATED: Score = Score(0);
    pub const MAX_STARS: u8 = 5;

    /// Only 0, 2, 4, 6, 8 and 10 are valid.
    pub fn new(value: i64) -> Option<Self> {
        match value {
            0 | 2 | 4 | 6 | 8 | 10 => Some(Score(value as u8)),
            _ => None,
        }
    }

    pub fn from_stars(stars: u8) -> Option<Self> {
        if stars > Self::MAX_STARS {
            return None;
        }
        Some(Score(stars * 2))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn stars(self) -> u8 {
        self.0 / 2
    }

    pub fn is_rated(self) -> bool {
        self.0 > 0
    }

    pub fn comment(self) -> &'static str {
        SCORE_COMMENTS[self.stars() as usize]
    }

    /// One star more, saturating at five. Unrated moves to one star.
    pub fn next_star(self) -> Self {
        Score((self.stars() + 1).min(Self::MAX_STARS) * 2)
    }

    /// One star less, never below one star.
    pub fn prev_star(self) -> Self {
        Score(self.stars().saturating_sub(1).max(1) * 2)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value).ok_or_else(|| format!("score out of range: {value}"))
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        score.0 as i64
    }
}

/// One entry of the persisted collection. `id` is unique within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserRating {
    pub id: i64,
    pub score: Score,
}

/// Loose shape used only for reading, so one bad record does not poison the rest.
#[derive(Deserialize)]
struct StoredRating {
    id: i64,
    score: i64,
}

/// The single owner of personal ratings.
///
/// The collection is loaded on first access and cached here, and nowhere else.
/// Every [`RatingStore::set_score`] re-reads the durable entry, upserts, and
/// writes the whole collection back before returning. Scores whose write
/// failed are carried into every later write until one succeeds.
pub struct RatingStore {
    storage: Box<dyn DurableStorage>,
    cache: RefCell<Option<Vec<UserRating>>>,
    unsaved: RefCell<Vec<UserRating>>,
}

impl RatingStore {
    pub fn new(storage: impl DurableStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            cache: RefCell::new(None),
            unsaved: RefCell::new(Vec::new()),
        }
    }

    /// Stored score for `movie_id`, or [`Score::UNRATED`].
    pub fn get_score(&self, movie_id: i64) -> Score {
        self.with_ratings(|ratings| {
            ratings
                .iter()
                .find(|r| r.id == movie_id)
                .map(|r| r.score)
                .unwrap_or_default()
        })
    }

    pub fn is_reviewed(&self, movie_id: i64) -> bool {
        self.get_score(movie_id).is_rated()
    }

    /// Upsert and persist. On a failed write the in-memory collection still
    /// reflects the new score so the session stays consistent.
    pub fn set_score(&self, movie_id: i64, score: Score) -> Result<(), StorageError> {
        let mut unsaved = self.unsaved.borrow_mut();
        upsert(&mut unsaved, movie_id, score);

        let mut ratings = self.load();
        for pending in unsaved.iter() {
            upsert(&mut ratings, pending.id, pending.score);
        }

        let written = serde_json::to_string(&ratings)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.write(STORAGE_KEY, &json));
        *self.cache.borrow_mut() = Some(ratings);

        match written {
            Ok(()) => {
                unsaved.clear();
                tracing::info!(movie_id, score = score.value(), "rating saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(movie_id, unsaved = unsaved.len(), error = %e, "rating kept in memory only");
                Err(e)
            }
        }
    }

    /// Snapshot of the whole collection.
    pub fn ratings(&self) -> Vec<UserRating> {
        self.with_ratings(|ratings| ratings.to_vec())
    }

    fn with_ratings<R>(&self, f: impl FnOnce(&[UserRating]) -> R) -> R {
        let mut cache = self.cache.borrow_mut();
        let ratings = cache.get_or_insert_with(|| self.load());
        f(ratings)
    }

    fn load(&self) -> Vec<UserRating> {
        let Some(raw) = self.storage.read(STORAGE_KEY) else {
            return Vec::new();
        };
        let stored: Vec<StoredRating> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "ratings entry is corrupt, starting empty");
                return Vec::new();
            }
        };

        let mut ratings: Vec<UserRating> = Vec::with_capacity(stored.len());
        for record in stored {
            let Some(score) = Score::new(record.score) else {
                tracing::warn!(movie_id = record.id, score = record.score, "dropping out-of-range rating");
                continue;
            };
            // Later duplicates win, matching an in-place update.
            upsert(&mut ratings, record.id, score);
        }
        ratings
    }
}

fn upsert(ratings: &mut Vec<UserRating>, movie_id: i64, score: Score) {
    match ratings.iter_mut().find(|r| r.id == movie_id) {
        Some(existing) => existing.score = score,
        None => ratings.push(UserRating {
            id: movie_id,
            score,
        }),
    }
}
