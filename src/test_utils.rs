//! Shared fixtures for unit tests.

use crate::catalog::{Catalog, LookupError};
use crate::domain::{MovieDetail, MovieSummary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// In-memory catalog. Ids listed in `failing` answer with a transport error,
/// unknown ids with `NotFound`.
#[derive(Default)]
pub struct FixtureCatalog {
    pub movies: HashMap<i64, MovieDetail>,
    pub failing: HashSet<i64>,
}

impl FixtureCatalog {
    pub fn with_movies(ids: &[i64]) -> Self {
        Self {
            movies: ids.iter().map(|&id| (id, detail(id))).collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }
}

pub fn detail(id: i64) -> MovieDetail {
    MovieDetail {
        id,
        title: format!("Movie {id}"),
        poster_path: format!("/{id}.jpg"),
        score: 7.5,
        description: format!("Description of movie {id}"),
        categories: "Drama".to_string(),
        running_time_minutes: 100,
        release_date: None,
    }
}

pub fn summary(id: i64) -> MovieSummary {
    MovieSummary {
        id,
        title: format!("Movie {id}"),
        poster_path: format!("/{id}.jpg"),
        score: 7.5,
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn search(&self, word: &str) -> Result<Vec<MovieSummary>, LookupError> {
        let mut ids: Vec<i64> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .map(summary)
            .filter(|s| word.is_empty() || s.title.contains(word))
            .collect())
    }

    async fn lookup(&self, movie_id: i64) -> Result<MovieDetail, LookupError> {
        if self.failing.contains(&movie_id) {
            return Err(LookupError::Transport("connection reset".to_string()));
        }
        self.movies
            .get(&movie_id)
            .cloned()
            .ok_or(LookupError::NotFound(movie_id))
    }
}
