use crate::domain::{MovieDetail, MovieSummary};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Movie not found: {0}")]
    NotFound(i64),

    #[error("Catalog unavailable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Transport(e.to_string())
    }
}

/// Remote source of movie metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// First result page for `word`; an empty word lists popular movies.
    async fn search(&self, word: &str) -> Result<Vec<MovieSummary>, LookupError>;

    async fn lookup(&self, movie_id: i64) -> Result<MovieDetail, LookupError>;
}

/// TMDB v3 REST client.
pub struct TmdbCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: f64,
}

#[derive(Deserialize)]
struct DetailBody {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct Genre {
    name: String,
}

impl From<SearchHit> for MovieSummary {
    fn from(hit: SearchHit) -> Self {
        MovieSummary {
            id: hit.id,
            title: hit.title,
            poster_path: hit.poster_path.unwrap_or_default(),
            score: hit.vote_average,
        }
    }
}

impl From<DetailBody> for MovieDetail {
    fn from(body: DetailBody) -> Self {
        MovieDetail {
            id: body.id,
            title: body.title,
            poster_path: body.poster_path.unwrap_or_default(),
            score: body.vote_average,
            description: body.overview.unwrap_or_default(),
            categories: body
                .genres
                .into_iter()
                .map(|g| g.name)
                .collect::<Vec<_>>()
                .join(", "),
            running_time_minutes: body.runtime.unwrap_or(0),
            release_date: body
                .release_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        }
    }
}

impl TmdbCatalog {
    pub fn new(base_url: &str, api_key: &str, language: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
        }
    }

    async fn get(&self, path: &str, extra: &[(&str, &str)]) -> Result<reqwest::Response, LookupError> {
        let mut query = vec![("api_key", self.api_key.as_str()), ("language", self.language.as_str())];
        query.extend_from_slice(extra);
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl Catalog for TmdbCatalog {
    async fn search(&self, word: &str) -> Result<Vec<MovieSummary>, LookupError> {
        let response = if word.is_empty() {
            self.get("/movie/popular", &[("page", "1")]).await?
        } else {
            self.get("/search/movie", &[("query", word), ("page", "1")]).await?
        };
        let page: SearchPage = response.error_for_status()?.json().await?;
        Ok(page.results.into_iter().map(MovieSummary::from).collect())
    }

    async fn lookup(&self, movie_id: i64) -> Result<MovieDetail, LookupError> {
        let response = self.get(&format!("/movie/{movie_id}"), &[]).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(movie_id));
        }
        let body: DetailBody = response.error_for_status()?.json().await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_body_mapping() {
        let body: DetailBody = serde_json::from_value(serde_json::json!({
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/m.jpg",
            "vote_average": 8.2,
            "overview": "Neo wakes up.",
            "genres": [{ "id": 28, "name": "Action" }, { "id": 878, "name": "Science Fiction" }],
            "runtime": 136,
            "release_date": "1999-03-30"
        }))
        .unwrap();

        let detail = MovieDetail::from(body);
        assert_eq!(detail.categories, "Action, Science Fiction");
        assert_eq!(detail.running_time_minutes, 136);
        assert_eq!(detail.release_date, NaiveDate::from_ymd_opt(1999, 3, 30));
        assert_eq!(detail.poster_path, "/m.jpg");
    }

    #[test]
    fn test_detail_body_tolerates_nulls_and_blank_dates() {
        let body: DetailBody = serde_json::from_value(serde_json::json!({
            "id": 1,
            "poster_path": null,
            "overview": null,
            "runtime": null,
            "release_date": ""
        }))
        .unwrap();

        let detail = MovieDetail::from(body);
        assert_eq!(detail.poster_path, "");
        assert_eq!(detail.categories, "");
        assert_eq!(detail.running_time_minutes, 0);
        assert!(detail.release_date.is_none());
    }

    #[test]
    fn test_search_page_mapping() {
        let page: SearchPage = serde_json::from_value(serde_json::json!({
            "page": 1,
            "results": [{ "id": 7, "title": "Seven", "poster_path": null, "vote_average": 8.4 }]
        }))
        .unwrap();

        let summaries: Vec<MovieSummary> = page.results.into_iter().map(Into::into).collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, 7);
        assert_eq!(summaries[0].poster_path, "");
    }

    #[test]
    fn test_lookup_error_messages() {
        assert_eq!(LookupError::NotFound(9).to_string(), "Movie not found: 9");
        assert!(LookupError::Transport("timeout".into()).to_string().contains("timeout"));
    }
}
