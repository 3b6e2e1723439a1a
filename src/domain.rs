use chrono::NaiveDate;

/// A single entry of a search result page.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: String,
    pub score: f64,
}

/// Everything the detail overlay shows for one movie.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    pub poster_path: String,
    pub score: f64,
    pub description: String,
    pub categories: String,
    pub running_time_minutes: u32,
    pub release_date: Option<NaiveDate>,
}

pub const NO_CATEGORY: &str = "No category";

impl MovieDetail {
    pub fn categories_text(&self) -> &str {
        if self.categories.is_empty() {
            NO_CATEGORY
        } else {
            &self.categories
        }
    }

    pub fn release_date_text(&self) -> String {
        self.release_date
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_default()
    }

    pub fn running_time_text(&self) -> String {
        format_running_time(self.running_time_minutes)
    }
}

/// Catalog scores are shown with exactly one decimal.
pub fn format_score(score: f64) -> String {
    format!("{score:.1}")
}

/// `136` becomes `2h 16m`; zero means the catalog did not know.
pub fn format_running_time(minutes: u32) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (0, 0) => String::new(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Join an image base URL and a catalog poster path.
pub fn poster_url(image_base_url: &str, poster_path: &str) -> String {
    if poster_path.is_empty() {
        return String::new();
    }
    format!(
        "{}/{}",
        image_base_url.trim_end_matches('/'),
        poster_path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> MovieDetail {
        MovieDetail {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg".to_string(),
            score: 8.2,
            description: String::new(),
            categories: String::new(),
            running_time_minutes: 136,
            release_date: NaiveDate::from_ymd_opt(1999, 3, 30),
        }
    }

    #[test]
    fn test_detail_presentation() {
        let d = detail();
        assert_eq!(d.categories_text(), NO_CATEGORY);
        assert_eq!(d.release_date_text(), "1999/03/30");
        assert_eq!(d.running_time_text(), "2h 16m");
    }

    #[test]
    fn test_missing_release_date_renders_empty() {
        let d = MovieDetail {
            release_date: None,
            ..detail()
        };
        assert_eq!(d.release_date_text(), "");
    }

    #[test]
    fn test_format_running_time() {
        assert_eq!(format_running_time(0), "");
        assert_eq!(format_running_time(45), "45m");
        assert_eq!(format_running_time(120), "2h");
        assert_eq!(format_running_time(61), "1h 1m");
    }

    #[test]
    fn test_format_score_one_decimal() {
        assert_eq!(format_score(7.0), "7.0");
        assert_eq!(format_score(8.234), "8.2");
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/w200/", "/abc.jpg"),
            "https://image.tmdb.org/t/p/w200/abc.jpg"
        );
        assert_eq!(poster_url("https://image.tmdb.org/t/p/w200", ""), "");
    }
}
