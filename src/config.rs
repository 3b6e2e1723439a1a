use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    #[error("Could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// User settings, read from `config.json` in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub language: String,
    pub image_base_url: String,
    /// Where ratings and logs live. Platform data directory when unset.
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.themoviedb.org/3".to_string(),
            language: "en-US".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w200".to_string(),
            data_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("dev", "movie-browser", "movie-browser").ok_or(ConfigError::NoHomeDirectory)
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file gives the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => project_dirs()?.config_dir().join(CONFIG_FILE),
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Resolve the data directory and create it if needed.
    pub fn prepare_data_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.resolve_data_dir()?;
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.language, "en-US");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "api_key": "abc", "data_dir": "/tmp/movies" }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.api_base_url, Config::default().api_base_url);
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/movies"));
    }

    #[test]
    fn test_prepare_data_dir_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().join("a").join("b")),
            ..Config::default()
        };
        let prepared = config.prepare_data_dir().unwrap();
        assert!(prepared.is_dir());
    }

    #[test]
    fn test_unusable_data_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let config = Config {
            data_dir: Some(blocker.join("ratings")),
            ..Config::default()
        };

        let err = config.prepare_data_dir().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ nope").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
