use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Send `tracing` output to a daily log file; the terminal belongs to the UI.
///
/// `RUST_LOG` wins over `default_filter`. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(logs_dir: &Path, default_filter: &str) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("movie-browser.log")
        .build(logs_dir)
        .map_err(std::io::Error::other)?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}
