mod address;
mod app;
mod catalog;
mod config;
mod domain;
mod list;
mod logging;
mod modal;
mod ratings;
mod storage;
#[cfg(test)]
mod test_utils;
mod ui;

use app::{App, InputMode};
use catalog::TmdbCatalog;
use clap::Parser;
use config::Config;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;

/// Browse movies and keep your own star ratings
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a config.json (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY")]
    api_key: Option<String>,

    /// Start at this address, e.g. "#?q=matrix&id=603"
    #[arg(short, long)]
    address: Option<String>,

    /// Directory for ratings and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(key) = cli.api_key {
        config.api_key = key;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if config.api_key.is_empty() {
        eprintln!("Error: no TMDB API key. Pass --api-key, set TMDB_API_KEY, or add \"api_key\" to config.json.");
        std::process::exit(1);
    }

    // Without a usable data directory ratings only last for this session.
    let (ratings, _log_guard) = match config.prepare_data_dir() {
        Ok(data_dir) => {
            let guard = match logging::init(&data_dir.join("logs"), &config.log_filter) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    eprintln!("Warning: logging disabled: {e}");
                    None
                }
            };
            tracing::info!(version = env!("CARGO_PKG_VERSION"), data_dir = %data_dir.display(), "movie-browser starting");
            (ratings::RatingStore::new(storage::FileStorage::new(&data_dir)), guard)
        }
        Err(e) => {
            eprintln!("Warning: {e}; ratings will not be saved.");
            (ratings::RatingStore::new(storage::MemoryStorage::new()), None)
        }
    };

    let catalog = Arc::new(TmdbCatalog::new(&config.api_base_url, &config.api_key, &config.language));
    let address = match cli.address.as_deref() {
        Some(fragment) => address::AddressState::from_fragment(fragment),
        None => address::AddressState::new(),
    };

    let mut app = App::new(config, catalog, ratings, address);
    app.init();

    // Init terminal
    let mut terminal = ratatui::init();

    let size = terminal.size()?;
    app.update_page_size(size.height);

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    ratatui::restore();

    if let Err(e) = result {
        tracing::error!(error = %e, "terminal loop failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    // Leave the final address on stdout so it can be reopened with --address.
    println!("{}", app.address.fragment());
    Ok(())
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.tick();
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout; give spawned lookups a turn either way
        if event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        handle_key(app, key);
                        app.sync_address();
                    }
                }
                Event::Resize(_, height) => {
                    app.update_page_size(height);
                }
                _ => {}
            }
        }
        tokio::task::yield_now().await;
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
        return;
    }

    // Help toggle (global)
    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.modal.is_active() {
        handle_detail_key(app, key);
    } else {
        handle_list_key(app, key);
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.commit_search();
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input = app.address.read().search_word;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        _ => {}
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.list_next();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.list_prev();
        }
        KeyCode::PageDown => {
            app.list_page_down();
        }
        KeyCode::PageUp => {
            app.list_page_up();
        }
        KeyCode::Char('g') => {
            app.list_first();
        }
        KeyCode::Char('G') => {
            app.list_last();
        }
        KeyCode::Enter => {
            app.open_selected();
        }
        KeyCode::Char('H') => {
            app.go_home();
        }
        KeyCode::Esc => {
            // Clear search
            if !app.address.read().search_word.is_empty() {
                app.go_home();
            }
        }
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.close_detail();
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.hover_next_star();
        }
        KeyCode::Left | KeyCode::Char('h') => {
            app.hover_prev_star();
        }
        KeyCode::Char('0') => {
            app.modal.hover_exit();
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.commit_hovered();
        }
        KeyCode::Char(c @ '1'..='5') => {
            app.commit_stars(c as u8 - b'0');
        }
        _ => {}
    }
}
