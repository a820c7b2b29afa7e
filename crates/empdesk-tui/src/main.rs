//! empdesk - terminal client for the employee-management service
//!
//! Built with Ratatui and crossterm.

mod app;
mod config;
mod handlers;
mod ui;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use empdesk_core::{ApiClient, FileSessionStore};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use app::{App, AppState};
use config::Config;

/// Environment variable overriding the API address.
const API_URL_ENV: &str = "EMPDESK_API_URL";

/// empdesk - manage employee records from the terminal
#[derive(Parser, Debug)]
#[command(name = "empdesk")]
#[command(about = "A terminal client for the employee-management service")]
struct Args {
    /// Path to a config file (defaults to ~/.config/empdesk/empdesk.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base address of the REST API, overriding the config file
    #[arg(short, long)]
    base_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let writer = match &args.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr), // Write logs to stderr to not interfere with TUI
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("empdesk_tui=info".parse()?)
                .add_directive("empdesk_core=info".parse()?),
        )
        .with_ansi(args.log_file.is_none())
        .with_writer(writer)
        .init();

    // A missing .env is fine
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {}", e);
    }

    let mut config = Config::load(args.config)?;
    if let Ok(url) = std::env::var(API_URL_ENV) {
        config.api_base_url = url;
    }
    if let Some(url) = args.base_url {
        config.api_base_url = url;
    }
    tracing::info!("Starting empdesk against {}", config.api_base_url);

    let session = Arc::new(FileSessionStore::open(config.session_path()?)?);
    let api = ApiClient::new(&config.api_base_url, session.clone())
        .with_context(|| format!("Invalid API address: {}", config.api_base_url))?
        .with_page_size(config.page_size);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(Arc::new(api), session, config.redirect_delay());

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout for smooth updates
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if handlers::handle_key(app, key) {
                    break;
                }
            }
        }

        app.poll_worker();
        app.tick(Instant::now());

        // Check if we should quit
        if matches!(app.state, AppState::Quit) {
            break;
        }
    }

    Ok(())
}
