mod api;
mod app;
mod config;
mod error;
mod models;
mod ui;
mod view;

use crate::api::{HttpTransport, TodoApi};
use crate::app::App;
use crate::config::Config;
use crate::ui::run_app;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to a file; writing to stderr would tear the alternate screen.
fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_logging(&config)?;
    info!(endpoint = %config.endpoint(), "starting");

    let api = TodoApi::new(HttpTransport::new(config.endpoint()));
    let mut app = App::new(api);

    // `--html` prints the rendered list instead of starting the UI
    if env::args().skip(1).any(|arg| arg == "--html") {
        println!("{}", app.snapshot_html().await?);
        return Ok(());
    }

    // Initial load; failures show up as an alert once the UI is up
    app.reload().await;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
