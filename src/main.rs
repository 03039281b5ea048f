use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod handler;
mod tui;
mod ui;

use api::ApiClient;
use app::{App, Route};
use config::Config;

#[derive(Parser)]
#[command(name = "dobbe")]
#[command(about = "Terminal client for the Dobbe AI dental clinic chat service")]
struct Cli {
    /// Route to open, e.g. "/login", "/patient/pat42" or "/doctor/doc7"
    path: Option<String>,

    /// Backend origin, overriding the config file
    #[arg(long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::load().unwrap_or_default();
    let base_url = cli.backend.as_deref().unwrap_or_else(|| config.backend());

    let route = match cli.path.as_deref() {
        Some(path) => Route::parse(path).ok_or_else(|| anyhow!("unrecognized route: {path}"))?,
        None => Route::Login,
    };

    tracing::info!(%base_url, path = %route.path(), "starting");

    let mut app = App::new(ApiClient::new(base_url), route);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        app.poll_pending().await;
        handler::handle_event(app, event);
    }

    Ok(())
}

/// Diagnostics go to a file; the terminal belongs to the UI. Best effort:
/// an unwritable log location never blocks the client.
fn init_logging() {
    let Ok(path) = Config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = std::fs::File::create(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
