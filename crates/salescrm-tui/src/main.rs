//! Sales CRM TUI - keyboard-driven dashboards for the sales-incentive CRM.
//!
//! Super admins manage admins, agents, credentials and the prize catalog.
//! Admins approve sale and reward requests. Agents report sales, follow
//! their monthly target and spend coins in the prize shop.

mod app;
mod form;
mod ui;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use salescrm_core::api::ApiClient;
use salescrm_core::auth::SessionStore;
use salescrm_core::config::{self, Config};

use app::{App, AppState, Session};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "salescrm.log";

const USAGE: &str = "Usage: salescrm [login | whoami | logout]";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Logging for the one-shot commands goes to stderr.
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// The TUI owns the terminal, so its logs go to a daily file in the cache
/// directory. The returned guard flushes the writer on drop.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.cache_dir()?;
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if let Some(command) = args.get(1) {
        init_cli_tracing();
        return match command.as_str() {
            "login" => cli_login(config).await,
            "whoami" => cli_whoami(config).await,
            "logout" => cli_logout(config),
            "-h" | "--help" => {
                println!("{}", USAGE);
                Ok(())
            }
            other => Err(anyhow::anyhow!("Unknown command '{}'\n{}", other, USAGE)),
        };
    }

    let _guard = init_file_tracing(&config)?;
    info!("Sales CRM TUI starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Show the loading screen while the persisted session resolves
    let result = match terminal.draw(|f| render(f, &app)) {
        Ok(_) => {
            app.initialize().await;
            run_app(&mut terminal, &mut app).await
        }
        Err(e) => Err(e.into()),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Sales CRM TUI shutting down");
    Ok(())
}

fn open_session(config: &Config) -> Result<Session> {
    let api = ApiClient::new(&config.backend_url())?;
    Ok(SessionStore::new(api, config.token_store()?))
}

/// Log in from the command line and persist the token for the TUI.
async fn cli_login(mut config: Config) -> Result<()> {
    let mut session = open_session(&config)?;

    let default = config.default_username();
    match &default {
        Some(name) => eprint!("Username [{}]: ", name),
        None => eprint!("Username: "),
    }
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let username = match input.trim() {
        "" => default.ok_or_else(|| anyhow::anyhow!("Username is required"))?,
        typed => typed.to_string(),
    };

    let password = match config::env_password() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    match session.login(&username, &password).await {
        Ok(identity) => {
            println!(
                "Logged in as {} ({})",
                identity.display_name(),
                identity.role.display_name()
            );
            config.last_username = Some(username);
            config.save()?;
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(e.message)),
    }
}

async fn cli_whoami(config: Config) -> Result<()> {
    let mut session = open_session(&config)?;
    session.initialize().await;

    match session.identity() {
        Some(identity) => {
            println!("{} <{}>", identity.display_name(), identity.username);
            println!("Role: {}", identity.role.display_name());
            if let Some(coins) = identity.coins {
                println!("Coins: {}", salescrm_core::rules::format_amount(coins));
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn cli_logout(config: Config) -> Result<()> {
    let mut session = open_session(&config)?;
    session.logout();
    println!("Logged out");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks().await;

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
