//! MIS & Invoicing console - a terminal front end for the MIS & Invoicing
//! backend.
//!
//! Sign in, browse the pages your role allows, and list chains, brands,
//! groups, sub-zones, estimates and invoices. Sessions end after 30 minutes
//! without keyboard or mouse activity.

mod app;
mod forms;
mod ui;
mod utils;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use misinvoice_core::auth::{AuthService, IDLE_TIMEOUT};
use misinvoice_core::config::ENV_PASSWORD;
use misinvoice_core::{
    ApiClient, ChannelNavigator, Config, CredentialBackend, SessionController, SessionStore,
};

use app::{App, AppState};
use ui::input::{handle_input, handle_mouse};
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name inside the cache directory
const LOG_FILE: &str = "misinvoice.log";

/// Keep the credential in process memory only
const EPHEMERAL_FLAG: &str = "--ephemeral";

const USAGE: &str = "Usage: misinvoice [--ephemeral] [--login | --logout | --whoami]";

/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug)
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Logging for the command-line flags
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Logging for the full-screen UI. Writing to stderr would corrupt the
/// terminal, so lines go to a file in the cache directory. The returned
/// guard flushes pending lines when dropped.
fn init_file_tracing() -> Option<WorkerGuard> {
    let dir = Config::default().cache_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

/// Split the arguments (program name excluded) into the ephemeral switch
/// and the command flag, if any.
fn parse_args(args: &[String]) -> (bool, Option<&str>) {
    let ephemeral = args.iter().any(|a| a == EPHEMERAL_FLAG);
    let command = args.iter().map(String::as_str).find(|a| *a != EPHEMERAL_FLAG);
    (ephemeral, command)
}

fn load_config(ephemeral: bool) -> Config {
    let mut config = Config::load();
    if ephemeral {
        info!("Ephemeral run, credential kept in memory only");
        config.credential_backend = CredentialBackend::Memory;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (ephemeral, command) = parse_args(&args);
    if let Some(flag) = command {
        init_stderr_tracing();
        let config = load_config(ephemeral);
        return match flag {
            "--login" => login_cli(config).await,
            "--logout" => logout_cli(config).await,
            "--whoami" => whoami_cli(config),
            _ => {
                eprintln!("{}", USAGE);
                Ok(())
            }
        };
    }

    let _log_guard = init_file_tracing();
    info!("MIS & Invoicing console starting");
    let config = load_config(ephemeral);

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config)?;
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

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

    info!("MIS & Invoicing console shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so timers and background fetches land
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    if handle_input(app, key).await? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }

        // Background results, idle expiry, pending navigation, role gate
        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Command-line flags
// ============================================================================

/// Session controller for one-shot commands. Navigation requests have no
/// page to apply to and are dropped.
fn cli_controller(config: &Config, api: &ApiClient) -> Result<SessionController> {
    let (navigator, _) = ChannelNavigator::new();
    let auth: Arc<dyn AuthService> = Arc::new(api.clone());
    Ok(SessionController::new(
        SessionStore::new(config.build_storage()?),
        auth,
        Arc::new(navigator),
        IDLE_TIMEOUT,
    ))
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(email) => print!("Email [{}]: ", email),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(match (input.is_empty(), default) {
        (true, Some(email)) => email.to_string(),
        _ => input.to_string(),
    })
}

async fn login_cli(mut config: Config) -> Result<()> {
    println!("\n=== MIS & Invoicing Login ===\n");

    let email = prompt_email(config.last_email.as_deref())?;
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    println!("\nAuthenticating...");
    let api = ApiClient::new(&config.api_base_url)?;
    let credential = api.authenticate(&email, &password).await?;
    let role = credential
        .role()
        .context("This account has no access role assigned")?;

    let mut controller = cli_controller(&config, &api)?;
    controller.login(credential);

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {} ({})\n", email, role);
    Ok(())
}

async fn logout_cli(config: Config) -> Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;
    let mut controller = cli_controller(&config, &api)?;
    if !controller.restore() {
        println!("Not logged in.");
        return Ok(());
    }

    if let Some(remote) = controller.logout() {
        remote.await.context("Logout task failed")?;
    }
    println!("Logged out.");
    Ok(())
}

fn whoami_cli(config: Config) -> Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;
    let mut controller = cli_controller(&config, &api)?;
    if !controller.restore() {
        println!("Not logged in.");
        return Ok(());
    }

    let session = controller.session();
    println!("Email: {}", session.subject.as_deref().unwrap_or("-"));
    println!(
        "Role:  {}",
        session.role.map(|r| r.display_name()).unwrap_or("none")
    );
    if let Some(since) = session.since {
        println!(
            "Since: {}",
            since.with_timezone(&chrono::Local).format("%b %d, %Y %H:%M")
        );
    }
    let expires = session
        .credential
        .as_ref()
        .and_then(|c| c.claims())
        .and_then(|c| c.expires_at());
    if let Some(expires) = expires {
        println!(
            "Token: expires {}",
            expires.with_timezone(&chrono::Local).format("%b %d, %Y %H:%M")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args(&[])), (false, None));
        assert_eq!(parse_args(&args(&["--ephemeral"])), (true, None));
        assert_eq!(parse_args(&args(&["--whoami"])), (false, Some("--whoami")));
        assert_eq!(
            parse_args(&args(&["--ephemeral", "--login"])),
            (true, Some("--login"))
        );
    }
}
