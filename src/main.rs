//! PharmaDoc session keeper.
//!
//! Keeps a logged-in PharmaDoc session alive from the terminal: refreshes
//! tokens on schedule, warns before the session boundary, and clears
//! storage on expiry. Each line on stdin is an input:
//!
//! - `extend` extends the session from the warning
//! - `logout` logs out now
//! - `hidden` / `visible` report the client moving to and from the background
//! - anything else counts as a key press

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tracing_subscriber::{EnvFilter, fmt};

use pharmadoc_core::config::AppConfig;
use pharmadoc_core::error::AppError;
use pharmadoc_core::events::{EventEnvelope, SessionEvent};
use pharmadoc_session::{
    ActivityKind, HttpAuthClient, SessionBus, SessionInput, SessionManager, SessionRunner,
    SystemClock, Visibility,
};
use pharmadoc_store::SessionStorage;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Keeper error: {}", e);
        std::process::exit(1);
    }
}

/// `PHARMADOC_CONFIG` names an explicit file; otherwise `config/default`
/// layered with `config/{PHARMADOC_ENV}`.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("PHARMADOC_CONFIG") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => {
            let env =
                std::env::var("PHARMADOC_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PharmaDoc keeper v{}", env!("CARGO_PKG_VERSION"));

    // ── Storage ──────────────────────────────────────────────────
    let store = pharmadoc_store::open_store(&config.storage).await?;
    let storage = SessionStorage::new(store);
    if storage.tokens().await?.is_none() {
        return Err(AppError::authentication(
            "No stored session; run `pharmadoc login` first",
        ));
    }

    // ── Session manager ──────────────────────────────────────────
    let api = Arc::new(HttpAuthClient::new(&config.api)?);
    tracing::info!(base_url = api.base_url(), "Auth API client ready");

    let bus = SessionBus::default();
    let manager = Arc::new(SessionManager::new(
        config.session.clone(),
        storage,
        api,
        Arc::new(SystemClock),
        bus.clone(),
    ));

    // ── Inputs and shutdown ──────────────────────────────────────
    let (input_tx, input_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(read_stdin(input_tx));
    tokio::spawn(announce(bus.subscribe()));
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    SessionRunner::new(Arc::clone(&manager), input_rx)
        .run(shutdown_rx)
        .await;

    let phase = manager.phase().await;
    tracing::info!(?phase, "PharmaDoc keeper stopped");
    Ok(())
}

/// Map stdin lines to session inputs until stdin closes.
async fn read_stdin(tx: mpsc::Sender<SessionInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(parse_input(&line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("stdin closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

fn parse_input(line: &str) -> SessionInput {
    match line.trim().to_ascii_lowercase().as_str() {
        "extend" => SessionInput::Extend,
        "logout" => SessionInput::Logout,
        "hidden" => SessionInput::Visibility(Visibility::Hidden),
        "visible" => SessionInput::Visibility(Visibility::Visible),
        _ => SessionInput::Activity(ActivityKind::KeyPress),
    }
}

/// Print the user-facing side of session events.
async fn announce(mut events: broadcast::Receiver<EventEnvelope>) {
    loop {
        match events.recv().await {
            Ok(envelope) => match envelope.event {
                SessionEvent::WarningShown { remaining_seconds } => println!(
                    "Session expires in {}:{:02}. Type `extend` to stay logged in or `logout` to leave.",
                    remaining_seconds / 60,
                    remaining_seconds % 60
                ),
                SessionEvent::Extended => println!("Session extended."),
                SessionEvent::Logout {
                    reason,
                    redirect_to,
                } => {
                    println!("Logged out ({}). Log in again at {}.", reason, redirect_to);
                }
                SessionEvent::Refreshed => {}
            },
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("extend"), SessionInput::Extend);
        assert_eq!(parse_input("  LOGOUT \n"), SessionInput::Logout);
        assert_eq!(
            parse_input("hidden"),
            SessionInput::Visibility(Visibility::Hidden)
        );
        assert_eq!(
            parse_input("visible"),
            SessionInput::Visibility(Visibility::Visible)
        );
        assert_eq!(
            parse_input("q"),
            SessionInput::Activity(ActivityKind::KeyPress)
        );
    }
}
