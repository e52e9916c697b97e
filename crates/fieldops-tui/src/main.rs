//! `fieldops-tui`: terminal front-end for field-service CRM records.
//!
//! Built on [ratatui](https://ratatui.rs). Each entity type gets a list
//! screen driven by a `fieldops_core::ListController`; screen 7 is the
//! opportunity pipeline board. Screens are navigable via number keys (1-7).
//!
//! Logs go to a file (default under the platform cache dir) so they never
//! corrupt the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod component;
mod screen;
mod screens;
mod terminal;
mod theme;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fieldops_config::{ClientSettings, Profile};
use fieldops_core::{FileColumnStore, ListOptions, RestClient};

use crate::app::App;
use crate::screens::ScreenContext;

/// Terminal UI for browsing and managing field-service CRM records.
#[derive(Parser, Debug)]
#[command(name = "fieldops-tui", version, about)]
struct Cli {
    /// Profile from the shared config file
    #[arg(short = 'p', long, env = "FIELDOPS_PROFILE")]
    profile: Option<String>,

    /// API root URL, overriding the profile
    #[arg(short = 'u', long, env = "FIELDOPS_API_URL")]
    api_url: Option<String>,

    /// Bearer token, overriding the profile
    #[arg(long, env = "FIELDOPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log file path (defaults to fieldops-tui.log in the cache dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. The returned guard flushes logs on drop.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("fieldops_tui={log_level},fieldops_core={log_level}"))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| fieldops_config::log_dir().join("fieldops-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    std::fs::create_dir_all(&log_dir)?;
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("fieldops-tui.log"));

    let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}

/// Resolve client settings: CLI flags > config profile.
fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let config = fieldops_config::load_config()?;
    let (name, mut profile) = match config.profile(cli.profile.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        Err(e) if cli.profile.is_some() => return Err(e.into()),
        Err(_) => ("default".to_owned(), Profile::default()),
    };

    if let Some(ref url) = cli.api_url {
        profile.api_url.clone_from(url);
    }
    if profile.api_url.is_empty() {
        return Err(eyre!(
            "No API URL configured. Run `fieldops config init` or pass --api-url."
        ));
    }

    let mut settings = fieldops_config::profile_to_settings(&profile, &name, &config.defaults)?;
    if let Some(ref token) = cli.token {
        settings.transport = settings
            .transport
            .with_token(SecretString::from(token.clone()));
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    terminal::install_hooks()?;

    // Tracing to file; the guard flushes logs on exit
    let _log_guard = setup_tracing(&cli)?;

    // Fail before the alternate screen so the message stays readable
    let settings = resolve_settings(&cli)?;
    info!(api_url = %settings.api_url, "starting fieldops-tui");

    let client = Arc::new(RestClient::new(settings.api_url.as_str(), &settings.transport)?);
    let (notifier, toasts) = mpsc::unbounded_channel();
    let ctx = ScreenContext {
        client,
        columns: Arc::new(FileColumnStore::new(fieldops_config::prefs_dir())),
        notifier,
        options: ListOptions {
            page_size: settings.page_size,
            live_search: settings.live_search,
            search_debounce: settings.search_debounce,
            autosave_columns: true,
        },
    };

    let mut app = App::new(&ctx, toasts, settings.api_url.to_string());
    app.run().await?;

    Ok(())
}
