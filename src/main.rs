//! AnsuryX API Server
//!
//! Run with: cargo run --bin ansuryx
//!
//! # Configuration
//!
//! Settings come from `config.toml` (see `ansuryx-cli config`), searched in
//! the user config directory, `/etc/ansuryx` and the working directory.
//! `ANSURYX_CONFIG` points at an explicit file instead. `ANSURYX_*`
//! variables override individual settings and `RUST_LOG` overrides the
//! log filter.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use ansuryx::api::{serve, ApiConfig, AppState};
use ansuryx::auth::AuthService;
use ansuryx::config::{Config, LoggingConfig};
use ansuryx::storage::open_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var_os("ANSURYX_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            Config::load_with_env(&path)
                .with_context(|| format!("loading config from {:?}", path))?
        }
        None => Config::load_default(),
    };

    init_logging(&config.logging)?;

    tracing::info!("Starting AnsuryX API server v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = config.storage.data_path();
    tracing::info!("Data directory: {:?}", data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {:?}", data_dir))?;

    let store = open_store(config.storage.backend, &data_dir)
        .with_context(|| format!("opening {} store", config.storage.backend))?;
    store.ping().await.context("store did not answer ping")?;

    let api_config = ApiConfig::from(&config);
    let state = AppState::new(store, api_config.clone());

    let purge_task = spawn_session_purge(state.auth.clone(), config.auth.purge_interval());

    tracing::info!("Starting server on {}:{}", api_config.host, api_config.port);
    serve(state, &api_config).await?;

    purge_task.abort();
    tracing::info!("AnsuryX API server stopped");

    Ok(())
}

/// Install the global subscriber described by `logging`
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("ansuryx={},tower_http=info", logging.level))
    });

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };
    let ansi = logging.file.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init(),
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .init(),
    }

    Ok(())
}

/// Periodically drop expired sessions
fn spawn_session_purge(auth: AuthService, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = auth.purge_expired().await {
                tracing::warn!(error = %e, "Session purge failed");
            }
        }
    })
}
