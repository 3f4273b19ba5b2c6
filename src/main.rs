//! Wiring & DI. Entry point: pick the client repository, build the service, serve HTTP.
//! No business logic here.

use dotenv::dotenv;
use payday_lms::adapters::http::LoansServer;
use payday_lms::adapters::persistence::{JsonClientRepo, MemoryClientRepo, SqliteClientRepo};
use payday_lms::ports::{ClientRepo, Lms};
use payday_lms::shared::config::{AppConfig, StorageKind};
use payday_lms::usecases::LoanService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        AppConfig::default()
    });

    let repo = open_repo(&cfg).await?;
    let lms: Arc<dyn Lms> = Arc::new(LoanService::new(repo));

    let server = LoansServer::new(cfg.listen_addr_or_default(), cfg.public_url_or_default(), lms);
    server
        .start(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {}", e))?;

    Ok(())
}

/// Build the configured storage backend.
async fn open_repo(cfg: &AppConfig) -> anyhow::Result<Arc<dyn ClientRepo>> {
    let data_dir = cfg.data_dir_or_default();
    let repo: Arc<dyn ClientRepo> = match cfg.storage_or_default() {
        StorageKind::Memory => {
            warn!("using in-memory storage; clients are lost on restart");
            Arc::new(MemoryClientRepo::new())
        }
        StorageKind::Json => {
            let path = data_dir.join("clients.json");
            Arc::new(
                JsonClientRepo::open(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("open {}: {}", path.display(), e))?,
            )
        }
        StorageKind::Sqlite => Arc::new(
            SqliteClientRepo::connect(&data_dir)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
        ),
    };
    info!(storage = ?cfg.storage_or_default(), data_dir = %data_dir.display(), "client storage ready");
    Ok(repo)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
