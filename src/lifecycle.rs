//! Application lifecycle management.
//!
//! Handles setup and shutdown of long-running services like the page fetcher.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::commands::AppState;
use crate::config::{AppConfig, FetchBackend};
use crate::db;
use crate::repository::{AnalysisStore, MemoryAnalysisStore, SqliteAnalysisRepository};
use crate::service::{build_fetcher, build_summarizer, AnalysisPipeline};

/// Initialize logging with tracing_subscriber. `log` records are bridged in.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        .add_directive("sqlx=warn".parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}

/// Build every service the HTTP API needs.
///
/// Mock mode uses the in-memory store and skips link probing; otherwise the
/// sqlite database is opened and migrated.
pub async fn setup(config: &AppConfig) -> Result<AppState> {
    let store: Arc<dyn AnalysisStore> = if config.use_mock {
        log::info!("Mock mode: analyses are kept in memory");
        Arc::new(MemoryAnalysisStore::new())
    } else {
        let pool = db::init_db(&config.database_url)
            .await
            .context("failed to init db")?;
        Arc::new(SqliteAnalysisRepository::new(pool))
    };

    let fetcher = build_fetcher(config).context("failed to build page fetcher")?;
    let summarizer = build_summarizer(config).context("failed to build summarizer")?;

    let mut pipeline = AnalysisPipeline::new(fetcher, summarizer, store.clone(), &config.pipeline);
    if config.fetch_backend == FetchBackend::Mock {
        pipeline = pipeline.without_link_probe();
    }

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        store,
    })
}

/// Cancel `token` on Ctrl-C or SIGTERM.
pub fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        log::info!("Shutdown signal received");
        token.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            log::warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Gracefully shutdown long-lived services.
pub async fn shutdown_services(state: &AppState) {
    let fetcher = state.pipeline.fetcher();
    log::info!("Shutting down {} fetcher...", fetcher.name());
    if let Err(e) = fetcher.shutdown().await {
        log::error!("Error shutting down fetcher: {}", e);
    } else {
        log::info!("Fetcher shut down successfully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_in_mock_mode_uses_memory_store() {
        let config = AppConfig {
            use_mock: true,
            fetch_backend: FetchBackend::Mock,
            ..Default::default()
        };

        let state = setup(&config).await.unwrap();
        assert_eq!(state.pipeline.fetcher().name(), "mock");
        assert!(state.store.get_all().await.unwrap().is_empty());

        shutdown_services(&state).await;
    }

    #[tokio::test]
    async fn test_setup_with_sqlite_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_url: format!("sqlite://{}?mode=rwc", dir.path().join("life.db").display()),
            fetch_backend: FetchBackend::Mock,
            ..Default::default()
        };

        let state = setup(&config).await.unwrap();
        let result = state
            .pipeline
            .run(crate::service::AnalyzeRequest::new("https://mock.test/"))
            .await
            .unwrap();

        let id = result.id.expect("persisted");
        assert!(state.store.get_by_id(&id).await.unwrap().is_some());
    }
}
