use anyhow::Result;
use tokio_util::sync::CancellationToken;

use pagelens::config::AppConfig;
use pagelens::lifecycle;
use pagelens::server::HttpServer;

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_logging();

    let config = AppConfig::from_env()?;
    log::info!(
        "Starting pagelens {} (fetch backend: {}, mock: {})",
        env!("CARGO_PKG_VERSION"),
        config.fetch_backend.as_str(),
        config.use_mock
    );

    let state = lifecycle::setup(&config).await?;

    let shutdown = CancellationToken::new();
    lifecycle::spawn_shutdown_listener(shutdown.clone());

    let server = HttpServer::new(config.listen_addr.clone(), config.cors_enabled, state.clone());
    let outcome = server.run(shutdown).await;

    lifecycle::shutdown_services(&state).await;
    outcome
}
