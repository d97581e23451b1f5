//! HTTP API Server
//!
//! Axum-based HTTP server for the pagelens REST API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::Method;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::commands::{create_router, AppState};

pub struct HttpServer {
    listen_addr: String,
    cors_enabled: bool,
    state: AppState,
}

impl HttpServer {
    pub fn new(listen_addr: impl Into<String>, cors_enabled: bool, state: AppState) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            cors_enabled,
            state,
        }
    }

    /// Serve until `shutdown` is cancelled. In-flight requests are allowed to finish.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr: SocketAddr = self
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let mut app = create_router(self.state);

        if self.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any);
            app = app.layer(cors);
        }

        app = app.layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;

        log::info!("HTTP API server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                log::info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, FetchBackend};
    use crate::lifecycle;

    async fn mock_state() -> AppState {
        let config = AppConfig {
            use_mock: true,
            fetch_backend: FetchBackend::Mock,
            ..Default::default()
        };
        lifecycle::setup(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_listen_addr() {
        let server = HttpServer::new("not-an-address", true, mock_state().await);
        let err = server.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid HTTP listen address"));
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let server = HttpServer::new("127.0.0.1:0", false, mock_state().await);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), server.run(shutdown))
            .await
            .expect("server did not stop after cancellation");
        assert!(outcome.is_ok());
    }
}
