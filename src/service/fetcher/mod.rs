//! Page fetch strategies.
//!
//! - **Http**: plain GET, no JavaScript rendering, no screenshot
//! - **ScrapeApi**: managed scraping service returning rendered HTML and a screenshot
//! - **Browser**: local headless Chromium (`browser` feature)
//! - **Mock**: deterministic canned page
//!
//! All implement the `PageFetcher` trait and are picked by [`build_fetcher`].

#[cfg(feature = "browser")]
mod browser;
mod http;
mod mock;
mod scrape_api;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use mock::MockFetcher;
pub use scrape_api::{ScrapeApiFetcher, ScrapeApiResponse};

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::config::{AppConfig, FetchBackend};
use crate::domain::models::PageSnapshot;
use crate::error::{AppError, Result};

/// Strategy trait for retrieving a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its rendered HTML plus whatever metadata the
    /// backend can provide.
    async fn fetch(&self, url: &str) -> Result<PageSnapshot>;

    /// Human-readable name for this fetcher.
    fn name(&self) -> &'static str;

    /// Release held resources. Called once on service shutdown.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Parse and validate a fetch target. Only absolute http(s) URLs are accepted.
pub fn parse_target_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("URL is required"));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AppError::invalid_input(format!("'{trimmed}' is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(AppError::invalid_input(format!("'{trimmed}' has no host"))),
        scheme => Err(AppError::invalid_input(format!(
            "unsupported URL scheme '{scheme}', expected http or https"
        ))),
    }
}

/// Build the fetcher selected by configuration.
pub fn build_fetcher(config: &AppConfig) -> Result<Arc<dyn PageFetcher>> {
    let settings = &config.pipeline;

    let fetcher: Arc<dyn PageFetcher> = match config.fetch_backend {
        FetchBackend::Http => Arc::new(HttpFetcher::new(settings.fetch_timeout)?),
        FetchBackend::ScrapeApi => {
            let api = config.scrape_api.clone().ok_or_else(|| {
                AppError::config("scrape-api backend selected without endpoint and key")
            })?;
            Arc::new(ScrapeApiFetcher::new(api, settings.fetch_timeout, settings.settle_time)?)
        }
        #[cfg(feature = "browser")]
        FetchBackend::Browser => Arc::new(BrowserFetcher::new(
            settings.fetch_timeout,
            settings.settle_time,
        )),
        #[cfg(not(feature = "browser"))]
        FetchBackend::Browser => {
            return Err(AppError::config(
                "browser backend requested but pagelens was built without the `browser` feature",
            ))
        }
        FetchBackend::Mock => Arc::new(MockFetcher::new()),
    };

    log::info!("[FETCH] Using {} fetcher", fetcher.name());
    Ok(fetcher)
}
