//! Headless Chromium backend.
//!
//! One browser process per fetcher, launched on first use and released by
//! [`PageFetcher::shutdown`]. Each fetch opens its own tab. Tabs only need a
//! read lock; launching and releasing take the write lock.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::{parse_target_url, PageFetcher};
use crate::domain::models::PageSnapshot;
use crate::error::{AppError, Result};

const SERVICE: &str = "browser";

struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
}

pub struct BrowserFetcher {
    state: RwLock<Option<BrowserHandle>>,
    timeout: Duration,
    settle_time: Duration,
}

impl BrowserFetcher {
    pub fn new(timeout: Duration, settle_time: Duration) -> Self {
        Self {
            state: RwLock::new(None),
            timeout,
            settle_time,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_some()
    }

    async fn launch() -> Result<BrowserHandle> {
        log::info!("[BROWSER] Launching headless Chromium");

        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1366, 900)
            .args(["--disable-gpu", "--disable-dev-shm-usage", "--disable-extensions"])
            .build()
            .map_err(|e| AppError::config(format!("browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(BrowserHandle { browser, handler })
    }

    async fn ensure_launched(&self) -> Result<()> {
        if self.state.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.state.write().await;
        if guard.is_none() {
            *guard = Some(Self::launch().await?);
        }
        Ok(())
    }

    async fn render(&self, page: &Page, url: &str) -> Result<PageSnapshot> {
        page.goto(url).await.map_err(cdp_error)?;
        page.wait_for_navigation().await.map_err(cdp_error)?;
        tokio::time::sleep(self.settle_time).await;

        let html = page.content().await.map_err(cdp_error)?;
        let title = page.get_title().await.ok().flatten();
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let screenshot = match page.screenshot(params).await {
            Ok(bytes) => Some(STANDARD.encode(bytes)),
            Err(e) => {
                log::warn!("[BROWSER] Screenshot failed for {}: {}", url, e);
                None
            }
        };

        Ok(PageSnapshot {
            final_url,
            title,
            html,
            screenshot,
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        let target = parse_target_url(url)?;
        self.ensure_launched().await?;

        let guard = self.state.read().await;
        let handle = guard
            .as_ref()
            .ok_or_else(|| AppError::upstream(SERVICE, "browser was released"))?;

        let page = handle.browser.new_page("about:blank").await.map_err(cdp_error)?;
        let outcome = tokio::time::timeout(self.timeout, self.render(&page, target.as_str())).await;

        if let Err(e) = page.close().await {
            log::debug!("[BROWSER] Failed to close tab: {}", e);
        }

        outcome.map_err(|_| AppError::Timeout(self.timeout.as_secs()))?
    }

    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn shutdown(&self) -> Result<()> {
        let Some(mut handle) = self.state.write().await.take() else {
            return Ok(());
        };

        log::info!("[BROWSER] Closing headless Chromium");
        if let Err(e) = handle.browser.close().await {
            log::warn!("[BROWSER] Close failed: {}", e);
        }
        if let Err(e) = handle.browser.wait().await {
            log::warn!("[BROWSER] Wait for exit failed: {}", e);
        }
        handle.handler.abort();
        Ok(())
    }
}

fn cdp_error(e: CdpError) -> AppError {
    AppError::upstream(SERVICE, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_browser_is_lazy_and_shutdown_without_launch_is_noop() {
        let fetcher = BrowserFetcher::new(Duration::from_secs(5), Duration::from_millis(0));
        assert!(!fetcher.is_running().await);
        fetcher.shutdown().await.unwrap();
        assert!(!fetcher.is_running().await);
    }

    #[tokio::test]
    async fn test_invalid_url_does_not_launch_browser() {
        let fetcher = BrowserFetcher::new(Duration::from_secs(5), Duration::from_millis(0));
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(!fetcher.is_running().await);
    }
}
