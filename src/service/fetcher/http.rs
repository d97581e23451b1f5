//! Plain HTTP fetcher. Fast, but sees only server-rendered markup.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{parse_target_url, PageFetcher};
use crate::domain::models::PageSnapshot;
use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};

const SERVICE: &str = "http";

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::BrowserLike, timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        let target = parse_target_url(url)?;
        log::debug!("[FETCH] GET {}", target);

        let response = self
            .client
            .get(target)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("[FETCH] {} answered {}", url, status);
            return Err(AppError::upstream(SERVICE, format!("{url} returned HTTP {status}")));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;

        log::debug!("[FETCH] {} bytes from {}", html.len(), final_url);

        Ok(PageSnapshot {
            final_url,
            title: None,
            html,
            screenshot: None,
        })
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}
