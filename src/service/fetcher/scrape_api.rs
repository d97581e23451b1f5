//! Managed scraping service backend.
//!
//! The service renders the page remotely and returns HTML, the page title and
//! a full-page screenshot. Its reply comes in one of three shapes which are
//! normalized into a [`PageSnapshot`] here and nowhere else.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{parse_target_url, PageFetcher};
use crate::config::ScrapeApiConfig;
use crate::domain::models::PageSnapshot;
use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};

const SERVICE: &str = "scrape-api";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScrapePayload {
    #[serde(alias = "content")]
    pub html: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default, alias = "finalUrl", alias = "final_url")]
    pub url: Option<String>,
}

/// Reply variants of the scraping service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScrapeApiResponse {
    Failed { error: String },
    Wrapped { data: ScrapePayload },
    Direct(ScrapePayload),
}

impl ScrapeApiResponse {
    pub fn into_snapshot(self, requested_url: &str) -> Result<PageSnapshot> {
        let payload = match self {
            ScrapeApiResponse::Failed { error } => return Err(AppError::upstream(SERVICE, error)),
            ScrapeApiResponse::Wrapped { data } => data,
            ScrapeApiResponse::Direct(payload) => payload,
        };

        Ok(PageSnapshot {
            final_url: payload
                .url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| requested_url.to_string()),
            title: payload.title,
            html: payload.html,
            screenshot: payload.screenshot.as_deref().and_then(normalize_screenshot),
        })
    }
}

/// Strip a `data:` URL prefix; the document stores bare base64.
fn normalize_screenshot(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let encoded = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    (!encoded.is_empty()).then(|| encoded.to_string())
}

pub struct ScrapeApiFetcher {
    client: Client,
    config: ScrapeApiConfig,
    timeout: Duration,
    settle_time: Duration,
}

impl ScrapeApiFetcher {
    pub fn new(config: ScrapeApiConfig, timeout: Duration, settle_time: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Standard, timeout)?,
            config,
            timeout,
            settle_time,
        })
    }
}

#[async_trait]
impl PageFetcher for ScrapeApiFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        let target = parse_target_url(url)?;
        log::debug!("[FETCH] Scrape API request for {}", target);

        let body = json!({
            "url": target.as_str(),
            "renderJs": true,
            "screenshot": true,
            "fullPage": true,
            "waitMs": self.settle_time.as_millis() as u64,
            "timeoutMs": self.timeout.as_millis() as u64,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;

        if !status.is_success() {
            log::warn!("[FETCH] Scrape API answered {} for {}", status, url);
            return Err(AppError::upstream(SERVICE, format!("HTTP {status}: {text}")));
        }

        let parsed: ScrapeApiResponse = serde_json::from_str(&text)
            .map_err(|e| AppError::upstream(SERVICE, format!("malformed reply: {e}")))?;

        parsed.into_snapshot(target.as_str())
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}
