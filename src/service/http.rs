use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:136.0) Gecko/20100101 Firefox/136.0";
const SERVICE_USER_AGENT: &str = concat!("pagelens/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    /// JSON APIs (scrape service, language model)
    Standard,
    /// Page and link requests that should look like a regular browser
    BrowserLike,
}

/// Factory for creating an HTTP client with the given request timeout.
pub fn create_client(client_type: ClientType, timeout: Duration) -> Result<Client> {
    let builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)));

    match client_type {
        ClientType::BrowserLike => builder
            .user_agent(BROWSER_USER_AGENT)
            .redirect(Policy::limited(10))
            .build()
            .context("Failed to build browser-like reqwest client"),
        ClientType::Standard => builder
            .user_agent(SERVICE_USER_AGENT)
            .build()
            .context("Failed to build standard reqwest client"),
    }
}
