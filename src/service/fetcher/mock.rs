use async_trait::async_trait;

use super::{parse_target_url, PageFetcher};
use crate::domain::models::PageSnapshot;
use crate::error::Result;

/// 1x1 transparent PNG
const PLACEHOLDER_SCREENSHOT: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

const CANNED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Sample Landing Page</title></head>
<body>
  <h1>Welcome to the sample site</h1>
  <h2>What we offer</h2>
  <p>Reliable tools for great websites.</p>
  <h3>Features</h3>
  <h2>Pricing</h2>
  <a href="/features">Explore all features</a>
  <a href="/pricing">See pricing plans</a>
  <a href="/blog">Read more</a>
  <a href="/media/intro.mp4">Watch the intro video</a>
  <a href="/media/hero.png">Hero image</a>
</body>
</html>"#;

/// Returns the same page for every URL. Selected only by explicit configuration.
#[derive(Debug, Default)]
pub struct MockFetcher;

impl MockFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        let target = parse_target_url(url)?;
        log::debug!("[FETCH] Serving canned page for {}", target);

        Ok(PageSnapshot {
            final_url: target.to_string(),
            title: None,
            html: CANNED_PAGE.to_string(),
            screenshot: Some(PLACEHOLDER_SCREENSHOT.to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PageExtractor;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let fetcher = MockFetcher::new();
        let a = fetcher.fetch("https://example.com/").await.unwrap();
        let b = fetcher.fetch("https://example.com/").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_mock_links_resolve_against_requested_url() {
        let snapshot = MockFetcher::new().fetch("https://site.test/start").await.unwrap();
        let doc = PageExtractor::extract_snapshot(&snapshot);

        assert_eq!(doc.title.as_deref(), Some("Sample Landing Page"));
        assert!(doc.links.iter().all(|l| l.href.starts_with("https://site.test/")));
        assert!(doc.screenshot.is_some());
    }
}
