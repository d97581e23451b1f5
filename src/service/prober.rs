//! Link liveness checks.
//!
//! Links are probed in fixed-size batches; a batch settles completely before
//! the next one starts. Each probe is independent and a failed request marks
//! only its own link as broken.

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::domain::models::Document;
use crate::error::Result;
use crate::service::http::{create_client, ClientType};

pub struct LinkProber {
    client: Client,
    batch_size: usize,
    timeout: Duration,
}

impl LinkProber {
    pub fn new(batch_size: usize, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::BrowserLike, timeout)?,
            batch_size: batch_size.max(1),
            timeout,
        })
    }

    /// Probe every distinct href and return `href -> is_broken`.
    pub async fn probe(&self, hrefs: &[String]) -> HashMap<String, bool> {
        let batches = plan_batches(hrefs, self.batch_size);
        let mut results = HashMap::with_capacity(hrefs.len());

        for (i, batch) in batches.iter().enumerate() {
            log::trace!("[PROBE] Batch {} ({} links)", i + 1, batch.len());
            let outcomes = join_all(batch.iter().map(|href| self.probe_one(href))).await;
            results.extend(batch.iter().cloned().zip(outcomes));
        }

        let broken = results.values().filter(|b| **b).count();
        log::debug!("[PROBE] {} links checked, {} broken", results.len(), broken);
        results
    }

    /// `true` when the link is broken: status >= 400, request failure, or timeout.
    pub async fn probe_one(&self, href: &str) -> bool {
        match tokio::time::timeout(self.timeout, self.status_of(href)).await {
            Ok(Ok(status)) => {
                log::trace!("[PROBE] {} -> {}", href, status);
                status.as_u16() >= 400
            }
            Ok(Err(e)) => {
                log::debug!("[PROBE] {} failed: {}", href, e);
                true
            }
            Err(_) => {
                log::debug!("[PROBE] {} timed out", href);
                true
            }
        }
    }

    async fn status_of(&self, href: &str) -> reqwest::Result<StatusCode> {
        let status = self.client.head(href).send().await?.status();
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            log::trace!("[PROBE] HEAD unsupported for {}, retrying with GET", href);
            return Ok(self.client.get(href).send().await?.status());
        }
        Ok(status)
    }
}

/// Split hrefs into batches of at most `size`, dropping duplicates and
/// keeping first-occurrence order.
pub fn plan_batches(hrefs: &[String], size: usize) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = hrefs
        .iter()
        .filter(|h| seen.insert(*h))
        .cloned()
        .collect();

    unique.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

/// Merge probe results into the document's links by href. Links without a
/// result keep `is_broken = false`.
pub fn apply_link_status(document: &mut Document, statuses: &HashMap<String, bool>) {
    for link in &mut document.links {
        link.is_broken = statuses.get(&link.href).copied().unwrap_or(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Link;

    fn hrefs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_batches_respects_size_and_dedups() {
        let input = hrefs(&["a", "b", "a", "c", "d", "e", "f", "b", "g"]);
        let batches = plan_batches(&input, 5);

        assert!(batches.iter().all(|b| b.len() <= 5));
        assert_eq!(batches.concat(), hrefs(&["a", "b", "c", "d", "e", "f", "g"]));
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_plan_batches_zero_size_is_treated_as_one() {
        let batches = plan_batches(&hrefs(&["a", "b"]), 0);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_apply_link_status_keeps_order_and_fails_open() {
        let mut doc = Document {
            links: vec![
                Link::new("https://x/1", "one"),
                Link::new("https://x/2", "two"),
                Link::new("https://x/1", "one again"),
            ],
            ..Default::default()
        };
        let statuses = HashMap::from([("https://x/1".to_string(), true)]);

        apply_link_status(&mut doc, &statuses);

        let flags: Vec<bool> = doc.links.iter().map(|l| l.is_broken).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(doc.links[2].text, "one again");
    }

    #[tokio::test]
    async fn test_probe_classifies_statuses() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("HEAD", "/ok").with_status(200).create_async().await;
        let _gone = server.mock("HEAD", "/gone").with_status(404).create_async().await;
        let _err = server.mock("HEAD", "/err").with_status(500).create_async().await;

        let prober = LinkProber::new(2, Duration::from_secs(5)).unwrap();
        let base = server.url();
        let links = hrefs(&[
            &format!("{base}/ok"),
            &format!("{base}/gone"),
            &format!("{base}/err"),
        ]);
        let results = prober.probe(&links).await;

        assert_eq!(results[&format!("{base}/ok")], false);
        assert_eq!(results[&format!("{base}/gone")], true);
        assert_eq!(results[&format!("{base}/err")], true);
    }

    #[tokio::test]
    async fn test_head_not_allowed_falls_back_to_get() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/no-head")
            .with_status(405)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/no-head")
            .with_status(200)
            .with_body("fine")
            .create_async()
            .await;

        let prober = LinkProber::new(5, Duration::from_secs(5)).unwrap();
        let broken = prober.probe_one(&format!("{}/no-head", server.url())).await;

        head.assert_async().await;
        get.assert_async().await;
        assert!(!broken);
    }

    #[tokio::test]
    async fn test_duplicate_hrefs_are_probed_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/same")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let href = format!("{}/same", server.url());
        let prober = LinkProber::new(5, Duration::from_secs(5)).unwrap();
        let results = prober.probe(&[href.clone(), href.clone(), href]).await;

        mock.assert_async().await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_link_is_broken() {
        let prober = LinkProber::new(5, Duration::from_secs(2)).unwrap();
        assert!(prober.probe_one("http://127.0.0.1:9/").await);
    }
}
