//! Single-URL analysis: fetch, extract, probe links, analyze, summarize, assemble.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PipelineSettings;
use crate::domain::models::{AnalysisResult, Document};
use crate::error::{AppError, Result};
use crate::extractor::PageExtractor;
use crate::repository::AnalysisStore;
use crate::service::analysis_assembler::AnalysisAssembler;
use crate::service::analyzer::IssueAnalyzer;
use crate::service::fetcher::{parse_target_url, PageFetcher};
use crate::service::prober::{apply_link_status, LinkProber};
use crate::service::summarizer::Summarizer;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default = "default_true")]
    pub persist: bool,
    #[serde(default = "default_true", alias = "include_analysis")]
    pub include_analysis: bool,
}

impl AnalyzeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            persist: true,
            include_analysis: true,
        }
    }
}

pub struct AnalysisPipeline {
    fetcher: Arc<dyn PageFetcher>,
    prober: Option<LinkProber>,
    summarizer: Arc<dyn Summarizer>,
    assembler: AnalysisAssembler,
    timeout: Duration,
}

impl AnalysisPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn AnalysisStore>,
        settings: &PipelineSettings,
    ) -> Self {
        let prober = match LinkProber::new(settings.probe_batch_size, settings.probe_timeout) {
            Ok(prober) => Some(prober),
            Err(e) => {
                log::warn!("[PIPELINE] Link prober unavailable, links will not be checked: {}", e);
                None
            }
        };

        Self {
            fetcher,
            prober,
            summarizer,
            assembler: AnalysisAssembler::new(store),
            timeout: settings.pipeline_timeout,
        }
    }

    /// Skip link liveness checks; every link is reported as not broken.
    pub fn without_link_probe(mut self) -> Self {
        self.prober = None;
        self
    }

    pub fn fetcher(&self) -> &Arc<dyn PageFetcher> {
        &self.fetcher
    }

    /// Run the whole pipeline for one URL.
    ///
    /// Only an invalid URL or the pipeline timeout produce an error. Fetch
    /// failures end up in `Document::error`.
    pub async fn run(&self, request: AnalyzeRequest) -> Result<AnalysisResult> {
        let url = parse_target_url(&request.url)?;
        log::info!("[PIPELINE] Analyzing {}", url);

        match tokio::time::timeout(self.timeout, self.execute(url.as_str(), &request)).await {
            Ok(result) => Ok(result),
            Err(_) => {
                log::warn!(
                    "[PIPELINE] {} exceeded {}s, aborting",
                    url,
                    self.timeout.as_secs()
                );
                Err(AppError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn execute(&self, url: &str, request: &AnalyzeRequest) -> AnalysisResult {
        let document = self.build_document(url).await;

        let analysis = if request.include_analysis && !document.is_failed() {
            Some(self.summarizer.summarize(&document).await)
        } else {
            None
        };

        self.assembler
            .assemble(document, analysis, request.persist)
            .await
    }

    async fn build_document(&self, url: &str) -> Document {
        let snapshot = match self.fetcher.fetch(url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("[PIPELINE] Fetch of {} via {} failed: {}", url, self.fetcher.name(), e);
                return Document::failed(url, e.to_string());
            }
        };

        let mut document = PageExtractor::extract_snapshot(&snapshot);
        document.url = url.to_string();
        log::debug!(
            "[PIPELINE] Extracted {} headings and {} links from {}",
            document.headings.len(),
            document.links.len(),
            url
        );

        self.check_links(&mut document).await;
        document.issues = IssueAnalyzer::analyze(&document);
        document
    }

    async fn check_links(&self, document: &mut Document) {
        if document.links.is_empty() {
            return;
        }

        match &self.prober {
            Some(prober) => {
                let hrefs: Vec<String> = document.links.iter().map(|l| l.href.clone()).collect();
                let statuses = prober.probe(&hrefs).await;
                apply_link_status(document, &statuses);
            }
            None => {
                log::warn!(
                    "[PIPELINE] Link status unknown for {} links on {}; reporting them as not broken",
                    document.links.len(),
                    document.url
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{IssueKind, PageSnapshot};
    use crate::repository::MemoryAnalysisStore;
    use crate::service::fetcher::MockFetcher;
    use crate::service::summarizer::HeuristicSummarizer;
    use crate::{assert_has_issue, assert_no_issue};
    use async_trait::async_trait;

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<PageSnapshot> {
            Err(AppError::network("connection refused"))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowFetcher;

    #[async_trait]
    impl PageFetcher for SlowFetcher {
        async fn fetch(&self, _url: &str) -> Result<PageSnapshot> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PageSnapshot::default())
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn pipeline_with(fetcher: Arc<dyn PageFetcher>, store: Arc<MemoryAnalysisStore>) -> AnalysisPipeline {
        AnalysisPipeline::new(
            fetcher,
            Arc::new(HeuristicSummarizer),
            store,
            &PipelineSettings::default(),
        )
        .without_link_probe()
    }

    #[tokio::test]
    async fn test_run_with_mock_fetcher_persists_result() {
        let store = Arc::new(MemoryAnalysisStore::new());
        let pipeline = pipeline_with(Arc::new(MockFetcher::new()), store.clone());

        let result = pipeline.run(AnalyzeRequest::new("https://mock.test/")).await.unwrap();

        assert!(result.is_persisted());
        assert_eq!(result.document.url, "https://mock.test/");
        assert_eq!(result.document.h1_count(), 1);
        assert!(result.analysis.is_some());
        assert_has_issue!(&result.document.issues, IssueKind::NonDescriptiveLinks);
        assert_no_issue!(&result.document.issues, IssueKind::MissingTitle);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_url() {
        let pipeline = pipeline_with(Arc::new(MockFetcher::new()), Arc::new(MemoryAnalysisStore::new()));
        let err = pipeline.run(AnalyzeRequest::new("ftp://nope")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_document_error() {
        let store = Arc::new(MemoryAnalysisStore::new());
        let pipeline = pipeline_with(Arc::new(FailingFetcher), store.clone());

        let result = pipeline.run(AnalyzeRequest::new("https://down.test/")).await.unwrap();

        let doc = &result.document;
        assert!(doc.error.as_deref().unwrap().contains("connection refused"));
        assert!(doc.title.is_none() && doc.headings.is_empty() && doc.links.is_empty());
        assert!(doc.issues.is_empty());
        assert!(result.analysis.is_none());
        assert!(result.is_persisted());
    }

    #[tokio::test]
    async fn test_pipeline_timeout_aborts_run() {
        let settings = PipelineSettings {
            pipeline_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let store = Arc::new(MemoryAnalysisStore::new());
        let pipeline = AnalysisPipeline::new(
            Arc::new(SlowFetcher),
            Arc::new(HeuristicSummarizer),
            store.clone(),
            &settings,
        );

        let err = pipeline.run(AnalyzeRequest::new("https://slow.test/")).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert!(store.is_empty(), "no partial result may be stored");
    }

    #[tokio::test]
    async fn test_request_flags_are_honored() {
        let store = Arc::new(MemoryAnalysisStore::new());
        let pipeline = pipeline_with(Arc::new(MockFetcher::new()), store.clone());

        let request = AnalyzeRequest {
            url: "https://mock.test/".into(),
            persist: false,
            include_analysis: false,
        };
        let result = pipeline.run(request).await.unwrap();

        assert!(!result.is_persisted());
        assert!(result.analysis.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_analyze_request_defaults() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"url":"https://x.test"}"#).unwrap();
        assert!(req.persist && req.include_analysis);

        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"url":"https://x.test","include_analysis":false}"#).unwrap();
        assert!(!req.include_analysis);
    }
}
