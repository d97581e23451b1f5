//! End-to-end tests for the single-URL analysis pipeline.
//!
//! A local mock site stands in for the target page and its links.

use std::sync::Arc;
use std::time::Duration;

use pagelens::{
    config::PipelineSettings,
    domain::models::IssueKind,
    repository::{AnalysisStore, SqliteAnalysisRepository},
    service::{
        fetcher::HttpFetcher, summarizer::HeuristicSummarizer, AnalysisPipeline, AnalyzeRequest,
    },
};
use sqlx::SqlitePool;

/// Creates an in-memory SQLite database with migrations applied for testing.
async fn setup_test_db() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        fetch_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn build_pipeline(store: Arc<dyn AnalysisStore>) -> AnalysisPipeline {
    AnalysisPipeline::new(
        Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap()),
        Arc::new(HeuristicSummarizer),
        store,
        &settings(),
    )
}

const LANDING_PAGE: &str = r#"
<html>
  <head><title>Acme widgets and gadgets</title></head>
  <body>
    <h1>Acme widgets</h1>
    <h1>Second headline</h1>
    <h3>Skipped a level</h3>
    <a href="/ok">Our great catalogue</a>
    <a href="/gone">Old reliable page</a>
    <a href="/ok">click here</a>
    <a href="mailto:sales@acme.test">Mail us</a>
  </body>
</html>
"#;

#[tokio::test]
async fn test_full_pipeline_against_mock_site() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(LANDING_PAGE)
        .create_async()
        .await;
    let ok = server
        .mock("HEAD", "/ok")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let _gone = server.mock("HEAD", "/gone").with_status(404).create_async().await;

    let store = Arc::new(SqliteAnalysisRepository::new(setup_test_db().await));
    let pipeline = build_pipeline(store.clone());

    let url = format!("{}/", server.url());
    let result = pipeline.run(AnalyzeRequest::new(url.clone())).await.unwrap();
    let doc = &result.document;

    // Duplicate hrefs are probed once
    ok.assert_async().await;

    assert_eq!(doc.url, url);
    assert_eq!(doc.title.as_deref(), Some("Acme widgets and gadgets"));
    assert_eq!(doc.headings.len(), 3);
    assert_eq!(doc.links.len(), 3, "mailto links are dropped");
    assert!(doc.links.iter().all(|l| l.href.starts_with("http")));

    let broken: Vec<bool> = doc.links.iter().map(|l| l.is_broken).collect();
    assert_eq!(broken, vec![false, true, false]);

    let kinds: Vec<IssueKind> = doc.issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::MultipleH1s));
    assert!(kinds.contains(&IssueKind::HeadingHierarchy));
    assert!(kinds.contains(&IssueKind::NonDescriptiveLinks));
    assert!(kinds.contains(&IssueKind::BrokenLinks));
    assert!(!kinds.contains(&IssueKind::MissingTitle));

    let broken_issue = doc
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::BrokenLinks)
        .unwrap();
    assert_eq!(broken_issue.description, "Page contains 1 broken link");

    let analysis = result.analysis.as_ref().expect("analysis requested by default");
    assert!(analysis.sentiment_score > 0.0);
    assert!(!analysis.suggestions.is_empty());

    // Round trip through the store
    let id = result.id.clone().expect("persisted by default");
    let stored = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(&stored.document, doc);
    assert_eq!(stored.analysis.as_ref(), Some(analysis));
}

#[tokio::test]
async fn test_unreachable_page_is_reported_not_raised() {
    let store = Arc::new(SqliteAnalysisRepository::new(setup_test_db().await));
    let pipeline = build_pipeline(store.clone());

    let result = pipeline
        .run(AnalyzeRequest::new("http://127.0.0.1:9/"))
        .await
        .expect("fetch failures do not fail the run");

    assert!(result.document.error.is_some());
    assert!(result.document.links.is_empty());
    assert!(result.analysis.is_none());
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_error_page_is_reported_not_raised() {
    let mut server = mockito::Server::new_async().await;
    let _page = server.mock("GET", "/").with_status(503).create_async().await;

    let pipeline = build_pipeline(Arc::new(SqliteAnalysisRepository::new(setup_test_db().await)));
    let request = AnalyzeRequest {
        url: format!("{}/", server.url()),
        persist: false,
        include_analysis: true,
    };
    let result = pipeline.run(request).await.unwrap();

    assert!(result.document.error.as_deref().unwrap().contains("503"));
    assert!(!result.is_persisted());
}
