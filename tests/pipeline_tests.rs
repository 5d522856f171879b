use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arch_scraper::extractor::FALLBACK_DESCRIPTION;
use arch_scraper::{
    ArchitectureExtractor, ArchitectureRepository, FetchError, HttpPageFetcher,
    InMemoryArchitectureRepository, ModelError, PageFetcher, ParsingStatus, PipelineError,
    ScrapePipeline, SqliteDocumentStore, StorageError, TextModel,
};
use async_trait::async_trait;
use warp::Filter;

const ARCHITECTURE_PAGE: &str = r#"<html>
<head><title>Serverless Image Processing</title></head>
<body>
  <h1>Serverless Image Processing</h1>
  <p>Images land in Amazon S3 and trigger AWS Lambda.</p>
</body>
</html>"#;

const MODEL_REPLY: &str = r#"```json
{
  "title": "Serverless Image Processing",
  "description": "Resize uploads on the fly",
  "services": ["Amazon S3", "AWS Lambda"],
  "components": [{"name": "Upload bucket", "type": "aws_service", "description": "Receives images"}],
  "use_case": "Media",
  "complexity": "Simple",
  "benefits": ["No servers"],
  "architecture_pattern": "event-driven"
}
```"#;

struct CannedModel(&'static str);

#[async_trait]
impl TextModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok(self.0.to_string())
    }
}

/// Serves the architecture page at `/arch`, a slow page at `/slow` and 404
/// everywhere else.
async fn spawn_site() -> SocketAddr {
    let arch = warp::path("arch")
        .and(warp::path::end())
        .map(|| warp::reply::html(ARCHITECTURE_PAGE));
    let slow = warp::path("slow").and(warp::path::end()).then(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        warp::reply::html(ARCHITECTURE_PAGE)
    });

    let (addr, server) = warp::serve(arch.or(slow)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn build_pipeline(
    reply: &'static str,
    fetch_timeout: Duration,
) -> (ScrapePipeline, Arc<dyn ArchitectureRepository>) {
    let repository: Arc<dyn ArchitectureRepository> =
        Arc::new(InMemoryArchitectureRepository::new());
    let pipeline = ScrapePipeline::new(
        Arc::new(HttpPageFetcher::new(fetch_timeout).expect("http client")),
        ArchitectureExtractor::new(Arc::new(CannedModel(reply)), Duration::from_secs(5)),
        Arc::clone(&repository),
    );
    (pipeline, repository)
}

#[tokio::test]
async fn fetcher_reads_title_and_text_from_live_page() {
    let addr = spawn_site().await;
    let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).expect("http client");
    let url = format!("http://{}/arch", addr);

    let page = fetcher.fetch(&url).await.expect("fetch");

    assert_eq!(page.url, url);
    assert_eq!(page.title, "Serverless Image Processing");
    assert!(page.full_text.contains("Images land in Amazon S3"));
}

#[tokio::test]
async fn process_stores_and_returns_extracted_record() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_secs(5));
    let url = format!("http://{}/arch", addr);

    let record = pipeline.process(&url).await.expect("process");

    assert_eq!(record.parsing_status, ParsingStatus::Success);
    assert_eq!(record.source_url, url);
    assert_eq!(record.services, vec!["Amazon S3", "AWS Lambda"]);
    assert_eq!(record.raw_title.as_deref(), Some("Serverless Image Processing"));
    assert_eq!(repository.list_all().await.expect("list"), vec![record]);
}

#[tokio::test]
async fn repeated_scrapes_of_one_url_create_distinct_records() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_secs(5));
    let url = format!("http://{}/arch", addr);

    let first = pipeline.process(&url).await.expect("first");
    let second = pipeline.process(&url).await.expect("second");

    assert_ne!(first.id, second.id);
    let stored = repository.list_all().await.expect("list");
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.source_url == url));
}

#[tokio::test]
async fn unparsable_reply_is_stored_as_fallback() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline("not json at all", Duration::from_secs(5));
    let url = format!("http://{}/arch", addr);

    let record = pipeline.process(&url).await.expect("process");

    assert_eq!(record.parsing_status, ParsingStatus::Failed);
    assert_eq!(record.description.as_deref(), Some(FALLBACK_DESCRIPTION));
    assert_eq!(record.title.as_deref(), Some("Serverless Image Processing"));
    assert_eq!(repository.list_all().await.expect("list"), vec![record]);
}

#[tokio::test]
async fn non_success_status_aborts_without_storing() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_secs(5));
    let url = format!("http://{}/missing", addr);

    let err = pipeline.process(&url).await.expect_err("404 must fail");

    match err {
        PipelineError::Fetch(ref fetch) => {
            assert_eq!(fetch.url(), url);
            assert_eq!(fetch.status(), Some(404));
        }
        ref other => panic!("expected fetch error, got {other:?}"),
    }
    assert!(err.to_string().contains(&url));
    assert!(repository.list_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn slow_page_times_out_without_storing() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_millis(200));
    let url = format!("http://{}/slow", addr);

    let err = pipeline.process(&url).await.expect_err("timeout must fail");

    assert!(matches!(
        err,
        PipelineError::Fetch(FetchError::Timeout { .. })
    ));
    assert!(repository.list_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn unreachable_host_is_a_fetch_error() {
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_secs(2));

    // Nothing listens on port 9 of the loopback interface.
    let err = pipeline
        .process("http://127.0.0.1:9/arch")
        .await
        .expect_err("connection must fail");

    assert!(matches!(err, PipelineError::Fetch(_)));
    assert!(repository.list_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn closed_store_surfaces_storage_error() {
    let addr = spawn_site().await;
    let repository: Arc<dyn ArchitectureRepository> =
        Arc::new(SqliteDocumentStore::open_in_memory("architectures").expect("open store"));
    repository.close().await.expect("close store");
    let pipeline = ScrapePipeline::new(
        Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).expect("http client")),
        ArchitectureExtractor::new(Arc::new(CannedModel(MODEL_REPLY)), Duration::from_secs(5)),
        repository,
    );
    let url = format!("http://{}/arch", addr);

    let err = pipeline.process(&url).await.expect_err("insert must fail");

    assert!(matches!(err, PipelineError::Storage(StorageError::Closed)));
    assert_eq!(err.to_string(), "Store is closed");
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let addr = spawn_site().await;
    let (pipeline, repository) = build_pipeline(MODEL_REPLY, Duration::from_secs(5));
    let pipeline = Arc::new(pipeline);
    let url = format!("http://{}/arch", addr);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let url = url.clone();
            tokio::spawn(async move { pipeline.process(&url).await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task").expect("process");
    }

    assert_eq!(repository.list_all().await.expect("list").len(), 8);
}
