mod page_fetcher;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::RawPage;

pub use page_fetcher::{parse_page, HttpPageFetcher, DEFAULT_FETCH_TIMEOUT_SECS};

/// Retrieves a single page and reduces it to title and visible text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError>;
}
