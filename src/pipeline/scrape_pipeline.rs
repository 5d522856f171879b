use std::sync::Arc;

use tracing::{error, info};

use crate::error::{PipelineError, StorageError};
use crate::extractor::ArchitectureExtractor;
use crate::models::ArchitectureRecord;
use crate::repository::ArchitectureRepository;
use crate::scraper::PageFetcher;

/// Fetch, extract and store one URL at a time.
///
/// Holds no per-call state; clone the `Arc` and call [`process`](Self::process)
/// from as many tasks as needed.
pub struct ScrapePipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: ArchitectureExtractor,
    repository: Arc<dyn ArchitectureRepository>,
}

impl ScrapePipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: ArchitectureExtractor,
        repository: Arc<dyn ArchitectureRepository>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            repository,
        }
    }

    /// Fetch `url`, extract a record and store it.
    ///
    /// A fetch failure aborts before anything is written. Extraction cannot
    /// fail; a page the model could not describe is stored as a fallback
    /// record.
    pub async fn process(&self, url: &str) -> Result<ArchitectureRecord, PipelineError> {
        info!("Starting scrape for URL: {}", url);

        let page = self.fetcher.fetch(url).await.inspect_err(|e| {
            error!("Error scraping {}: {}", url, e);
        })?;

        let record = self.extractor.extract(&page).await;

        self.repository.insert(&record).await.inspect_err(|e| {
            error!("Error storing architecture from {}: {}", url, e);
        })?;

        info!(
            "Stored architecture: {} ({:?})",
            record.title.as_deref().unwrap_or("Unknown"),
            record.parsing_status
        );
        Ok(record)
    }

    pub async fn list_all(&self) -> Result<Vec<ArchitectureRecord>, StorageError> {
        info!("Retrieving all stored architectures");
        self.repository.list_all().await
    }

    pub async fn delete_all(&self) -> Result<u64, StorageError> {
        let removed = self.repository.delete_all().await?;
        info!("Deleted {} architectures", removed);
        Ok(removed)
    }
}
