//! Scrape cloud architecture pages, describe them with an LLM and keep the
//! structured result in a document store.

pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod scraper;
pub mod web;

pub use crate::config::Config;
pub use crate::error::{FetchError, ModelError, PipelineError, StorageError};
pub use crate::extractor::{ArchitectureExtractor, ParsedReply};
pub use crate::llm::{LlmClient, TextModel};
pub use crate::models::{ArchitectureRecord, Component, ParsingStatus, RawPage};
pub use crate::pipeline::ScrapePipeline;
pub use crate::repository::{
    ArchitectureRepository, InMemoryArchitectureRepository, SqliteDocumentStore, StoreLocation,
};
pub use crate::scraper::{HttpPageFetcher, PageFetcher};
