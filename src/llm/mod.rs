mod client;

use async_trait::async_trait;

use crate::error::ModelError;

pub use client::{LlmClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Text in, free text out. The reply carries no structural guarantees.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
