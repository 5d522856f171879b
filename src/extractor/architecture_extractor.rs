use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::reply::{parse_reply, ParsedReply};
use crate::error::ModelError;
use crate::llm::TextModel;
use crate::models::{dedup_services, ArchitectureRecord, Component, ParsingStatus, RawPage};

pub const MAX_CONTENT_CHARS: usize = 3000;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
pub const FALLBACK_DESCRIPTION: &str = "Failed to parse with AI";

const UNKNOWN: &str = "Unknown";

// Fixed schema section; page text is never substituted into it.
const PROMPT_INSTRUCTIONS: &str = r#"Please extract and return JSON with the following structure:
{
    "title": "Clean architecture title",
    "description": "Brief description of the architecture",
    "services": ["list", "of", "aws", "services", "mentioned"],
    "components": [
        {"name": "component_name", "type": "aws_service", "description": "what it does"}
    ],
    "use_case": "Primary use case or industry",
    "complexity": "Simple/Medium/Complex",
    "estimated_cost": "Cost estimation if mentioned",
    "benefits": ["key", "benefits", "listed"],
    "architecture_pattern": "Pattern type (e.g., microservices, serverless, etc.)"
}

Focus on:
- AWS services mentioned (EC2, S3, Lambda, RDS, etc.)
- Architecture components and their relationships
- Use cases and benefits
- Cost considerations
- Scalability and performance aspects"#;

/// Why a structured extraction was abandoned. Never leaves this module.
#[derive(Error, Debug)]
enum ExtractionFailure {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model call exceeded {0:?}")]
    Timeout(Duration),

    #[error("could not parse AI response as JSON")]
    Unparsable,

    #[error("AI response did not match the architecture schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Shape the model is asked to produce. Every field is optional; `null`
/// counts as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractedArchitecture {
    title: Option<String>,
    description: Option<String>,
    services: Option<Vec<String>>,
    components: Option<Vec<Component>>,
    use_case: Option<String>,
    complexity: Option<String>,
    estimated_cost: Option<String>,
    benefits: Option<Vec<String>>,
    architecture_pattern: Option<String>,
}

pub struct ArchitectureExtractor {
    model: Arc<dyn TextModel>,
    timeout: Duration,
}

impl ArchitectureExtractor {
    pub fn new(model: Arc<dyn TextModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Turn a page into a record. Always returns one: any model or parse
    /// failure yields a fallback record with `ParsingStatus::Failed`.
    pub async fn extract(&self, page: &RawPage) -> ArchitectureRecord {
        info!("Parsing content with AI for: {}", page.url);

        match self.try_extract(page).await {
            Ok(record) => {
                info!("Successfully parsed architecture from: {}", page.url);
                record
            }
            Err(e) => {
                error!("AI parsing error for {}: {}", page.url, e);
                fallback_record(page)
            }
        }
    }

    async fn try_extract(&self, page: &RawPage) -> Result<ArchitectureRecord, ExtractionFailure> {
        let prompt = build_prompt(page);

        let reply = tokio::time::timeout(self.timeout, self.model.generate(&prompt))
            .await
            .map_err(|_| ExtractionFailure::Timeout(self.timeout))??;

        let value = match parse_reply(&reply) {
            ParsedReply::Parsed(value) => value,
            ParsedReply::Unparsable => return Err(ExtractionFailure::Unparsable),
        };
        let extracted: ExtractedArchitecture = serde_json::from_value(value)?;

        Ok(success_record(page, extracted))
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn build_prompt(page: &RawPage) -> String {
    format!(
        "Analyze the following AWS architecture content and extract structured information:\n\n\
        Title: {}\n\
        Content: {}...\n\n\
        {}",
        page.title,
        truncate_chars(&page.full_text, MAX_CONTENT_CHARS),
        PROMPT_INSTRUCTIONS
    )
}

fn success_record(page: &RawPage, extracted: ExtractedArchitecture) -> ArchitectureRecord {
    ArchitectureRecord {
        id: Uuid::new_v4().to_string(),
        title: extracted.title,
        description: extracted.description,
        services: dedup_services(extracted.services.unwrap_or_default()),
        components: extracted.components.unwrap_or_default(),
        use_case: extracted.use_case,
        complexity: extracted.complexity,
        estimated_cost: extracted.estimated_cost,
        benefits: extracted.benefits.unwrap_or_default(),
        architecture_pattern: extracted.architecture_pattern,
        source_url: page.url.clone(),
        scraped_at: page.fetched_at,
        raw_title: Some(page.title.clone()),
        parsing_status: ParsingStatus::Success,
    }
}

/// Degraded record for a page the model could not describe.
pub fn fallback_record(page: &RawPage) -> ArchitectureRecord {
    warn!("Using fallback parser for: {}", page.url);

    ArchitectureRecord {
        id: Uuid::new_v4().to_string(),
        title: Some(page.title.clone()),
        description: Some(FALLBACK_DESCRIPTION.to_string()),
        services: Vec::new(),
        components: Vec::new(),
        use_case: Some(UNKNOWN.to_string()),
        complexity: Some(UNKNOWN.to_string()),
        estimated_cost: None,
        benefits: Vec::new(),
        architecture_pattern: None,
        source_url: page.url.clone(),
        scraped_at: page.fetched_at,
        raw_title: None,
        parsing_status: ParsingStatus::Failed,
    }
}
