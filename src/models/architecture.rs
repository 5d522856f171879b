use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A fetched page, handed from the fetcher to the extractor exactly once.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub title: String,
    pub full_text: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsingStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// One stored architecture description.
///
/// Records are built once by the extractor and never mutated afterwards.
/// Absent optional fields are left out of the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture_pattern: Option<String>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_title: Option<String>,
    pub parsing_status: ParsingStatus,
}

/// Keeps the first occurrence of every service name.
pub(crate) fn dedup_services(services: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(services.len());
    for service in services {
        if !unique.contains(&service) {
            unique.push(service);
        }
    }
    unique
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
