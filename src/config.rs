use std::time::Duration;

use clap::Args;

use crate::error::StorageError;
use crate::extractor::DEFAULT_MODEL_TIMEOUT_SECS;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::repository::StoreLocation;
use crate::scraper::DEFAULT_FETCH_TIMEOUT_SECS;

/// Runtime settings. Every option can come from the environment (or a `.env`
/// file) and has a default suitable for local development.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// API key for the chat completions endpoint
    #[arg(long, env = "LLM_API_KEY", default_value = "", hide_env_values = true)]
    pub llm_api_key: String,

    /// Base URL of an OpenAI-compatible chat completions API
    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    /// Model identifier
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub llm_model: String,

    /// Seconds to wait for the model before storing a fallback record
    #[arg(long, env = "LLM_TIMEOUT", default_value_t = DEFAULT_MODEL_TIMEOUT_SECS)]
    pub llm_timeout: u64,

    /// Store connection string: `memory://`, `sqlite::memory:` or `sqlite://<dir>`
    #[arg(long, env = "STORE_URI", default_value = "sqlite://data")]
    pub store_uri: String,

    /// Database name inside the store
    #[arg(long, env = "STORE_DB_NAME", default_value = "aws_architectures")]
    pub store_db_name: String,

    /// Collection holding the records
    #[arg(long, env = "STORE_COLLECTION", default_value = "architectures")]
    pub store_collection: String,

    /// Seconds before a page fetch is abandoned
    #[arg(long, env = "REQUESTS_TIMEOUT", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub requests_timeout: u64,
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.requests_timeout)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout)
    }

    pub fn store_location(&self) -> Result<StoreLocation, StorageError> {
        StoreLocation::parse(&self.store_uri, &self.store_db_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn flags_override_defaults() {
        let harness = Harness::parse_from([
            "test",
            "--store-uri",
            "sqlite://tmp",
            "--store-db-name",
            "arch",
            "--requests-timeout",
            "5",
            "--llm-timeout",
            "7",
        ]);
        let config = harness.config;

        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.model_timeout(), Duration::from_secs(7));
        assert_eq!(
            config.store_location().unwrap(),
            StoreLocation::SqliteFile(PathBuf::from("tmp/arch.sqlite"))
        );
    }
}
