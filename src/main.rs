use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arch_scraper::repository::{self, ArchitectureRepository};
use arch_scraper::{ArchitectureExtractor, Config, HttpPageFetcher, LlmClient, ScrapePipeline};

#[derive(Parser)]
#[command(name = "arch-scraper")]
#[command(about = "Scrape cloud architecture pages into structured records")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Scrape a single URL and print the stored record
    Scrape { url: String },
    /// Print every stored record
    List,
    /// Delete every stored record
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arch_scraper=info,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let location = config.store_location()?;
    let store = repository::connect(&location, &config.store_collection)
        .context("Failed to open document store")?;

    let outcome = run(cli.command, &config, Arc::clone(&store)).await;

    if let Err(e) = store.close().await {
        warn!("Failed to close document store: {}", e);
    }

    outcome
}

async fn run(
    command: Commands,
    config: &Config,
    repository: Arc<dyn ArchitectureRepository>,
) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(config, repository)?);

    match command {
        Commands::Serve { host, port } => {
            if config.llm_api_key.is_empty() {
                warn!("LLM_API_KEY is not set; every page will be stored as a fallback record");
            }
            arch_scraper::web::run_server(pipeline, SocketAddr::new(host, port), async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await?;
        }
        Commands::Scrape { url } => {
            let record = pipeline
                .process(&url)
                .await
                .with_context(|| format!("Failed to scrape url: {}", url))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List => {
            let records = pipeline.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Clear => {
            let removed = pipeline.delete_all().await?;
            println!("Deleted {} architectures", removed);
        }
    }

    Ok(())
}

fn build_pipeline(
    config: &Config,
    repository: Arc<dyn ArchitectureRepository>,
) -> Result<ScrapePipeline> {
    let fetcher = HttpPageFetcher::new(config.fetch_timeout())
        .context("Failed to build HTTP client")?;

    let model = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        Some(config.llm_base_url.clone()),
    );
    info!("Using model {}", model.model());

    Ok(ScrapePipeline::new(
        Arc::new(fetcher),
        ArchitectureExtractor::new(Arc::new(model), config.model_timeout()),
        repository,
    ))
}
