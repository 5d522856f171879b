mod scrape_pipeline;

pub use scrape_pipeline::ScrapePipeline;
