use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{info, warn};

use super::PageFetcher;
use crate::error::FetchError;
use crate::models::RawPage;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Elements whose text never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Transport { url: url.to_string(), source }
            }
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Received non-200 response ({}) for URL: {}", status.as_u16(), url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html_content = response.text().await.map_err(transport)?;
        info!("Successfully fetched content from: {} ({} bytes)", url, html_content.len());

        Ok(parse_page(url, &html_content, Utc::now()))
    }
}

/// Reduce an HTML document to its title and visible text.
pub fn parse_page(url: &str, html: &str, fetched_at: DateTime<Utc>) -> RawPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let mut lines = Vec::new();
    collect_visible_text(document.root_element(), &mut lines);

    RawPage {
        url: url.to_string(),
        title,
        full_text: lines.join("\n"),
        fetched_at,
    }
}

fn collect_visible_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    if HIDDEN_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, lines);
                }
            }
            _ => {}
        }
    }
}
