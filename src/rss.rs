use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::db::Database;
use crate::environment::get_env_var_as_vec;
use crate::vector::config::E5Config;
use crate::vector::embedding::get_article_vector;
use crate::vector::storage::{ensure_news_collection, store_news_embedding};
use crate::vector::client;
use crate::TARGET_INGEST;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const SUMMARY_CHARS: usize = 400;

/// First `SUMMARY_CHARS` characters of the extracted text, cut on a char
/// boundary.
fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx].trim_end()),
        None => text.trim().to_string(),
    }
}

async fn fetch_with_retries(http: &reqwest::Client, url: &str) -> Result<String> {
    let mut last_err = None;
    for attempt in 1..=MAX_RETRIES {
        match http.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.text().await?);
            }
            Ok(response) => {
                warn!(target: TARGET_INGEST, "Attempt {}/{} for {} returned {}", attempt, MAX_RETRIES, url, response.status());
                last_err = Some(anyhow::anyhow!("HTTP {}", response.status()));
            }
            Err(e) => {
                warn!(target: TARGET_INGEST, "Attempt {}/{} for {} failed: {}", attempt, MAX_RETRIES, url, e);
                last_err = Some(e.into());
            }
        }
        if attempt < MAX_RETRIES {
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("unreachable: {}", url)))
}

/// Pull every configured feed, store unseen articles, and embed their text
/// for semantic search. Feed URLs come from the FEED_URLS environment
/// variable, separated by semicolons.
pub async fn fetch_feeds(db: &Database) -> Result<usize> {
    let feed_urls = get_env_var_as_vec("FEED_URLS", ';');
    if feed_urls.is_empty() {
        warn!(target: TARGET_INGEST, "FEED_URLS is not set; nothing to fetch");
        return Ok(0);
    }

    let qdrant = client()?;
    ensure_news_collection(&qdrant, E5Config::default().dimensions).await?;

    let http = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; gaffer/0.3)")
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut stored = 0usize;
    for feed_url in &feed_urls {
        info!(target: TARGET_INGEST, "Fetching feed {}", feed_url);
        let body = match fetch_with_retries(&http, feed_url).await {
            Ok(b) => b,
            Err(e) => {
                error!(target: TARGET_INGEST, "Giving up on feed {}: {}", feed_url, e);
                continue;
            }
        };
        let feed = match feed_rs::parser::parse(body.as_bytes()) {
            Ok(f) => f,
            Err(e) => {
                error!(target: TARGET_INGEST, "Failed to parse feed {}: {}", feed_url, e);
                continue;
            }
        };

        for entry in feed.entries {
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                continue;
            };
            match db.has_seen_article(&link).await {
                Ok(true) => {
                    debug!(target: TARGET_INGEST, "Already seen {}", link);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(target: TARGET_INGEST, "Dedup check failed for {}: {}", link, e);
                    continue;
                }
            }

            match process_entry(db, &qdrant, &http, &link, &entry).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    warn!(target: TARGET_INGEST, "Skipping article {}: {}", link, e);
                }
            }
        }
    }

    info!(target: TARGET_INGEST, "Stored {} new articles", stored);
    Ok(stored)
}

async fn process_entry(
    db: &Database,
    qdrant: &qdrant_client::Qdrant,
    http: &reqwest::Client,
    link: &str,
    entry: &feed_rs::model::Entry,
) -> Result<()> {
    let page = fetch_with_retries(http, link).await?;
    let page_url = Url::parse(link)?;
    let product = readability::extractor::extract(&mut page.as_bytes(), &page_url)?;

    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| product.title.clone());
    let source = page_url.host_str().unwrap_or("").to_string();
    let published_at = entry
        .published
        .or(entry.updated)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();
    let summary = summarize(&product.text);

    let article_id = db
        .add_article(link, &title, &source, &published_at, &product.text, &summary)
        .await?;

    let embed_input = format!("{}\n\n{}", title, product.text);
    if let Some(embedding) = get_article_vector(&embed_input).await? {
        store_news_embedding(qdrant, article_id, embedding, &published_at).await?;
    } else {
        warn!(target: TARGET_INGEST, "No embedding produced for article {}", article_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_truncates_on_char_boundary() {
        let text = "ü".repeat(1000);
        let summary = summarize(&text);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_CHARS + 3);
    }

    #[test]
    fn summarize_keeps_short_text_whole() {
        assert_eq!(summarize("short report"), "short report");
    }
}
