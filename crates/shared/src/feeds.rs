use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use rss::Channel;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use crate::config::{FeedSource, FeedsConfig};
use crate::models::RawItem;

const MAX_CONCURRENT_FEEDS: usize = 4;
const MAX_ATTEMPTS: u32 = 3;

pub struct FeedFetcher {
    client: Client,
    semaphore: Arc<Semaphore>,
}

impl FeedFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; DailyBriefing/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FEEDS));

        Ok(Self { client, semaphore })
    }

    /// Fetch every configured feed. Items come back in configured source
    /// order, then feed order within each source.
    pub async fn fetch_all(&self, feeds: &FeedsConfig) -> Vec<RawItem> {
        let per_source: Vec<Vec<RawItem>> = stream::iter(&feeds.sources)
            .map(|source| self.fetch_source(source, feeds))
            .buffered(MAX_CONCURRENT_FEEDS)
            .collect()
            .await;

        per_source.into_iter().flatten().collect()
    }

    async fn fetch_source(&self, source: &FeedSource, feeds: &FeedsConfig) -> Vec<RawItem> {
        let body = match self.fetch_feed_body(&source.rss).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = %source.name, error = %e, "Feed error");
                return Vec::new();
            }
        };

        match parse_feed(&source.name, &body, feeds) {
            Ok(items) => {
                debug!(source = %source.name, items = items.len(), "Parsed feed");
                items
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "Feed error");
                Vec::new()
            }
        }
    }

    async fn fetch_feed_body(&self, url: &str) -> Result<Vec<u8>> {
        let _permit = self.semaphore.acquire().await?;

        let mut attempt = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt + 1 >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    debug!(url, attempt, error = %e, "Retrying feed fetch");
                    let backoff = std::time::Duration::from_millis(500 * (2_u64.pow(attempt)));
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send HTTP request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        Ok(body.to_vec())
    }
}

/// One entry pulled out of either feed format
struct FeedEntry<'a> {
    title: Option<&'a str>,
    link: Option<&'a str>,
    published_at: Option<DateTime<Utc>>,
    summary_html: &'a str,
}

/// Turn one RSS or Atom document into raw items for `source_name`.
///
/// Entries need a title and a valid link; excluded headlines are skipped and
/// at most `daily_limit_per_source` entries are kept.
pub fn parse_feed(source_name: &str, body: &[u8], feeds: &FeedsConfig) -> Result<Vec<RawItem>> {
    // Try parsing as RSS first, then Atom
    if let Ok(channel) = Channel::read_from(body) {
        let entries = channel.items().iter().map(|entry| FeedEntry {
            title: entry.title(),
            link: entry.link(),
            published_at: entry.pub_date().and_then(parse_pub_date),
            summary_html: entry
                .description()
                .filter(|d| !d.trim().is_empty())
                .or_else(|| entry.content())
                .unwrap_or_default(),
        });
        return Ok(collect_items(source_name, entries, feeds));
    }

    let feed = atom_syndication::Feed::read_from(body)
        .context("Failed to parse feed as RSS or Atom")?;
    let entries = feed.entries().iter().map(|entry| FeedEntry {
        title: Some(entry.title().as_str()),
        link: entry
            .links()
            .iter()
            .find(|l| l.rel() == "alternate")
            .or_else(|| entry.links().first())
            .map(|l| l.href()),
        published_at: entry
            .published()
            .or(Some(entry.updated()))
            .map(|d| d.with_timezone(&Utc)),
        summary_html: entry
            .summary()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content().and_then(|c| c.value()))
            .unwrap_or_default(),
    });
    Ok(collect_items(source_name, entries, feeds))
}

fn collect_items<'a>(
    source_name: &str,
    entries: impl Iterator<Item = FeedEntry<'a>>,
    feeds: &FeedsConfig,
) -> Vec<RawItem> {
    entries
        .filter_map(|entry| {
            let title = entry.title.map(str::trim).filter(|t| !t.is_empty())?;
            let link = entry.link.map(str::trim).filter(|l| !l.is_empty())?;
            let link = Url::parse(link).ok()?;

            if !feeds.is_newsworthy(title) {
                debug!(source = source_name, title, "Excluded by keyword");
                return None;
            }

            Some(RawItem {
                source_name: source_name.to_string(),
                title: title.to_string(),
                link,
                published_at: entry.published_at,
                summary_html: entry.summary_html.to_string(),
            })
        })
        .take(feeds.daily_limit_per_source)
        .collect()
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
