//! Feed fetching engine: conditional GETs, bounded concurrency, GUID dedup.

use crate::cache::FeedCache;
use crate::consts::{headers, limits, Source, SourceKind};
use crate::utils::{first_sentence, strip_html, truncate_text};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use feed_rs::model::{Entry, Feed};
use futures::future::join_all;
use reqwest::header::{ACCEPT, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, Semaphore};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")] Status(u16),
    #[error("Parse: {0}")] Parse(String),
    #[error("Not a feed source: {0}")] NotFeed(&'static str),
    #[error("Fetcher closed")] Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub guid: String,
    pub published: Option<DateTime<Utc>>,
}

/// Shared HTTP client: 10 s total, 5 s connect, no retries.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(headers::USER_AGENT)
        .timeout(Duration::from_secs(limits::REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(limits::CONNECT_TIMEOUT_SECS))
        .build()
}

pub fn parse_feed(bytes: &[u8]) -> Result<Feed, FetchError> {
    feed_rs::parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))
}

pub struct FeedFetcher {
    client: Client,
    cache: Mutex<FeedCache>,
    limiter: RwLock<Arc<Semaphore>>,
    cache_path: PathBuf,
}

impl FeedFetcher {
    pub async fn new(client: Client, cache_path: impl Into<PathBuf>) -> Arc<Self> {
        let cache_path = cache_path.into();
        let cache = FeedCache::load(&cache_path).await;
        Arc::new(Self {
            client,
            cache: Mutex::new(cache),
            limiter: RwLock::new(Arc::new(Semaphore::new(limits::DEFAULT_CONCURRENCY))),
            cache_path,
        })
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Requests already holding a permit finish under the old bound.
    pub async fn set_concurrency_limit(&self, limit: usize) {
        *self.limiter.write().await = Arc::new(Semaphore::new(limit.max(1)));
    }

    /// Next unseen entry of `source`, or `None` when the feed is unchanged
    /// or every scanned entry was already emitted.
    pub async fn fetch_feed(&self, source: &Source, use_cache: bool) -> Result<Option<FeedItem>, FetchError> {
        if source.kind != SourceKind::Rss {
            return Err(FetchError::NotFeed(source.key));
        }
        let Some(body) = self.get(source.url, use_cache).await? else {
            log::debug!("{}: not modified", source.name);
            return Ok(None);
        };
        let feed = parse_feed(&body)?;
        let cutoff = cutoff_for(source);

        let mut cache = self.cache.lock().await;
        for entry in feed.entries.into_iter().take(source.category.scan_depth()) {
            if !is_recent(&entry, cutoff) {
                continue;
            }
            let item = build_item(entry, source.url);
            if cache.has_seen(source.url, &item.guid) {
                continue;
            }
            cache.remember(source.url, &item.guid);
            return Ok(Some(item));
        }
        Ok(None)
    }

    /// Newest recent entry, ignoring validators and the seen window.
    pub async fn peek_latest(&self, source: &Source) -> Result<Option<FeedItem>, FetchError> {
        if source.kind != SourceKind::Rss {
            return Err(FetchError::NotFeed(source.key));
        }
        let body = self.get(source.url, false).await?.ok_or(FetchError::Status(304))?;
        let feed = parse_feed(&body)?;
        let cutoff = cutoff_for(source);
        Ok(feed
            .entries
            .into_iter()
            .take(source.category.scan_depth())
            .find(|e| is_recent(e, cutoff))
            .map(|e| build_item(e, source.url)))
    }

    /// One pass over `sources`. Failures are logged and skipped; the cache
    /// is flushed when anything new turned up.
    pub async fn fetch_many(
        &self,
        sources: &[&'static Source],
        use_cache: bool,
    ) -> Vec<(&'static Source, FeedItem)> {
        let tasks = sources.iter().map(|&source| async move {
            (source, self.fetch_feed(source, use_cache).await)
        });

        let mut found = Vec::new();
        for (source, result) in join_all(tasks).await {
            match result {
                Ok(Some(item)) => found.push((source, item)),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to fetch {}: {}", source.name, e),
            }
        }

        if !found.is_empty() {
            if let Err(e) = self.save_cache().await {
                log::error!("Failed to save feed cache {}: {}", self.cache_path.display(), e);
            }
        }
        found
    }

    pub async fn close(&self) -> Result<(), crate::state::StateError> {
        self.save_cache().await
    }

    async fn save_cache(&self) -> Result<(), crate::state::StateError> {
        let snapshot = self.cache.lock().await.clone();
        snapshot.save(&self.cache_path).await
    }

    async fn get(&self, url: &str, use_cache: bool) -> Result<Option<Vec<u8>>, FetchError> {
        let mut req = self.client.get(url).header(ACCEPT, headers::ACCEPT_FEED);
        if use_cache {
            let cache = self.cache.lock().await;
            if let Some(tag) = cache.etag(url) {
                req = req.header(IF_NONE_MATCH, tag);
            }
            if let Some(stamp) = cache.last_modified(url) {
                req = req.header(IF_MODIFIED_SINCE, stamp);
            }
        }

        let limiter = self.limiter.read().await.clone();
        let _permit = limiter.acquire().await.map_err(|_| FetchError::Closed)?;

        let res = req.send().await?;
        match res.status() {
            StatusCode::NOT_MODIFIED => return Ok(None),
            StatusCode::OK => {}
            other => return Err(FetchError::Status(other.as_u16())),
        }

        if use_cache {
            let header = |name: reqwest::header::HeaderName| {
                res.headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let (etag, modified) = (header(ETAG), header(LAST_MODIFIED));
            self.cache.lock().await.store_validators(url, etag, modified);
        }

        Ok(Some(res.bytes().await?.to_vec()))
    }
}

fn cutoff_for(source: &Source) -> Option<DateTime<Utc>> {
    source
        .category
        .max_age_days()
        .map(|days| Utc::now() - ChronoDuration::days(days))
}

/// Undated entries count as recent.
fn is_recent(entry: &Entry, cutoff: Option<DateTime<Utc>>) -> bool {
    match (cutoff, entry.published.or(entry.updated)) {
        (Some(cutoff), Some(when)) => when >= cutoff,
        _ => true,
    }
}

fn build_item(entry: Entry, feed_url: &str) -> FeedItem {
    let published = entry.published.or(entry.updated);
    let raw = entry
        .content
        .and_then(|c| c.body)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.summary.map(|t| t.content))
        .unwrap_or_default();
    let text = strip_html(&raw);

    let mut title = entry.title.map(|t| strip_html(&t.content)).unwrap_or_default();
    if title.is_empty() {
        title = if text.is_empty() {
            "Latest Update".to_string()
        } else {
            first_sentence(&text, limits::TITLE_FALLBACK_CHARS)
        };
    }

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_else(|| feed_url.to_string());

    let guid = if entry.id.trim().is_empty() { link.clone() } else { entry.id };

    FeedItem {
        title,
        link,
        description: truncate_text(&text, limits::DESCRIPTION_CHARS),
        guid,
        published,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::Category;
    use crate::testing::{client, rss, scratch_path, serve, Canned};
    use std::sync::atomic::Ordering;

    fn source(category: Category, url: String) -> &'static Source {
        Box::leak(Box::new(Source {
            key: "test",
            name: "Test Feed",
            url: Box::leak(url.into_boxed_str()),
            color: 0,
            icon: "🧪",
            category,
            kind: SourceKind::Rss,
        }))
    }

    #[tokio::test]
    async fn emits_each_guid_once() {
        let body = rss(&[("a", "First", "<p>one</p>", None), ("b", "Second", "two", None)]);
        let server = serve(Duration::ZERO, Arc::new(move |_: &str| Canned::ok(body.clone()))).await;
        let src = source(Category::Tech, server.url("/feed"));
        let fetcher = FeedFetcher::new(client(), scratch_path("c.json")).await;

        let first = fetcher.fetch_feed(src, false).await.unwrap().unwrap();
        assert_eq!(first.guid, "a");
        assert_eq!(first.description, "one");
        let second = fetcher.fetch_feed(src, false).await.unwrap().unwrap();
        assert_eq!(second.guid, "b");
        assert!(fetcher.fetch_feed(src, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replays_etag_and_treats_304_as_nothing_new() {
        let body = rss(&[("a", "First", "one", None)]);
        let server = serve(
            Duration::ZERO,
            Arc::new(move |req: &str| {
                if req.to_lowercase().contains("if-none-match: \"v1\"") {
                    Canned::status(304)
                } else {
                    Canned::ok(body.clone()).header("ETag", "\"v1\"")
                }
            }),
        )
        .await;
        let src = source(Category::Tech, server.url("/feed"));
        let fetcher = FeedFetcher::new(client(), scratch_path("c.json")).await;

        assert!(fetcher.fetch_feed(src, true).await.unwrap().is_some());
        assert!(fetcher.fetch_feed(src, true).await.unwrap().is_none());
        assert_eq!(server.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let server = serve(Duration::ZERO, Arc::new(|_: &str| Canned::status(503))).await;
        let src = source(Category::Tech, server.url("/feed"));
        let fetcher = FeedFetcher::new(client(), scratch_path("c.json")).await;
        assert!(matches!(fetcher.fetch_feed(src, true).await, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        let body = rss(&[("x", "Item", "d", None)]);
        let server = serve(Duration::from_millis(100), Arc::new(move |_: &str| Canned::ok(body.clone()))).await;
        let sources: Vec<&'static Source> = (0..8)
            .map(|i| source(Category::Tech, server.url(&format!("/feed/{i}"))))
            .collect();
        let path = scratch_path("c.json");
        let fetcher = FeedFetcher::new(client(), path.clone()).await;
        fetcher.set_concurrency_limit(2).await;

        let found = fetcher.fetch_many(&sources, true).await;

        assert_eq!(found.len(), 8);
        assert_eq!(server.hits.load(Ordering::SeqCst), 8);
        assert!(server.peak.load(Ordering::SeqCst) <= 2);
        assert!(path.exists(), "cache flushed after a batch with new items");
    }

    #[tokio::test]
    async fn stale_entries_are_skipped_for_legislation() {
        let old = (Utc::now() - ChronoDuration::days(30)).to_rfc2822();
        let fresh = Utc::now().to_rfc2822();
        let body = rss(&[("old", "Old bill", "x", Some(old)), ("new", "New bill", "y", Some(fresh))]);
        let server = serve(Duration::ZERO, Arc::new(move |_: &str| Canned::ok(body.clone()))).await;
        let src = source(Category::EuLegislation, server.url("/feed"));
        let fetcher = FeedFetcher::new(client(), scratch_path("c.json")).await;

        let item = fetcher.fetch_feed(src, false).await.unwrap().unwrap();
        assert_eq!(item.guid, "new");
        assert_eq!(fetcher.peek_latest(src).await.unwrap().unwrap().guid, "new");
    }

    #[tokio::test]
    async fn seen_window_survives_restart() {
        let body = rss(&[("a", "Only", "one", None)]);
        let server = serve(Duration::ZERO, Arc::new(move |_: &str| Canned::ok(body.clone()))).await;
        let src = source(Category::Tech, server.url("/feed"));
        let path = scratch_path("c.json");

        let fetcher = FeedFetcher::new(client(), path.clone()).await;
        assert_eq!(fetcher.fetch_many(&[src], false).await.len(), 1);
        drop(fetcher);

        let reopened = FeedFetcher::new(client(), path).await;
        assert!(reopened.fetch_feed(src, false).await.unwrap().is_none());
    }

    #[test]
    fn empty_title_falls_back_to_first_sentence() {
        let feed = parse_feed(rss(&[("g", "", "<b>Kernel</b> patched. More later.", None)]).as_bytes()).unwrap();
        let item = build_item(feed.entries.into_iter().next().unwrap(), "https://example.org/rss");
        assert_eq!(item.title, "Kernel patched");
        assert_eq!(item.link, "https://example.org/g");
    }

    #[test]
    fn content_body_is_preferred_over_summary() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>t</title><id>urn:feed</id><updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <id>urn:entry:1</id><title></title><updated>2024-01-01T00:00:00Z</updated>
    <link rel="alternate" href="https://example.org/post"/>
    <summary>Short teaser.</summary>
    <content type="html">&lt;p&gt;Full &lt;b&gt;body&lt;/b&gt; text. Second sentence.&lt;/p&gt;</content>
  </entry>
</feed>"#;
        let feed = parse_feed(atom.as_bytes()).unwrap();
        let item = build_item(feed.entries.into_iter().next().unwrap(), "u");
        assert_eq!(item.title, "Full body text");
        assert_eq!(item.description, "Full body text. Second sentence.");
        assert_eq!(item.link, "https://example.org/post");
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "word ".repeat(200);
        let feed = parse_feed(rss(&[("g", "T", &long, None)]).as_bytes()).unwrap();
        let item = build_item(feed.entries.into_iter().next().unwrap(), "u");
        assert!(item.description.ends_with("..."));
        assert!(item.description.chars().count() <= limits::DESCRIPTION_CHARS + 3);
    }
}
