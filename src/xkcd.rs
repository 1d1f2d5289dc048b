//! XKCD JSON API client and auto-poster state.

use crate::consts::endpoints;
use crate::post::Post;
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SEARCH_WINDOW: u32 = 100;
const SEARCH_RESULTS: usize = 5;
pub const COLOR: u32 = 0x96A8C8;

#[derive(Error, Debug)]
pub enum XkcdError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("Comic not found")] NotFound,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comic {
    pub num: u32,
    pub title: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub day: String,
}

impl Comic {
    pub fn url(&self) -> String {
        format!("{}/{}/", endpoints::XKCD_BASE, self.num)
    }

    pub fn published(&self) -> String {
        let pad = |s: &str| s.parse::<u32>().map(|n| format!("{n:02}")).unwrap_or_else(|_| s.to_string());
        format!("{}-{}-{}", self.year, pad(&self.month), pad(&self.day))
    }

    pub fn post(&self) -> Post {
        let mut post = Post::new(format!("#{}: {}", self.num, self.title))
            .url(self.url())
            .color(COLOR)
            .footer(format!("Published: {}", self.published()));
        if !self.alt.is_empty() {
            post = post.description(format!("*{}*", self.alt));
        }
        if !self.img.is_empty() {
            post = post.image(&self.img);
        }
        post
    }
}

#[derive(Clone)]
pub struct XkcdClient {
    client: Client,
    base: String,
}

impl XkcdClient {
    pub fn new(client: Client) -> Self {
        Self::with_base(client, endpoints::XKCD_BASE)
    }

    pub fn with_base(client: Client, base: impl Into<String>) -> Self {
        Self { client, base: base.into() }
    }

    /// `None` selects the latest comic. A 404 yields `Ok(None)`.
    pub async fn fetch(&self, num: Option<u32>) -> Result<Option<Comic>, XkcdError> {
        let url = match num {
            Some(n) => format!("{}/{}/info.0.json", self.base, n),
            None => format!("{}/info.0.json", self.base),
        };
        let res = self.client.get(url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(res.error_for_status()?.json().await?))
    }

    pub async fn latest(&self) -> Result<Comic, XkcdError> {
        self.fetch(None).await?.ok_or(XkcdError::NotFound)
    }

    pub async fn random(&self) -> Result<Comic, XkcdError> {
        let latest = self.latest().await?;
        for _ in 0..3 {
            let pick = rand::thread_rng().gen_range(1..=latest.num);
            if let Some(comic) = self.fetch(Some(pick)).await? {
                return Ok(comic);
            }
        }
        Ok(latest)
    }

    /// Title matches among the most recent comics, newest first.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Comic>, XkcdError> {
        let needle = keyword.trim().to_lowercase();
        let latest = self.latest().await?;
        let oldest = latest.num.saturating_sub(SEARCH_WINDOW - 1).max(1);

        let fetched: Vec<_> = stream::iter((oldest..latest.num).rev())
            .map(|n| self.fetch(Some(n)))
            .buffered(8)
            .collect()
            .await;

        let mut matches = Vec::new();
        for comic in std::iter::once(Ok(Some(latest))).chain(fetched) {
            match comic {
                Ok(Some(c)) if c.title.to_lowercase().contains(&needle) => matches.push(c),
                Ok(_) => {}
                Err(e) => log::debug!("xkcd search: {}", e),
            }
            if matches.len() >= SEARCH_RESULTS {
                break;
            }
        }
        Ok(matches)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XkcdState {
    #[serde(default)]
    pub last_posted: u32,
    #[serde(default)]
    pub channel_id: Option<u64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for XkcdState {
    fn default() -> Self {
        Self { last_posted: 0, channel_id: None, enabled: true }
    }
}

impl XkcdState {
    /// Channel to post `latest` to, if it has not been posted yet.
    pub fn due(&self, latest: u32) -> Option<u64> {
        if !self.enabled || latest <= self.last_posted {
            return None;
        }
        self.channel_id
    }
}
