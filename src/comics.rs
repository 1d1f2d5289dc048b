//! Tech comic sources, explainxkcd lookups and daily-comic state.

use crate::consts::endpoints;
use crate::fetcher::parse_feed;
use crate::post::Post;
use crate::utils::{first_image_src, strip_html, truncate_text};
use crate::xkcd::XkcdClient;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const EXPLAIN_CHARS: usize = 497;
pub const DAILY_HOUR_UTC: u32 = 9;

#[derive(Error, Debug)]
pub enum ComicError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("XKCD: {0}")] Xkcd(#[from] crate::xkcd::XkcdError),
    #[error("Feed: {0}")] Feed(#[from] crate::fetcher::FetchError),
    #[error("Unknown comic source `{0}`. Try: xkcd, joyoftech, turnoff or random")] Unknown(String),
    #[error("Feed had no comics")] Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComicSource {
    Xkcd,
    JoyOfTech,
    TurnOff,
}

impl ComicSource {
    pub const ALL: [ComicSource; 3] = [ComicSource::Xkcd, ComicSource::JoyOfTech, ComicSource::TurnOff];

    pub fn random() -> Self {
        *Self::ALL.choose(&mut rand::thread_rng()).unwrap_or(&ComicSource::Xkcd)
    }

    /// `random` picks one of the sources.
    pub fn resolve(name: &str) -> Result<Self, ComicError> {
        if name.trim().eq_ignore_ascii_case("random") {
            return Ok(Self::random());
        }
        name.parse()
    }

    pub fn key(self) -> &'static str {
        match self {
            ComicSource::Xkcd => "xkcd",
            ComicSource::JoyOfTech => "joyoftech",
            ComicSource::TurnOff => "turnoff",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ComicSource::Xkcd => "🤓",
            ComicSource::JoyOfTech => "😂",
            ComicSource::TurnOff => "🔧",
        }
    }

    fn feed_url(self) -> Option<&'static str> {
        match self {
            ComicSource::Xkcd => None,
            ComicSource::JoyOfTech => Some(endpoints::JOY_OF_TECH_RSS),
            ComicSource::TurnOff => Some(endpoints::TURNOFF_RSS),
        }
    }
}

impl fmt::Display for ComicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ComicSource {
    type Err = ComicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xkcd" => Ok(ComicSource::Xkcd),
            "joyoftech" | "joy" | "jot" => Ok(ComicSource::JoyOfTech),
            "turnoff" | "turn" => Ok(ComicSource::TurnOff),
            other => Err(ComicError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComicStrip {
    pub source: ComicSource,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub alt: Option<String>,
}

impl ComicStrip {
    pub fn post(&self) -> Post {
        let mut post = Post::new(format!("{} {}", self.source.icon(), self.title))
            .url(&self.link)
            .color(0x3498DB);
        if let Some(img) = &self.image {
            post = post.image(img);
        }
        match (&self.source, &self.alt) {
            (ComicSource::Xkcd, Some(alt)) if !alt.is_empty() => post.footer(format!("Alt: {}", truncate_text(alt, 200))),
            _ => post.footer(format!(
                "Source: {} • Use !comic {} for more",
                self.source.key().to_uppercase(),
                self.source.key()
            )),
        }
    }

    pub fn daily_post(&self) -> Post {
        let mut post = self.post();
        post.title = format!("📰 Daily Tech Comic: {}", post.title);
        post
    }
}

pub struct ComicsClient {
    client: Client,
    xkcd: XkcdClient,
    explain_api: String,
}

impl ComicsClient {
    pub fn new(client: Client) -> Self {
        Self {
            xkcd: XkcdClient::new(client.clone()),
            client,
            explain_api: endpoints::EXPLAIN_XKCD_API.to_string(),
        }
    }

    pub async fn fetch(&self, source: ComicSource) -> Result<ComicStrip, ComicError> {
        let Some(url) = source.feed_url() else {
            let comic = self.xkcd.latest().await?;
            return Ok(ComicStrip {
                source,
                title: comic.title.clone(),
                link: comic.url(),
                image: Some(comic.img.clone()).filter(|s| !s.is_empty()),
                alt: Some(comic.alt),
            });
        };
        self.fetch_feed(source, url).await
    }

    async fn fetch_feed(&self, source: ComicSource, url: &str) -> Result<ComicStrip, ComicError> {
        let bytes = self.client.get(url).send().await?.error_for_status()?.bytes().await?;
        strip_from_feed(source, &bytes, url)
    }

    /// Introductory extract from explainxkcd, `None` when the page is missing.
    pub async fn explain(&self, num: u32) -> Result<Option<String>, ComicError> {
        let titles = num.to_string();
        let body: Value = self
            .client
            .get(&self.explain_api)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", ""),
                ("explaintext", ""),
                ("titles", titles.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(explain_extract(&body))
    }
}

fn strip_from_feed(source: ComicSource, bytes: &[u8], feed_url: &str) -> Result<ComicStrip, ComicError> {
    let feed = parse_feed(bytes)?;
    let entry = feed.entries.into_iter().next().ok_or(ComicError::Empty)?;
    let html = entry
        .content
        .and_then(|c| c.body)
        .into_iter()
        .chain(entry.summary.map(|s| s.content))
        .find(|h| h.contains("<img"))
        .unwrap_or_default();
    Ok(ComicStrip {
        source,
        title: entry
            .title
            .map(|t| strip_html(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Tech Comic".to_string()),
        link: entry.links.first().map(|l| l.href.clone()).unwrap_or_else(|| feed_url.to_string()),
        image: first_image_src(&html),
        alt: None,
    })
}

fn explain_extract(body: &Value) -> Option<String> {
    let pages = body["query"]["pages"].as_object()?;
    pages
        .iter()
        .filter(|(id, _)| id.as_str() != "-1")
        .filter_map(|(_, page)| page["extract"].as_str())
        .map(str::trim)
        .find(|e| !e.is_empty())
        .map(|e| {
            if e.chars().count() > EXPLAIN_CHARS + 3 {
                format!("{}...", e.chars().take(EXPLAIN_CHARS).collect::<String>())
            } else {
                e.to_string()
            }
        })
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "random".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyComicState {
    #[serde(default)]
    pub last_posted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel_id: Option<u64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for DailyComicState {
    fn default() -> Self {
        Self { last_posted: None, channel_id: None, enabled: true, source: default_source() }
    }
}

/// Next 09:00 UTC strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(DAILY_HOUR_UTC, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now { today } else { today + ChronoDuration::days(1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn aliases_resolve() {
        assert_eq!("joy".parse::<ComicSource>().unwrap(), ComicSource::JoyOfTech);
        assert_eq!("JOT".parse::<ComicSource>().unwrap(), ComicSource::JoyOfTech);
        assert_eq!("turn".parse::<ComicSource>().unwrap(), ComicSource::TurnOff);
        assert!(matches!("dilbert".parse::<ComicSource>(), Err(ComicError::Unknown(_))));
        assert!(ComicSource::ALL.contains(&ComicSource::resolve("random").unwrap()));
    }

    #[test]
    fn image_comes_from_description_markup() {
        let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>JoT</title>
            <item><title>Geek Culture</title><link>https://joyoftech.com/2900.html</link>
            <description><![CDATA[<p>new</p><img src="https://joyoftech.com/2900.png" />]]></description></item>
            </channel></rss>"#;
        let strip = strip_from_feed(ComicSource::JoyOfTech, rss.as_bytes(), "u").unwrap();
        assert_eq!(strip.title, "Geek Culture");
        assert_eq!(strip.image.as_deref(), Some("https://joyoftech.com/2900.png"));
        assert_eq!(strip.post().footer.as_deref(), Some("Source: JOYOFTECH • Use !comic joyoftech for more"));
    }

    #[test]
    fn xkcd_footer_uses_alt_text() {
        let strip = ComicStrip {
            source: ComicSource::Xkcd,
            title: "Python".into(),
            link: "https://xkcd.com/353/".into(),
            image: None,
            alt: Some("I wrote 20 short programs".into()),
        };
        assert_eq!(strip.post().footer.as_deref(), Some("Alt: I wrote 20 short programs"));
        assert_eq!(strip.daily_post().title, "📰 Daily Tech Comic: 🤓 Python");
    }

    #[test]
    fn explain_skips_missing_pages_and_truncates() {
        assert_eq!(explain_extract(&json!({"query":{"pages":{"-1":{"missing":""}}}})), None);
        let long = "x".repeat(800);
        let text = explain_extract(&json!({"query":{"pages":{"1234":{"extract": long}}}})).unwrap();
        assert_eq!(text.chars().count(), EXPLAIN_CHARS + 3);
        assert!(text.ends_with("..."));
        let short = explain_extract(&json!({"query":{"pages":{"1":{"extract":" short "}}}}));
        assert_eq!(short.as_deref(), Some("short"));
    }

    #[test]
    fn daily_run_is_next_nine_utc() {
        let before = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(next_daily_run(before), Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let after = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert_eq!(next_daily_run(after), Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap());
    }
}
