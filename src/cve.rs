//! CVE feeds: NVD 2.0 JSON API and Ubuntu Security Notices.

use crate::consts::{endpoints, limits, Source, SourceKind};
use crate::fetcher::{parse_feed, FetchError};
use crate::post::Post;
use crate::utils::{strip_html, truncate_text};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

const NVD_LOOKBACK_DAYS: i64 = 7;
const NVD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Clone)]
pub struct CveItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub link: String,
    pub date: Option<String>,
    pub source: &'static Source,
}

impl CveItem {
    pub fn post(&self) -> Post {
        let mut post = Post::new(format!(
            "{} {}: {}",
            self.source.icon,
            self.id,
            truncate_text(&self.title, 100)
        ))
        .url(&self.link)
        .description(&self.description)
        .color(self.source.color)
        .field("Severity", format!("{} {}", severity_emoji(&self.severity), self.severity), true)
        .footer(format!("Source: {}", self.source.name))
        .stamped();
        if let Some(date) = &self.date {
            post = post.field("Date", date.chars().take(10).collect::<String>(), true);
        }
        post
    }
}

pub fn severity_emoji(severity: &str) -> &'static str {
    match severity.to_uppercase().as_str() {
        "CRITICAL" => "🔴",
        "HIGH" => "🟠",
        "MEDIUM" => "🟡",
        "LOW" => "🟢",
        _ => "⚪",
    }
}

fn cve_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"CVE-\d{4}-\d+").expect("static regex"))
}

pub struct CveClient {
    client: Client,
}

impl CveClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, source: &'static Source) -> Result<Vec<CveItem>, FetchError> {
        match source.kind {
            SourceKind::NvdApi => self.fetch_nvd(source, Utc::now()).await,
            SourceKind::Rss => self.fetch_notices(source).await,
        }
    }

    /// Items from several sources, failures logged and skipped.
    pub async fn fetch_all(&self, sources: &[&'static Source]) -> Vec<CveItem> {
        let results = futures::future::join_all(sources.iter().map(|&s| self.fetch(s))).await;
        let mut items = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(mut found) => items.append(&mut found),
                Err(e) => log::warn!("CVE source {} failed: {}", source.name, e),
            }
        }
        items
    }

    async fn fetch_nvd(&self, source: &'static Source, now: DateTime<Utc>) -> Result<Vec<CveItem>, FetchError> {
        let start = now - ChronoDuration::days(NVD_LOOKBACK_DAYS);
        let res = self
            .client
            .get(source.url)
            .query(&[
                ("pubStartDate", start.format(NVD_DATE_FORMAT).to_string()),
                ("pubEndDate", now.format(NVD_DATE_FORMAT).to_string()),
                ("resultsPerPage", "10".to_string()),
            ])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status().as_u16()));
        }
        let body: Value = res.json().await?;
        Ok(parse_nvd(&body, source))
    }

    async fn fetch_notices(&self, source: &'static Source) -> Result<Vec<CveItem>, FetchError> {
        let res = self.client.get(source.url).send().await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status().as_u16()));
        }
        parse_notices(&res.bytes().await?, source)
    }
}

fn parse_nvd(body: &Value, source: &'static Source) -> Vec<CveItem> {
    let Some(vulns) = body["vulnerabilities"].as_array() else { return Vec::new() };
    vulns
        .iter()
        .take(limits::CVE_DISPLAY)
        .map(|wrapper| {
            let cve = &wrapper["cve"];
            let id = cve["id"].as_str().unwrap_or("Unknown").to_string();
            let description = cve["descriptions"]
                .as_array()
                .and_then(|d| d.iter().find(|x| x["lang"] == "en"))
                .and_then(|d| d["value"].as_str())
                .unwrap_or("No description");
            let severity = cve["metrics"]["cvssMetricV31"][0]["cvssData"]["baseSeverity"]
                .as_str()
                .unwrap_or("UNKNOWN")
                .to_string();
            CveItem {
                title: format!("CVE {id}"),
                description: truncate_text(description, limits::DESCRIPTION_CHARS),
                severity,
                link: format!("{}{}", endpoints::NVD_DETAIL, id),
                date: cve["published"].as_str().filter(|s| !s.is_empty()).map(str::to_string),
                id,
                source,
            }
        })
        .collect()
}

fn parse_notices(bytes: &[u8], source: &'static Source) -> Result<Vec<CveItem>, FetchError> {
    let feed = parse_feed(bytes)?;
    Ok(feed
        .entries
        .into_iter()
        .take(limits::CVE_DISPLAY)
        .filter_map(|entry| {
            let title = strip_html(&entry.title?.content);
            let link = entry.links.first()?.href.clone();
            let id = cve_pattern()
                .find(&title)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| title.split(':').next().unwrap_or_default().trim().to_string());
            let description = entry
                .summary
                .map(|s| strip_html(&s.content))
                .filter(|d| !d.is_empty())
                .map(|d| truncate_text(&d, limits::DESCRIPTION_CHARS))
                .unwrap_or_else(|| "No description".to_string());
            Some(CveItem {
                id,
                title,
                description,
                severity: "MEDIUM".to_string(),
                link,
                date: None,
                source,
            })
        })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CveState {
    pub posted_cves: Vec<String>,
    pub last_check: Option<DateTime<Utc>>,
}

impl CveState {
    /// Items not posted before, without duplicates inside the batch.
    pub fn unposted(&self, items: Vec<CveItem>) -> Vec<CveItem> {
        let mut seen: HashSet<String> = self.posted_cves.iter().cloned().collect();
        items.into_iter().filter(|item| seen.insert(item.id.clone())).collect()
    }

    pub fn record(&mut self, id: &str) {
        if self.posted_cves.iter().any(|x| x == id) {
            return;
        }
        self.posted_cves.push(id.to_string());
        if self.posted_cves.len() > limits::CVE_HISTORY {
            let excess = self.posted_cves.len() - limits::CVE_HISTORY;
            self.posted_cves.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{find_source, Category};
    use serde_json::json;

    fn nvd() -> &'static Source {
        find_source(Category::Cve, "nvd").unwrap()
    }

    fn ubuntu() -> &'static Source {
        find_source(Category::Cve, "ubuntu").unwrap()
    }

    #[test]
    fn parses_nvd_payload() {
        let body = json!({"vulnerabilities": [
            {"cve": {"id": "CVE-2024-0001", "published": "2024-06-01T10:00:00.000",
                "descriptions": [{"lang": "es", "value": "hola"}, {"lang": "en", "value": "Overflow in foo"}],
                "metrics": {"cvssMetricV31": [{"cvssData": {"baseSeverity": "CRITICAL"}}]}}},
            {"cve": {"id": "CVE-2024-0002", "descriptions": []}}
        ]});
        let items = parse_nvd(&body, nvd());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Overflow in foo");
        assert_eq!(items[0].severity, "CRITICAL");
        assert_eq!(items[0].link, "https://nvd.nist.gov/vuln/detail/CVE-2024-0001");
        assert_eq!(items[1].severity, "UNKNOWN");
        assert_eq!(items[1].description, "No description");
        assert_eq!(items[1].date, None);
    }

    #[test]
    fn parses_ubuntu_notices() {
        let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>USN</title>
            <item><title>USN-6800-1: OpenSSL vulnerability (CVE-2024-5535)</title><link>https://ubuntu.com/security/notices/USN-6800-1</link>
              <description>&lt;p&gt;It was discovered that OpenSSL...&lt;/p&gt;</description></item>
            <item><title>USN-6801-1: curl regression</title><link>https://ubuntu.com/security/notices/USN-6801-1</link></item>
            </channel></rss>"#;
        let items = parse_notices(rss.as_bytes(), ubuntu()).unwrap();
        assert_eq!(items[0].id, "CVE-2024-5535");
        assert_eq!(items[0].severity, "MEDIUM");
        assert_eq!(items[1].id, "USN-6801-1");
        assert_eq!(items[1].description, "No description");
    }

    #[test]
    fn severity_emojis() {
        assert_eq!(severity_emoji("critical"), "🔴");
        assert_eq!(severity_emoji("HIGH"), "🟠");
        assert_eq!(severity_emoji("MEDIUM"), "🟡");
        assert_eq!(severity_emoji("LOW"), "🟢");
        assert_eq!(severity_emoji("UNKNOWN"), "⚪");
    }

    #[test]
    fn history_is_capped_and_dedups() {
        let mut state = CveState::default();
        for i in 0..1005 {
            state.record(&format!("CVE-2024-{i}"));
        }
        state.record("CVE-2024-1004");
        assert_eq!(state.posted_cves.len(), limits::CVE_HISTORY);
        assert_eq!(state.posted_cves[0], "CVE-2024-5");

        let item = |id: &str| CveItem {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            severity: "LOW".into(),
            link: String::new(),
            date: None,
            source: nvd(),
        };
        let fresh = state.unposted(vec![item("CVE-2024-1004"), item("CVE-2025-1"), item("CVE-2025-1")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "CVE-2025-1");
    }
}
