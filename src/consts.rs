//! Static source configuration.
//! All registry strings are &'static str so the table lives in rodata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a source is fetched and parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// RSS 0.9x/2.0 or Atom feed
    Rss,
    /// NVD CVE 2.0 JSON API
    NvdApi,
}

/// News category groupings. The snake_case name doubles as the config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cybersecurity,
    Tech,
    Gaming,
    AppleGoogle,
    Cve,
    UsLegislation,
    EuLegislation,
    UkLegislation,
    GeneralNews,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Cybersecurity,
        Category::Tech,
        Category::Gaming,
        Category::AppleGoogle,
        Category::Cve,
        Category::UsLegislation,
        Category::EuLegislation,
        Category::UkLegislation,
        Category::GeneralNews,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Cybersecurity => "cybersecurity",
            Category::Tech => "tech",
            Category::Gaming => "gaming",
            Category::AppleGoogle => "apple_google",
            Category::Cve => "cve",
            Category::UsLegislation => "us_legislation",
            Category::EuLegislation => "eu_legislation",
            Category::UkLegislation => "uk_legislation",
            Category::GeneralNews => "general_news",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Cybersecurity => "🔒",
            Category::Tech => "💻",
            Category::Gaming => "🎮",
            Category::AppleGoogle => "📱",
            Category::Cve => "🛡️",
            Category::UsLegislation => "🇺🇸",
            Category::EuLegislation => "🇪🇺",
            Category::UkLegislation => "🇬🇧",
            Category::GeneralNews => "📰",
        }
    }

    /// Entries inspected per poll. Slow-moving feeds get a deeper scan.
    pub fn scan_depth(self) -> usize {
        match self {
            Category::UsLegislation
            | Category::EuLegislation
            | Category::UkLegislation
            | Category::GeneralNews => limits::DEEP_SCAN_DEPTH,
            _ => limits::SCAN_DEPTH,
        }
    }

    /// Entries older than this are never posted.
    pub fn max_age_days(self) -> Option<i64> {
        match self {
            Category::UsLegislation
            | Category::EuLegislation
            | Category::UkLegislation
            | Category::GeneralNews => Some(limits::MAX_ENTRY_AGE_DAYS),
            _ => None,
        }
    }

    /// (interval hours, minute offset, concurrency limit)
    pub fn schedule(self) -> (u32, u32, usize) {
        match self {
            Category::Cybersecurity => (3, 1, limits::DEFAULT_CONCURRENCY),
            Category::Tech => (4, 30, limits::DEFAULT_CONCURRENCY),
            Category::Gaming => (2, 15, limits::DEFAULT_CONCURRENCY),
            Category::AppleGoogle => (3, 45, limits::DEFAULT_CONCURRENCY),
            Category::Cve => (6, 0, 3),
            Category::UsLegislation => (1, 5, 3),
            Category::EuLegislation => (1, 10, 3),
            Category::UkLegislation => (1, 25, 3),
            Category::GeneralNews => (2, 20, limits::DEFAULT_CONCURRENCY),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Cybersecurity => "Cybersecurity",
            Category::Tech => "Tech",
            Category::Gaming => "Gaming",
            Category::AppleGoogle => "Apple & Google",
            Category::Cve => "CVE",
            Category::UsLegislation => "US Legislation",
            Category::EuLegislation => "EU Legislation",
            Category::UkLegislation => "UK Legislation",
            Category::GeneralNews => "General News",
        };
        write!(f, "{} {}", self.icon(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Feed source definition with static lifetime
#[derive(Debug, Clone, Copy)]
pub struct Source {
    pub key: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub color: u32,
    pub icon: &'static str,
    pub category: Category,
    pub kind: SourceKind,
}

impl Source {
    const fn new(
        category: Category,
        key: &'static str,
        name: &'static str,
        url: &'static str,
        color: u32,
        icon: &'static str,
    ) -> Self {
        Self { key, name, url, color, icon, category, kind: SourceKind::Rss }
    }

    const fn api(mut self) -> Self {
        self.kind = SourceKind::NvdApi;
        self
    }
}

use Category::*;

/// Static source registry
pub static SOURCES: &[Source] = &[
    // ═══════════════════════════════════════════════════════════════════
    // CYBERSECURITY
    // ═══════════════════════════════════════════════════════════════════
    Source::new(Cybersecurity, "404media", "404 Media", "https://404media.co/rss/", 0xFF6B35, "📰"),
    Source::new(Cybersecurity, "arstechnica_sec", "Ars Technica Security", "https://feeds.arstechnica.com/arstechnica/security", 0xFF4F00, "🔬"),
    Source::new(Cybersecurity, "thehackernews", "The Hacker News", "https://thehackernews.com/feeds/posts/default", 0xD9231F, "🔒"),
    Source::new(Cybersecurity, "welivesecurity", "WeLiveSecurity (ESET)", "https://www.welivesecurity.com/feed/", 0x00A3E0, "🛡️"),
    Source::new(Cybersecurity, "darkreading", "Dark Reading", "https://www.darkreading.com/rss.xml", 0x1A1A1A, "🌑"),
    Source::new(Cybersecurity, "bleepingcomputer", "BleepingComputer", "https://www.bleepingcomputer.com/feed/", 0x0066CC, "💻"),
    Source::new(Cybersecurity, "malwarebytes", "Malwarebytes Labs", "https://blog.malwarebytes.com/feed/", 0xFF6A13, "🦠"),
    Source::new(Cybersecurity, "wired_security", "Wired Security", "https://www.wired.com/category/security/feed", 0x000000, "📡"),
    Source::new(Cybersecurity, "eff", "EFF Deeplinks", "https://www.eff.org/rss/updates.xml", 0xC8102E, "🗽"),
    Source::new(Cybersecurity, "schneier", "Schneier on Security", "https://www.schneier.com/feed/atom/", 0x8B4513, "📚"),
    Source::new(Cybersecurity, "cyberscoop", "CyberScoop", "https://www.cyberscoop.com/feed/", 0x1E3A8A, "🏛️"),
    Source::new(Cybersecurity, "securityweek", "SecurityWeek", "https://feeds.feedburner.com/securityweek", 0x2E5C8A, "📊"),
    Source::new(Cybersecurity, "databreaches", "DataBreaches.net", "https://www.databreaches.net/feed/", 0xE74C3C, "💥"),
    Source::new(Cybersecurity, "aws_security", "AWS Security Blog", "https://aws.amazon.com/blogs/security/feed/", 0xFF9900, "☁️"),
    Source::new(Cybersecurity, "crowdstrike", "CrowdStrike", "https://www.crowdstrike.com/blog/feed/", 0xE01F3D, "🦅"),
    Source::new(Cybersecurity, "tenable", "Tenable", "https://www.tenable.com/blog/rss", 0x00B2A9, "🔬"),
    Source::new(Cybersecurity, "zscaler", "Zscaler Research", "https://www.zscaler.com/blogs/feed", 0x0066CC, "🌐"),
    Source::new(Cybersecurity, "privacyintl", "Privacy International", "https://privacyinternational.org/rss.xml", 0x9B59B6, "🕵️"),

    // ═══════════════════════════════════════════════════════════════════
    // TECH
    // ═══════════════════════════════════════════════════════════════════
    Source::new(Tech, "arstechnica", "Ars Technica (Main)", "https://feeds.arstechnica.com/arstechnica/index", 0xFF4F00, "🔬"),
    Source::new(Tech, "theverge", "The Verge", "https://www.theverge.com/rss/index.xml", 0xFA4B2A, "📱"),
    Source::new(Tech, "techcrunch", "TechCrunch", "https://techcrunch.com/feed/", 0x0AB34F, "🚀"),
    Source::new(Tech, "engadget", "Engadget", "https://www.engadget.com/rss.xml", 0x2E5C8A, "📡"),
    Source::new(Tech, "phoronix", "Phoronix (Linux/Hardware)", "https://www.phoronix.com/rss.php", 0x15A0DD, "🐧"),
    Source::new(Tech, "lwn", "LWN.net (Linux Weekly News)", "https://lwn.net/headlines/rss", 0x336699, "📰"),
    Source::new(Tech, "hackaday", "Hackaday", "https://hackaday.com/blog/feed/", 0xF4D03F, "🔧"),
    Source::new(Tech, "ieee_spectrum", "IEEE Spectrum", "https://spectrum.ieee.org/feed", 0x00629B, "⚡"),
    Source::new(Tech, "tomshardware", "Tom's Hardware", "https://www.tomshardware.com/feeds/all", 0xD02B2D, "💻"),
    Source::new(Tech, "anandtech", "AnandTech", "https://www.anandtech.com/rss", 0xE74C3C, "🖥️"),
    Source::new(Tech, "infoq", "InfoQ", "https://feeds.infoq.com/", 0x1E88E5, "👨‍💻"),
    Source::new(Tech, "github_blog", "GitHub Blog", "https://github.blog/feed/", 0x24292E, "🐙"),
    Source::new(Tech, "google_dev", "Google Developers Blog", "https://developers.googleblog.com/feeds/posts/default", 0x4285F4, "🔍"),
    Source::new(Tech, "cloudflare_eng", "Cloudflare Engineering", "https://blog.cloudflare.com/tag/engineering/rss/", 0xF38020, "☁️"),
    Source::new(Tech, "venturebeat", "VentureBeat (AI/Tech)", "https://venturebeat.com/feed/", 0x0A7CFF, "🤖"),

    // ═══════════════════════════════════════════════════════════════════
    // GAMING
    // ═══════════════════════════════════════════════════════════════════
    Source::new(Gaming, "ign", "IGN", "https://feeds.ign.com/ign/all", 0xD91F26, "🎮"),
    Source::new(Gaming, "gameinformer", "Game Informer", "https://www.gameinformer.com/rss", 0xFFCC00, "🎯"),
    Source::new(Gaming, "polygon", "Polygon", "https://www.polygon.com/rss/index.xml", 0xFF3C68, "🔺"),
    Source::new(Gaming, "pcgamer", "PC Gamer", "https://www.pcgamer.com/rss/", 0xC41230, "💻"),
    Source::new(Gaming, "eurogamer", "Eurogamer", "https://www.eurogamer.net/?format=rss", 0x003C6C, "🇪🇺"),
    Source::new(Gaming, "rockpapershotgun", "Rock Paper Shotgun", "https://www.rockpapershotgun.com/feed", 0x2D5677, "✂️"),
    Source::new(Gaming, "gamespot", "GameSpot", "https://www.gamespot.com/feeds/mashup/", 0xE50914, "🎪"),
    Source::new(Gaming, "kotaku", "Kotaku", "https://kotaku.com/rss", 0xFF5C00, "🗾"),
    Source::new(Gaming, "destructoid", "Destructoid", "https://www.destructoid.com/feed/", 0x39B54A, "🤖"),
    Source::new(Gaming, "nichegamer", "Niche Gamer", "https://nichegamer.com/feed/", 0x9B59B6, "🎲"),

    // ═══════════════════════════════════════════════════════════════════
    // APPLE & GOOGLE
    // ═══════════════════════════════════════════════════════════════════
    Source::new(AppleGoogle, "9to5mac", "9to5Mac", "https://9to5mac.com/feed/", 0x0080FF, "🍎"),
    Source::new(AppleGoogle, "macrumors", "MacRumors", "https://www.macrumors.com/macrumors.xml", 0x000000, "🍎"),
    Source::new(AppleGoogle, "appleinsider", "AppleInsider", "https://appleinsider.com/rss/news/", 0xE53935, "🍎"),
    Source::new(AppleGoogle, "cultofmac", "Cult of Mac", "https://www.cultofmac.com/feed/", 0xFF2D55, "🍎"),
    Source::new(AppleGoogle, "macworld", "MacWorld", "https://www.macworld.com/feed/", 0x4A90E2, "🍎"),
    Source::new(AppleGoogle, "macstories", "MacStories", "https://www.macstories.net/feed/", 0x5C2D91, "🍎"),
    Source::new(AppleGoogle, "tidbits", "TidBITS", "https://tidbits.com/feed/", 0x0066CC, "🍎"),
    Source::new(AppleGoogle, "9to5google", "9to5Google", "https://9to5google.com/feed/", 0x4285F4, "🤖"),
    Source::new(AppleGoogle, "android_authority", "Android Authority", "https://www.androidauthority.com/feed/", 0x3DDC84, "🤖"),
    Source::new(AppleGoogle, "android_police", "Android Police", "https://www.androidpolice.com/feed/", 0xFF6600, "🤖"),
    Source::new(AppleGoogle, "xda", "XDA Developers", "https://www.xda-developers.com/feed/", 0xEA7100, "🤖"),
    Source::new(AppleGoogle, "android_central", "Android Central", "https://www.androidcentral.com/rss.xml", 0x00C853, "🤖"),
    Source::new(AppleGoogle, "sammobile", "SamMobile", "https://www.sammobile.com/feed/", 0x1428A0, "🤖"),
    Source::new(AppleGoogle, "gsmarena", "GSMArena (Mobile Devices)", "https://www.gsmarena.com/rss-news-reviews.php3", 0xFF6600, "📱"),
    Source::new(AppleGoogle, "chrome_unboxed", "Chrome Unboxed", "https://chromeunboxed.com/feed/", 0x4285F4, "💻"),
    Source::new(AppleGoogle, "google_cloud", "Google Cloud Blog", "https://cloud.google.com/blog/rss", 0x4285F4, "☁️"),
    Source::new(AppleGoogle, "android_dev", "Android Developers Blog", "https://android-developers.googleblog.com/feeds/posts/default", 0x3DDC84, "👨‍💻"),

    // ═══════════════════════════════════════════════════════════════════
    // CVE
    // ═══════════════════════════════════════════════════════════════════
    Source::new(Cve, "nvd", "NVD Recent CVEs", endpoints::NVD_CVES, 0x1C4E80, "📊").api(),
    Source::new(Cve, "ubuntu", "Ubuntu Security Notices", "https://ubuntu.com/security/notices/rss.xml", 0xE95420, "🐧"),

    // ═══════════════════════════════════════════════════════════════════
    // LEGISLATION
    // ═══════════════════════════════════════════════════════════════════
    Source::new(UsLegislation, "govinfo_bills", "GovInfo - Congressional Bills", "https://www.govinfo.gov/rss/bills.xml", 0x3C3B6E, "📜"),
    Source::new(UsLegislation, "govinfo_plaw", "GovInfo - Public Laws", "https://www.govinfo.gov/rss/plaw.xml", 0x3C3B6E, "⚖️"),
    Source::new(UsLegislation, "congress_most_viewed", "Congress.gov - Most Viewed Bills", "https://www.congress.gov/rss/most-viewed-bills.xml", 0xB22234, "🏛️"),
    Source::new(EuLegislation, "eurlex_parliament_council", "EUR-Lex - Parliament & Council Legislation", "https://eur-lex.europa.eu/EN/display-feed.rss?rssId=162", 0x003399, "🇪🇺"),
    Source::new(EuLegislation, "eurlex_proposals", "EUR-Lex - Commission Proposals", "https://eur-lex.europa.eu/EN/display-feed.rss?rssId=161", 0x003399, "📜"),
    Source::new(EuLegislation, "eurlex_official_journal", "EUR-Lex - Official Journal (Binding Acts)", "https://eur-lex.europa.eu/EN/display-feed.rss?rssId=222", 0x003399, "📰"),
    Source::new(UkLegislation, "uk_bills", "UK Parliament - All Bills", "https://bills.parliament.uk/rss/allbills.rss", 0x006548, "🏛️"),
    Source::new(UkLegislation, "uk_legislation_new", "legislation.gov.uk - New Legislation", "https://www.legislation.gov.uk/new/data.feed", 0x006548, "📜"),

    // ═══════════════════════════════════════════════════════════════════
    // GENERAL NEWS
    // ═══════════════════════════════════════════════════════════════════
    Source::new(GeneralNews, "npr_news", "NPR News", "https://feeds.npr.org/1001/rss.xml", 0x3498DB, "📻"),
    Source::new(GeneralNews, "pbs_economy", "PBS NewsHour - Economy", "https://www.pbs.org/newshour/feeds/rss/economy", 0x3498DB, "📺"),
    Source::new(GeneralNews, "financial_times", "Financial Times", "https://www.ft.com/news-feed?format=rss", 0x3498DB, "💼"),
    Source::new(GeneralNews, "pew_research", "Pew Research Center", "https://www.pewresearch.org/feed/", 0x3498DB, "📊"),
    Source::new(GeneralNews, "nyt_homepage", "New York Times - Homepage", "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml", 0x3498DB, "📰"),
    Source::new(GeneralNews, "foreign_affairs", "Foreign Affairs", "https://www.foreignaffairs.com/rss.xml", 0x3498DB, "🌍"),
    Source::new(GeneralNews, "politico", "Politico", "https://www.politico.com/rss/politicopicks.xml", 0x3498DB, "🏛️"),
    Source::new(GeneralNews, "bbc_health", "BBC News - Health", "http://feeds.bbci.co.uk/news/health/rss.xml", 0x3498DB, "🏥"),
    Source::new(GeneralNews, "bbc_uk", "BBC News - UK", "http://feeds.bbci.co.uk/news/uk/rss.xml", 0x3498DB, "🇬🇧"),
    Source::new(GeneralNews, "bbc_world", "BBC News - World", "http://feeds.bbci.co.uk/news/world/rss.xml", 0x3498DB, "🌍"),
    Source::new(GeneralNews, "bbc_news", "BBC News - Top Stories", "http://feeds.bbci.co.uk/news/rss.xml", 0x3498DB, "📰"),
    Source::new(GeneralNews, "bbc_politics", "BBC News - Politics", "http://feeds.bbci.co.uk/news/politics/rss.xml", 0x3498DB, "🏛️"),
];

/// Lookup a source by key within a category (case-insensitive)
#[inline]
pub fn find_source(category: Category, key: &str) -> Option<&'static Source> {
    SOURCES
        .iter()
        .find(|s| s.category == category && s.key.eq_ignore_ascii_case(key.trim()))
}

/// Get all sources in a category
#[inline]
pub fn sources_by_category(category: Category) -> impl Iterator<Item = &'static Source> {
    SOURCES.iter().filter(move |s| s.category == category)
}

/// HTTP headers
pub mod headers {
    pub const USER_AGENT: &str = "PenguinOverlord/0.1 (+https://github.com/penguin-overlord)";
    pub const ACCEPT_FEED: &str =
        "application/rss+xml,application/atom+xml,application/xml,text/xml;q=0.9,*/*;q=0.8";
}

/// Remote endpoints used outside the feed registry
pub mod endpoints {
    pub const NVD_CVES: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
    pub const NVD_DETAIL: &str = "https://nvd.nist.gov/vuln/detail/";
    pub const XKCD_BASE: &str = "https://xkcd.com";
    pub const EXPLAIN_XKCD_API: &str = "https://www.explainxkcd.com/wiki/api.php";
    pub const JOY_OF_TECH_RSS: &str = "https://www.joyoftech.com/joyoftech/jotblog/index.xml";
    pub const TURNOFF_RSS: &str = "https://turnoff.us/feed.xml";
    pub const NOAA_SCALES: &str = "https://services.swpc.noaa.gov/products/noaa-scales.json";
    pub const NOAA_FLUX: &str = "https://services.swpc.noaa.gov/json/f107_cm_flux.json";
    pub const NOAA_K_INDEX: &str = "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json";
    pub const DOPPLER_DOWNLOAD: &str = "https://api.doppler.com/v3/configs/config/secrets/download";
}

/// Limits and thresholds
pub mod limits {
    pub const SCAN_DEPTH: usize = 5;
    pub const DEEP_SCAN_DEPTH: usize = 10;
    pub const MAX_ENTRY_AGE_DAYS: i64 = 7;
    pub const DESCRIPTION_CHARS: usize = 300;
    pub const TITLE_FALLBACK_CHARS: usize = 100;
    pub const GUID_WINDOW: usize = 50;
    pub const CVE_HISTORY: usize = 1000;
    pub const CVE_DISPLAY: usize = 5;
    pub const DEFAULT_CONCURRENCY: usize = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const POST_SPACING_MS: u64 = 500;
    pub const EMBED_FIELD_CHARS: usize = 1024;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn source_keys_are_unique_per_category() {
        let mut seen = HashSet::new();
        for s in SOURCES {
            assert!(seen.insert((s.category, s.key)), "duplicate key {}", s.key);
        }
    }

    #[test]
    fn every_category_has_sources() {
        for c in Category::ALL {
            assert!(sources_by_category(c).count() > 0, "{c:?} is empty");
        }
    }

    #[test]
    fn category_parses_from_key_and_loose_spelling() {
        assert_eq!("apple_google".parse::<Category>(), Ok(Category::AppleGoogle));
        assert_eq!("EU-Legislation".parse::<Category>(), Ok(Category::EuLegislation));
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn find_source_is_scoped_to_category() {
        assert!(find_source(Category::Tech, "GOOGLE_DEV").is_some());
        assert!(find_source(Category::Gaming, "google_dev").is_none());
        assert_eq!(find_source(Category::Cve, "nvd").map(|s| s.kind), Some(SourceKind::NvdApi));
    }
}
