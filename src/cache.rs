//! Conditional-request validators and recently seen GUIDs, per feed URL.

use crate::consts::limits;
use crate::state::{self, StateError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCache {
    pub etags: HashMap<String, String>,
    pub last_modified: HashMap<String, String>,
    pub last_guids: HashMap<String, Vec<String>>,
}

impl FeedCache {
    pub async fn load(path: &Path) -> Self {
        let cache: Self = state::load_or_default(path).await;
        log::debug!("Feed cache {}: {} feeds tracked", path.display(), cache.last_guids.len());
        cache
    }

    pub async fn save(&self, path: &Path) -> Result<(), StateError> {
        state::save(path, self).await
    }

    pub fn etag(&self, url: &str) -> Option<&str> {
        self.etags.get(url).map(String::as_str)
    }

    pub fn last_modified(&self, url: &str) -> Option<&str> {
        self.last_modified.get(url).map(String::as_str)
    }

    /// Validators are only replaced when the server sent them.
    pub fn store_validators(&mut self, url: &str, etag: Option<String>, last_modified: Option<String>) {
        if let Some(tag) = etag {
            self.etags.insert(url.to_string(), tag);
        }
        if let Some(stamp) = last_modified {
            self.last_modified.insert(url.to_string(), stamp);
        }
    }

    pub fn has_seen(&self, url: &str, guid: &str) -> bool {
        self.last_guids.get(url).is_some_and(|g| g.iter().any(|x| x == guid))
    }

    /// Appends to the feed's window, keeping only the newest entries.
    pub fn remember(&mut self, url: &str, guid: &str) {
        let window = self.last_guids.entry(url.to_string()).or_default();
        window.push(guid.to_string());
        if window.len() > limits::GUID_WINDOW {
            let excess = window.len() - limits::GUID_WINDOW;
            window.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_path;

    const URL: &str = "https://example.org/feed";

    #[test]
    fn window_keeps_latest_fifty() {
        let mut cache = FeedCache::default();
        for i in 0..60 {
            cache.remember(URL, &format!("guid-{i}"));
        }
        let window = &cache.last_guids[URL];
        assert_eq!(window.len(), limits::GUID_WINDOW);
        assert!(!cache.has_seen(URL, "guid-9"));
        assert!(cache.has_seen(URL, "guid-10"));
        assert!(cache.has_seen(URL, "guid-59"));
    }

    #[test]
    fn validators_are_not_cleared_by_missing_headers() {
        let mut cache = FeedCache::default();
        cache.store_validators(URL, Some("\"v1\"".into()), Some("Mon, 01 Jan 2024 00:00:00 GMT".into()));
        cache.store_validators(URL, None, None);
        assert_eq!(cache.etag(URL), Some("\"v1\""));
        assert!(cache.last_modified(URL).is_some());
    }

    #[tokio::test]
    async fn persists_with_expected_keys() {
        let path = scratch_path("feed_cache.json");
        let mut cache = FeedCache::default();
        cache.store_validators(URL, Some("abc".into()), None);
        cache.remember(URL, "g1");
        cache.save(&path).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(raw["etags"][URL], "abc");
        assert_eq!(raw["last_guids"][URL][0], "g1");
        assert!(raw["last_modified"].is_object());

        assert_eq!(FeedCache::load(&path).await, cache);
    }
}
