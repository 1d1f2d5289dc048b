//! Per-category news configuration: channels, schedules, sources, roles.

use crate::config::Secrets;
use crate::consts::{find_source, sources_by_category, Category, Source};
use crate::state::{self, StateError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MIN_INTERVAL_HOURS: u32 = 1;
pub const MAX_INTERVAL_HOURS: u32 = 24;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("Please set a channel for {0} first")]
    NoChannel(Category),
    #[error("Interval must be between 1 and 24 hours (got {0})")]
    IntervalOutOfRange(u32),
    #[error("Unknown source `{key}` for {category}")]
    UnknownSource { category: Category, key: String },
    #[error("Role is already approved")]
    RoleExists,
    #[error("Role is not in the approved list")]
    RoleMissing,
    #[error("State: {0}")]
    State(#[from] StateError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub enabled: bool,
    pub channel_id: Option<u64>,
    pub interval_hours: u32,
    pub minute_offset: u32,
    /// Sources missing from this map are enabled.
    pub sources: BTreeMap<String, bool>,
    pub approved_roles: Vec<u64>,
    pub concurrency_limit: usize,
    pub use_etag_cache: bool,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_id: None,
            interval_hours: 2,
            minute_offset: 0,
            sources: BTreeMap::new(),
            approved_roles: Vec::new(),
            concurrency_limit: crate::consts::limits::DEFAULT_CONCURRENCY,
            use_etag_cache: true,
        }
    }
}

impl CategoryConfig {
    pub fn defaults_for(category: Category) -> Self {
        let (interval_hours, minute_offset, concurrency_limit) = category.schedule();
        Self { interval_hours, minute_offset, concurrency_limit, ..Self::default() }
    }

    pub fn is_source_enabled(&self, key: &str) -> bool {
        self.sources.get(key).copied().unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryStatus {
    pub category: Category,
    pub enabled: bool,
    pub channel_id: Option<u64>,
    pub channel_from_env: bool,
    pub interval_hours: u32,
    pub minute_offset: u32,
    pub enabled_sources: usize,
    pub total_sources: usize,
    pub approved_roles: Vec<u64>,
}

impl CategoryStatus {
    pub fn ready_to_enable(&self) -> bool {
        !self.enabled && self.channel_id.is_some()
    }
}

#[derive(Debug)]
pub struct NewsConfig {
    path: PathBuf,
    categories: BTreeMap<Category, CategoryConfig>,
    env_channels: BTreeSet<Category>,
}

impl NewsConfig {
    pub async fn load(path: impl Into<PathBuf>, secrets: &Secrets) -> Self {
        let path = path.into();
        let raw: BTreeMap<String, CategoryConfig> = state::load_or_default(&path).await;

        let mut categories = BTreeMap::new();
        for (key, cfg) in raw {
            match key.parse::<Category>() {
                Ok(category) => {
                    categories.insert(category, cfg);
                }
                Err(e) => log::warn!("news config: dropping {}", e),
            }
        }
        for category in Category::ALL {
            categories
                .entry(category)
                .or_insert_with(|| CategoryConfig::defaults_for(category));
        }

        let mut env_channels = BTreeSet::new();
        for category in Category::ALL {
            let key = format!("{}_CHANNEL_ID", category.key().to_uppercase());
            if let Some(id) = secrets.get_u64("NEWS", &key) {
                if let Some(cfg) = categories.get_mut(&category) {
                    cfg.channel_id = Some(id);
                }
                env_channels.insert(category);
                log::info!("news: {} channel {} from environment", category.key(), id);
            }
        }

        Self { path, categories, env_channels }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, category: Category) -> CategoryConfig {
        self.categories
            .get(&category)
            .cloned()
            .unwrap_or_else(|| CategoryConfig::defaults_for(category))
    }

    fn entry(&mut self, category: Category) -> &mut CategoryConfig {
        self.categories
            .entry(category)
            .or_insert_with(|| CategoryConfig::defaults_for(category))
    }

    pub async fn save(&self) -> Result<(), StateError> {
        state::save(&self.path, &self.categories).await
    }

    pub async fn set_channel(&mut self, category: Category, channel_id: u64) -> Result<(), NewsError> {
        self.entry(category).channel_id = Some(channel_id);
        self.env_channels.remove(&category);
        Ok(self.save().await?)
    }

    pub async fn enable(&mut self, category: Category) -> Result<(), NewsError> {
        let cfg = self.entry(category);
        if cfg.channel_id.is_none() {
            return Err(NewsError::NoChannel(category));
        }
        cfg.enabled = true;
        Ok(self.save().await?)
    }

    pub async fn disable(&mut self, category: Category) -> Result<(), NewsError> {
        self.entry(category).enabled = false;
        Ok(self.save().await?)
    }

    pub async fn set_interval(&mut self, category: Category, hours: u32) -> Result<(), NewsError> {
        if !(MIN_INTERVAL_HOURS..=MAX_INTERVAL_HOURS).contains(&hours) {
            return Err(NewsError::IntervalOutOfRange(hours));
        }
        self.entry(category).interval_hours = hours;
        Ok(self.save().await?)
    }

    /// Flips a source and returns its new state.
    pub async fn toggle_source(&mut self, category: Category, key: &str) -> Result<bool, NewsError> {
        let source = find_source(category, key).ok_or_else(|| NewsError::UnknownSource {
            category,
            key: key.to_string(),
        })?;
        let cfg = self.entry(category);
        let now = !cfg.is_source_enabled(source.key);
        cfg.sources.insert(source.key.to_string(), now);
        self.save().await?;
        Ok(now)
    }

    pub async fn add_role(&mut self, category: Category, role_id: u64) -> Result<(), NewsError> {
        let cfg = self.entry(category);
        if cfg.approved_roles.contains(&role_id) {
            return Err(NewsError::RoleExists);
        }
        cfg.approved_roles.push(role_id);
        Ok(self.save().await?)
    }

    pub async fn remove_role(&mut self, category: Category, role_id: u64) -> Result<(), NewsError> {
        let cfg = self.entry(category);
        let before = cfg.approved_roles.len();
        cfg.approved_roles.retain(|r| *r != role_id);
        if cfg.approved_roles.len() == before {
            return Err(NewsError::RoleMissing);
        }
        Ok(self.save().await?)
    }

    pub fn is_source_enabled(&self, category: Category, key: &str) -> bool {
        self.categories
            .get(&category)
            .map_or(true, |c| c.is_source_enabled(key))
    }

    pub fn enabled_sources(&self, category: Category) -> Vec<&'static Source> {
        sources_by_category(category)
            .filter(|s| self.is_source_enabled(category, s.key))
            .collect()
    }

    /// Sorted by key, with each source's current state.
    pub fn list_sources(&self, category: Category) -> Vec<(&'static Source, bool)> {
        let mut all: Vec<_> = sources_by_category(category)
            .map(|s| (s, self.is_source_enabled(category, s.key)))
            .collect();
        all.sort_by_key(|(s, _)| s.key);
        all
    }

    /// Administrators always; otherwise any approved role.
    pub fn may_configure(&self, category: Category, is_admin: bool, roles: &[u64]) -> bool {
        is_admin
            || self
                .categories
                .get(&category)
                .is_some_and(|c| c.approved_roles.iter().any(|r| roles.contains(r)))
    }

    pub fn status(&self, category: Category) -> CategoryStatus {
        let cfg = self.get(category);
        let total_sources = sources_by_category(category).count();
        CategoryStatus {
            category,
            enabled: cfg.enabled,
            channel_id: cfg.channel_id,
            channel_from_env: self.env_channels.contains(&category),
            interval_hours: cfg.interval_hours,
            minute_offset: cfg.minute_offset,
            enabled_sources: self.enabled_sources(category).len(),
            total_sources,
            approved_roles: cfg.approved_roles,
        }
    }

    pub fn status_all(&self) -> Vec<CategoryStatus> {
        Category::ALL.into_iter().map(|c| self.status(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_path;
    use std::collections::HashMap;

    async fn fresh() -> NewsConfig {
        NewsConfig::load(scratch_path("news_config.json"), &Secrets::default()).await
    }

    #[tokio::test]
    async fn defaults_are_disabled_and_staggered() {
        let cfg = fresh().await;
        let cyber = cfg.get(Category::Cybersecurity);
        assert!(!cyber.enabled);
        assert_eq!((cyber.interval_hours, cyber.minute_offset), (3, 1));
        let cve = cfg.get(Category::Cve);
        assert_eq!((cve.interval_hours, cve.concurrency_limit), (6, 3));
        assert!(cve.use_etag_cache);
    }

    #[tokio::test]
    async fn enable_requires_channel() {
        let mut cfg = fresh().await;
        assert!(matches!(cfg.enable(Category::Tech).await, Err(NewsError::NoChannel(Category::Tech))));
        cfg.set_channel(Category::Tech, 42).await.unwrap();
        cfg.enable(Category::Tech).await.unwrap();
        assert!(cfg.get(Category::Tech).enabled);
        cfg.disable(Category::Tech).await.unwrap();
        assert!(!cfg.get(Category::Tech).enabled);
    }

    #[tokio::test]
    async fn interval_bounds() {
        let mut cfg = fresh().await;
        assert!(matches!(cfg.set_interval(Category::Gaming, 0).await, Err(NewsError::IntervalOutOfRange(0))));
        assert!(cfg.set_interval(Category::Gaming, 25).await.is_err());
        cfg.set_interval(Category::Gaming, 24).await.unwrap();
        assert_eq!(cfg.get(Category::Gaming).interval_hours, 24);
    }

    #[tokio::test]
    async fn toggling_sources() {
        let mut cfg = fresh().await;
        assert!(cfg.is_source_enabled(Category::Tech, "lwn"));
        assert!(!cfg.toggle_source(Category::Tech, "lwn").await.unwrap());
        assert!(!cfg.enabled_sources(Category::Tech).iter().any(|s| s.key == "lwn"));
        assert!(cfg.toggle_source(Category::Tech, "LWN").await.unwrap());
        assert!(matches!(
            cfg.toggle_source(Category::Tech, "nope").await,
            Err(NewsError::UnknownSource { .. })
        ));
    }

    #[tokio::test]
    async fn roles_and_permissions() {
        let mut cfg = fresh().await;
        cfg.add_role(Category::Tech, 7).await.unwrap();
        assert!(matches!(cfg.add_role(Category::Tech, 7).await, Err(NewsError::RoleExists)));
        assert!(cfg.may_configure(Category::Tech, false, &[1, 7]));
        assert!(!cfg.may_configure(Category::Gaming, false, &[7]));
        assert!(cfg.may_configure(Category::Gaming, true, &[]));
        cfg.remove_role(Category::Tech, 7).await.unwrap();
        assert!(matches!(cfg.remove_role(Category::Tech, 7).await, Err(NewsError::RoleMissing)));
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let path = scratch_path("news_config.json");
        let mut cfg = NewsConfig::load(path.clone(), &Secrets::default()).await;
        cfg.set_channel(Category::Cve, 99).await.unwrap();
        cfg.enable(Category::Cve).await.unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["cve"]["channel_id"], 99);

        let reloaded = NewsConfig::load(path, &Secrets::default()).await;
        assert!(reloaded.get(Category::Cve).enabled);
    }

    #[tokio::test]
    async fn environment_channel_overrides_file() {
        let env: HashMap<String, String> =
            [("NEWS_TECH_CHANNEL_ID".to_string(), "555".to_string())].into_iter().collect();
        let cfg = NewsConfig::load(scratch_path("n.json"), &Secrets::from_env(env)).await;
        let status = cfg.status(Category::Tech);
        assert_eq!(status.channel_id, Some(555));
        assert!(status.channel_from_env);
        assert!(status.ready_to_enable());
        assert_eq!(cfg.status_all().iter().filter(|s| s.ready_to_enable()).count(), 1);
    }

    #[tokio::test]
    async fn sources_listed_sorted() {
        let cfg = fresh().await;
        let keys: Vec<_> = cfg.list_sources(Category::Cve).into_iter().map(|(s, _)| s.key).collect();
        assert_eq!(keys, vec!["nvd", "ubuntu"]);
    }
}
