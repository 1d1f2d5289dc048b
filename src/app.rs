//! Shared services: HTTP clients, per-category fetchers and persisted state.

use crate::comics::{ComicsClient, DailyComicState};
use crate::config::{Secrets, Settings};
use crate::consts::Category;
use crate::cve::{CveClient, CveState};
use crate::events::EventCalendar;
use crate::fetcher::FeedFetcher;
use crate::news::NewsConfig;
use crate::radio::{NoaaClient, SolarState};
use crate::state::{StateError, Stored};
use crate::xkcd::{XkcdClient, XkcdState};
use chrono::Utc;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct App {
    pub settings: Settings,
    pub client: Client,
    pub news: Mutex<NewsConfig>,
    pub fetchers: BTreeMap<Category, Arc<FeedFetcher>>,
    pub xkcd: XkcdClient,
    pub comics: ComicsClient,
    pub cve: CveClient,
    pub noaa: NoaaClient,
    pub xkcd_state: Stored<XkcdState>,
    pub comic_state: Stored<DailyComicState>,
    pub solar_state: Stored<SolarState>,
    pub cve_state: Stored<CveState>,
    pub events: RwLock<EventCalendar>,
}

impl App {
    pub async fn build(settings: Settings, secrets: &Secrets, client: Client) -> Result<Arc<Self>, StateError> {
        let news = NewsConfig::load(settings.data_file("news_config.json"), secrets).await;

        let mut fetchers = BTreeMap::new();
        for category in Category::ALL {
            let cfg = news.get(category);
            let path = settings.data_file(&format!("feed_cache_{}.json", category.key()));
            let fetcher = FeedFetcher::new(client.clone(), path).await;
            fetcher.set_concurrency_limit(cfg.concurrency_limit).await;
            fetchers.insert(category, fetcher);
        }

        let app = Self {
            news: Mutex::new(news),
            fetchers,
            xkcd: XkcdClient::new(client.clone()),
            comics: ComicsClient::new(client.clone()),
            cve: CveClient::new(client.clone()),
            noaa: NoaaClient::new(client.clone()),
            xkcd_state: Stored::load(settings.data_file("xkcd_state.json")).await,
            comic_state: Stored::load(settings.data_file("comic_state.json")).await,
            solar_state: Stored::load(settings.data_file("solar_state.json")).await,
            cve_state: Stored::load(settings.data_file("cve_state.json")).await,
            events: RwLock::new(load_events(&settings).await),
            client,
            settings,
        };
        app.apply_env_channels().await?;
        Ok(Arc::new(app))
    }

    /// Channel ids from the secret chain win over persisted ones.
    async fn apply_env_channels(&self) -> Result<(), StateError> {
        if let Some(id) = self.settings.xkcd_channel {
            self.xkcd_state.update(|s| s.channel_id = Some(id)).await?;
        }
        if let Some(id) = self.settings.comic_channel {
            self.comic_state.update(|s| s.channel_id = Some(id)).await?;
        }
        if let Some(id) = self.settings.solar_channel {
            self.solar_state.update(|s| s.channel_id = Some(id)).await?;
        }
        Ok(())
    }

    pub fn fetcher(&self, category: Category) -> Option<&Arc<FeedFetcher>> {
        self.fetchers.get(&category)
    }

    pub async fn reload_events(&self) -> usize {
        let calendar = load_events(&self.settings).await;
        let n = calendar.len();
        *self.events.write().await = calendar;
        n
    }

    /// Flushes every feed cache.
    pub async fn shutdown(&self) {
        for (category, fetcher) in &self.fetchers {
            if let Err(e) = fetcher.close().await {
                log::error!("Failed to save {} feed cache: {}", category.key(), e);
            }
        }
    }
}

async fn load_events(settings: &Settings) -> EventCalendar {
    let dir = settings.events_dir.clone();
    let today = Utc::now().date_naive();
    tokio::task::spawn_blocking(move || EventCalendar::load(&dir, today))
        .await
        .unwrap_or_else(|e| {
            log::error!("Event loader panicked: {}", e);
            EventCalendar::default()
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::testing::{client, scratch_path};
    use std::collections::HashMap;

    pub fn settings(name: &str) -> Settings {
        let root = scratch_path(name);
        Settings {
            token: "test".into(),
            owner_id: None,
            data_dir: root.join("data"),
            events_dir: root.join("events"),
            xkcd_poll_minutes: 30,
            xkcd_channel: None,
            comic_channel: None,
            solar_channel: None,
            events_reminder_channel: None,
        }
    }

    pub async fn app(settings: Settings) -> Arc<App> {
        let secrets = Secrets::from_env(HashMap::new());
        App::build(settings, &secrets, client()).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{app, settings};
    use super::*;

    #[tokio::test]
    async fn env_channels_override_state() {
        let mut s = settings("app_env");
        s.xkcd_channel = Some(42);
        s.solar_channel = Some(7);
        let app = app(s).await;
        assert_eq!(app.xkcd_state.get().await.channel_id, Some(42));
        assert_eq!(app.solar_state.get().await.channel_id, Some(7));
        assert_eq!(app.comic_state.get().await.channel_id, None);
        assert!(app.xkcd_state.path().exists());
    }

    #[tokio::test]
    async fn one_fetcher_per_category_with_its_own_cache() {
        let app = app(settings("app_fetchers")).await;
        assert_eq!(app.fetchers.len(), Category::ALL.len());
        let cve = app.fetcher(Category::Cve).unwrap();
        assert!(cve.cache_path().ends_with("feed_cache_cve.json"));
        assert!(app.events.read().await.is_empty());
    }
}
