//! Polling loops and one-shot passes that turn fetch results into posts.

use crate::app::App;
use crate::comics::{next_daily_run, ComicError, ComicSource};
use crate::consts::{limits, Category, Source};
use crate::events;
use crate::fetcher::{FeedItem, FetchError};
use crate::news::CategoryConfig;
use crate::post::{self, Post};
use crate::state::StateError;
use crate::xkcd::XkcdError;
use chrono::{DateTime, NaiveDate, Utc};
use poise::serenity_prelude as serenity;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

const XKCD_FIRST_POLL: Duration = Duration::from_secs(10);
const SOLAR_PERIOD_HOURS: i64 = 12;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Discord: {0}")] Discord(#[from] serenity::Error),
    #[error("Rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug)]
pub enum PassError {
    #[error("Publish: {0}")] Publish(#[from] PostError),
    #[error("Fetch: {0}")] Fetch(#[from] FetchError),
    #[error("XKCD: {0}")] Xkcd(#[from] XkcdError),
    #[error("Comic: {0}")] Comic(#[from] ComicError),
    #[error("State: {0}")] State(#[from] StateError),
}

/// Where posts go. The bot and the one-shot runners publish through the
/// Discord REST client.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, channel_id: u64, post: &Post) -> impl Future<Output = Result<(), PostError>> + Send;
}

impl Publisher for serenity::Http {
    async fn publish(&self, channel_id: u64, post: &Post) -> Result<(), PostError> {
        post::send(self, channel_id, post).await?;
        Ok(())
    }
}

async fn publish_spaced<P: Publisher>(publisher: &P, channel_id: u64, posts: &[Post]) -> usize {
    let mut sent = 0;
    for (i, post) in posts.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(limits::POST_SPACING_MS)).await;
        }
        match publisher.publish(channel_id, post).await {
            Ok(()) => sent += 1,
            Err(e) => log::error!("Failed to post \"{}\" to {}: {}", post.title, channel_id, e),
        }
    }
    sent
}

// ═══════════════════════════════════════════════════════════════════
// NEWS
// ═══════════════════════════════════════════════════════════════════

pub fn news_posts(items: &[(&'static Source, FeedItem)]) -> Vec<Post> {
    items.iter().map(|(source, item)| Post::news(source, item)).collect()
}

/// One pass for `category`. Returns the number of posts sent.
pub async fn news_pass<P: Publisher>(app: &App, publisher: &P, category: Category) -> Result<usize, PassError> {
    let (cfg, sources) = {
        let news = app.news.lock().await;
        (news.get(category), news.enabled_sources(category))
    };
    let Some(channel_id) = cfg.channel_id.filter(|_| cfg.enabled) else {
        log::debug!("{}: disabled or no channel, skipping", category.key());
        return Ok(0);
    };
    if sources.is_empty() {
        log::info!("{}: every source disabled", category.key());
        return Ok(0);
    }

    if category == Category::Cve {
        return cve_pass(app, publisher, channel_id, &sources).await;
    }

    post_new_items(app, publisher, category, &cfg, channel_id, &sources).await
}

/// Fetches `sources` through the category's fetcher and posts what is new.
pub async fn post_new_items<P: Publisher>(
    app: &App,
    publisher: &P,
    category: Category,
    cfg: &CategoryConfig,
    channel_id: u64,
    sources: &[&'static Source],
) -> Result<usize, PassError> {
    let Some(fetcher) = app.fetcher(category) else { return Ok(0) };
    fetcher.set_concurrency_limit(cfg.concurrency_limit).await;
    let items = fetcher.fetch_many(sources, cfg.use_etag_cache).await;
    log::info!("{}: {} new item(s) from {} source(s)", category.key(), items.len(), sources.len());
    Ok(publish_spaced(publisher, channel_id, &news_posts(&items)).await)
}

/// Unposted CVEs from `sources`; each id is recorded once its post succeeds.
pub async fn cve_pass<P: Publisher>(
    app: &App,
    publisher: &P,
    channel_id: u64,
    sources: &[&'static Source],
) -> Result<usize, PassError> {
    let items = app.cve.fetch_all(sources).await;
    let fresh = app.cve_state.get().await.unposted(items);
    let mut sent = 0;
    for (i, item) in fresh.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(limits::POST_SPACING_MS)).await;
        }
        match publisher.publish(channel_id, &item.post()).await {
            Ok(()) => {
                app.cve_state.update(|s| s.record(&item.id)).await?;
                sent += 1;
            }
            Err(e) => log::error!("Failed to post {}: {}", item.id, e),
        }
    }
    app.cve_state.update(|s| s.last_check = Some(Utc::now())).await?;
    Ok(sent)
}

pub async fn news_loop<P: Publisher>(app: Arc<App>, publisher: Arc<P>, category: Category) {
    let offset = app.news.lock().await.get(category).minute_offset;
    log::info!("{}: poster starts in {} minute(s)", category.key(), offset);
    tokio::time::sleep(Duration::from_secs(u64::from(offset) * 60)).await;
    loop {
        match news_pass(&app, publisher.as_ref(), category).await {
            Ok(n) if n > 0 => log::info!("{}: posted {} item(s)", category.key(), n),
            Ok(_) => {}
            Err(e) => log::error!("{}: pass failed: {}", category.key(), e),
        }
        let hours = app.news.lock().await.get(category).interval_hours.max(1);
        tokio::time::sleep(Duration::from_secs(u64::from(hours) * 3600)).await;
    }
}

// ═══════════════════════════════════════════════════════════════════
// COMICS
// ═══════════════════════════════════════════════════════════════════

/// Posts the latest XKCD when it is newer than the last one posted.
pub async fn xkcd_pass<P: Publisher>(app: &App, publisher: &P, force: bool) -> Result<Option<u32>, PassError> {
    let state = app.xkcd_state.get().await;
    if !state.enabled && !force {
        return Ok(None);
    }
    let latest = app.xkcd.latest().await?;
    let channel = if force { state.channel_id } else { state.due(latest.num) };
    let Some(channel_id) = channel else {
        if latest.num > state.last_posted {
            log::info!("XKCD #{} is new but no channel is configured", latest.num);
        }
        return Ok(None);
    };
    publisher.publish(channel_id, &latest.post()).await?;
    app.xkcd_state.update(|s| s.last_posted = s.last_posted.max(latest.num)).await?;
    log::info!("Posted XKCD #{} to {}", latest.num, channel_id);
    Ok(Some(latest.num))
}

pub async fn xkcd_loop<P: Publisher>(app: Arc<App>, publisher: Arc<P>) {
    tokio::time::sleep(XKCD_FIRST_POLL).await;
    let mut tick = tokio::time::interval(Duration::from_secs(app.settings.xkcd_poll_minutes * 60));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tick.tick().await;
        if let Err(e) = xkcd_pass(&app, publisher.as_ref(), false).await {
            log::error!("XKCD poll failed: {}", e);
        }
    }
}

pub async fn daily_comic_pass<P: Publisher>(app: &App, publisher: &P) -> Result<bool, PassError> {
    let state = app.comic_state.get().await;
    let Some(channel_id) = state.channel_id.filter(|_| state.enabled) else {
        return Ok(false);
    };
    let source = ComicSource::resolve(&state.source).unwrap_or_else(|e| {
        log::warn!("Daily comic: {} (using random)", e);
        ComicSource::random()
    });
    let strip = app.comics.fetch(source).await?;
    publisher.publish(channel_id, &strip.daily_post()).await?;
    app.comic_state.update(|s| s.last_posted = Some(Utc::now())).await?;
    log::info!("Posted daily {} comic to {}", source, channel_id);
    Ok(true)
}

pub async fn daily_comic_loop<P: Publisher>(app: Arc<App>, publisher: Arc<P>) {
    loop {
        let now = Utc::now();
        let wait = (next_daily_run(now) - now).to_std().unwrap_or(DAY);
        tokio::time::sleep(wait).await;
        if let Err(e) = daily_comic_pass(&app, publisher.as_ref()).await {
            log::error!("Daily comic failed: {}", e);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// SOLAR
// ═══════════════════════════════════════════════════════════════════

/// Time until the next 12-hour solar update is due.
pub fn solar_wait(last_posted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    let Some(last) = last_posted else { return Duration::ZERO };
    let due = last + chrono::Duration::hours(SOLAR_PERIOD_HOURS);
    (due - now).to_std().unwrap_or(Duration::ZERO)
}

pub async fn solar_pass<P: Publisher>(app: &App, publisher: &P, force: bool) -> Result<bool, PassError> {
    let state = app.solar_state.get().await;
    let Some(channel_id) = state.channel_id.filter(|_| state.enabled || force) else {
        return Ok(false);
    };
    let report = app.noaa.report().await?;
    publisher.publish(channel_id, &report.update_post()).await?;
    app.solar_state.update(|s| s.last_posted = Some(Utc::now())).await?;
    log::info!("Posted solar update to {}", channel_id);
    Ok(true)
}

pub async fn solar_loop<P: Publisher>(app: Arc<App>, publisher: Arc<P>) {
    loop {
        let last = app.solar_state.get().await.last_posted;
        tokio::time::sleep(solar_wait(last, Utc::now())).await;
        match solar_pass(&app, publisher.as_ref(), false).await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(Duration::from_secs(SOLAR_PERIOD_HOURS as u64 * 3600)).await,
            Err(e) => {
                log::error!("Solar update failed: {}", e);
                tokio::time::sleep(Duration::from_secs(SOLAR_PERIOD_HOURS as u64 * 3600)).await;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════

pub async fn event_reminder_pass<P: Publisher>(app: &App, publisher: &P, today: NaiveDate) -> usize {
    let calendar = app.events.read().await;
    let due = calendar.reminders_due(today);
    let Some(channel_id) = app.settings.events_reminder_channel else {
        for u in &due {
            log::info!("Reminder: {} in {} days (no reminder channel)", u.event.name, u.days_until);
        }
        return 0;
    };
    let posts: Vec<Post> = due.iter().map(events::reminder_post).collect();
    publish_spaced(publisher, channel_id, &posts).await
}

pub async fn event_reminder_loop<P: Publisher>(app: Arc<App>, publisher: Arc<P>) {
    let mut tick = tokio::time::interval(DAY);
    loop {
        tick.tick().await;
        let today = Utc::now().date_naive();
        let n = event_reminder_pass(&app, publisher.as_ref(), today).await;
        if n > 0 {
            log::info!("Posted {} event reminder(s)", n);
        }
    }
}

/// Starts every background poster.
pub fn spawn_all<P: Publisher>(app: Arc<App>, publisher: Arc<P>) -> Vec<JoinHandle<()>> {
    let mut handles: Vec<JoinHandle<()>> = Category::ALL
        .into_iter()
        .map(|category| tokio::spawn(news_loop(app.clone(), publisher.clone(), category)))
        .collect();
    handles.push(tokio::spawn(xkcd_loop(app.clone(), publisher.clone())));
    handles.push(tokio::spawn(daily_comic_loop(app.clone(), publisher.clone())));
    handles.push(tokio::spawn(solar_loop(app.clone(), publisher.clone())));
    handles.push(tokio::spawn(event_reminder_loop(app, publisher)));
    log::info!("Started {} background posters", handles.len());
    handles
}
