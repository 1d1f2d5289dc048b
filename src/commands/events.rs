//! Conference and ham radio event lookups.

use super::{paginate, reply};
use crate::bot::{Context, Error};
use crate::events::{self, TypeFilter};
use chrono::Utc;

const DEFAULT_DAYS: i64 = 30;
const BROWSE_DAYS: i64 = 365;
const MAX_WEEKS: u32 = 12;

/// Upcoming events, optionally filtered by type
#[poise::command(slash_command, prefix_command)]
pub async fn events(
    ctx: Context<'_>,
    #[description = "Days ahead (default 30)"] days: Option<u32>,
    #[description = "cybersecurity, ham or any event type"] event_type: Option<String>,
) -> Result<(), Error> {
    let days = days.map(i64::from).unwrap_or(DEFAULT_DAYS);
    let filter = TypeFilter::parse(event_type.as_deref());
    let today = Utc::now().date_naive();
    let post = {
        let calendar = ctx.data().events.read().await;
        let list = calendar.upcoming_of(today, days, &filter);
        (!list.is_empty()).then(|| events::upcoming_post(&list, days, &filter))
    };
    match post {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say(format!("📅 No upcoming {} events found in the next {days} days.", filter.label()))
                .await?;
            Ok(())
        }
    }
}

/// Browse every upcoming event, five per page
#[poise::command(slash_command, prefix_command)]
pub async fn allevents(
    ctx: Context<'_>,
    #[description = "cybersecurity, ham or any event type"] event_type: Option<String>,
) -> Result<(), Error> {
    let filter = TypeFilter::parse(event_type.as_deref());
    let today = Utc::now().date_naive();
    let pages = {
        let calendar = ctx.data().events.read().await;
        events::pages(&calendar.upcoming_of(today, BROWSE_DAYS, &filter), &filter)
    };
    if pages.is_empty() {
        ctx.say(format!("📅 No upcoming {} events found.", filter.label())).await?;
        return Ok(());
    }
    paginate(ctx, &pages).await
}

/// The next event on the calendar
#[poise::command(slash_command, prefix_command)]
pub async fn nextevent(ctx: Context<'_>) -> Result<(), Error> {
    let today = Utc::now().date_naive();
    let post = {
        let calendar = ctx.data().events.read().await;
        calendar.next(today).map(|u| events::next_post(&u))
    };
    match post {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say("📅 No upcoming events found.").await?;
            Ok(())
        }
    }
}

/// Search events by name, city, state or type
#[poise::command(slash_command, prefix_command)]
pub async fn searchevent(ctx: Context<'_>, #[rest] #[description = "Name or location"] query: String) -> Result<(), Error> {
    let today = Utc::now().date_naive();
    let post = {
        let calendar = ctx.data().events.read().await;
        let matches = calendar.search(today, &query);
        (!matches.is_empty()).then(|| events::search_post(&query, &matches))
    };
    match post {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say(format!("🔍 No events found matching '{query}'")).await?;
            Ok(())
        }
    }
}

/// Events grouped by the week they start in
#[poise::command(slash_command, prefix_command)]
pub async fn eventweeks(ctx: Context<'_>, #[description = "Weeks ahead (default 4, max 12)"] weeks: Option<u32>) -> Result<(), Error> {
    let weeks = i64::from(weeks.unwrap_or(4).clamp(1, MAX_WEEKS));
    let today = Utc::now().date_naive();
    let post = {
        let calendar = ctx.data().events.read().await;
        let groups = calendar.by_week(today, weeks);
        (!groups.is_empty()).then(|| events::weeks_post(&groups, weeks))
    };
    match post {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say(format!("📅 No events in the next {weeks} week(s).")).await?;
            Ok(())
        }
    }
}
