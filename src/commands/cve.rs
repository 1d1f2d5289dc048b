//! `/cve` lookups and the CVE auto-poster switches. Channel, enabled flag
//! and interval live in the news configuration under the `cve` category.

use super::reply;
use crate::bot::{Context, Error};
use crate::consts::{find_source, limits, sources_by_category, Category};
use crate::cve::CveState;
use crate::news::{CategoryStatus, NewsError};
use crate::post::Post;
use poise::serenity_prelude as serenity;
use std::time::Duration;

const STATUS_COLOR: u32 = 0x1C4E80;

pub fn status_post(status: &CategoryStatus, state: &CveState) -> Post {
    let channel = status.channel_id.map(|id| format!("<#{id}>")).unwrap_or_else(|| "Not set".into());
    let last = state
        .last_check
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "Never".into());
    Post::new("🛡️ CVE Auto-Poster Status")
        .color(STATUS_COLOR)
        .field("Status", if status.enabled { "🟢 Enabled" } else { "🔴 Disabled" }, true)
        .field("Channel", channel, true)
        .field("Interval", format!("{} hours", status.interval_hours), true)
        .field("Tracked CVEs", state.posted_cves.len().to_string(), true)
        .field("Last Check", last, true)
}

/// Recent CVEs from NVD and Ubuntu
#[poise::command(slash_command, prefix_command)]
pub async fn cve(ctx: Context<'_>, #[description = "nvd or ubuntu (blank for both)"] source: Option<String>) -> Result<(), Error> {
    let sources: Vec<_> = match source.as_deref() {
        None => sources_by_category(Category::Cve).collect(),
        Some(key) => match find_source(Category::Cve, key) {
            Some(s) => vec![s],
            None => {
                let keys: Vec<_> = sources_by_category(Category::Cve).map(|s| s.key).collect();
                ctx.say(format!("❌ Unknown source: `{key}`\nAvailable: {}", keys.join(", "))).await?;
                return Ok(());
            }
        },
    };

    ctx.defer().await?;
    let items = ctx.data().cve.fetch_all(&sources).await;
    if items.is_empty() {
        ctx.say("❌ No CVEs found. Sources may be temporarily unavailable.").await?;
        return Ok(());
    }
    for (i, item) in items.iter().take(limits::CVE_DISPLAY).enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(limits::POST_SPACING_MS)).await;
        }
        reply(ctx, &item.post()).await?;
    }
    Ok(())
}

/// Channel for automatic CVE alerts (defaults to this one)
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn cve_set_channel(ctx: Context<'_>, #[description = "Channel"] channel: Option<serenity::GuildChannel>) -> Result<(), Error> {
    let id = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    let result = ctx.data().news.lock().await.set_channel(Category::Cve, id.get()).await;
    match result {
        Ok(()) => ctx.say(format!("✅ CVE alerts will be posted to <#{id}>.\nUse `/cve_enable` to start automatic posting.")).await?,
        Err(NewsError::State(e)) => return Err(e.into()),
        Err(e) => ctx.say(format!("❌ {e}")).await?,
    };
    Ok(())
}

/// Turn CVE alerts on (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn cve_enable(ctx: Context<'_>) -> Result<(), Error> {
    let result = ctx.data().news.lock().await.enable(Category::Cve).await;
    match result {
        Ok(()) => ctx.say("✅ CVE auto-posting enabled").await?,
        Err(NewsError::NoChannel(_)) => ctx.say("❌ Please set a channel first with `/cve_set_channel`").await?,
        Err(e) => return Err(e.into()),
    };
    Ok(())
}

/// Turn CVE alerts off (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn cve_disable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().news.lock().await.disable(Category::Cve).await?;
    ctx.say("🔴 CVE auto-posting disabled").await?;
    Ok(())
}

/// CVE auto-poster status
#[poise::command(slash_command, prefix_command)]
pub async fn cve_status(ctx: Context<'_>) -> Result<(), Error> {
    let status = ctx.data().news.lock().await.status(Category::Cve);
    let state = ctx.data().cve_state.get().await;
    reply(ctx, &status_post(&status, &state)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts_tracked_ids() {
        let status = CategoryStatus {
            category: Category::Cve,
            enabled: false,
            channel_id: None,
            channel_from_env: false,
            interval_hours: 6,
            minute_offset: 0,
            enabled_sources: 2,
            total_sources: 2,
            approved_roles: Vec::new(),
        };
        let state = CveState { posted_cves: vec!["CVE-2024-1".into(), "CVE-2024-2".into()], last_check: None };
        let post = status_post(&status, &state);
        assert_eq!(post.fields[1].value, "Not set");
        assert_eq!(post.fields[2].value, "6 hours");
        assert_eq!(post.fields[3].value, "2");
        assert_eq!(post.fields[4].value, "Never");
    }
}
