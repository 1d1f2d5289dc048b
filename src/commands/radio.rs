//! HAM radio, solar weather and aviation commands.

use super::reply;
use crate::aviation;
use crate::bot::{Context, Error};
use crate::poster;
use crate::post::Post;
use crate::radio::{self, SolarState};
use poise::serenity_prelude as serenity;

pub fn solar_status_post(state: &SolarState) -> Post {
    let mut post = Post::new("📡 Solar Auto-Poster Status")
        .color(if state.enabled { 0x1E88E5 } else { 0x757575 })
        .field("Status", if state.enabled { "🟢 Enabled" } else { "🔴 Disabled" }, true)
        .field(
            "Channel",
            state.channel_id.map(|id| format!("<#{id}>")).unwrap_or_else(|| "Not set".into()),
            true,
        )
        .field("Frequency", "Every 12 hours", true);
    if let Some(last) = state.last_posted {
        post = post.field("Last Posted", format!("<t:{}:R>", last.timestamp()), true);
    }
    post
}

/// Random HAM radio trivia
#[poise::command(slash_command, prefix_command)]
pub async fn hamradio(ctx: Context<'_>) -> Result<(), Error> {
    reply(ctx, &radio::trivia_post()).await
}

/// Facts about a random amateur band
#[poise::command(slash_command, prefix_command)]
pub async fn frequency(ctx: Context<'_>) -> Result<(), Error> {
    match radio::band_post() {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say("📡 No band data available.").await?;
            Ok(())
        }
    }
}

async fn solar_report(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    match ctx.data().noaa.report().await {
        Ok(report) => reply(ctx, &report.post()).await,
        Err(e) => {
            log::warn!("NOAA report failed: {}", e);
            ctx.say("❌ Could not fetch solar data from NOAA. Try again later.").await?;
            Ok(())
        }
    }
}

/// Solar weather report and band predictions
#[poise::command(slash_command, prefix_command)]
pub async fn solar(ctx: Context<'_>) -> Result<(), Error> {
    solar_report(ctx).await
}

/// Current HF propagation (same as solar)
#[poise::command(slash_command, prefix_command)]
pub async fn propagation(ctx: Context<'_>) -> Result<(), Error> {
    solar_report(ctx).await
}

/// Channel for 12-hourly solar updates (defaults to this one)
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn solar_set_channel(ctx: Context<'_>, #[description = "Channel"] channel: Option<serenity::GuildChannel>) -> Result<(), Error> {
    let id = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    ctx.data().solar_state.update(|s| s.channel_id = Some(id.get())).await?;
    ctx.say(format!(
        "✅ Solar/propagation updates will be posted to <#{id}> every 12 hours.\nUse `/solar_enable` to start automatic posting."
    ))
    .await?;
    Ok(())
}

/// Turn solar updates on (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn solar_enable(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx
        .data()
        .solar_state
        .update(|s| {
            if s.channel_id.is_some() {
                s.enabled = true;
            }
            s.channel_id
        })
        .await?;
    let Some(id) = channel else {
        ctx.say("❌ Please set a channel first with `/solar_set_channel`").await?;
        return Ok(());
    };
    ctx.say(format!("✅ Solar/propagation auto-posting **enabled** in <#{id}>!\nUpdates will be posted every 12 hours."))
        .await?;
    if ctx.data().solar_state.get().await.last_posted.is_none() {
        if let Err(e) = poster::solar_pass(ctx.data(), ctx.http(), false).await {
            log::warn!("First solar update failed: {}", e);
        }
    }
    Ok(())
}

/// Turn solar updates off (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn solar_disable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().solar_state.update(|s| s.enabled = false).await?;
    ctx.say("✅ Solar/propagation auto-posting **disabled**.").await?;
    Ok(())
}

/// Solar auto-poster status
#[poise::command(slash_command, prefix_command)]
pub async fn solar_status(ctx: Context<'_>) -> Result<(), Error> {
    let state = ctx.data().solar_state.get().await;
    reply(ctx, &solar_status_post(&state)).await
}

/// Random aviation trivia
#[poise::command(slash_command, prefix_command)]
pub async fn aviation(ctx: Context<'_>) -> Result<(), Error> {
    reply(ctx, &aviation::trivia_post()).await
}

/// Look up a transponder code, or list the notable ones
#[poise::command(slash_command, prefix_command)]
pub async fn squawk(ctx: Context<'_>, #[description = "Four-digit code, e.g. 7700"] code: Option<String>) -> Result<(), Error> {
    let post = match code {
        Some(code) => aviation::squawk_post(code.trim()),
        None => aviation::squawk_table(),
    };
    reply(ctx, &post).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn status_shows_last_post_as_relative_time() {
        let idle = solar_status_post(&SolarState::default());
        assert_eq!(idle.color, 0x757575);
        assert_eq!(idle.fields.len(), 3);
        assert_eq!(idle.fields[1].value, "Not set");

        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let live = solar_status_post(&SolarState { last_posted: Some(at), channel_id: Some(5), enabled: true });
        assert_eq!(live.color, 0x1E88E5);
        assert_eq!(live.fields[3].value, format!("<t:{}:R>", at.timestamp()));
    }
}
