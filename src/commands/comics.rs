//! XKCD lookups, tech comics and the comic auto-poster switches.

use super::reply;
use crate::bot::{Context, Error};
use crate::comics::ComicSource;
use crate::poster;
use crate::post::Post;
use crate::xkcd::Comic;
use poise::serenity_prelude as serenity;

const EXPLAIN_COLOR: u32 = 0x2ECC71;

/// First match as the embed, the rest listed underneath.
pub fn search_post(keyword: &str, matches: &[Comic]) -> Option<Post> {
    let (first, rest) = matches.split_first()?;
    let mut post = first.post();
    if !rest.is_empty() {
        let others: Vec<String> = rest.iter().map(|c| format!("#{}: {}", c.num, c.title)).collect();
        post = post.field("Other matches", others.join("\n"), false);
    }
    Some(post.footer(format!("{} result(s) for '{}'", matches.len(), keyword)))
}

pub fn explain_post(num: u32, explanation: &str) -> Post {
    Post::new(format!("🤓 XKCD #{num} Explanation"))
        .description(explanation)
        .url(format!("https://www.explainxkcd.com/wiki/index.php/{num}"))
        .color(EXPLAIN_COLOR)
        .footer("Source: explainxkcd.com")
}

// ═══════════════════════════════════════════════════════════════════
// XKCD
// ═══════════════════════════════════════════════════════════════════

/// XKCD by number, or the latest
#[poise::command(slash_command, prefix_command)]
pub async fn xkcd(ctx: Context<'_>, #[description = "Comic number (blank for latest)"] number: Option<u32>) -> Result<(), Error> {
    ctx.defer().await?;
    match ctx.data().xkcd.fetch(number).await {
        Ok(Some(comic)) => reply(ctx, &comic.post()).await,
        Ok(None) => {
            ctx.say(format!("❌ Could not find XKCD comic #{}. Please check the number and try again.", number.unwrap_or(0)))
                .await?;
            Ok(())
        }
        Err(e) => {
            log::warn!("xkcd fetch failed: {}", e);
            ctx.say("❌ Could not fetch the latest XKCD comic. Please try again later.").await?;
            Ok(())
        }
    }
}

/// The latest XKCD
#[poise::command(slash_command, prefix_command)]
pub async fn xkcd_latest(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    match ctx.data().xkcd.latest().await {
        Ok(comic) => reply(ctx, &comic.post()).await,
        Err(e) => {
            log::warn!("xkcd latest failed: {}", e);
            ctx.say("❌ Could not fetch the latest XKCD comic. Please try again later.").await?;
            Ok(())
        }
    }
}

/// A random XKCD
#[poise::command(slash_command, prefix_command)]
pub async fn xkcd_random(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    match ctx.data().xkcd.random().await {
        Ok(comic) => reply(ctx, &comic.post()).await,
        Err(e) => {
            log::warn!("xkcd random failed: {}", e);
            ctx.say("❌ Could not fetch XKCD data. Please try again later.").await?;
            Ok(())
        }
    }
}

/// Search recent XKCD titles
#[poise::command(slash_command, prefix_command)]
pub async fn xkcd_search(ctx: Context<'_>, #[rest] #[description = "Keyword to look for"] keyword: String) -> Result<(), Error> {
    ctx.defer().await?;
    let matches = match ctx.data().xkcd.search(&keyword).await {
        Ok(m) => m,
        Err(e) => {
            log::warn!("xkcd search failed: {}", e);
            ctx.say("❌ Could not fetch XKCD data. Please try again later.").await?;
            return Ok(());
        }
    };
    match search_post(&keyword, &matches) {
        Some(post) => reply(ctx, &post).await,
        None => {
            ctx.say(format!("❌ No comics found matching '{keyword}' in the last 100 comics.")).await?;
            Ok(())
        }
    }
}

/// Channel for automatic XKCD posts
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn xkcd_set_channel(ctx: Context<'_>, #[description = "Channel"] channel: serenity::GuildChannel) -> Result<(), Error> {
    let id = channel.id.get();
    ctx.data().xkcd_state.update(|s| s.channel_id = Some(id)).await?;
    ctx.say(format!("✅ XKCD poster channel set to <#{id}>")).await?;
    Ok(())
}

/// Turn automatic XKCD posting on
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn xkcd_enable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().xkcd_state.update(|s| s.enabled = true).await?;
    ctx.say("✅ XKCD auto-posting enabled").await?;
    Ok(())
}

/// Turn automatic XKCD posting off
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn xkcd_disable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().xkcd_state.update(|s| s.enabled = false).await?;
    ctx.say("🔴 XKCD auto-posting disabled").await?;
    Ok(())
}

/// Post the latest XKCD to the configured channel now
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn xkcd_post_now(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    match poster::xkcd_pass(ctx.data(), ctx.http(), true).await? {
        Some(num) => ctx.say(format!("✅ Posted XKCD #{num}")).await?,
        None => ctx.say("❌ No XKCD channel configured. Use `!xkcd_set_channel` first.").await?,
    };
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════
// TECH COMICS
// ═══════════════════════════════════════════════════════════════════

/// A tech comic: xkcd, joyoftech, turnoff or random
#[poise::command(slash_command, prefix_command)]
pub async fn comic(ctx: Context<'_>, #[description = "xkcd, joyoftech, turnoff or random"] source: Option<String>) -> Result<(), Error> {
    let source = match ComicSource::resolve(source.as_deref().unwrap_or("random")) {
        Ok(s) => s,
        Err(e) => {
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };
    ctx.defer().await?;
    match ctx.data().comics.fetch(source).await {
        Ok(strip) => reply(ctx, &strip.post()).await,
        Err(e) => {
            log::warn!("{} comic failed: {}", source, e);
            ctx.say(format!("❌ Could not fetch comic from {source}. Try again later.")).await?;
            Ok(())
        }
    }
}

/// Explain an XKCD via explainxkcd
#[poise::command(slash_command, prefix_command)]
pub async fn comic_trivia(ctx: Context<'_>, #[description = "XKCD number"] comic_number: u32) -> Result<(), Error> {
    ctx.defer().await?;
    match ctx.data().comics.explain(comic_number).await {
        Ok(Some(text)) => reply(ctx, &explain_post(comic_number, &text)).await,
        Ok(None) => {
            ctx.say(format!("❌ Could not find explanation for XKCD #{comic_number}")).await?;
            Ok(())
        }
        Err(e) => {
            log::warn!("explainxkcd #{} failed: {}", comic_number, e);
            ctx.say(format!("❌ Could not find explanation for XKCD #{comic_number}")).await?;
            Ok(())
        }
    }
}

/// Today's comic, right here
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn daily_comic(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let source = ComicSource::random();
    match ctx.data().comics.fetch(source).await {
        Ok(strip) => reply(ctx, &strip.daily_post()).await,
        Err(e) => {
            log::warn!("daily comic from {} failed: {}", source, e);
            ctx.say(format!("❌ Could not fetch comic from {source}")).await?;
            Ok(())
        }
    }
}

/// Channel for the daily comic
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn comic_set_channel(ctx: Context<'_>, #[description = "Channel"] channel: serenity::GuildChannel) -> Result<(), Error> {
    let id = channel.id.get();
    ctx.data().comic_state.update(|s| s.channel_id = Some(id)).await?;
    ctx.say(format!("✅ Daily comic channel set to <#{id}>")).await?;
    Ok(())
}

/// Turn the daily comic on (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn comic_enable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().comic_state.update(|s| s.enabled = true).await?;
    ctx.say("✅ Enabled daily comic posting (9 AM UTC)").await?;
    Ok(())
}

/// Turn the daily comic off (owner)
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn comic_disable(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().comic_state.update(|s| s.enabled = false).await?;
    ctx.say("✅ Disabled daily comic posting").await?;
    Ok(())
}
