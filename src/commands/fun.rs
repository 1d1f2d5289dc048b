//! Quotes, fortunes, the patch gremlin and man pages.

use super::{paginate, reply};
use crate::bot::{Context, Error};
use crate::fun as cookies;
use crate::quotes;

async fn quote_from(ctx: Context<'_>, alias: &str) -> Result<(), Error> {
    match quotes::resolve_author(alias).and_then(quotes::random_by) {
        Some(quote) => reply(ctx, &quote.post()).await,
        None => {
            ctx.say("❌ No quotes found for that author.").await?;
            Ok(())
        }
    }
}

/// A random tech quote
#[poise::command(slash_command, prefix_command)]
pub async fn techquote(ctx: Context<'_>) -> Result<(), Error> {
    match quotes::random() {
        Some(quote) => reply(ctx, &quote.post()).await,
        None => {
            ctx.say("❌ No quotes available.").await?;
            Ok(())
        }
    }
}

/// A Linus Torvalds quote
#[poise::command(slash_command, prefix_command)]
pub async fn quote_linus(ctx: Context<'_>) -> Result<(), Error> {
    quote_from(ctx, "linus").await
}

/// A Richard Stallman quote
#[poise::command(slash_command, prefix_command)]
pub async fn quote_stallman(ctx: Context<'_>) -> Result<(), Error> {
    quote_from(ctx, "stallman").await
}

/// A Grace Hopper quote
#[poise::command(slash_command, prefix_command)]
pub async fn quote_hopper(ctx: Context<'_>) -> Result<(), Error> {
    quote_from(ctx, "hopper").await
}

/// An Elissa Shevinsky quote
#[poise::command(slash_command, prefix_command)]
pub async fn quote_shevinsky(ctx: Context<'_>) -> Result<(), Error> {
    quote_from(ctx, "shevinsky").await
}

/// A Timothy C. May quote
#[poise::command(slash_command, prefix_command)]
pub async fn quote_may(ctx: Context<'_>) -> Result<(), Error> {
    quote_from(ctx, "may").await
}

/// Every quoted author
#[poise::command(slash_command, prefix_command)]
pub async fn quote_list(ctx: Context<'_>) -> Result<(), Error> {
    paginate(ctx, &quotes::author_pages()).await
}

/// A cyber fortune cookie
#[poise::command(slash_command, prefix_command)]
pub async fn fortune(ctx: Context<'_>) -> Result<(), Error> {
    reply(ctx, &cookies::random_fortune()).await
}

/// A chaotic reminder about updates
#[poise::command(slash_command, prefix_command)]
pub async fn patchgremlin(ctx: Context<'_>) -> Result<(), Error> {
    reply(ctx, &cookies::random_gremlin()).await
}

/// A random Linux command
#[poise::command(slash_command, prefix_command)]
pub async fn manpage(ctx: Context<'_>) -> Result<(), Error> {
    reply(ctx, &cookies::random_manpage()).await
}
