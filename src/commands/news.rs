//! `/news` configuration group and the per-category fetch commands.

use super::{deny, may_configure, reply, CategoryChoice};
use crate::bot::{Context, Error};
use crate::consts::{find_source, Category, Source};
use crate::news::{CategoryStatus, NewsError};
use crate::post::{Post, DEFAULT_COLOR};
use poise::serenity_prelude as serenity;

// ═══════════════════════════════════════════════════════════════════
// EMBEDS
// ═══════════════════════════════════════════════════════════════════

fn channel_text(id: Option<u64>) -> String {
    id.map(|id| format!("<#{id}>")).unwrap_or_else(|| "Not set".into())
}

pub fn status_post(status: &CategoryStatus) -> Post {
    let roles = if status.approved_roles.is_empty() {
        "None (Admins only)".to_string()
    } else {
        status.approved_roles.iter().map(|r| format!("<@&{r}>")).collect::<Vec<_>>().join(", ")
    };
    let mut channel = channel_text(status.channel_id);
    if status.channel_from_env {
        channel.push_str(" (env)");
    }
    Post::new(format!("📰 {} News Configuration", status.category))
        .color(DEFAULT_COLOR)
        .field("Status", if status.enabled { "🟢 Enabled" } else { "🔴 Disabled" }, true)
        .field("Channel", channel, true)
        .field("Interval", format!("{} hours (+{} min)", status.interval_hours, status.minute_offset), true)
        .field("Sources", format!("{}/{} enabled", status.enabled_sources, status.total_sources), true)
        .field("Approved Roles", roles, false)
}

pub fn status_all_post(all: &[CategoryStatus]) -> Post {
    let mut post = Post::new("📰 News Configuration Overview").color(DEFAULT_COLOR);
    for s in all {
        let state = if s.enabled {
            "🟢 Enabled"
        } else if s.ready_to_enable() {
            "🟡 Ready to enable"
        } else {
            "🔴 Disabled"
        };
        post = post.field(
            s.category.to_string(),
            format!(
                "{state}\n{} • every {}h\n{}/{} sources",
                channel_text(s.channel_id),
                s.interval_hours,
                s.enabled_sources,
                s.total_sources
            ),
            true,
        );
    }
    post.footer("Use /news status <category> for details")
}

pub fn sources_post(category: Category, sources: &[(&'static Source, bool)]) -> Post {
    let lines: Vec<String> = sources
        .iter()
        .map(|(s, on)| format!("{} **{}** `{}`", if *on { "🟢" } else { "🔴" }, s.name, s.key))
        .collect();
    Post::new(format!("📋 {category} Sources"))
        .description(format!("Total: {} sources\n\n{}", sources.len(), lines.join("\n")))
        .color(DEFAULT_COLOR)
        .footer(format!("Toggle with /news toggle_source {} <key>", category.key()))
}

// ═══════════════════════════════════════════════════════════════════
// FETCH
// ═══════════════════════════════════════════════════════════════════

async fn fetch_latest(ctx: Context<'_>, category: Category, source: Option<String>) -> Result<(), Error> {
    let Some(key) = source else {
        let list = ctx.data().news.lock().await.list_sources(category);
        return reply(ctx, &sources_post(category, &list)).await;
    };
    let Some(source) = find_source(category, &key) else {
        ctx.say(format!(
            "❌ Unknown source. Use `/news list_sources {}` to see available sources.",
            category.key()
        ))
        .await?;
        return Ok(());
    };
    let Some(fetcher) = ctx.data().fetcher(category) else { return Ok(()) };

    ctx.defer().await?;
    match fetcher.peek_latest(source).await {
        Ok(Some(item)) => reply(ctx, &Post::news(source, &item)).await,
        Ok(None) => {
            ctx.say("❌ No recent news from this source.").await?;
            Ok(())
        }
        Err(e) => {
            log::warn!("Manual fetch of {} failed: {}", source.name, e);
            ctx.say("❌ Failed to fetch news from this source.").await?;
            Ok(())
        }
    }
}

/// Latest cybersecurity headline from one source
#[poise::command(slash_command, prefix_command)]
pub async fn cybersecurity(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::Cybersecurity, source).await
}

/// Latest tech headline from one source
#[poise::command(slash_command, prefix_command)]
pub async fn tech(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::Tech, source).await
}

/// Latest gaming headline from one source
#[poise::command(slash_command, prefix_command)]
pub async fn gaming(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::Gaming, source).await
}

/// Latest Apple/Google headline from one source
#[poise::command(slash_command, prefix_command)]
pub async fn applegoogle(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::AppleGoogle, source).await
}

/// Latest general news headline from one source
#[poise::command(slash_command, prefix_command)]
pub async fn generalnews(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::GeneralNews, source).await
}

/// Latest US legislation update
#[poise::command(slash_command, prefix_command)]
pub async fn uslegislation(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::UsLegislation, source).await
}

/// Latest EU legislation update
#[poise::command(slash_command, prefix_command)]
pub async fn eulegislation(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::EuLegislation, source).await
}

/// Latest UK legislation update
#[poise::command(slash_command, prefix_command)]
pub async fn uklegislation(ctx: Context<'_>, #[description = "Source key"] source: Option<String>) -> Result<(), Error> {
    fetch_latest(ctx, Category::UkLegislation, source).await
}

// ═══════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════

/// Answers a configuration result; validation errors go back to the user.
async fn confirm(ctx: Context<'_>, result: Result<String, NewsError>) -> Result<(), Error> {
    match result {
        Ok(msg) => ctx.say(msg).await?,
        Err(NewsError::State(e)) => return Err(e.into()),
        Err(e) => ctx.say(format!("❌ {e}")).await?,
    };
    Ok(())
}

/// Configure automatic news posting
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("set_channel", "enable", "disable", "set_interval", "toggle_source", "add_role", "remove_role", "status", "list_sources"),
    subcommand_required
)]
pub async fn news(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Set the channel for a news category
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn set_channel(
    ctx: Context<'_>,
    #[description = "News category"] category: CategoryChoice,
    #[description = "Channel to post in"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let category = Category::from(category);
    if !may_configure(ctx, category).await {
        return deny(ctx, category).await;
    }
    let result = ctx.data().news.lock().await.set_channel(category, channel.id.get()).await;
    confirm(ctx, result.map(|_| format!("✅ {category} news will be posted in <#{}>", channel.id))).await
}

/// Enable auto-posting for a news category
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn enable(ctx: Context<'_>, #[description = "News category"] category: CategoryChoice) -> Result<(), Error> {
    let category = Category::from(category);
    if !may_configure(ctx, category).await {
        return deny(ctx, category).await;
    }
    let result = ctx.data().news.lock().await.enable(category).await;
    confirm(ctx, result.map(|_| format!("✅ {category} news enabled"))).await
}

/// Disable auto-posting for a news category
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn disable(ctx: Context<'_>, #[description = "News category"] category: CategoryChoice) -> Result<(), Error> {
    let category = Category::from(category);
    if !may_configure(ctx, category).await {
        return deny(ctx, category).await;
    }
    let result = ctx.data().news.lock().await.disable(category).await;
    confirm(ctx, result.map(|_| format!("🔴 {category} news disabled"))).await
}

/// Set the posting interval (1-24 hours)
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn set_interval(
    ctx: Context<'_>,
    #[description = "News category"] category: CategoryChoice,
    #[description = "Hours between posts"] hours: u32,
) -> Result<(), Error> {
    let category = Category::from(category);
    if !may_configure(ctx, category).await {
        return deny(ctx, category).await;
    }
    let result = ctx.data().news.lock().await.set_interval(category, hours).await;
    confirm(ctx, result.map(|_| format!("⏱️ {category} news every {hours} hour(s)"))).await
}

/// Enable or disable one source
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn toggle_source(
    ctx: Context<'_>,
    #[description = "News category"] category: CategoryChoice,
    #[description = "Source key (see list_sources)"] source: String,
) -> Result<(), Error> {
    let category = Category::from(category);
    if !may_configure(ctx, category).await {
        return deny(ctx, category).await;
    }
    let result = ctx.data().news.lock().await.toggle_source(category, &source).await;
    confirm(
        ctx,
        result.map(|on| {
            let state = if on { "🟢 enabled" } else { "🔴 disabled" };
            format!("Source `{source}` is now {state} for {category}")
        }),
    )
    .await
}

/// Let a role manage a news category (admin only)
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn add_role(
    ctx: Context<'_>,
    #[description = "News category"] category: CategoryChoice,
    #[description = "Role to approve"] role: serenity::Role,
) -> Result<(), Error> {
    let category = Category::from(category);
    if !super::is_admin(ctx).await {
        ctx.say(crate::bot::NO_PERMISSION).await?;
        return Ok(());
    }
    let result = ctx.data().news.lock().await.add_role(category, role.id.get()).await;
    confirm(ctx, result.map(|_| format!("✅ {} can now manage {category}", role.name))).await
}

/// Remove an approved role (admin only)
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn remove_role(
    ctx: Context<'_>,
    #[description = "News category"] category: CategoryChoice,
    #[description = "Role to remove"] role: serenity::Role,
) -> Result<(), Error> {
    let category = Category::from(category);
    if !super::is_admin(ctx).await {
        ctx.say(crate::bot::NO_PERMISSION).await?;
        return Ok(());
    }
    let result = ctx.data().news.lock().await.remove_role(category, role.id.get()).await;
    confirm(ctx, result.map(|_| format!("🗑️ {} removed from {category}", role.name))).await
}

/// Configuration of one category, or all of them
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn status(ctx: Context<'_>, #[description = "News category"] category: Option<CategoryChoice>) -> Result<(), Error> {
    let post = {
        let news = ctx.data().news.lock().await;
        match category {
            Some(c) => status_post(&news.status(c.into())),
            None => status_all_post(&news.status_all()),
        }
    };
    ctx.send(poise::CreateReply::default().embed(post.to_embed()).ephemeral(true)).await?;
    Ok(())
}

/// List the sources of a category and whether each is on
#[poise::command(slash_command, prefix_command)]
pub async fn list_sources(ctx: Context<'_>, #[description = "News category"] category: CategoryChoice) -> Result<(), Error> {
    let category = Category::from(category);
    let list = ctx.data().news.lock().await.list_sources(category);
    ctx.send(poise::CreateReply::default().embed(sources_post(category, &list).to_embed()).ephemeral(true))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::sources_by_category;

    fn status(enabled: bool, channel: Option<u64>) -> CategoryStatus {
        CategoryStatus {
            category: Category::Tech,
            enabled,
            channel_id: channel,
            channel_from_env: false,
            interval_hours: 4,
            minute_offset: 30,
            enabled_sources: 3,
            total_sources: 4,
            approved_roles: Vec::new(),
        }
    }

    #[test]
    fn status_lists_admin_only_when_no_roles() {
        let post = status_post(&status(true, Some(9)));
        assert_eq!(post.fields[0].value, "🟢 Enabled");
        assert_eq!(post.fields[1].value, "<#9>");
        assert_eq!(post.fields[3].value, "3/4 enabled");
        assert_eq!(post.fields[4].value, "None (Admins only)");
    }

    #[test]
    fn overview_marks_ready_categories() {
        let post = status_all_post(&[status(false, Some(1)), status(false, None)]);
        assert!(post.fields[0].value.starts_with("🟡 Ready to enable"));
        assert!(post.fields[1].value.starts_with("🔴 Disabled\nNot set"));
    }

    #[test]
    fn source_list_shows_state_and_key() {
        let list: Vec<_> = sources_by_category(Category::Tech).map(|s| (s, s.key != "verge")).collect();
        let post = sources_post(Category::Tech, &list);
        let body = post.description.unwrap();
        assert!(body.starts_with(&format!("Total: {} sources", list.len())));
        let first = list[0].0;
        assert!(body.contains(&format!("**{}** `{}`", first.name, first.key)));
    }
}
