//! Discord command adapters. Every command answers to `!name` and `/name`.

pub mod admin;
pub mod comics;
pub mod cve;
pub mod events;
pub mod fun;
pub mod help;
pub mod news;
pub mod radio;

use crate::bot::{Context, Data, Error};
use crate::consts::Category;
use crate::post::Post;
use poise::serenity_prelude as serenity;
use std::time::Duration;

const PAGE_TIMEOUT: Duration = Duration::from_secs(180);

pub fn list() -> Vec<poise::Command<Data, Error>> {
    vec![
        news::news(),
        news::cybersecurity(),
        news::tech(),
        news::gaming(),
        news::applegoogle(),
        news::generalnews(),
        news::uslegislation(),
        news::eulegislation(),
        news::uklegislation(),
        comics::xkcd(),
        comics::xkcd_latest(),
        comics::xkcd_random(),
        comics::xkcd_search(),
        comics::xkcd_set_channel(),
        comics::xkcd_enable(),
        comics::xkcd_disable(),
        comics::xkcd_post_now(),
        comics::comic(),
        comics::comic_trivia(),
        comics::daily_comic(),
        comics::comic_set_channel(),
        comics::comic_enable(),
        comics::comic_disable(),
        cve::cve(),
        cve::cve_set_channel(),
        cve::cve_enable(),
        cve::cve_disable(),
        cve::cve_status(),
        radio::hamradio(),
        radio::frequency(),
        radio::solar(),
        radio::propagation(),
        radio::solar_set_channel(),
        radio::solar_enable(),
        radio::solar_disable(),
        radio::solar_status(),
        radio::aviation(),
        radio::squawk(),
        events::events(),
        events::allevents(),
        events::nextevent(),
        events::searchevent(),
        events::eventweeks(),
        fun::techquote(),
        fun::quote_linus(),
        fun::quote_stallman(),
        fun::quote_hopper(),
        fun::quote_shevinsky(),
        fun::quote_may(),
        fun::quote_list(),
        fun::fortune(),
        fun::patchgremlin(),
        fun::manpage(),
        help::help(),
        admin::sync(),
        admin::reload_events(),
    ]
}

/// Slash-command choice mirroring [`Category`].
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum CategoryChoice {
    #[name = "cybersecurity"]
    Cybersecurity,
    #[name = "tech"]
    Tech,
    #[name = "gaming"]
    Gaming,
    #[name = "apple_google"]
    AppleGoogle,
    #[name = "cve"]
    Cve,
    #[name = "us_legislation"]
    UsLegislation,
    #[name = "eu_legislation"]
    EuLegislation,
    #[name = "uk_legislation"]
    UkLegislation,
    #[name = "general_news"]
    GeneralNews,
}

impl From<CategoryChoice> for Category {
    fn from(c: CategoryChoice) -> Self {
        match c {
            CategoryChoice::Cybersecurity => Category::Cybersecurity,
            CategoryChoice::Tech => Category::Tech,
            CategoryChoice::Gaming => Category::Gaming,
            CategoryChoice::AppleGoogle => Category::AppleGoogle,
            CategoryChoice::Cve => Category::Cve,
            CategoryChoice::UsLegislation => Category::UsLegislation,
            CategoryChoice::EuLegislation => Category::EuLegislation,
            CategoryChoice::UkLegislation => Category::UkLegislation,
            CategoryChoice::GeneralNews => Category::GeneralNews,
        }
    }
}

pub async fn reply(ctx: Context<'_>, post: &Post) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(post.to_embed())).await?;
    Ok(())
}

/// Embed pages with previous/next buttons, same flow as poise's text paginator.
pub async fn paginate(ctx: Context<'_>, pages: &[Post]) -> Result<(), Error> {
    let Some(first) = pages.first() else { return Ok(()) };
    if pages.len() == 1 {
        return reply(ctx, first).await;
    }

    let ctx_id = ctx.id();
    let prev_id = format!("{ctx_id}prev");
    let next_id = format!("{ctx_id}next");
    let buttons = serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(&prev_id).emoji('◀'),
        serenity::CreateButton::new(&next_id).emoji('▶'),
    ]);
    ctx.send(poise::CreateReply::default().embed(first.to_embed()).components(vec![buttons]))
        .await?;

    let mut current = 0;
    while let Some(press) = serenity::collector::ComponentInteractionCollector::new(ctx)
        .filter(move |press| press.data.custom_id.starts_with(&ctx_id.to_string()))
        .timeout(PAGE_TIMEOUT)
        .await
    {
        if press.data.custom_id == next_id {
            current = (current + 1) % pages.len();
        } else if press.data.custom_id == prev_id {
            current = current.checked_sub(1).unwrap_or(pages.len() - 1);
        } else {
            continue;
        }
        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new().embed(pages[current].to_embed()),
                ),
            )
            .await?;
    }
    Ok(())
}

/// Guild owner, Administrator or Manage Server.
pub async fn is_admin(ctx: Context<'_>) -> bool {
    let Some(member) = ctx.author_member().await else { return false };
    let from_interaction = member.permissions.is_some_and(|p| p.administrator() || p.manage_guild());
    let from_cache = ctx.guild().is_some_and(|guild| {
        let perms = guild.member_permissions(&member);
        guild.owner_id == member.user.id || perms.administrator() || perms.manage_guild()
    });
    from_interaction || from_cache
}

/// Admins always; otherwise a role approved for `category`.
pub async fn may_configure(ctx: Context<'_>, category: Category) -> bool {
    let admin = is_admin(ctx).await;
    let roles: Vec<u64> = match ctx.author_member().await {
        Some(member) => member.roles.iter().map(|r| r.get()).collect(),
        None => Vec::new(),
    };
    ctx.data().news.lock().await.may_configure(category, admin, &roles)
}

pub async fn deny(ctx: Context<'_>, category: Category) -> Result<(), Error> {
    ctx.say(format!(
        "❌ You need Administrator, Manage Server or an approved role to configure {}.",
        category
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_choice_maps_to_its_category() {
        let choices = [
            CategoryChoice::Cybersecurity,
            CategoryChoice::Tech,
            CategoryChoice::Gaming,
            CategoryChoice::AppleGoogle,
            CategoryChoice::Cve,
            CategoryChoice::UsLegislation,
            CategoryChoice::EuLegislation,
            CategoryChoice::UkLegislation,
            CategoryChoice::GeneralNews,
        ];
        let mapped: Vec<Category> = choices.into_iter().map(Category::from).collect();
        assert_eq!(mapped, Category::ALL.to_vec());
    }

    #[test]
    fn command_names_are_unique() {
        let commands = list();
        let mut names: Vec<_> = commands.iter().map(|c| c.name.clone()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
