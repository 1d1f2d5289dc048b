use crate::bot::{Context, Error};

/// Re-register slash commands globally (owner)
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn sync(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("🔄 Syncing slash commands...").await?;
    let commands = &ctx.framework().options().commands;
    match poise::builtins::register_globally(ctx.serenity_context(), commands).await {
        Ok(()) => {
            log::info!("Manual sync: {} commands synced by {}", commands.len(), ctx.author().name);
            ctx.say(format!("✅ Successfully synced {} slash command(s)!", commands.len())).await?;
        }
        Err(e) => {
            log::error!("Manual sync failed: {}", e);
            ctx.say(format!("❌ Failed to sync commands: {e}")).await?;
        }
    }
    Ok(())
}

/// Re-read the event CSV files (owner)
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn reload_events(ctx: Context<'_>) -> Result<(), Error> {
    let n = ctx.data().reload_events().await;
    log::info!("Event calendar reloaded by {}: {} event(s)", ctx.author().name, n);
    ctx.say(format!("✅ Loaded {n} upcoming event(s)")).await?;
    Ok(())
}
