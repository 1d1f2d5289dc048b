//! Gateway bot: poise framework, error replies and background posters.

use crate::app::App;
use crate::commands;
use crate::poster;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use std::sync::Arc;

pub type Data = Arc<App>;
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub const PREFIX: &str = "!";
const STATUS: &str = "the penguins 🐧 | !help";

pub const MISSING_ARGUMENT: &str = "❌ Missing required argument";
pub const BAD_ARGUMENT: &str = "❌ Bad argument";
pub const UNEXPECTED: &str = "❌ An unexpected error occurred. Please try again later.";
pub const NO_PERMISSION: &str = "❌ You don't have permission to use this command.";

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::UnknownCommand { .. } => {}
        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
            let reply = match input {
                None => format!("{MISSING_ARGUMENT}. Use `{PREFIX}help` for usage."),
                Some(input) => {
                    log::debug!("Bad argument `{}` for {}: {}", input, ctx.command().qualified_name, error);
                    format!("{BAD_ARGUMENT}: `{input}`")
                }
            };
            if let Err(e) = ctx.say(reply).await {
                log::warn!("Failed to send argument error: {}", e);
            }
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            log::error!("Command {} failed: {}", ctx.command().qualified_name, error);
            if let Err(e) = ctx.say(UNEXPECTED).await {
                log::warn!("Failed to send error reply: {}", e);
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. }
        | poise::FrameworkError::NotAnOwner { ctx, .. } => {
            if let Err(e) = ctx.say(NO_PERMISSION).await {
                log::warn!("Failed to send permission reply: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                log::error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to the gateway and runs until the shards stop.
pub async fn run(app: Arc<App>) -> Result<(), Error> {
    let owners: HashSet<serenity::UserId> = app.settings.owner_id.map(serenity::UserId::new).into_iter().collect();

    let options = poise::FrameworkOptions {
        commands: commands::list(),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(PREFIX.into()),
            mention_as_prefix: true,
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                log::debug!("{} invoked {}", ctx.author().name, ctx.command().qualified_name);
            })
        },
        owners,
        ..Default::default()
    };

    let setup_app = app.clone();
    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                log::info!("Logged in as {} ({} guilds)", ready.user.name, ready.guilds.len());
                let commands = &framework.options().commands;
                poise::builtins::register_globally(ctx, commands).await?;
                log::info!("Registered {} slash commands", commands.len());
                ctx.set_activity(Some(serenity::ActivityData::watching(STATUS)));
                poster::spawn_all(setup_app.clone(), ctx.http.clone());
                Ok(setup_app)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::ClientBuilder::new(&app.settings.token, intents)
        .framework(framework)
        .await?;

    let shards = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutting down...");
            shards.shutdown_all().await;
        }
    });

    let result = client.start().await;
    app.shutdown().await;
    result.map_err(Into::into)
}
