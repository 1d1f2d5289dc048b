//! PENGUIN OVERLORD - Discord bot for tech news, comics, CVEs and radio propagation

mod app;
mod aviation;
mod bot;
mod cache;
mod comics;
mod commands;
mod config;
mod consts;
mod cve;
mod events;
mod fetcher;
mod fun;
mod news;
mod post;
mod poster;
mod quotes;
mod radio;
mod state;
mod utils;
mod xkcd;

#[cfg(test)]
mod testing;

use crate::app::App;
use crate::config::{Secrets, Settings};
use crate::consts::Category;
use clap::{Parser, Subcommand};
use poise::serenity_prelude as serenity;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "penguin-overlord", version, about = "Discord bot for tech news, comics, CVEs and radio propagation")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Where state and feed caches live
    #[arg(long, env = "DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Directory of event CSV files
    #[arg(long, env = "EVENTS_DIR", default_value = "events", global = true)]
    events_dir: PathBuf,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
enum Mode {
    /// Connect to the gateway and run every poster (default)
    Run,
    /// One news pass, then exit
    News {
        /// Category key, e.g. cybersecurity; every category when omitted
        #[arg(long)]
        category: Option<Category>,
    },
    /// Post the solar report once
    Solar,
    /// Post the latest XKCD if it is new
    Xkcd,
    /// Post the daily comic once
    Comic,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    log::info!("═══════════════════════════════════════════");
    log::info!("  🐧 PENGUIN OVERLORD ONLINE. WATCHING FEEDS...");
    log::info!("═══════════════════════════════════════════");

    if let Err(e) = run(cli).await {
        log::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), bot::Error> {
    let client = fetcher::http_client()?;
    let secrets = Secrets::load(&client).await;
    let settings = Settings::resolve(&secrets, cli.data_dir, cli.events_dir)?;
    let app = App::build(settings, &secrets, client).await?;
    log::info!("{} event(s) loaded", app.events.read().await.len());

    let mode = cli.mode.unwrap_or(Mode::Run);
    if let Mode::Run = mode {
        return bot::run(app).await;
    }

    let http = serenity::Http::new(&app.settings.token);
    let result = one_shot(&app, &http, mode).await;
    app.shutdown().await;
    result
}

/// A single pass over the REST API, no gateway connection.
async fn one_shot(app: &App, http: &serenity::Http, mode: Mode) -> Result<(), bot::Error> {
    match mode {
        Mode::Run => {}
        Mode::News { category } => {
            let categories = match category {
                Some(c) => vec![c],
                None => Category::ALL.to_vec(),
            };
            for category in categories {
                match poster::news_pass(app, http, category).await {
                    Ok(n) => log::info!("{}: posted {} item(s)", category.key(), n),
                    Err(e) => log::error!("{}: pass failed: {}", category.key(), e),
                }
            }
        }
        Mode::Solar => {
            if !poster::solar_pass(app, http, true).await? {
                log::warn!("No solar channel configured, nothing posted");
            }
        }
        Mode::Xkcd => match poster::xkcd_pass(app, http, false).await? {
            Some(num) => log::info!("Posted XKCD #{}", num),
            None => log::info!("No new XKCD to post"),
        },
        Mode::Comic => {
            if !poster::daily_comic_pass(app, http).await? {
                log::warn!("Daily comic disabled or no channel configured");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["penguin-overlord"]).unwrap();
        assert!(cli.mode.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn news_takes_a_category_key() {
        let cli = Cli::try_parse_from(["penguin-overlord", "news", "--category", "apple_google", "-v"]).unwrap();
        match cli.mode {
            Some(Mode::News { category }) => assert_eq!(category, Some(Category::AppleGoogle)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(cli.verbose);
        assert!(Cli::try_parse_from(["penguin-overlord", "news", "--category", "nope"]).is_err());
    }
}
