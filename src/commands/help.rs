//! Categorized help pages.

use super::{paginate, reply};
use crate::bot::{Context, Error};
use crate::post::{Post, DEFAULT_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Topic {
    #[name = "overview"]
    Overview,
    #[name = "comics"]
    Comics,
    #[name = "news"]
    News,
    #[name = "ham"]
    Ham,
    #[name = "aviation"]
    Aviation,
    #[name = "events"]
    Events,
    #[name = "utilities"]
    Utilities,
    #[name = "admin"]
    Admin,
}

impl Topic {
    pub const ALL: [Topic; 8] = [
        Topic::Overview,
        Topic::Comics,
        Topic::News,
        Topic::Ham,
        Topic::Aviation,
        Topic::Events,
        Topic::Utilities,
        Topic::Admin,
    ];

    fn heading(self) -> (&'static str, &'static str) {
        match self {
            Topic::Overview => ("🐧", "Penguin Overlord"),
            Topic::Comics => ("🎨", "Comics & Fun"),
            Topic::News => ("📰", "News & CVE"),
            Topic::Ham => ("📻", "HAM Radio"),
            Topic::Aviation => ("✈️", "Aviation"),
            Topic::Events => ("📅", "Events"),
            Topic::Utilities => ("🛠️", "Utilities"),
            Topic::Admin => ("⚙️", "Admin"),
        }
    }

    /// (usage, description)
    fn commands(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Topic::Overview => &[
                ("!help <topic>", "Jump straight to a topic"),
                ("comics · news · ham · aviation", "Topics you can pick"),
                ("events · utilities · admin", "More topics"),
            ],
            Topic::Comics => &[
                ("!xkcd [number]", "An XKCD comic, latest by default"),
                ("!xkcd_latest / !xkcd_random", "Newest or random XKCD"),
                ("!xkcd_search <keyword>", "Search the last 100 titles"),
                ("!comic [source]", "xkcd, joyoftech, turnoff or random"),
                ("!comic_trivia <number>", "explainxkcd summary"),
                ("!techquote", "A random tech quote"),
                ("!quote_linus / !quote_stallman / !quote_hopper", "Quotes by author"),
                ("!quote_shevinsky / !quote_may", "More quotes by author"),
                ("!quote_list", "Every quoted author"),
            ],
            Topic::News => &[
                ("!cybersecurity [source]", "Latest headline, or the source list"),
                ("!tech / !gaming / !applegoogle [source]", "Same for other categories"),
                ("!generalnews [source]", "General news"),
                ("!uslegislation / !eulegislation / !uklegislation", "Legislation trackers"),
                ("!cve [nvd|ubuntu]", "Up to 5 recent CVEs"),
                ("/news status [category]", "Auto-posting configuration"),
                ("/news list_sources <category>", "Sources and whether they are on"),
            ],
            Topic::Ham => &[
                ("!hamradio", "HAM radio trivia"),
                ("!frequency", "Facts about a band"),
                ("!solar / !propagation", "NOAA solar report and band outlook"),
                ("!solar_status", "Solar auto-poster status"),
            ],
            Topic::Aviation => &[
                ("!aviation", "Aviation trivia"),
                ("!squawk [code]", "Transponder code lookup"),
            ],
            Topic::Events => &[
                ("!events [days] [type]", "Upcoming events (default 30 days)"),
                ("!allevents [type]", "Browse every upcoming event"),
                ("!nextevent", "The next event"),
                ("!searchevent <query>", "Search by name or location"),
                ("!eventweeks [weeks]", "Events grouped by week"),
            ],
            Topic::Utilities => &[
                ("!fortune", "Cyber fortune cookie"),
                ("!patchgremlin", "Patch reminders with attitude"),
                ("!manpage", "A random Linux command"),
            ],
            Topic::Admin => &[
                ("/news set_channel · enable · disable", "News auto-posting"),
                ("/news set_interval · toggle_source", "Schedule and sources"),
                ("/news add_role · remove_role", "Approved roles"),
                ("!xkcd_set_channel · enable · disable · post_now", "XKCD poster"),
                ("!comic_set_channel · enable · disable / !daily_comic", "Daily comic"),
                ("!cve_set_channel · enable · disable · status", "CVE alerts"),
                ("!solar_set_channel · enable · disable", "Solar updates"),
                ("!sync", "Re-register slash commands (owner)"),
                ("!reload_events", "Re-read the event CSV files (owner)"),
            ],
        }
    }

    pub fn post(self) -> Post {
        let (icon, title) = self.heading();
        let lines: Vec<String> = self.commands().iter().map(|(usage, what)| format!("`{usage}`\n{what}")).collect();
        let mut post = Post::new(format!("{icon} {title}")).description(lines.join("\n\n")).color(DEFAULT_COLOR);
        if self == Topic::Overview {
            post = post.field("Prefix", "Every command works with `!` or `/`", false);
        }
        post.footer("💡 All commands work with ! or / prefix")
    }
}

/// Help by topic, or browse them all
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>, #[description = "Topic"] topic: Option<Topic>) -> Result<(), Error> {
    match topic {
        Some(topic) => reply(ctx, &topic.post()).await,
        None => {
            let pages: Vec<Post> = Topic::ALL.into_iter().map(Topic::post).collect();
            paginate(ctx, &pages).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_topic_has_a_page() {
        for topic in Topic::ALL {
            let post = topic.post();
            assert!(post.description.as_deref().is_some_and(|d| !d.is_empty()));
        }
        assert_eq!(Topic::News.post().title, "📰 News & CVE");
    }

    #[test]
    fn help_pages_only_mention_real_commands() {
        let names: Vec<String> = super::super::list().into_iter().map(|c| c.name).collect();
        for topic in Topic::ALL {
            for (usage, _) in topic.commands() {
                let Some(rest) = usage.strip_prefix('!') else { continue };
                let name = rest.split(|c: char| c.is_whitespace() || c == '/').next().unwrap_or_default();
                assert!(names.iter().any(|n| n == name), "{name}");
            }
        }
    }
}
