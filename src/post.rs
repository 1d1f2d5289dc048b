//! Transport-neutral message model and its Discord embed rendering.

use crate::consts::{limits, Source};
use crate::fetcher::FeedItem;
use crate::utils::truncate_text;
use poise::serenity_prelude as serenity;

pub const DEFAULT_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<Field>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
    pub timestamp: bool,
}

impl Post {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            description: None,
            color: DEFAULT_COLOR,
            fields: Vec::new(),
            image: None,
            thumbnail: None,
            footer: None,
            timestamp: false,
        }
    }

    /// `"{icon} {title}"`, linked, with the source's colour and name.
    pub fn news(source: &Source, item: &FeedItem) -> Self {
        let post = Self::new(format!("{} {}", source.icon, item.title))
            .url(&item.link)
            .color(if source.color == 0 { DEFAULT_COLOR } else { source.color })
            .footer(format!("Source: {}", source.name))
            .stamped();
        if item.description.is_empty() { post } else { post.description(&item.description) }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self { self.url = Some(url.into()); self }
    pub fn description(mut self, d: impl Into<String>) -> Self { self.description = Some(d.into()); self }
    pub fn color(mut self, c: u32) -> Self { self.color = c; self }
    pub fn image(mut self, url: impl Into<String>) -> Self { self.image = Some(url.into()); self }
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self { self.thumbnail = Some(url.into()); self }
    pub fn footer(mut self, f: impl Into<String>) -> Self { self.footer = Some(f.into()); self }
    pub fn stamped(mut self) -> Self { self.timestamp = true; self }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field { name: name.into(), value: value.into(), inline });
        self
    }

    pub fn to_embed(&self) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::new()
            .title(truncate_text(&self.title, 250))
            .colour(self.color);
        if let Some(url) = &self.url {
            embed = embed.url(url);
        }
        if let Some(d) = &self.description {
            embed = embed.description(truncate_text(d, 4000));
        }
        for f in &self.fields {
            embed = embed.field(&f.name, truncate_text(&f.value, limits::EMBED_FIELD_CHARS - 3), f.inline);
        }
        if let Some(img) = &self.image {
            embed = embed.image(img);
        }
        if let Some(thumb) = &self.thumbnail {
            embed = embed.thumbnail(thumb);
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
        }
        if self.timestamp {
            embed = embed.timestamp(serenity::Timestamp::now());
        }
        embed
    }
}

/// Post to a channel through the REST API only.
pub async fn send(http: &serenity::Http, channel_id: u64, post: &Post) -> Result<(), serenity::Error> {
    serenity::ChannelId::new(channel_id)
        .send_message(http, serenity::CreateMessage::new().embed(post.to_embed()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{find_source, Category};

    fn item(description: &str) -> FeedItem {
        FeedItem {
            title: "Kernel 6.9 released".into(),
            link: "https://lwn.net/a".into(),
            description: description.into(),
            guid: "g".into(),
            published: None,
        }
    }

    #[test]
    fn news_post_layout() {
        let src = find_source(Category::Tech, "lwn").unwrap();
        let post = Post::news(src, &item("Highlights"));
        assert_eq!(post.title, "📰 Kernel 6.9 released");
        assert_eq!(post.url.as_deref(), Some("https://lwn.net/a"));
        assert_eq!(post.footer.as_deref(), Some("Source: LWN.net (Linux Weekly News)"));
        assert_eq!(post.color, 0x336699);
        assert!(post.timestamp);
    }

    #[test]
    fn black_sources_fall_back_to_default_colour_and_empty_description_is_omitted() {
        let src = find_source(Category::Cybersecurity, "wired_security").unwrap();
        let post = Post::news(src, &item(""));
        assert_eq!(post.color, DEFAULT_COLOR);
        assert!(post.description.is_none());
    }

    #[test]
    fn embed_carries_fields() {
        let embed = Post::new("t")
            .field("Severity", "🔴 CRITICAL", true)
            .footer("f")
            .to_embed();
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["title"], "t");
        assert_eq!(json["fields"][0]["name"], "Severity");
        assert_eq!(json["footer"]["text"], "f");
    }
}
