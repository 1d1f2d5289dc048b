//! Quotes from tech legends.

use crate::post::{Post, DEFAULT_COLOR};
use crate::utils::chunk_lines;
use rand::seq::SliceRandom;

const LIST_PAGE_CHARS: usize = 900;

pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
    pub bio: &'static str,
    pub wiki: Option<&'static str>,
    pub color: u32,
}

const fn q(text: &'static str, author: &'static str, bio: &'static str, wiki: Option<&'static str>, color: u32) -> Quote {
    Quote { text, author, bio, wiki, color }
}

const LINUS: &str = "Linus Torvalds";
const LINUS_BIO: &str = "Creator of Linux and Git";
const LINUS_WIKI: Option<&str> = Some("https://en.wikipedia.org/wiki/Linus_Torvalds");
const RMS: &str = "Richard Stallman";
const RMS_BIO: &str = "Founder of GNU Project and Free Software Foundation";
const RMS_WIKI: Option<&str> = Some("https://en.wikipedia.org/wiki/Richard_Stallman");
const HOPPER: &str = "Grace Hopper";
const HOPPER_BIO: &str = "Computer programming pioneer and inventor of the first compiler";
const HOPPER_WIKI: Option<&str> = Some("https://en.wikipedia.org/wiki/Grace_Hopper");
const SHEVINSKY: &str = "Elissa Shevinsky";
const SHEVINSKY_BIO: &str = "Privacy advocate, entrepreneur, and author of 'Lean Out'";
const MAY: &str = "Timothy C. May";
const MAY_BIO: &str = "Cryptoanarchist, cypherpunk pioneer, author of 'The Crypto Anarchist Manifesto'";
const MAY_WIKI: Option<&str> = Some("https://en.wikipedia.org/wiki/Timothy_C._May");

pub static TECH_QUOTES: &[Quote] = &[
    q("Talk is cheap. Show me the code.", LINUS, LINUS_BIO, LINUS_WIKI, 0xFCC624),
    q("Bad programmers worry about the code. Good programmers worry about data structures and their relationships.", LINUS, LINUS_BIO, LINUS_WIKI, 0xFCC624),
    q("Most good programmers do programming not because they expect to get paid, but because it is fun to program.", LINUS, LINUS_BIO, LINUS_WIKI, 0xFCC624),
    q("Free software is a matter of liberty, not price. Think of 'free' as in 'free speech,' not as in 'free beer.'", RMS, RMS_BIO, RMS_WIKI, 0xA42E2B),
    q("Sharing is good, and with digital technology, sharing is easy.", RMS, RMS_BIO, RMS_WIKI, 0xA42E2B),
    q("The most dangerous phrase in the language is, 'We've always done it this way.'", HOPPER, HOPPER_BIO, HOPPER_WIKI, 0x9B59B6),
    q("It's easier to ask forgiveness than it is to get permission.", HOPPER, HOPPER_BIO, HOPPER_WIKI, 0x9B59B6),
    q("A ship in port is safe, but that's not what ships are built for.", HOPPER, HOPPER_BIO, HOPPER_WIKI, 0x9B59B6),
    q("Privacy is not about having something to hide. Privacy is about having something to protect.", SHEVINSKY, SHEVINSKY_BIO, None, 0x9B59B6),
    q("Security is not a product, but a process. Privacy is not just a feature, it's a human right.", SHEVINSKY, SHEVINSKY_BIO, None, 0x9B59B6),
    q("A specter is haunting the modern world, the specter of crypto anarchy.", MAY, MAY_BIO, MAY_WIKI, 0x2C3E50),
    q("Cypherpunks write code.", MAY, MAY_BIO, MAY_WIKI, 0x2C3E50),
    q("Premature optimization is the root of all evil.", "Donald Knuth", "Author of The Art of Computer Programming", Some("https://en.wikipedia.org/wiki/Donald_Knuth"), 0x3498DB),
    q("Simplicity is prerequisite for reliability.", "Edsger W. Dijkstra", "Pioneer of structured programming", Some("https://en.wikipedia.org/wiki/Edsger_W._Dijkstra"), 0xE67E22),
    q("UNIX is basically a simple operating system, but you have to be a genius to understand the simplicity.", "Dennis Ritchie", "Creator of C and co-creator of Unix", Some("https://en.wikipedia.org/wiki/Dennis_Ritchie"), 0x555555),
    q("When in doubt, use brute force.", "Ken Thompson", "Co-creator of Unix and Go", Some("https://en.wikipedia.org/wiki/Ken_Thompson"), 0x00ADD8),
    q("There are only two kinds of languages: the ones people complain about and the ones nobody uses.", "Bjarne Stroustrup", "Creator of C++", Some("https://en.wikipedia.org/wiki/Bjarne_Stroustrup"), 0x00599C),
    q("Security is a process, not a product.", "Bruce Schneier", "Cryptographer and security technologist", Some("https://en.wikipedia.org/wiki/Bruce_Schneier"), 0xE74C3C),
];

/// Short command names for the authors with dedicated commands.
pub fn resolve_author(alias: &str) -> Option<&'static str> {
    match alias.trim().to_lowercase().as_str() {
        "linus" | "torvalds" => Some(LINUS),
        "stallman" | "rms" => Some(RMS),
        "hopper" | "grace" => Some(HOPPER),
        "shevinsky" => Some(SHEVINSKY),
        "may" => Some(MAY),
        _ => None,
    }
}

pub fn random() -> Option<&'static Quote> {
    TECH_QUOTES.choose(&mut rand::thread_rng())
}

pub fn random_by(author: &str) -> Option<&'static Quote> {
    let matching: Vec<_> = TECH_QUOTES.iter().filter(|q| q.author == author).collect();
    matching.choose(&mut rand::thread_rng()).copied()
}

impl Quote {
    pub fn post(&self) -> Post {
        let mut post = Post::new("💡 Tech Quote of the Day")
            .description(format!("\"{}\"", self.text))
            .color(self.color)
            .field("\u{200b}", format!("— {}\n*{}*", self.author, self.bio), false);
        if let Some(wiki) = self.wiki {
            post = post.field("📖 Learn More", format!("[Read about {}]({})", self.author, wiki), false);
        }
        post.footer("🐧 Penguin Overlord | Tech Wisdom")
    }
}

/// (author, bio, count), most quoted first.
pub fn authors() -> Vec<(&'static str, &'static str, usize)> {
    let mut out: Vec<(&'static str, &'static str, usize)> = Vec::new();
    for quote in TECH_QUOTES {
        match out.iter_mut().find(|(a, _, _)| *a == quote.author) {
            Some(entry) => entry.2 += 1,
            None => out.push((quote.author, quote.bio, 1)),
        }
    }
    out.sort_by(|a, b| b.2.cmp(&a.2));
    out
}

pub fn author_pages() -> Vec<Post> {
    let authors = authors();
    let lines: Vec<String> = authors
        .iter()
        .map(|(name, bio, n)| format!("**{name}** - {bio} ({n} quote{})", if *n > 1 { "s" } else { "" }))
        .collect();
    let chunks = chunk_lines(&lines, LIST_PAGE_CHARS);
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            Post::new("💡 Tech Quote Authors")
                .description(format!(
                    "We have quotes from {} tech legends (Total: {} quotes)\nPage {} of {}",
                    authors.len(),
                    TECH_QUOTES.len(),
                    i + 1,
                    total
                ))
                .color(DEFAULT_COLOR)
                .field("\u{200b}", body, false)
                .footer("Use !techquote to get a random quote!")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_has_quotes() {
        for alias in ["linus", "stallman", "hopper", "shevinsky", "may"] {
            let author = resolve_author(alias).unwrap();
            assert_eq!(random_by(author).unwrap().author, author);
        }
        assert!(resolve_author("nobody").is_none());
        assert!(random_by("Nobody").is_none());
    }

    #[test]
    fn authors_sorted_by_count() {
        let list = authors();
        assert_eq!(list[0].0, LINUS);
        assert!(list.windows(2).all(|w| w[0].2 >= w[1].2));
        assert_eq!(list.iter().map(|a| a.2).sum::<usize>(), TECH_QUOTES.len());
    }

    #[test]
    fn author_pages_fit_embed_fields() {
        let pages = author_pages();
        assert!(!pages.is_empty());
        for page in &pages {
            assert!(page.fields[0].value.len() <= LIST_PAGE_CHARS);
        }
    }

    #[test]
    fn quote_post_links_wiki_when_known() {
        let with_wiki = random_by(LINUS).unwrap().post();
        assert_eq!(with_wiki.fields.len(), 2);
        let without = random_by(SHEVINSKY).unwrap().post();
        assert_eq!(without.fields.len(), 1);
        assert!(without.description.unwrap().starts_with('"'));
    }
}
