use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::OnceLock;

/// Elements whose boundaries separate words.
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "tr", "td", "th", "table", "blockquote", "pre",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr",
];

/// Strip markup from a feed fragment: entities decoded, script/style bodies
/// dropped, whitespace collapsed to single spaces.
pub fn strip_html(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return collapse_whitespace(text);
    }

    let fragment = Html::parse_fragment(text);
    let mut out = String::with_capacity(text.len());
    push_text(fragment.root_element(), &mut out);
    collapse_whitespace(&out)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Node::Text(t) = child.value() {
            out.push_str(t);
            continue;
        }
        let Some(inner) = ElementRef::wrap(child) else { continue };
        let name = inner.value().name();
        if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
            continue;
        }
        let block = BLOCK_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t));
        if block { out.push(' '); }
        push_text(inner, out);
        if block { out.push(' '); }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars { return s.to_string(); }
    s.chars().take(max_chars).collect::<String>().trim_end().to_string() + "..."
}

fn sentence_end() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?](\s|$)").expect("static regex"))
}

/// First sentence of `text`, capped at `max_chars` + "..." when longer.
/// Terminators inside words ("Node.js", "v2.6") do not end a sentence.
pub fn first_sentence(text: &str, max_chars: usize) -> String {
    let sentence = sentence_end()
        .find(text)
        .map(|m| &text[..m.start()])
        .unwrap_or(text)
        .trim();
    truncate_text(sentence, max_chars)
}

/// Split lines into chunks whose joined length stays under `max_len`.
pub fn chunk_lines<S: AsRef<str>>(lines: &[S], max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in lines {
        let line = line.as_ref();
        if !current.is_empty() && current.len() + line.len() + 1 > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() { current.push('\n'); }
        current.push_str(line);
    }
    if !current.is_empty() { chunks.push(current); }
    chunks
}

/// First `<img src="...">` in an HTML fragment.
pub fn first_image_src(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter_map(|n| n.value().as_element())
        .find(|e| e.name() == "img")
        .and_then(|e| e.attr("src"))
        .map(str::to_string)
}
