//! Conference calendar loaded from CSV listings.

use crate::post::Post;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const REMINDER_DAYS: [i64; 3] = [7, 3, 1];
pub const MAX_LISTED: usize = 10;
pub const PER_PAGE: usize = 5;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum EventError {
    #[error("IO: {0}")] Io(#[from] std::io::Error),
    #[error("CSV: {0}")] Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Event")]
    name: String,
    #[serde(rename = "Start Date")]
    start: String,
    #[serde(rename = "End Date", default)]
    end: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "Source", default)]
    source: String,
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(rename = "Date Status", default)]
    date_status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub city: String,
    pub state: String,
    pub url: String,
    pub source: String,
    pub kind: String,
    pub date_status: String,
}

fn or_unknown(s: String, fallback: &str) -> String {
    if s.trim().is_empty() { fallback.to_string() } else { s.trim().to_string() }
}

impl Event {
    fn from_row(row: Row) -> Result<Self, chrono::ParseError> {
        let start = NaiveDate::parse_from_str(row.start.trim(), DATE_FORMAT)?;
        let end = match row.end.trim() {
            "" => start,
            s => NaiveDate::parse_from_str(s, DATE_FORMAT)?,
        };
        Ok(Self {
            name: row.name.trim().to_string(),
            start,
            end,
            city: or_unknown(row.city, "Unknown"),
            state: or_unknown(row.state, "Unknown"),
            url: row.url.trim().to_string(),
            source: or_unknown(row.source, "Unknown"),
            kind: or_unknown(row.kind, "Event"),
            date_status: or_unknown(row.date_status, "Unknown"),
        })
    }

    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    pub fn estimated(&self) -> bool {
        self.date_status.to_lowercase().contains("estimated")
    }

    pub fn date_range(&self, month: &str) -> String {
        if self.start == self.end {
            self.start.format(&format!("{month} %d, %Y")).to_string()
        } else {
            format!(
                "{} - {}",
                self.start.format(&format!("{month} %d")),
                self.end.format(&format!("{month} %d, %Y"))
            )
        }
    }

    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.start - today).num_days()
    }
}

/// Ham radio, cybersecurity, or a free-form substring of the event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Ham,
    Cyber,
    Other(String),
}

impl TypeFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else { return TypeFilter::All };
        let lower = raw.to_lowercase();
        if lower.contains("ham") || lower.contains("radio") {
            TypeFilter::Ham
        } else if lower.contains("cyber") || lower.contains("security") {
            TypeFilter::Cyber
        } else {
            TypeFilter::Other(lower)
        }
    }

    pub fn matches(&self, kind: &str) -> bool {
        let kind = kind.to_lowercase();
        match self {
            TypeFilter::All => true,
            TypeFilter::Ham => kind.contains("ham") || kind.contains("radio"),
            TypeFilter::Cyber => kind.contains("cyber") || kind.contains("security"),
            TypeFilter::Other(s) => kind.contains(s.as_str()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TypeFilter::All => "All".to_string(),
            TypeFilter::Ham => "Ham Radio".to_string(),
            TypeFilter::Cyber => "Cybersecurity".to_string(),
            TypeFilter::Other(s) => {
                let mut chars = s.chars();
                chars.next().map(|c| c.to_uppercase().chain(chars).collect()).unwrap_or_default()
            }
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TypeFilter::Ham => "📻",
            TypeFilter::Cyber => "🔐",
            _ => "📅",
        }
    }

    fn page_color(&self) -> u32 {
        match self {
            TypeFilter::Ham => 0xFF9800,
            TypeFilter::Cyber => 0xFF6B00,
            _ => 0x2196F3,
        }
    }
}

pub fn type_emoji(kind: &str) -> &'static str {
    match TypeFilter::parse(Some(kind)) {
        TypeFilter::Ham => "📻",
        TypeFilter::Cyber => "🔐",
        _ => "📅",
    }
}

/// Countdown text and embed colour for an event `days` away.
pub fn urgency(days: i64) -> (String, u32) {
    match days {
        0 => ("🔥 **HAPPENING TODAY!**".to_string(), 0xFF0000),
        1 => ("⚡ **TOMORROW!**".to_string(), 0xFF6B00),
        d if d <= 7 => (format!("📅 **In {d} days**"), 0xFFB300),
        d => (format!("📅 In {d} days"), 0x4CAF50),
    }
}

fn time_until(days: i64) -> String {
    match days {
        d if d < 0 => format!("Passed {} days ago", d.abs()),
        0 => "**TODAY!**".to_string(),
        1 => "**Tomorrow!**".to_string(),
        d => format!("In {d} days"),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Upcoming<'a> {
    pub event: &'a Event,
    pub days_until: i64,
}

#[derive(Debug, Default)]
pub struct EventCalendar {
    events: Vec<Event>,
}

impl EventCalendar {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Every `*.csv` in `dir`. Events that ended before `today` are dropped,
    /// unreadable files and bad rows are logged and skipped.
    pub fn load(dir: &Path, today: NaiveDate) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Events directory {} unreadable: {}", dir.display(), e);
                return Self::default();
            }
        };
        let mut files: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();
        if files.is_empty() {
            log::warn!("No CSV files found in {}", dir.display());
        }

        let mut events = Vec::new();
        for path in files {
            let label = path.display().to_string();
            match std::fs::File::open(&path).map_err(EventError::from).and_then(|f| parse_csv(f, today, &label)) {
                Ok(mut found) => events.append(&mut found),
                Err(e) => log::error!("Error reading {}: {}", label, e),
            }
        }
        log::info!("Loaded {} events (excluding past events)", events.len());
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events starting within `days_ahead` days, soonest first.
    pub fn upcoming(&self, today: NaiveDate, days_ahead: i64) -> Vec<Upcoming<'_>> {
        let mut out: Vec<_> = self
            .events
            .iter()
            .map(|event| Upcoming { event, days_until: event.days_until(today) })
            .filter(|u| (0..=days_ahead).contains(&u.days_until))
            .collect();
        out.sort_by_key(|u| u.event.start);
        out
    }

    pub fn upcoming_of(&self, today: NaiveDate, days_ahead: i64, filter: &TypeFilter) -> Vec<Upcoming<'_>> {
        self.upcoming(today, days_ahead).into_iter().filter(|u| filter.matches(&u.event.kind)).collect()
    }

    /// Week index (0 = this week) to events starting in it.
    pub fn by_week(&self, today: NaiveDate, weeks: i64) -> BTreeMap<i64, Vec<&Event>> {
        let mut out: BTreeMap<i64, Vec<&Event>> = BTreeMap::new();
        for event in &self.events {
            let days = event.days_until(today);
            if days < 0 || days / 7 >= weeks {
                continue;
            }
            out.entry(days / 7).or_default().push(event);
        }
        for list in out.values_mut() {
            list.sort_by_key(|e| e.start);
        }
        out
    }

    pub fn next(&self, today: NaiveDate) -> Option<Upcoming<'_>> {
        self.upcoming(today, 365).into_iter().next()
    }

    /// Case-insensitive match on name, city, state or type.
    pub fn search(&self, today: NaiveDate, query: &str) -> Vec<Upcoming<'_>> {
        let q = query.trim().to_lowercase();
        let mut out: Vec<_> = self
            .events
            .iter()
            .filter(|e| {
                [&e.name, &e.city, &e.state, &e.kind].iter().any(|f| f.to_lowercase().contains(&q))
            })
            .map(|event| Upcoming { event, days_until: event.days_until(today) })
            .collect();
        out.sort_by_key(|u| u.event.start);
        out
    }

    /// Events exactly 7, 3 or 1 days away.
    pub fn reminders_due(&self, today: NaiveDate) -> Vec<Upcoming<'_>> {
        self.upcoming(today, REMINDER_DAYS[0])
            .into_iter()
            .filter(|u| REMINDER_DAYS.contains(&u.days_until))
            .collect()
    }
}

fn parse_csv<R: Read>(reader: R, today: NaiveDate, label: &str) -> Result<Vec<Event>, EventError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut events = Vec::new();
    for row in rdr.deserialize::<Row>() {
        let event = match row {
            Ok(row) => Event::from_row(row),
            Err(e) => {
                log::warn!("Bad event row in {}: {}", label, e);
                continue;
            }
        };
        match event {
            Ok(event) if event.end >= today => events.push(event),
            Ok(_) => {}
            Err(e) => log::warn!("Bad event date in {}: {}", label, e),
        }
    }
    Ok(events)
}

// ═══════════════════════════════════════════════════════════════════
// EMBEDS
// ═══════════════════════════════════════════════════════════════════

fn detail_field(u: &Upcoming<'_>) -> String {
    let e = u.event;
    let status = if e.estimated() { "⚠️ (Estimated)" } else { "✅ (Confirmed)" };
    let mut value = format!(
        "{} **Type:** {}\n📍 **Location:** {}\n📆 **Date:** {} {}\n⏰ **Time Until:** {}",
        type_emoji(&e.kind),
        e.kind,
        e.location(),
        e.date_range("%b"),
        status,
        time_until(u.days_until)
    );
    if !e.url.is_empty() {
        value.push_str(&format!("\n🔗 [Event Website]({})", e.url));
    }
    value
}

pub fn upcoming_post(list: &[Upcoming<'_>], days: i64, filter: &TypeFilter) -> Post {
    let mut post = Post::new(format!("{} Upcoming {} Events", filter.emoji(), filter.label()))
        .description(format!("Events happening in the next {days} days"))
        .color(0xFF6B00);
    for u in list.iter().take(MAX_LISTED) {
        post = post.field(&u.event.name, detail_field(u), false);
    }
    if list.len() > MAX_LISTED {
        post.footer(format!("Showing {MAX_LISTED} of {} events • Use !allevents for paginated view", list.len()))
    } else {
        post.footer("Filter by type: !events 30 cybersecurity or !events 60 ham")
    }
}

/// Five events per page.
pub fn pages(list: &[Upcoming<'_>], filter: &TypeFilter) -> Vec<Post> {
    let total = list.len().div_ceil(PER_PAGE);
    list.chunks(PER_PAGE)
        .enumerate()
        .map(|(i, chunk)| {
            let mut post = Post::new(format!("{} {} Events - Page {}/{}", filter.emoji(), filter.label(), i + 1, total))
                .description(format!("Showing {} upcoming event(s)", list.len()))
                .color(filter.page_color());
            for u in chunk {
                post = post.field(&u.event.name, detail_field(u), false);
            }
            post.footer(format!("Page {}/{}", i + 1, total))
        })
        .collect()
}

pub fn next_post(u: &Upcoming<'_>) -> Post {
    let e = u.event;
    let (countdown, color) = urgency(u.days_until);
    let confirmed = if e.date_status.to_lowercase().contains("confirmed") { "✅ Confirmed" } else { "⚠️ Estimated" };
    let mut post = Post::new(format!("🔐 Next Event: {}", e.name))
        .description(countdown)
        .color(color)
        .field(format!("{} Event Type", type_emoji(&e.kind)), &e.kind, true)
        .field("📍 Location", e.location(), true)
        .field("📆 Date", format!("{}\n{}", e.date_range("%B"), confirmed), true);
    if !e.url.is_empty() {
        post = post.url(&e.url).field("🔗 Website", format!("[{} Site]({})", e.name, e.url), false);
    }
    if u.days_until > 0 {
        post = post.field("⏰ Countdown", format!("{} days until event starts!", u.days_until), false);
    }
    post.footer("Use !events to see more upcoming events")
}

pub fn search_post(query: &str, matches: &[Upcoming<'_>]) -> Post {
    let mut post = Post::new(format!("🔍 Search Results: '{query}'"))
        .description(format!("Found {} matching event(s)", matches.len()))
        .color(0x2196F3);
    for u in matches.iter().take(MAX_LISTED) {
        let e = u.event;
        let mut value = format!(
            "{} **{}** {}\n📍 {}\n📆 {}\n⏰ {}",
            type_emoji(&e.kind),
            e.kind,
            if e.estimated() { "⚠️" } else { "✅" },
            e.location(),
            e.date_range("%b"),
            time_until(u.days_until)
        );
        if !e.url.is_empty() {
            value.push_str(&format!("\n🔗 [Website]({})", e.url));
        }
        post = post.field(&e.name, value, false);
    }
    if matches.len() > MAX_LISTED {
        post = post.footer(format!("Showing {MAX_LISTED} of {} results", matches.len()));
    }
    post
}

pub fn reminder_post(u: &Upcoming<'_>) -> Post {
    let (countdown, color) = urgency(u.days_until);
    let e = u.event;
    let mut post = Post::new(format!("⏰ Reminder: {}", e.name))
        .description(countdown)
        .color(color)
        .field("📍 Location", e.location(), true)
        .field("📆 Date", e.date_range("%b"), true)
        .stamped();
    if !e.url.is_empty() {
        post = post.url(&e.url);
    }
    post
}

fn week_label(week: i64) -> String {
    match week {
        0 => "This Week".to_string(),
        1 => "Next Week".to_string(),
        n => format!("In {n} Weeks"),
    }
}

/// One field per week, events listed by start date.
pub fn weeks_post(groups: &BTreeMap<i64, Vec<&Event>>, weeks: i64) -> Post {
    let mut post = Post::new("🗓️ Events by Week")
        .description(format!("Events starting in the next {weeks} week(s)"))
        .color(0x7E57C2);
    for (week, events) in groups {
        let lines: Vec<String> = events
            .iter()
            .map(|e| format!("{} **{}** - {} ({})", type_emoji(&e.kind), e.name, e.date_range("%b"), e.location()))
            .collect();
        post = post.field(week_label(*week), lines.join("\n"), false);
    }
    post.footer("Use !events for details • !allevents to browse")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Event,Start Date,End Date,City,State,URL,Source,Type,Date Status
DEF CON 33,2025-08-07,2025-08-10,Las Vegas,NV,https://defcon.org,manual,Cybersecurity,Confirmed
Hamvention,2025-05-16,2025-05-18,Xenia,OH,https://hamvention.org,manual,Ham Radio,Confirmed
BSides Seattle,2025-05-10,,Seattle,WA,,manual,Cybersecurity,Estimated
Old Con,2025-01-01,2025-01-02,Nowhere,XX,,manual,Cybersecurity,Confirmed
Broken,not-a-date,,Somewhere,ZZ,,manual,Cybersecurity,Confirmed
";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(today: NaiveDate) -> EventCalendar {
        EventCalendar::new(parse_csv(CSV.as_bytes(), today, "test").unwrap())
    }

    #[test]
    fn past_and_bad_rows_are_dropped() {
        let cal = calendar(day(2025, 5, 1));
        assert_eq!(cal.len(), 3);
        let bsides = cal.search(day(2025, 5, 1), "seattle");
        assert_eq!(bsides[0].event.end, day(2025, 5, 10));
        assert!(bsides[0].event.estimated());
    }

    #[test]
    fn upcoming_is_sorted_and_bounded() {
        let today = day(2025, 5, 1);
        let cal = calendar(today);
        let names: Vec<_> = cal.upcoming(today, 30).iter().map(|u| u.event.name.clone()).collect();
        assert_eq!(names, vec!["BSides Seattle", "Hamvention"]);
        assert_eq!(cal.upcoming(today, 120).len(), 3);
        assert_eq!(cal.next(today).unwrap().days_until, 9);
    }

    #[test]
    fn type_filters() {
        let today = day(2025, 5, 1);
        let cal = calendar(today);
        let ham = TypeFilter::parse(Some("ham"));
        assert_eq!(ham.label(), "Ham Radio");
        assert_eq!(cal.upcoming_of(today, 365, &ham).len(), 1);
        let cyber = TypeFilter::parse(Some("security"));
        assert_eq!(cal.upcoming_of(today, 365, &cyber).len(), 2);
        assert_eq!(TypeFilter::parse(Some("workshop")).label(), "Workshop");
        assert_eq!(TypeFilter::parse(None), TypeFilter::All);
        assert_eq!(type_emoji("Ham Radio"), "📻");
        assert_eq!(type_emoji("Cybersecurity"), "🔐");
        assert_eq!(type_emoji("Workshop"), "📅");
    }

    #[test]
    fn weeks_group_by_distance() {
        let today = day(2025, 5, 1);
        let cal = calendar(today);
        let weeks = cal.by_week(today, 4);
        assert_eq!(weeks[&1][0].name, "BSides Seattle");
        assert_eq!(weeks[&2][0].name, "Hamvention");
        assert!(!weeks.contains_key(&14));

        let post = weeks_post(&weeks, 4);
        assert_eq!(post.fields[0].name, "Next Week");
        assert_eq!(post.fields[1].name, "In 2 Weeks");
        assert!(post.fields[0].value.contains("**BSides Seattle**"));
    }

    #[test]
    fn reminders_fire_on_seven_three_and_one_days() {
        let cal = calendar(day(2025, 5, 1));
        assert_eq!(cal.reminders_due(day(2025, 5, 3))[0].days_until, 7);
        assert_eq!(cal.reminders_due(day(2025, 5, 9))[0].days_until, 1);
        assert!(cal.reminders_due(day(2025, 5, 5)).is_empty());
        let three = cal.reminders_due(day(2025, 5, 13));
        assert_eq!(three[0].event.name, "Hamvention");
    }

    #[test]
    fn urgency_colours() {
        assert_eq!(urgency(0).1, 0xFF0000);
        assert_eq!(urgency(1).1, 0xFF6B00);
        assert_eq!(urgency(7).1, 0xFFB300);
        assert_eq!(urgency(8).1, 0x4CAF50);
    }

    #[test]
    fn search_matches_type_and_caps_listing() {
        let today = day(2025, 5, 1);
        let cal = calendar(today);
        assert_eq!(cal.search(today, "CYBER").len(), 2);
        let many: Vec<Event> = (0..12)
            .map(|i| Event { name: format!("Con {i}"), ..cal.next(today).unwrap().event.clone() })
            .collect();
        let big = EventCalendar::new(many);
        let found = big.search(today, "con");
        let post = search_post("con", &found);
        assert_eq!(post.fields.len(), MAX_LISTED);
        assert_eq!(post.footer.as_deref(), Some("Showing 10 of 12 results"));
        assert_eq!(pages(&found, &TypeFilter::All).len(), 3);
    }

    #[test]
    fn date_ranges() {
        let cal = calendar(day(2025, 5, 1));
        let defcon = &cal.search(day(2025, 5, 1), "def con")[0];
        assert_eq!(defcon.event.date_range("%b"), "Aug 07 - Aug 10, 2025");
        let bsides = &cal.search(day(2025, 5, 1), "bsides")[0];
        assert_eq!(bsides.event.date_range("%B"), "May 10, 2025");
    }

    #[test]
    fn loads_directory() {
        let dir = crate::testing::scratch_path("events");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cons.csv"), CSV).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        let cal = EventCalendar::load(&dir, day(2025, 5, 1));
        assert_eq!(cal.len(), 3);
        assert!(EventCalendar::load(&dir.join("missing"), day(2025, 5, 1)).is_empty());
    }
}
