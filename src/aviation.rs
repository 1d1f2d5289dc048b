//! Transponder squawk codes and aviation trivia.

use crate::post::Post;
use rand::seq::SliceRandom;

pub struct Squawk {
    pub code: &'static str,
    pub name: &'static str,
    pub meaning: &'static str,
    pub emergency: bool,
}

pub static SQUAWKS: &[Squawk] = &[
    Squawk { code: "7500", name: "Hijacking", meaning: "Unlawful interference. ATC will ask you to confirm, never to explain.", emergency: true },
    Squawk { code: "7600", name: "Radio Failure", meaning: "Lost communications. Follow the last clearance and watch for light-gun signals.", emergency: true },
    Squawk { code: "7700", name: "General Emergency", meaning: "Mayday. Every ATC radar screen in range lights up.", emergency: true },
    Squawk { code: "1200", name: "VFR (US)", meaning: "Default code for VFR flight in the United States when not talking to ATC.", emergency: false },
    Squawk { code: "7000", name: "VFR (ICAO/Europe)", meaning: "Conspicuity code for VFR flight in most ICAO countries.", emergency: false },
    Squawk { code: "2000", name: "IFR Entry", meaning: "Used when entering controlled airspace from an area where no code was assigned.", emergency: false },
    Squawk { code: "7777", name: "Military Interception", meaning: "Reserved for military interceptors. Not for civil use.", emergency: false },
    Squawk { code: "0000", name: "Unassigned", meaning: "Not to be used. Some transponders treat it as a malfunction indicator.", emergency: false },
];

pub static AVIATION_TRIVIA: &[&str] = &[
    "The Wright Flyer's first flight in 1903 lasted 12 seconds and covered 120 feet, shorter than a Boeing 747's wingspan.",
    "'Mayday' comes from the French 'venez m'aider', meaning 'come help me'.",
    "ADS-B broadcasts aircraft position about twice per second, which is how flight trackers see planes without radar.",
    "The black box is actually bright orange so it can be found in wreckage.",
    "Runway numbers are the magnetic heading divided by ten: runway 27 points roughly 270 degrees.",
    "The Concorde crossed the Atlantic in under 3.5 hours, cruising at Mach 2.04.",
    "Pilots and co-pilots are often served different meals to avoid both getting food poisoning.",
    "ACARS lets aircraft send text messages over VHF radio and satellite links.",
    "The phonetic alphabet was standardised by ICAO in 1956 so 'Bravo' sounds like 'Bravo' in every accent.",
    "1090 MHz carries both Mode S transponder replies and ADS-B Extended Squitter messages.",
];

pub fn lookup(code: &str) -> Option<&'static Squawk> {
    let code = code.trim();
    SQUAWKS.iter().find(|s| s.code == code)
}

/// Squawk codes are four octal digits.
pub fn is_valid_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 4 && code.chars().all(|c| ('0'..='7').contains(&c))
}

pub fn squawk_post(code: &str) -> Post {
    match lookup(code) {
        Some(s) => Post::new(format!("✈️ Squawk {} - {}", s.code, s.name))
            .description(s.meaning)
            .color(if s.emergency { 0xE53935 } else { 0x1E88E5 })
            .footer("Use !squawk <code> to look up another code"),
        None if is_valid_code(code) => Post::new(format!("✈️ Squawk {}", code.trim()))
            .description("A discrete code assigned by ATC. Nothing special about it.")
            .color(0x607D8B),
        None => Post::new("✈️ Invalid squawk code")
            .description("Squawk codes are four digits from 0 to 7, e.g. `7700`.")
            .color(0x607D8B),
    }
}

pub fn squawk_table() -> Post {
    let lines: Vec<String> = SQUAWKS
        .iter()
        .map(|s| format!("{} **{}** {}", if s.emergency { "🚨" } else { "•" }, s.code, s.name))
        .collect();
    Post::new("✈️ Special Squawk Codes").description(lines.join("\n")).color(0x1E88E5)
}

pub fn trivia_post() -> Post {
    let fact = AVIATION_TRIVIA.choose(&mut rand::thread_rng()).copied().unwrap_or("Blue skies!");
    Post::new("✈️ Aviation Trivia")
        .description(fact)
        .color(0x0288D1)
        .footer("Use !aviation for more • !squawk <code> for transponder codes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_codes_are_red() {
        for code in ["7500", "7600", "7700"] {
            assert!(lookup(code).unwrap().emergency);
            assert_eq!(squawk_post(code).color, 0xE53935);
        }
        assert!(!lookup(" 1200 ").unwrap().emergency);
        assert_eq!(squawk_post("7000").title, "✈️ Squawk 7000 - VFR (ICAO/Europe)");
    }

    #[test]
    fn octal_validation() {
        assert!(is_valid_code("4521"));
        assert!(!is_valid_code("7800"));
        assert!(!is_valid_code("123"));
        assert_eq!(squawk_post("4521").title, "✈️ Squawk 4521");
        assert_eq!(squawk_post("9999").title, "✈️ Invalid squawk code");
    }

    #[test]
    fn table_lists_every_code() {
        let table = squawk_table();
        let body = table.description.unwrap();
        assert_eq!(body.lines().count(), SQUAWKS.len());
        assert!(body.contains("🚨 **7700**"));
    }
}
