//! Fortune cookies, the patch gremlin and random man pages.

use crate::post::Post;
use rand::seq::SliceRandom;

// ═══════════════════════════════════════════════════════════════════
// DATA
// ═══════════════════════════════════════════════════════════════════

/// (text, sarcastic)
pub static FORTUNES: &[(&str, bool)] = &[
    ("Your password is strong. So strong that even you can't remember it.", true),
    ("Remember: The 'S' in IoT stands for Security.", true),
    ("The cloud is just someone else's computer. And they're probably as bad at security as you are.", true),
    ("Don't worry about that certificate error. What's the worst that could happen?", true),
    ("Security through obscurity works great. Until someone Googles it.", true),
    ("chmod 777 solves all permission problems and creates exciting new security problems!", true),
    ("Your JWT secret is 'secret'. At least it's honest.", true),
    ("There are two types of companies: those that have been hacked, and those that don't know they've been hacked.", false),
    ("Security is always excessive until it's not enough. - Robbie Sinclair", false),
    ("Assume breach. It's not paranoia if they're really out to get you.", false),
    ("A backup is only as good as its last successful restore.", false),
    ("Zero trust: Verify everything, trust nothing.", false),
    ("The OWASP Top 10 is a starting point, not a finishing line.", false),
];

/// (message, chaos 1..=5)
pub static GREMLINS: &[(&str, u8)] = &[
    ("🧌 PATCH GREMLIN SAYS: Automatic updates are disabled. Living on the edge, I see.", 3),
    ("🧌 PATCH GREMLIN SAYS: That npm package hasn't been updated in 4 years. It's fine. Everything is fine.", 3),
    ("🧌 PATCH GREMLIN SAYS: Your dependencies have dependencies that have vulnerabilities.", 4),
    ("🧌 PATCH GREMLIN SAYS: Log4Shell called. It wants to know why you still haven't patched.", 5),
    ("🧌 PATCH GREMLIN SAYS: 'yum update' or 'dnf upgrade'? The real question is: will you run either?", 2),
    ("🧌 Patch Gremlin reminder: Reboot after kernel updates. Your uptime badge isn't worth a breach.", 2),
    ("🧌 Patch Gremlin reminder: sudo apt update && sudo apt upgrade - Make it a habit!", 1),
    ("🧌 Patch Gremlin reminder: Test patches in dev before production. But DO patch production.", 1),
];

/// (command, description, danger 1..=5)
pub static COMMANDS: &[(&str, &str, u8)] = &[
    (":(){ :|:& };:", "Fork bomb. DO NOT RUN THIS. It will crash your system.", 5),
    ("sudo rm -rf / --no-preserve-root", "The nuclear option, with the safety off. Seriously, don't.", 5),
    ("mkfs.ext4 /dev/sda", "Format your main drive. Hope you backed up... you didn't, did you?", 5),
    ("rm -rf directory/", "Recursively delete a directory. Use with caution!", 3),
    ("rsync -avz --delete source/ dest/", "Sync directories, deleting files in dest that aren't in source.", 3),
    ("sudo !!", "Forgot sudo? This runs your last command with sudo. Time saver!", 2),
    ("tail -f /var/log/syslog", "Watch logs in real-time. Perfect for debugging or pretending to work.", 1),
    ("tar -xzf archive.tar.gz", "Extract a gzipped tarball. Memorize this, you'll use it forever.", 1),
    ("find . -type f -size +100M", "Find files larger than 100MB. Hunt down the space hogs.", 1),
    ("curl parrot.live", "Watch a dancing parrot in your terminal. Essential system administration.", 1),
];

// ═══════════════════════════════════════════════════════════════════
// EMBEDS
// ═══════════════════════════════════════════════════════════════════

pub fn fortune_post(text: &str, sarcastic: bool) -> Post {
    let (title, color) = if sarcastic { ("🍪 Sarcastic Wisdom", 0xFF6B6B) } else { ("🔐 Real Wisdom", 0x4ECDC4) };
    Post::new(title)
        .description(text)
        .color(color)
        .footer("Cyber Fortune Cookie • Use !fortune for more wisdom")
}

pub fn chaos_color(chaos: u8) -> u32 {
    match chaos {
        c if c >= 4 => 0xFF1744,
        3 => 0xFF6F00,
        2 => 0xFFD600,
        _ => 0x00E676,
    }
}

pub fn gremlin_post(message: &str, chaos: u8) -> Post {
    Post::new("🧌 Patch Gremlin Alert")
        .description(message)
        .color(chaos_color(chaos))
        .footer(format!("Chaos Level: {} • Use !patchgremlin for more reminders", "🔥".repeat(chaos as usize)))
}

/// (colour, emoji) for a danger level.
pub fn danger_style(danger: u8) -> (u32, &'static str) {
    match danger {
        d if d >= 4 => (0xFF0000, "☠️"),
        3 => (0xFF6B00, "⚠️"),
        _ => (0x00D166, "✅"),
    }
}

pub fn manpage_post(cmd: &str, desc: &str, danger: u8) -> Post {
    let (color, emoji) = danger_style(danger);
    let mut post = Post::new(format!("{emoji} Random Linux Command"))
        .color(color)
        .field("Command", format!("`{cmd}`"), false)
        .field("Description", desc, false);
    if danger >= 4 {
        post = post.field(
            "⚠️ WARNING ⚠️",
            "This command is dangerous! Do NOT run it unless you know exactly what you're doing!",
            false,
        );
    }
    post.footer("man page • Use !manpage for more commands")
}

pub fn random_fortune() -> Post {
    let (text, sarcastic) = FORTUNES.choose(&mut rand::thread_rng()).copied().unwrap_or(("Patch early, patch often.", false));
    fortune_post(text, sarcastic)
}

pub fn random_gremlin() -> Post {
    let (msg, chaos) = GREMLINS.choose(&mut rand::thread_rng()).copied().unwrap_or(("🧌 Patch today.", 1));
    gremlin_post(msg, chaos)
}

pub fn random_manpage() -> Post {
    let (cmd, desc, danger) = COMMANDS.choose(&mut rand::thread_rng()).copied().unwrap_or(("man man", "Read the manual.", 1));
    manpage_post(cmd, desc, danger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fortune_styles() {
        let s = fortune_post("x", true);
        assert_eq!((s.title.as_str(), s.color), ("🍪 Sarcastic Wisdom", 0xFF6B6B));
        let r = fortune_post("x", false);
        assert_eq!((r.title.as_str(), r.color), ("🔐 Real Wisdom", 0x4ECDC4));
    }

    #[test]
    fn gremlin_chaos_meter() {
        assert_eq!(chaos_color(5), 0xFF1744);
        assert_eq!(chaos_color(3), 0xFF6F00);
        assert_eq!(chaos_color(2), 0xFFD600);
        assert_eq!(chaos_color(1), 0x00E676);
        let post = gremlin_post("m", 3);
        assert!(post.footer.unwrap().starts_with("Chaos Level: 🔥🔥🔥 "));
    }

    #[test]
    fn dangerous_commands_carry_a_warning() {
        assert_eq!(manpage_post("rm -rf /", "no", 5).fields.len(), 3);
        assert_eq!(manpage_post("ls", "list", 1).fields.len(), 2);
        assert_eq!(danger_style(3), (0xFF6B00, "⚠️"));
        assert!(manpage_post("ls", "list", 1).title.starts_with("✅"));
    }

    #[test]
    fn random_picks_come_from_tables() {
        let f = random_fortune();
        assert!(FORTUNES.iter().any(|(t, _)| f.description.as_deref() == Some(*t)));
        assert!(GREMLINS.iter().all(|(_, c)| (1..=5).contains(c)));
        assert!(random_manpage().fields[0].value.starts_with('`'));
        assert_eq!(random_gremlin().title, "🧌 Patch Gremlin Alert");
    }
}
