//! HAM radio trivia, band facts and NOAA space-weather propagation reports.

use crate::consts::endpoints;
use crate::fetcher::FetchError;
use crate::post::Post;
use chrono::{DateTime, Timelike, Utc};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════════
// TRIVIA
// ═══════════════════════════════════════════════════════════════════

/// (category, fact)
pub static HAM_TRIVIA: &[(&str, &str)] = &[
    ("History", "The first transatlantic radio transmission was made by Guglielmo Marconi in 1901 from Cornwall to Newfoundland."),
    ("Propagation", "HF propagation relies on the ionosphere, layers of charged particles 60-600km above Earth."),
    ("Propagation", "The 'gray line' is the best time for DX: the terminator between day and night crosses your signal path."),
    ("Space Weather", "Solar flares can cause radio blackouts by increasing D-layer absorption of HF signals."),
    ("Space Weather", "The K-index measures geomagnetic activity: 0-1 is calm, 5+ means poor HF conditions but possible aurora!"),
    ("Space Weather", "Solar Flux Index (SFI) above 150 means excellent HF conditions. Below 70 means only low bands work well."),
    ("Bands", "10 meters (28 MHz) opens up during solar maximum, providing worldwide communication on low power."),
    ("Bands", "2 meters (144 MHz) and 70cm (440 MHz) are the most popular VHF/UHF bands for local communication."),
    ("Modes", "FT8 revolutionized weak-signal communication: contacts are possible at -20dB signal-to-noise ratio."),
    ("Modes", "CW (Morse code) is still the most efficient mode, working when everything else fails."),
    ("Digital", "Winlink provides email over radio, crucial for emergency communications when internet is down."),
    ("Antennas", "Your antenna is MORE important than your radio. A dipole in the clear beats a beam in the trees."),
    ("Antennas", "SWR (Standing Wave Ratio) measures antenna efficiency. Under 1.5:1 is great, under 2:1 is acceptable."),
    ("Satellites", "The International Space Station has a ham radio station. Astronauts regularly make contacts!"),
    ("Operating", "QRP means low power operation, typically 5W or less. Some hams make worldwide contacts on 1W!"),
    ("Codes", "The term '73' means 'best regards' in ham radio. '88' means 'love and kisses'."),
    ("Awards", "DXCC (DX Century Club) awards require confirmed contacts with 100+ countries."),
    ("Events", "Field Day is ham radio's biggest event: 24 hours of emergency preparedness training disguised as fun."),
    ("Organizations", "ARRL is the American Radio Relay League, the main organization for US amateur radio since 1914."),
    ("Safety", "Lightning can induce thousands of volts in your antenna. Always ground and disconnect during storms!"),
    ("Technology", "Software Defined Radio (SDR) uses digital signal processing instead of analog circuits."),
];

pub fn category_color(category: &str) -> u32 {
    match category {
        "History" => 0x8B4513,
        "Propagation" => 0x1E88E5,
        "Space Weather" => 0xFF6F00,
        "Bands" => 0x43A047,
        "Modes" => 0x5E35B1,
        "Digital" => 0x00ACC1,
        "Antennas" => 0xFDD835,
        "Satellites" => 0x3949AB,
        "Operating" => 0x00897B,
        "Codes" => 0x6D4C41,
        "Awards" => 0xFFB300,
        "Events" => 0xE53935,
        "Organizations" => 0x1976D2,
        "Safety" => 0xD32F2F,
        "Technology" => 0x7B1FA2,
        _ => 0x607D8B,
    }
}

pub struct Band {
    pub freq: &'static str,
    pub desc: &'static str,
    pub propagation: &'static str,
}

pub static BANDS: &[Band] = &[
    Band { freq: "160m (1.8 MHz)", desc: "The 'top band': nighttime only, great for ragchewing. Requires large antennas.", propagation: "Ground wave and skywave at night" },
    Band { freq: "80m (3.5 MHz)", desc: "Workhorse band for regional nighttime contacts. Very popular for nets.", propagation: "200-500 miles at night via skywave" },
    Band { freq: "40m (7 MHz)", desc: "Works day and night, short to medium range. Most reliable all-around band.", propagation: "Day: 500 miles, Night: 2000+ miles" },
    Band { freq: "30m (10 MHz)", desc: "CW and digital only, no voice. Excellent for long distance with low power.", propagation: "Worldwide propagation often possible" },
    Band { freq: "20m (14 MHz)", desc: "The DX band! Worldwide contacts during the day. Most popular band.", propagation: "Worldwide during daylight hours" },
    Band { freq: "15m (21 MHz)", desc: "Opens during solar maximum, dead during minimum. Feast or famine!", propagation: "Worldwide when open, depends on solar cycle" },
    Band { freq: "10m (28 MHz)", desc: "The 'magic band': incredible DX when open, dead when closed.", propagation: "Can support worldwide FM simplex!" },
    Band { freq: "6m (50 MHz)", desc: "The 'magic band' of VHF. Sporadic E propagation in summer means surprise DX.", propagation: "Usually line of sight, but can skip 1000+ miles" },
    Band { freq: "2m (144 MHz)", desc: "Most popular VHF band. Repeaters, FM simplex, SSB weak signal work.", propagation: "Line of sight, occasional tropo and meteor scatter" },
    Band { freq: "70cm (440 MHz)", desc: "Popular UHF band. Great for small antennas and local communication.", propagation: "Line of sight, good for urban areas" },
];

pub fn trivia_post() -> Post {
    let (category, fact) = HAM_TRIVIA
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(("Codes", "73!"));
    Post::new(format!("📻 HAM Radio Trivia - {category}"))
        .description(fact)
        .color(category_color(category))
        .footer("73! • Use !hamradio for more • !propagation for current conditions")
}

pub fn band_post() -> Option<Post> {
    let band = BANDS.choose(&mut rand::thread_rng())?;
    Some(
        Post::new(format!("📡 Frequency Band: {}", band.freq))
            .description(band.desc)
            .color(0x43A047)
            .field("Propagation", band.propagation, false)
            .footer("73! • Use !frequency for more bands"),
    )
}

// ═══════════════════════════════════════════════════════════════════
// SOLAR REPORT
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct SolarReport {
    pub radio_blackout: Option<u8>,
    pub radiation: Option<u8>,
    pub geomagnetic: Option<u8>,
    pub solar_flux: Option<u32>,
    pub k_index: Option<f64>,
    pub observed: DateTime<Utc>,
}

fn scale_label(prefix: char, value: Option<u8>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{prefix}{v}"))
}

fn scale_state(value: Option<u8>, calm: &str, bad: &str) -> String {
    match value {
        Some(0) => format!("✅ {calm}"),
        Some(_) => format!("⚠️ {bad}"),
        None => "N/A".to_string(),
    }
}

impl SolarReport {
    /// A ≈ K² × 3.3, from the integer part of K.
    pub fn a_index(&self) -> Option<u32> {
        self.k_index.map(|k| {
            let k = k.trunc().max(0.0);
            (k * k * 3.3).floor() as u32
        })
    }

    /// No radio blackout and at most a minor geomagnetic storm.
    pub fn conditions_good(&self) -> bool {
        self.radio_blackout.unwrap_or(0) == 0 && self.geomagnetic.unwrap_or(0) <= 1
    }

    pub fn hf_assessment(&self) -> Option<String> {
        let flux = self.solar_flux?;
        let mut text = if flux > 150 {
            "🟢 **Excellent HF Conditions**".to_string()
        } else if flux > 100 {
            "🟡 **Good HF Conditions**".to_string()
        } else {
            "🟠 **Fair HF Conditions**".to_string()
        };
        if self.k_index.is_some_and(|k| k >= 5.0) {
            text.push_str("\n⚠️ High K-index may degrade propagation");
        }
        Some(text)
    }

    pub fn best_bands(&self) -> &'static str {
        if (12..=22).contains(&self.observed.hour()) {
            "**Best Now (Day):** 20m, 17m, 15m, 40m"
        } else {
            "**Best Now (Night):** 80m, 40m, 30m"
        }
    }

    fn band_predictions(&self) -> Vec<&'static str> {
        let good = self.conditions_good();
        let sfi = self.solar_flux.unwrap_or(100);
        let mut out = vec![
            "**160m:** 🟢 Good (Night) - Regional/DX after dark",
            "**80m:** 🟢 Excellent (Night) - Reliable day/night",
            "**40m:** 🟢 Excellent - Works day and night",
        ];
        out.push(if good && sfi > 80 {
            "**30m:** 🟢 Good - Digital modes DX possible"
        } else {
            "**30m:** 🟡 Fair - Try CW/digital for best results"
        });
        out.push(if good && sfi > 100 {
            "**20m:** 🟢 Excellent - Worldwide DX open!"
        } else if sfi > 80 {
            "**20m:** 🟡 Fair - DX possible with patience"
        } else {
            "**20m:** 🟡 Fair - Limited to regional"
        });
        out.push(if good && sfi > 120 {
            "**15m:** 🟢 Good - Long path DX possible"
        } else if sfi > 90 {
            "**15m:** 🟡 Fair - Check for openings"
        } else {
            "**15m:** 🔴 Poor - Likely closed"
        });
        out.push(if good && sfi > 150 {
            "**10m:** 🟢 Good - Magic band is open!"
        } else if sfi > 120 {
            "**10m:** 🟡 Fair - Possible short openings"
        } else {
            "**10m:** 🔴 Poor - Closed, try WSPR"
        });
        out.push("**6m:** 🟡 Check for Sporadic-E (summer) or aurora");
        out
    }

    fn recommendations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.radio_blackout.is_some_and(|r| r > 0) {
            out.push("⚠️ **Radio Blackout Active:** Expect HF absorption, especially on higher frequencies");
        }
        if let Some(g) = self.geomagnetic.filter(|g| *g > 0) {
            if g >= 3 {
                out.push("🌈 **Aurora Possible!** Check 6m/2m for aurora propagation");
            }
            out.push("💡 **Tip:** Lower bands (80m/40m) handle storms better");
        }
        match self.solar_flux {
            Some(f) if f > 150 => out.push("🎉 **Excellent Solar Flux!** Higher bands (15m/10m) should be wide open"),
            Some(f) if f < 80 => out.push("💡 **Low Solar Flux:** Stick to 40m/80m for best results"),
            _ => {}
        }
        if self.conditions_good() {
            out.push("✅ **Great Conditions Overall:** Good time for DX hunting on 20m!");
        }
        if out.is_empty() {
            out.push("📡 **Normal Conditions:** Standard band behavior expected");
        }
        out
    }

    fn indices(&self) -> (String, String, String) {
        let na = || "N/A".to_string();
        (
            self.solar_flux.map_or_else(na, |f| f.to_string()),
            self.a_index().map_or_else(na, |a| a.to_string()),
            self.k_index.map_or_else(na, |k| format!("{k}")),
        )
    }

    /// Full report for the `solar` / `propagation` commands.
    pub fn post(&self) -> Post {
        let (sfi, a, k) = self.indices();
        Post::new("☀️ Solar Weather Report")
            .description(format!(
                "Comprehensive propagation forecast • {} UTC",
                self.observed.format("%Y-%m-%d %H:%M")
            ))
            .color(if self.conditions_good() { 0xFF9800 } else { 0xF44336 })
            .field(
                "📊 Solar Indices",
                format!("**Solar Flux (SFI):** {sfi}\n**A-index:** {a}\n**K-index:** {k}\n*SFI >150=Excellent, 70-150=Good, <70=Poor*"),
                false,
            )
            .field(
                "⚡ Radio Blackout",
                format!("**{}** (R0-R5)\n{}", scale_label('R', self.radio_blackout), scale_state(self.radio_blackout, "Clear", "Degraded")),
                true,
            )
            .field(
                "☀️ Solar Radiation",
                format!("**{}** (S0-S5)\n{}", scale_label('S', self.radiation), scale_state(self.radiation, "Normal", "Elevated")),
                true,
            )
            .field(
                "🧲 Geomagnetic Storm",
                format!("**{}** (G0-G5)\n{}", scale_label('G', self.geomagnetic), scale_state(self.geomagnetic, "Calm", "Disturbed")),
                true,
            )
            .field("📻 Band Conditions (HF)", self.band_predictions().join("\n"), false)
            .field("💡 Operating Recommendations", self.recommendations().join("\n"), false)
            .field(
                "🕐 Time-Based Suggestion",
                format!("{}\n*Gray line propagation may enhance any band!*", self.best_bands()),
                false,
            )
            .footer("73 de Penguin Overlord! • Data from NOAA SWPC • !propagation for simple view")
    }

    /// Compact 12-hour update for the auto-poster.
    pub fn update_post(&self) -> Post {
        let (sfi, _, k) = self.indices();
        let mut post = Post::new("📡 Solar & Propagation Update")
            .description("*Automatic 12-hour update for radio operators*")
            .color(0x1E88E5)
            .field("☀️ Solar Flux Index (SFI)", format!("**{sfi}** sfu"), true)
            .field("🧲 K-Index", format!("**{k}**"), true)
            .stamped();
        if let Some(assessment) = self.hf_assessment() {
            post = post.field("📊 Overall Assessment", assessment, false);
        }
        post.field("📻 Recommended Bands", self.best_bands(), false)
            .footer("73 de Penguin Overlord! • Use /solar for detailed info • Posts every 12 hours")
    }
}

pub struct NoaaClient {
    client: Client,
    scales_url: String,
    flux_url: String,
    k_url: String,
}

impl NoaaClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            scales_url: endpoints::NOAA_SCALES.to_string(),
            flux_url: endpoints::NOAA_FLUX.to_string(),
            k_url: endpoints::NOAA_K_INDEX.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base(client: Client, base: &str) -> Self {
        Self {
            client,
            scales_url: format!("{base}/scales"),
            flux_url: format!("{base}/flux"),
            k_url: format!("{base}/k"),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status().as_u16()));
        }
        Ok(res.json().await?)
    }

    /// Scales are required; flux and K-index degrade to "N/A".
    pub async fn report(&self) -> Result<SolarReport, FetchError> {
        let (scales, flux, k) = tokio::join!(
            self.get_json(&self.scales_url),
            self.get_json(&self.flux_url),
            self.get_json(&self.k_url),
        );
        let (r, s, g) = parse_scales(&scales?);
        let solar_flux = flux
            .map_err(|e| log::warn!("NOAA flux unavailable: {}", e))
            .ok()
            .and_then(|v| parse_flux(&v));
        let k_index = k
            .map_err(|e| log::warn!("NOAA K-index unavailable: {}", e))
            .ok()
            .and_then(|v| parse_k_index(&v));
        Ok(SolarReport {
            radio_blackout: r,
            radiation: s,
            geomagnetic: g,
            solar_flux,
            k_index,
            observed: Utc::now(),
        })
    }
}

fn scale_value(v: &Value) -> Option<u8> {
    match v {
        Value::String(s) => s.trim().trim_start_matches(['R', 'S', 'G']).parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    }
}

fn parse_scales(body: &Value) -> (Option<u8>, Option<u8>, Option<u8>) {
    let now = &body["0"];
    (
        scale_value(&now["R"]["Scale"]),
        scale_value(&now["S"]["Scale"]),
        scale_value(&now["G"]["Scale"]),
    )
}

fn number(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Latest "Noon" reading, else the latest reading.
fn parse_flux(body: &Value) -> Option<u32> {
    let entries = body.as_array()?;
    entries
        .iter()
        .rev()
        .find(|e| e["reporting_schedule"] == "Noon")
        .or_else(|| entries.last())
        .and_then(|e| number(&e["flux"]))
        .map(|f| f.trunc() as u32)
}

fn parse_k_index(body: &Value) -> Option<f64> {
    body.as_array()?.last().and_then(|e| number(&e["kp_index"]))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarState {
    pub last_posted: Option<DateTime<Utc>>,
    pub channel_id: Option<u64>,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, serve, Canned};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn report(r: Option<u8>, g: Option<u8>, sfi: Option<u32>, k: Option<f64>, hour: u32) -> SolarReport {
        SolarReport {
            radio_blackout: r,
            radiation: Some(0),
            geomagnetic: g,
            solar_flux: sfi,
            k_index: k,
            observed: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn a_index_from_k() {
        assert_eq!(report(None, None, None, Some(3.0), 0).a_index(), Some(29));
        assert_eq!(report(None, None, None, Some(2.67), 0).a_index(), Some(13));
        assert_eq!(report(None, None, None, None, 0).a_index(), None);
    }

    #[test]
    fn conditions_and_colour() {
        assert!(report(Some(0), Some(1), Some(120), Some(2.0), 0).conditions_good());
        assert!(report(None, None, None, None, 0).conditions_good());
        assert!(!report(Some(2), Some(0), Some(120), None, 0).conditions_good());
        assert!(!report(Some(0), Some(3), Some(120), None, 0).conditions_good());
        assert_eq!(report(Some(2), Some(0), None, None, 0).post().color, 0xF44336);
        assert_eq!(report(Some(0), Some(0), None, None, 0).post().color, 0xFF9800);
    }

    #[test]
    fn hf_assessment_thresholds() {
        let a = |sfi, k| report(None, None, Some(sfi), Some(k), 0).hf_assessment().unwrap();
        assert!(a(151, 1.0).contains("Excellent"));
        assert!(a(150, 1.0).contains("Good"));
        assert!(a(100, 1.0).contains("Fair"));
        assert!(a(120, 5.0).contains("High K-index"));
        assert!(report(None, None, None, None, 0).hf_assessment().is_none());
    }

    #[test]
    fn best_bands_by_utc_hour() {
        assert!(report(None, None, None, None, 12).best_bands().contains("20m, 17m, 15m, 40m"));
        assert!(report(None, None, None, None, 22).best_bands().contains("Day"));
        assert!(report(None, None, None, None, 23).best_bands().contains("80m, 40m, 30m"));
        assert!(report(None, None, None, None, 3).best_bands().contains("Night"));
    }

    #[test]
    fn parses_noaa_payloads() {
        let scales = json!({"-1": {"R": {"Scale": "3"}}, "0": {"R": {"Scale": "0"}, "S": {"Scale": "1"}, "G": {"Scale": null}}});
        assert_eq!(parse_scales(&scales), (Some(0), Some(1), None));

        let flux = json!([
            {"flux": 140.2, "reporting_schedule": "Noon"},
            {"flux": 151.0, "reporting_schedule": "Afternoon"}
        ]);
        assert_eq!(parse_flux(&flux), Some(140));
        assert_eq!(parse_flux(&json!([{"flux": "99.9"}])), Some(99));

        let k = json!([{"kp_index": 1}, {"kp_index": 4}]);
        assert_eq!(parse_k_index(&k), Some(4.0));
    }

    #[tokio::test]
    async fn report_survives_missing_flux() {
        let server = serve(
            Duration::ZERO,
            Arc::new(|req: &str| {
                if req.starts_with("GET /scales ") {
                    Canned::ok(r#"{"0":{"R":{"Scale":"0"},"S":{"Scale":"0"},"G":{"Scale":"1"}}}"#)
                } else if req.starts_with("GET /k ") {
                    Canned::ok(r#"[{"kp_index":2}]"#)
                } else {
                    Canned::status(500)
                }
            }),
        )
        .await;
        let noaa = NoaaClient::with_base(client(), &server.base);
        let r = noaa.report().await.unwrap();
        assert_eq!(r.geomagnetic, Some(1));
        assert_eq!(r.solar_flux, None);
        assert_eq!(r.k_index, Some(2.0));
        assert_eq!(r.a_index(), Some(13));
    }

    #[test]
    fn trivia_uses_category_colour() {
        let post = trivia_post();
        let category = post.title.trim_start_matches("📻 HAM Radio Trivia - ");
        assert_eq!(post.color, category_color(category));
        assert!(band_post().is_some());
    }
}
