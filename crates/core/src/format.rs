//! Chat-message renderings of a voyage log.

use voyagelog_settings::ContentPreferences;

use crate::log::{format_list, DiveEntry, LogEntry, LogMode, Outcome};

/// 可用的訊息格式。 / Registered chat-message layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageFormat {
    /// Plain sectioned layout.
    #[default]
    Standard,
    /// Markdown headings, loot with thousands separators, dive statistics.
    Trigs,
}

const SUPPORTED_TAGS: [&str; 2] = ["Standard", "Trigs"];

impl MessageFormat {
    /// Resolves a stored tag; unknown tags fall back to [`MessageFormat::Standard`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "Trigs" => MessageFormat::Trigs,
            _ => MessageFormat::Standard,
        }
    }

    pub fn supported_tags() -> &'static [&'static str] {
        &SUPPORTED_TAGS
    }

    pub fn tag(self) -> &'static str {
        match self {
            MessageFormat::Standard => "Standard",
            MessageFormat::Trigs => "Trigs",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MessageFormat::Standard => "Standard",
            MessageFormat::Trigs => "Trig's Format",
        }
    }

    pub fn format_message(self, entry: &LogEntry, content: &ContentPreferences) -> String {
        match self {
            MessageFormat::Standard => standard(entry, content),
            MessageFormat::Trigs => match entry.mode {
                LogMode::Patrol => trigs_patrol(entry, content),
                LogMode::Skirmish => trigs_skirmish(entry),
            },
        }
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn standard(entry: &LogEntry, content: &ContentPreferences) -> String {
    let body_fallback = match entry.mode {
        LogMode::Patrol => "Patrol details here",
        LogMode::Skirmish => "Skirmish details here",
    };
    let common = [
        or_default(&entry.title, "Title here"),
        "",
        or_default(&entry.body, body_fallback),
        "",
    ]
    .join("\n");

    let mut sections: Vec<String> = Vec::new();
    match entry.mode {
        LogMode::Patrol => {
            if content.enable_events && !entry.events.is_empty() {
                sections.extend(["Events:".to_string(), entry.events.clone(), String::new()]);
            }
            sections.push(format!("Gold: {}", or_default(&entry.gold, "0")));
            sections.push(format!("Doubloons: {}", or_default(&entry.doubloons, "0")));
            sections.push(String::new());
        }
        LogMode::Skirmish => {
            let dives = if entry.dives.is_empty() {
                "No dives yet".to_string()
            } else {
                entry
                    .dives
                    .iter()
                    .enumerate()
                    .map(|(index, dive)| standard_dive(index, dive))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            sections.extend([
                String::new(),
                format!("Team: {}", entry.our_team),
                String::new(),
                "Dives:".to_string(),
                dives,
                String::new(),
            ]);
        }
    }
    if content.enable_crew && !entry.crew.is_empty() {
        sections.extend(["Crew:".to_string(), entry.crew.clone(), String::new()]);
    }

    let signature = format!("Signed:\n{}", or_default(&entry.signature, "Your Signature"));
    [common, sections.join("\n"), signature]
        .join("\n")
        .trim()
        .to_string()
}

fn standard_dive(index: usize, dive: &DiveEntry) -> String {
    let notes = if dive.notes.is_empty() {
        String::new()
    } else {
        format!(" - {}", dive.notes)
    };
    format!(
        "{}. {} {} vs. {} {} [{}]{}",
        index + 1,
        dive.our_team,
        dive.our_team.emoji(),
        dive.enemy_team,
        dive.enemy_team.emoji(),
        dive.outcome,
        notes
    )
}

fn trigs_patrol(entry: &LogEntry, content: &ContentPreferences) -> String {
    let mut lines: Vec<String> = vec![or_default(&entry.title, "Official Patrol Report").to_string()];
    lines.push(String::new());
    if !entry.body.is_empty() {
        lines.push(entry.body.clone());
        lines.push(String::new());
    }
    if content.enable_events && !entry.events.is_empty() {
        lines.push("**Events:**".to_string());
        lines.extend(format_list(&entry.events).into_iter().map(str::to_string));
        lines.push(String::new());
    }
    lines.push("**Loot Confiscated:**".to_string());
    lines.push(format!(":Gold: Gold: {}", format_amount(&entry.gold)));
    lines.push(format!(":Doubloons: Doubloons: {}", format_amount(&entry.doubloons)));
    lines.push(String::new());
    if content.enable_crew && !entry.crew.is_empty() {
        lines.push("**Crew:**".to_string());
        lines.extend(format_list(&entry.crew).into_iter().map(str::to_string));
        lines.push(String::new());
    }
    if !entry.signature.is_empty() {
        lines.push("**CO Notes:**".to_string());
        lines.push(entry.signature.clone());
    }
    lines.join("\n")
}

fn trigs_skirmish(entry: &LogEntry) -> String {
    let mut lines: Vec<String> = vec![or_default(&entry.title, "Official Skirmish Log").to_string()];
    lines.push(String::new());
    if !entry.body.is_empty() {
        lines.push(entry.body.clone());
        lines.push(String::new());
    }
    lines.push("**Dives:**".to_string());
    if entry.dives.is_empty() {
        lines.push("No dives recorded".to_string());
    } else {
        for (index, dive) in entry.dives.iter().enumerate() {
            let result = match dive.outcome {
                Outcome::Win => "❤️‍🔥 (win)",
                Outcome::Loss => "❤️‍🩹 (loss)",
            };
            lines.push(format!(
                "{}. {} vs {} {}",
                index + 1,
                dive.our_team.emoji(),
                dive.enemy_team.emoji(),
                result
            ));
            if !dive.notes.is_empty() {
                lines.push(format!("> {}", dive.notes));
            }
        }

        let stats = DiveStats::from_dives(&entry.dives);
        lines.push(String::new());
        lines.push("**Events:**".to_string());
        lines.push(format!(
            "🏆 Win/Loss: {}/{} ({:.1}%)",
            stats.wins,
            stats.losses,
            stats.win_rate()
        ));
        lines.push(format!("🔥 Highest Streak: {}", stats.highest_streak));
    }
    if !entry.signature.is_empty() {
        lines.push(String::new());
        lines.push("**CO Notes:**".to_string());
        lines.push(entry.signature.clone());
    }
    lines.join("\n")
}

/// Win/loss tallies over a skirmish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiveStats {
    pub wins: usize,
    pub losses: usize,
    pub highest_streak: usize,
}

impl DiveStats {
    pub fn from_dives(dives: &[DiveEntry]) -> Self {
        let mut stats = DiveStats::default();
        let mut streak = 0;
        for dive in dives {
            match dive.outcome {
                Outcome::Win => {
                    stats.wins += 1;
                    streak += 1;
                    stats.highest_streak = stats.highest_streak.max(streak);
                }
                Outcome::Loss => {
                    stats.losses += 1;
                    streak = 0;
                }
            }
        }
        stats
    }

    pub fn win_rate(&self) -> f64 {
        let total = self.wins + self.losses;
        if total == 0 {
            return 0.0;
        }
        self.wins as f64 * 100.0 / total as f64
    }
}

/// Formats a loot amount with thousands separators; unparsable input counts as zero.
fn format_amount(raw: &str) -> String {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0);
    let negative = value < 0.0;
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc() as u64;
    let fraction = format!("{:.3}", rounded.fract());
    let fraction = fraction.trim_start_matches('0').trim_end_matches('0');
    let fraction = if fraction == "." { "" } else { fraction };

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, ch) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if negative && (whole > 0 || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Team;

    fn patrol() -> LogEntry {
        let mut entry = LogEntry::default();
        entry.load_testing_data();
        entry
    }

    fn skirmish() -> LogEntry {
        let mut entry = LogEntry {
            mode: LogMode::Skirmish,
            ..LogEntry::default()
        };
        entry.load_testing_data();
        entry
    }

    #[test]
    fn unknown_tags_fall_back_to_standard() {
        assert_eq!(MessageFormat::from_tag("Trigs"), MessageFormat::Trigs);
        assert_eq!(MessageFormat::from_tag("Saber"), MessageFormat::Standard);
        assert_eq!(MessageFormat::from_tag(""), MessageFormat::Standard);
        assert_eq!(MessageFormat::supported_tags(), &["Standard", "Trigs"]);
    }

    #[test]
    fn standard_patrol_message() {
        let message =
            MessageFormat::Standard.format_message(&patrol(), &ContentPreferences::default());
        assert_eq!(
            message,
            "Test Patrol Title\n\nSample patrol log entry...\n\n\
             Events:\nEvent 1\nEvent 2\nEvent 3\n\n\
             Gold: 1000\nDoubloons: 300\n\n\
             Crew:\nCrew 1\nCrew 2\nCrew 3\n\n\
             Signed:\nCapt. Test"
        );
    }

    #[test]
    fn standard_empty_entry_uses_placeholders() {
        let content = ContentPreferences {
            enable_events: false,
            ..ContentPreferences::default()
        };
        let message = MessageFormat::Standard.format_message(&LogEntry::default(), &content);
        assert_eq!(
            message,
            "Title here\n\nPatrol details here\n\nGold: 0\nDoubloons: 0\n\nSigned:\nYour Signature"
        );
    }

    #[test]
    fn standard_skirmish_lists_dives() {
        let message =
            MessageFormat::Standard.format_message(&skirmish(), &ContentPreferences::default());
        assert!(message.contains("Team: Athena\n\nDives:\n"));
        assert!(message.contains(
            "1. Athena :Athena: vs. Reaper :Reaper: [loss] - Stamp Leader, they had 10 flags..."
        ));
        assert!(message.contains("2. Athena :Athena: vs. Reaper :Reaper: [win] - Second match, big win"));
        assert!(message.ends_with("Signed:\nCapt. Test"));
    }

    #[test]
    fn trigs_patrol_groups_loot() {
        let mut entry = patrol();
        entry.gold = "12500".into();
        entry.doubloons = "lots".into();
        let message = MessageFormat::Trigs.format_message(&entry, &ContentPreferences::default());
        assert!(message.starts_with("Test Patrol Title\n\nSample patrol log entry...\n\n**Events:**\nEvent 1"));
        assert!(message.contains("**Loot Confiscated:**\n:Gold: Gold: 12,500\n:Doubloons: Doubloons: 0\n"));
        assert!(message.ends_with("**CO Notes:**\nCapt. Test"));
    }

    #[test]
    fn trigs_skirmish_reports_streaks() {
        let mut entry = skirmish();
        entry.dives.push(DiveEntry {
            our_team: Team::Athena,
            enemy_team: Team::Reaper,
            outcome: Outcome::Win,
            notes: String::new(),
        });
        let message = MessageFormat::Trigs.format_message(&entry, &ContentPreferences::default());
        assert!(message.contains("1. :Athena: vs :Reaper: ❤️‍🩹 (loss)\n> Stamp Leader"));
        assert!(message.contains("🏆 Win/Loss: 2/1 (66.7%)"));
        assert!(message.contains("🔥 Highest Streak: 2"));
    }

    #[test]
    fn trigs_skirmish_without_dives() {
        let entry = LogEntry {
            mode: LogMode::Skirmish,
            ..LogEntry::default()
        };
        let message = MessageFormat::Trigs.format_message(&entry, &ContentPreferences::default());
        assert_eq!(message, "Official Skirmish Log\n\n**Dives:**\nNo dives recorded");
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount("0"), "0");
        assert_eq!(format_amount("999"), "999");
        assert_eq!(format_amount("1000"), "1,000");
        assert_eq!(format_amount(" 1234567 "), "1,234,567");
        assert_eq!(format_amount("12.5"), "12.5");
        assert_eq!(format_amount("-4000"), "-4,000");
        assert_eq!(format_amount(""), "0");
    }
}
