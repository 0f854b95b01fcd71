use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::session::SessionError;

/// Default ship selection for a fresh log.
pub const DEFAULT_SHIP: &str = "audacious";

/// 航海日誌的種類。 / Kind of voyage being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Patrol,
    Skirmish,
}

impl LogMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LogMode::Patrol => "patrol",
            LogMode::Skirmish => "skirmish",
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogMode {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "patrol" => Ok(LogMode::Patrol),
            "skirmish" => Ok(LogMode::Skirmish),
            other => Err(ParseValueError::new("mode", other)),
        }
    }
}

/// 陣營。 / Faction a crew sails for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Athena,
    Reaper,
}

impl Team {
    pub fn as_str(self) -> &'static str {
        match self {
            Team::Athena => "Athena",
            Team::Reaper => "Reaper",
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Athena => Team::Reaper,
            Team::Reaper => Team::Athena,
        }
    }

    /// Chat emoji shortcode for the faction.
    pub fn emoji(self) -> &'static str {
        match self {
            Team::Athena => ":Athena:",
            Team::Reaper => ":Reaper:",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Athena" => Ok(Team::Athena),
            "Reaper" => Ok(Team::Reaper),
            other => Err(ParseValueError::new("team", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            other => Err(ParseValueError::new("outcome", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseValueError {
    pub field: &'static str,
    pub value: String,
}

impl ParseValueError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.field, self.value)
    }
}

impl std::error::Error for ParseValueError {}

/// One skirmish engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveEntry {
    pub our_team: Team,
    pub enemy_team: Team,
    pub outcome: Outcome,
    #[serde(default)]
    pub notes: String,
}

/// Partial update applied by [`LogEntry::update_dive`]; `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DivePatch {
    pub our_team: Option<Team>,
    pub enemy_team: Option<Team>,
    pub outcome: Option<Outcome>,
    pub notes: Option<String>,
}

/// 單篇航海日誌的全部內容。 / Everything written into one voyage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub mode: LogMode,
    pub title: String,
    pub body: String,
    pub signature: String,
    pub subtitle: String,
    pub ship: String,
    pub events: String,
    pub crew: String,
    pub gold: String,
    pub doubloons: String,
    pub our_team: Team,
    pub dives: Vec<DiveEntry>,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            mode: LogMode::default(),
            title: String::new(),
            body: String::new(),
            signature: String::new(),
            subtitle: String::new(),
            ship: DEFAULT_SHIP.to_string(),
            events: String::new(),
            crew: String::new(),
            gold: String::new(),
            doubloons: String::new(),
            our_team: Team::default(),
            dives: Vec::new(),
        }
    }
}

impl LogEntry {
    /// Appends a dive against the opposing faction, recorded as a win.
    pub fn add_new_dive(&mut self) -> &DiveEntry {
        self.dives.push(DiveEntry {
            our_team: self.our_team,
            enemy_team: self.our_team.opponent(),
            outcome: Outcome::Win,
            notes: String::new(),
        });
        &self.dives[self.dives.len() - 1]
    }

    pub fn update_dive(&mut self, index: usize, patch: DivePatch) -> Result<&DiveEntry, SessionError> {
        let len = self.dives.len();
        let dive = self
            .dives
            .get_mut(index)
            .ok_or(SessionError::DiveOutOfRange { index, len })?;
        if let Some(team) = patch.our_team {
            dive.our_team = team;
        }
        if let Some(team) = patch.enemy_team {
            dive.enemy_team = team;
        }
        if let Some(outcome) = patch.outcome {
            dive.outcome = outcome;
        }
        if let Some(notes) = patch.notes {
            dive.notes = notes;
        }
        Ok(dive)
    }

    pub fn remove_dive(&mut self, index: usize) -> Result<DiveEntry, SessionError> {
        let len = self.dives.len();
        if index >= len {
            return Err(SessionError::DiveOutOfRange { index, len });
        }
        Ok(self.dives.remove(index))
    }

    /// Clears the written content. Mode and ship selection are kept.
    pub fn reset(&mut self) {
        *self = Self {
            mode: self.mode,
            ship: std::mem::take(&mut self.ship),
            ..Self::default()
        };
    }

    /// Fills the entry with sample content for the current mode.
    pub fn load_testing_data(&mut self) {
        self.title = match self.mode {
            LogMode::Patrol => "Test Patrol Title",
            LogMode::Skirmish => "Test Skirmish Title",
        }
        .to_string();
        self.signature = "Capt. Test".to_string();
        match self.mode {
            LogMode::Patrol => {
                self.body = "Sample patrol log entry...".to_string();
                self.events = "Event 1\nEvent 2\nEvent 3".to_string();
                self.crew = "Crew 1\nCrew 2\nCrew 3".to_string();
                self.gold = "1000".to_string();
                self.doubloons = "300".to_string();
                self.subtitle = "Test Subtitle".to_string();
            }
            LogMode::Skirmish => {
                self.body = "Skirmish details here...".to_string();
                self.our_team = Team::Athena;
                self.dives = vec![
                    DiveEntry {
                        our_team: Team::Athena,
                        enemy_team: Team::Reaper,
                        outcome: Outcome::Loss,
                        notes: "Stamp Leader, they had 10 flags...".to_string(),
                    },
                    DiveEntry {
                        our_team: Team::Athena,
                        enemy_team: Team::Reaper,
                        outcome: Outcome::Win,
                        notes: "Second match, big win".to_string(),
                    },
                ];
                self.subtitle = "Skirmish Leader".to_string();
            }
        }
    }
}

/// Non-blank lines of a newline-separated list field.
pub fn format_list(text: &str) -> Vec<&str> {
    text.split('\n').filter(|item| !item.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dive_faces_the_opposing_team() {
        let mut entry = LogEntry {
            our_team: Team::Reaper,
            ..LogEntry::default()
        };
        let dive = entry.add_new_dive().clone();
        assert_eq!(dive.our_team, Team::Reaper);
        assert_eq!(dive.enemy_team, Team::Athena);
        assert_eq!(dive.outcome, Outcome::Win);
        assert!(dive.notes.is_empty());
    }

    #[test]
    fn update_dive_applies_only_given_fields() {
        let mut entry = LogEntry::default();
        entry.add_new_dive();
        entry.add_new_dive();

        let updated = entry
            .update_dive(
                1,
                DivePatch {
                    outcome: Some(Outcome::Loss),
                    notes: Some("lost the flag".into()),
                    ..DivePatch::default()
                },
            )
            .unwrap()
            .clone();

        assert_eq!(updated.outcome, Outcome::Loss);
        assert_eq!(updated.notes, "lost the flag");
        assert_eq!(updated.enemy_team, Team::Reaper);
        assert_eq!(entry.dives[0].outcome, Outcome::Win);
    }

    #[test]
    fn dive_indices_are_checked() {
        let mut entry = LogEntry::default();
        assert!(matches!(
            entry.update_dive(0, DivePatch::default()),
            Err(SessionError::DiveOutOfRange { index: 0, len: 0 })
        ));
        entry.add_new_dive();
        assert!(entry.remove_dive(3).is_err());
        assert!(entry.remove_dive(0).is_ok());
        assert!(entry.dives.is_empty());
    }

    #[test]
    fn reset_keeps_mode_and_ship() {
        let mut entry = LogEntry {
            mode: LogMode::Skirmish,
            ship: "odin".into(),
            ..LogEntry::default()
        };
        entry.load_testing_data();
        entry.reset();

        assert_eq!(entry.mode, LogMode::Skirmish);
        assert_eq!(entry.ship, "odin");
        assert!(entry.title.is_empty());
        assert!(entry.dives.is_empty());
        assert_eq!(entry.our_team, Team::Athena);
    }

    #[test]
    fn sample_data_depends_on_mode() {
        let mut patrol = LogEntry::default();
        patrol.load_testing_data();
        assert_eq!(patrol.title, "Test Patrol Title");
        assert_eq!(patrol.gold, "1000");
        assert!(patrol.dives.is_empty());

        let mut skirmish = LogEntry {
            mode: LogMode::Skirmish,
            ..LogEntry::default()
        };
        skirmish.load_testing_data();
        assert_eq!(skirmish.title, "Test Skirmish Title");
        assert_eq!(skirmish.dives.len(), 2);
        assert_eq!(skirmish.dives[0].outcome, Outcome::Loss);
    }

    #[test]
    fn format_list_drops_blank_lines() {
        assert_eq!(format_list("a\n\n  \nb\n"), vec!["a", "b"]);
        assert!(format_list("").is_empty());
    }

    #[test]
    fn dives_serialize_with_camel_case_keys() {
        let dive = DiveEntry {
            our_team: Team::Athena,
            enemy_team: Team::Reaper,
            outcome: Outcome::Loss,
            notes: String::new(),
        };
        let json = serde_json::to_string(&dive).unwrap();
        assert_eq!(
            json,
            r#"{"ourTeam":"Athena","enemyTeam":"Reaper","outcome":"loss","notes":""}"#
        );
    }
}
