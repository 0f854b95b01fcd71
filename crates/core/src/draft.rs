use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use voyagelog_settings::{DebouncedWriter, KeyValueStore};

use crate::log::{DiveEntry, LogEntry};
use crate::session::SessionError;

/// Keys the draft is stored under; one value per key.
pub const DRAFT_KEYS: [&str; 12] = [
    "mode",
    "title",
    "body",
    "signature",
    "subtitle",
    "events",
    "crew",
    "gold",
    "doubloons",
    "ourTeam",
    "dives",
    "selectedShip",
];

/// 將編輯中的日誌保存在鍵值儲存內。 / Persists the log being edited in a key-value store.
#[derive(Debug)]
pub struct DraftStore<S> {
    store: S,
}

impl<S> DraftStore<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn save(&mut self, entry: &LogEntry) -> Result<(), SessionError> {
        let dives = serde_json::to_string(&entry.dives)?;
        let entries = [
            ("mode", entry.mode.to_string()),
            ("title", entry.title.clone()),
            ("body", entry.body.clone()),
            ("signature", entry.signature.clone()),
            ("subtitle", entry.subtitle.clone()),
            ("events", entry.events.clone()),
            ("crew", entry.crew.clone()),
            ("gold", entry.gold.clone()),
            ("doubloons", entry.doubloons.clone()),
            ("ourTeam", entry.our_team.to_string()),
            ("dives", dives),
            ("selectedShip", entry.ship.clone()),
        ];
        self.store.set_many(&entries)?;
        Ok(())
    }

    /// Reads the draft back. Missing, empty or unreadable values keep their
    /// defaults.
    pub fn load(&self) -> Result<LogEntry, SessionError> {
        let mut entry = LogEntry::default();

        if let Some(mode) = self.value("mode")? {
            assign_parsed(&mut entry.mode, "mode", &mode);
        }
        if let Some(team) = self.value("ourTeam")? {
            assign_parsed(&mut entry.our_team, "ourTeam", &team);
        }
        let text_fields = [
            ("title", &mut entry.title),
            ("body", &mut entry.body),
            ("signature", &mut entry.signature),
            ("subtitle", &mut entry.subtitle),
            ("events", &mut entry.events),
            ("crew", &mut entry.crew),
            ("gold", &mut entry.gold),
            ("doubloons", &mut entry.doubloons),
            ("selectedShip", &mut entry.ship),
        ];
        for (key, field) in text_fields {
            if let Some(value) = self.value(key)? {
                *field = value;
            }
        }
        if let Some(dives) = self.value("dives")? {
            match serde_json::from_str::<Vec<DiveEntry>>(&dives) {
                Ok(dives) => entry.dives = dives,
                Err(err) => warn!(error = %err, "ignoring unreadable dives in draft"),
            }
        }
        Ok(entry)
    }

    /// Removes every draft key.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        for key in DRAFT_KEYS {
            self.store.remove(key)?;
        }
        Ok(())
    }

    fn value(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(key)?.filter(|value| !value.is_empty()))
    }
}

impl<S> DraftStore<S>
where
    S: KeyValueStore + Send + 'static,
{
    /// Moves the store behind a debounced writer so bursts of edits are
    /// saved once per quiet `window`. Requires a tokio runtime.
    pub fn into_debounced(mut self, window: Duration) -> DebouncedWriter<LogEntry> {
        DebouncedWriter::spawn(window, move |entry: LogEntry| self.save(&entry))
    }
}

fn assign_parsed<T: FromStr>(slot: &mut T, key: &str, raw: &str)
where
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(err) => warn!(key, error = %err, "ignoring invalid draft value"),
    }
}
