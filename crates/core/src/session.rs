use thiserror::Error;
use tracing::{debug, warn};
use voyagelog_printing::{PaginationMetrics, Pages, Paginator, TextPaginator};
use voyagelog_settings::{DebouncedWriter, StoreError};

use crate::log::{DiveEntry, DivePatch, LogEntry};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("dive {index} does not exist ({len} recorded)")]
    DiveOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode dives: {0}")]
    Dives(#[from] serde_json::Error),
}

/// Receives a copy of the entry after every edit.
/// 每次編輯後接收日誌內容的目的地。
pub trait DraftSink: Send {
    fn record(&mut self, entry: &LogEntry);
}

impl DraftSink for DebouncedWriter<LogEntry> {
    fn record(&mut self, entry: &LogEntry) {
        if let Err(err) = self.push(entry.clone()) {
            warn!(error = %err, "draft writer unavailable, edit not persisted");
        }
    }
}

/// 編輯中的日誌：內容、分頁結果與目前顯示的頁面。
/// The log being edited together with its pagination and the visible page.
pub struct EditorSession {
    entry: LogEntry,
    paginator: TextPaginator,
    pages: Pages,
    active_page: usize,
    draft: Option<Box<dyn DraftSink>>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("entry", &self.entry)
            .field("pages", &self.pages.len())
            .field("active_page", &self.active_page)
            .field("draft", &self.draft.is_some())
            .finish()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(LogEntry::default())
    }
}

impl EditorSession {
    pub fn new(entry: LogEntry) -> Self {
        Self::with_metrics(entry, PaginationMetrics::default())
    }

    /// The session opens on the last page, as after any body edit.
    pub fn with_metrics(entry: LogEntry, metrics: PaginationMetrics) -> Self {
        let paginator = TextPaginator::new(metrics);
        let pages = paginator.paginate(&entry.body).pages;
        let active_page = pages.last_index();
        Self {
            entry,
            paginator,
            pages,
            active_page,
            draft: None,
        }
    }

    pub fn with_draft_sink(mut self, sink: impl DraftSink + 'static) -> Self {
        self.draft = Some(Box::new(sink));
        self
    }

    pub fn entry(&self) -> &LogEntry {
        &self.entry
    }

    pub fn into_entry(self) -> LogEntry {
        self.entry
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    pub fn metrics(&self) -> &PaginationMetrics {
        self.paginator.metrics()
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn is_last_page(&self) -> bool {
        self.active_page == self.pages.last_index()
    }

    /// Selects a page, clamping out-of-range requests to the last page.
    pub fn set_active_page(&mut self, index: usize) -> usize {
        self.active_page = index.min(self.pages.last_index());
        self.active_page
    }

    /// Replaces the narrative text, re-paginates and jumps to the last page.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.edit(|entry| entry.body = body.into());
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.edit(|entry| entry.title = title.into());
    }

    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.edit(|entry| entry.signature = signature.into());
    }

    pub fn add_new_dive(&mut self) -> DiveEntry {
        self.edit(|entry| entry.add_new_dive().clone())
    }

    pub fn update_dive(&mut self, index: usize, patch: DivePatch) -> Result<(), SessionError> {
        self.edit(|entry| entry.update_dive(index, patch).map(|_| ()))
    }

    pub fn remove_dive(&mut self, index: usize) -> Result<DiveEntry, SessionError> {
        self.edit(|entry| entry.remove_dive(index))
    }

    pub fn reset(&mut self) {
        self.edit(LogEntry::reset);
    }

    pub fn load_testing_data(&mut self) {
        self.edit(LogEntry::load_testing_data);
    }

    /// Applies an arbitrary change to the entry. Body changes re-paginate;
    /// any change is forwarded to the draft sink.
    pub fn edit<T, F>(&mut self, op: F) -> T
    where
        F: FnOnce(&mut LogEntry) -> T,
    {
        let before = self.entry.clone();
        let result = op(&mut self.entry);
        if self.entry.body != before.body {
            debug!(
                previous_len = before.body.len(),
                len = self.entry.body.len(),
                "body changed, re-paginating"
            );
            self.repaginate();
        }
        if self.entry != before {
            self.notify();
        }
        result
    }

    fn repaginate(&mut self) {
        self.pages = self.paginator.paginate(&self.entry.body).pages;
        self.active_page = self.pages.last_index();
    }

    fn notify(&mut self) {
        if let Some(sink) = self.draft.as_mut() {
            sink.record(&self.entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<LogEntry>>>);

    impl DraftSink for RecordingSink {
        fn record(&mut self, entry: &LogEntry) {
            self.0.lock().unwrap().push(entry.clone());
        }
    }

    fn small_metrics() -> PaginationMetrics {
        // two rows per page
        PaginationMetrics::new(48, 24, 10)
    }

    #[test]
    fn body_edits_jump_to_last_page() {
        let mut session = EditorSession::with_metrics(LogEntry::default(), small_metrics());
        assert_eq!(session.pages().len(), 1);
        assert_eq!(session.active_page(), 0);

        session.set_body("one\ntwo\nthree\nfour\nfive");
        assert_eq!(session.pages().len(), 3);
        assert_eq!(session.active_page(), 2);
        assert!(session.is_last_page());
        assert_eq!(session.pages().reconstruct(), session.entry().body);
    }

    #[test]
    fn active_page_is_clamped() {
        let mut session = EditorSession::with_metrics(LogEntry::default(), small_metrics());
        session.set_body("a\nb\nc");
        assert_eq!(session.set_active_page(0), 0);
        assert_eq!(session.set_active_page(9), 1);
        assert_eq!(session.active_page(), 1);
    }

    #[test]
    fn non_body_edits_keep_active_page() {
        let mut session = EditorSession::with_metrics(LogEntry::default(), small_metrics());
        session.set_body("a\nb\nc\nd\ne");
        session.set_active_page(0);
        session.set_title("Night Watch");
        assert_eq!(session.active_page(), 0);
    }

    #[test]
    fn changes_reach_the_draft_sink() {
        let sink = RecordingSink::default();
        let mut session = EditorSession::default().with_draft_sink(sink.clone());

        session.set_title("Harbor");
        session.set_title("Harbor");
        let dive = session.add_new_dive();
        assert!(session.update_dive(5, DivePatch::default()).is_err());

        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 2, "unchanged edits are not forwarded");
        assert_eq!(recorded[0].title, "Harbor");
        assert_eq!(recorded[1].dives, vec![dive]);
    }

    #[test]
    fn reset_returns_to_single_blank_page() {
        let mut session = EditorSession::with_metrics(LogEntry::default(), small_metrics());
        session.load_testing_data();
        session.set_body("a\nb\nc\nd");
        session.reset();
        assert_eq!(session.pages().len(), 1);
        assert_eq!(session.active_page(), 0);
        assert!(session.entry().title.is_empty());
    }
}
