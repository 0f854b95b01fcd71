pub mod draft;
pub mod format;
pub mod log;
pub mod preview;
pub mod session;

pub use draft::{DraftStore, DRAFT_KEYS};
pub use format::{DiveStats, MessageFormat};
pub use log::{format_list, DiveEntry, DivePatch, LogEntry, LogMode, Outcome, ParseValueError, Team};
pub use preview::{LogPreview, PreviewSurface};
pub use session::{DraftSink, EditorSession, SessionError};
