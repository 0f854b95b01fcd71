pub mod color;
pub mod debounce;
pub mod preferences;
pub mod store;

pub use color::{Color, ColorParseError};
pub use debounce::{DebounceError, DebouncedWriter, DEFAULT_DEBOUNCE_WINDOW};
pub use preferences::{
    ColorPreferences, ContentPreferences, FontPreferences, FontSizes, Preferences,
    PreferencesError, PreferencesStore, Range, Spacing, AVAILABLE_FONTS, LOG_ICONS,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
