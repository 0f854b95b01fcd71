use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::color::Color;
use crate::store::write_atomic;

const PREFERENCES_VERSION: u32 = 1;

/// Font families the log preview knows how to render.
pub const AVAILABLE_FONTS: [&str; 6] = [
    "Satisfy",
    "Indie_Flower",
    "Dancing_Script",
    "Times_New_Roman",
    "Domine",
    "Open_Sans",
];

/// Emblems that may be stamped on the first page; `none` disables it.
pub const LOG_ICONS: [&str; 6] = ["none", "usn", "hyperion", "silverclaw", "titan", "berserker"];

pub const DEFAULT_MESSAGE_FORMAT: &str = "Standard";
pub const DEFAULT_IMAGE_FORMAT: &str = "Standard";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Allowed range of a numeric setting and the value used when it is missing.
/// 數值設定的允許範圍與預設值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub default: u32,
    pub min: u32,
    pub max: u32,
}

impl Range {
    const fn new(default: u32, min: u32, max: u32) -> Self {
        Self { default, min, max }
    }

    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }
}

pub const TITLE_SIZE: Range = Range::new(48, 24, 72);
pub const BODY_SIZE: Range = Range::new(16, 12, 24);
pub const SIGNATURE_SIZE: Range = Range::new(48, 24, 72);
pub const HEADERS_SIZE: Range = Range::new(24, 18, 36);
pub const LISTS_SIZE: Range = Range::new(18, 14, 28);
pub const PADDING: Range = Range::new(48, 12, 96);
pub const MARGIN: Range = Range::new(32, 0, 64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub fonts: FontPreferences,
    #[serde(default)]
    pub font_sizes: FontSizes,
    #[serde(default)]
    pub spacing: Spacing,
    #[serde(default)]
    pub colors: ColorPreferences,
    #[serde(default)]
    pub content: ContentPreferences,
    #[serde(default = "default_log_icon")]
    pub log_icon: String,
    #[serde(default = "default_message_format")]
    pub message_format: String,
    #[serde(default = "default_image_format")]
    pub image_format: String,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

fn default_log_icon() -> String {
    "none".to_string()
}

fn default_message_format() -> String {
    DEFAULT_MESSAGE_FORMAT.to_string()
}

fn default_image_format() -> String {
    DEFAULT_IMAGE_FORMAT.to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            fonts: FontPreferences::default(),
            font_sizes: FontSizes::default(),
            spacing: Spacing::default(),
            colors: ColorPreferences::default(),
            content: ContentPreferences::default(),
            log_icon: default_log_icon(),
            message_format: default_message_format(),
            image_format: default_image_format(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.fonts.sanitize();
        self.font_sizes.sanitize();
        self.spacing.sanitize();
        if !LOG_ICONS.contains(&self.log_icon.as_str()) {
            self.log_icon = default_log_icon();
        }
        if self.message_format.trim().is_empty() {
            self.message_format = default_message_format();
        }
        if self.image_format.trim().is_empty() {
            self.image_format = default_image_format();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontPreferences {
    #[serde(default = "default_title_font")]
    pub title: String,
    #[serde(default = "default_body_font")]
    pub body: String,
    #[serde(default = "default_signature_font")]
    pub signature: String,
    #[serde(default = "default_signature_font")]
    pub subtitle: String,
    #[serde(default = "default_title_font")]
    pub headers: String,
    #[serde(default = "default_body_font")]
    pub lists: String,
}

fn default_title_font() -> String {
    "Satisfy".to_string()
}

fn default_body_font() -> String {
    "Indie_Flower".to_string()
}

fn default_signature_font() -> String {
    "Dancing_Script".to_string()
}

impl Default for FontPreferences {
    fn default() -> Self {
        Self {
            title: default_title_font(),
            body: default_body_font(),
            signature: default_signature_font(),
            subtitle: default_signature_font(),
            headers: default_title_font(),
            lists: default_body_font(),
        }
    }
}

impl FontPreferences {
    fn sanitize(&mut self) {
        let defaults = Self::default();
        let pairs = [
            (&mut self.title, defaults.title),
            (&mut self.body, defaults.body),
            (&mut self.signature, defaults.signature),
            (&mut self.subtitle, defaults.subtitle),
            (&mut self.headers, defaults.headers),
            (&mut self.lists, defaults.lists),
        ];
        for (font, fallback) in pairs {
            if !AVAILABLE_FONTS.contains(&font.as_str()) {
                *font = fallback;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSizes {
    #[serde(default = "default_title_size")]
    pub title: u32,
    #[serde(default = "default_body_size")]
    pub body: u32,
    #[serde(default = "default_signature_size")]
    pub signature: u32,
    #[serde(default = "default_headers_size")]
    pub headers: u32,
    #[serde(default = "default_lists_size")]
    pub lists: u32,
}

fn default_title_size() -> u32 {
    TITLE_SIZE.default
}

fn default_body_size() -> u32 {
    BODY_SIZE.default
}

fn default_signature_size() -> u32 {
    SIGNATURE_SIZE.default
}

fn default_headers_size() -> u32 {
    HEADERS_SIZE.default
}

fn default_lists_size() -> u32 {
    LISTS_SIZE.default
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: TITLE_SIZE.default,
            body: BODY_SIZE.default,
            signature: SIGNATURE_SIZE.default,
            headers: HEADERS_SIZE.default,
            lists: LISTS_SIZE.default,
        }
    }
}

impl FontSizes {
    fn sanitize(&mut self) {
        self.title = TITLE_SIZE.clamp(self.title);
        self.body = BODY_SIZE.clamp(self.body);
        self.signature = SIGNATURE_SIZE.clamp(self.signature);
        self.headers = HEADERS_SIZE.clamp(self.headers);
        self.lists = LISTS_SIZE.clamp(self.lists);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_margin")]
    pub margin: u32,
}

fn default_padding() -> u32 {
    PADDING.default
}

fn default_margin() -> u32 {
    MARGIN.default
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            padding: PADDING.default,
            margin: MARGIN.default,
        }
    }
}

impl Spacing {
    fn sanitize(&mut self) {
        self.padding = PADDING.clamp(self.padding);
        self.margin = MARGIN.clamp(self.margin);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPreferences {
    #[serde(default = "default_ink")]
    pub ink: Color,
    #[serde(default = "default_parchment")]
    pub parchment: Color,
    #[serde(default = "default_accent")]
    pub accent: Color,
}

fn default_ink() -> Color {
    Color::rgb(0x2B, 0x1D, 0x0E)
}

fn default_parchment() -> Color {
    Color::rgb(0xEF, 0xE4, 0xC5)
}

fn default_accent() -> Color {
    Color::rgb(0x8B, 0x1A, 0x1A)
}

impl Default for ColorPreferences {
    fn default() -> Self {
        Self {
            ink: default_ink(),
            parchment: default_parchment(),
            accent: default_accent(),
        }
    }
}

/// Which optional sections appear in the preview and exports.
/// 預覽與匯出時要顯示的區塊。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPreferences {
    #[serde(default = "default_true")]
    pub enable_events: bool,
    #[serde(default = "default_true")]
    pub enable_crew: bool,
    #[serde(default = "default_true")]
    pub show_title_on_first_page: bool,
    #[serde(default = "default_true")]
    pub show_extras_on_last_page: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ContentPreferences {
    fn default() -> Self {
        Self {
            enable_events: true,
            enable_crew: true,
            show_title_on_first_page: true,
            show_extras_on_last_page: true,
        }
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }
        let data = read_preferences(&path)?;
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        write_preferences(&self.path, &self.data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), PreferencesError> {
        write_preferences(path.as_ref(), &self.data)
    }

    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let data = read_preferences(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), PreferencesError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| PreferencesError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, PreferencesError> {
    let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: Preferences =
        serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.sanitize();
    Ok(data)
}

fn write_preferences(path: &Path, data: &Preferences) -> Result<(), PreferencesError> {
    let payload =
        serde_json::to_string_pretty(data).map_err(|source| PreferencesError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    write_atomic(path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
        path: path.to_path_buf(),
        source,
    })
}
