//! Offscreen rendition of the log page, usable as an export render target.

use image::RgbaImage;
use voyagelog_printing::raster::{estimate_text_width, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
use voyagelog_printing::{
    rasterize, soft_wrap, CaptureError, CaptureSpec, Color, DisplayCommand, GlyphRun,
    PageDisplayList, PageSurface, Pages, Point, Rectangle, RenderTarget, Size, Stroke,
    VISIBLE_PAGE_ID,
};
use voyagelog_settings::{Color as HexColor, Preferences};

use crate::log::{format_list, LogEntry, LogMode};
use crate::session::EditorSession;

pub const TITLE_PLACEHOLDER: &str = "Log Title";
pub const BODY_PLACEHOLDER: &str = "Your log entry will appear here...";
pub const SIGNATURE_PLACEHOLDER: &str = "Your Signature";

const BODY_LINE_SPACING: f32 = 1.625;
const LIST_LINE_SPACING: f32 = 1.4;
const EMBLEM_OPACITY: f32 = 0.3;

/// 以記憶體繪製日誌頁面的顯示介面。
/// Renders one log page at a time into a display list.
#[derive(Debug, Clone)]
pub struct LogPreview {
    entry: LogEntry,
    pages: Pages,
    preferences: Preferences,
    chars_per_line: usize,
    active: usize,
}

impl LogPreview {
    pub fn new(entry: LogEntry, pages: Pages, preferences: Preferences) -> Self {
        let active = pages.last_index();
        Self {
            entry,
            pages,
            preferences,
            chars_per_line: voyagelog_printing::layout::DEFAULT_CHARS_PER_LINE,
            active,
        }
    }

    /// Snapshot of a session, opened on the session's active page.
    pub fn from_session(session: &EditorSession, preferences: &Preferences) -> Self {
        let mut preview = Self::new(
            session.entry().clone(),
            session.pages().clone(),
            preferences.clone(),
        );
        preview.chars_per_line = session.metrics().chars_per_line();
        preview.active = session.active_page();
        preview
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    /// Display list for page `index`, or `None` when the page does not exist.
    pub fn compose_page(&self, index: usize) -> Option<PageDisplayList> {
        let page = self.pages.get(index)?;
        let prefs = &self.preferences;
        let is_first = index == 0;
        let is_last = index == self.pages.last_index();
        let inset = (prefs.spacing.padding + prefs.spacing.margin) as f32;
        let width = PAGE_WIDTH_PX as f32;
        let content_width = (width - inset * 2.0).max(1.0);
        let mut list = PageDisplayList::default();
        let mut cursor_y = inset;

        if prefs.log_icon != "none" {
            let side = width / 2.0;
            let mut accent = to_draw_color(prefs.colors.accent);
            accent.a *= EMBLEM_OPACITY;
            list.push(DisplayCommand::BackgroundRect(Rectangle {
                origin: Point {
                    x: (width - side) / 2.0,
                    y: (PAGE_HEIGHT_PX as f32 - side) / 2.0,
                },
                size: Size {
                    width: side,
                    height: side,
                },
                color: accent,
            }));
        }

        let ink = to_draw_color(prefs.colors.ink);
        if is_first || !prefs.content.show_title_on_first_page {
            let size = prefs.font_sizes.title as f32;
            let title = non_empty(&self.entry.title, TITLE_PLACEHOLDER);
            let text_width = estimate_text_width(title, size);
            list.push(text(
                title,
                &prefs.fonts.title,
                size,
                Point {
                    x: inset + ((content_width - text_width) / 2.0).max(0.0),
                    y: cursor_y,
                },
                ink,
            ));
            cursor_y += size * 1.2;
            list.push(DisplayCommand::HorizontalRule {
                start: Point { x: inset, y: cursor_y },
                end: Point {
                    x: inset + content_width,
                    y: cursor_y,
                },
                stroke: Stroke {
                    width: 1.0,
                    color: to_draw_color(prefs.colors.accent),
                },
            });
            cursor_y += size * 0.4;
        }

        let body_size = prefs.font_sizes.body as f32;
        let body_step = body_size * BODY_LINE_SPACING;
        let body = non_empty(page.text(), BODY_PLACEHOLDER);
        for line in body.split('\n') {
            for row in soft_wrap(line, self.chars_per_line) {
                if !row.is_empty() {
                    list.push(text(
                        row,
                        &prefs.fonts.body,
                        body_size,
                        Point { x: inset, y: cursor_y },
                        ink,
                    ));
                }
                cursor_y += body_step;
            }
        }

        if is_last {
            cursor_y += body_step;
            cursor_y = self.compose_extras(&mut list, inset, content_width, cursor_y);
        }
        if is_last || !prefs.content.show_extras_on_last_page {
            self.compose_signature(&mut list, inset, content_width, cursor_y);
        }

        Some(list)
    }

    fn compose_extras(&self, list: &mut PageDisplayList, inset: f32, content_width: f32, top: f32) -> f32 {
        let prefs = &self.preferences;
        let header_size = prefs.font_sizes.headers as f32;
        let list_size = prefs.font_sizes.lists as f32;
        let ink = to_draw_color(prefs.colors.ink);
        let mut bottom = top;

        match self.entry.mode {
            LogMode::Patrol => {
                let mut columns = Vec::new();
                if prefs.content.enable_events && !self.entry.events.is_empty() {
                    columns.push(("Notable Events", format_list(&self.entry.events)));
                }
                if prefs.content.enable_crew && !self.entry.crew.is_empty() {
                    columns.push(("Crew Manifest", format_list(&self.entry.crew)));
                }
                let column_width = content_width / 2.0;
                for (column, (heading, items)) in columns.into_iter().enumerate() {
                    let x = inset + column as f32 * column_width;
                    let mut y = top;
                    list.push(text(heading, &prefs.fonts.headers, header_size, Point { x, y }, ink));
                    y += header_size * 1.4;
                    for item in items {
                        list.push(text(item, &prefs.fonts.lists, list_size, Point { x, y }, ink));
                        y += list_size * LIST_LINE_SPACING;
                    }
                    bottom = bottom.max(y);
                }

                let loot_size = list_size * 1.3;
                let y = bottom + loot_size * 0.5;
                let gold = format!("Gold: {}", non_empty(&self.entry.gold, "0"));
                let doubloons = format!("Doubloons: {}", non_empty(&self.entry.doubloons, "0"));
                let gold_width = estimate_text_width(&gold, loot_size);
                list.push(text(&gold, &prefs.fonts.lists, loot_size, Point { x: inset, y }, ink));
                list.push(text(
                    &doubloons,
                    &prefs.fonts.lists,
                    loot_size,
                    Point {
                        x: inset + gold_width + 32.0,
                        y,
                    },
                    ink,
                ));
                bottom = y + loot_size * 1.2;
            }
            LogMode::Skirmish => {
                let mut y = top;
                list.push(text(
                    &format!("Team {}", self.entry.our_team),
                    &prefs.fonts.headers,
                    header_size,
                    Point { x: inset, y },
                    ink,
                ));
                y += header_size * 1.4;
                for (index, dive) in self.entry.dives.iter().enumerate() {
                    let mut line = format!(
                        "{}. {} vs. {} [{}]",
                        index + 1,
                        dive.our_team,
                        dive.enemy_team,
                        dive.outcome
                    );
                    if !dive.notes.is_empty() {
                        line.push_str(" - ");
                        line.push_str(&dive.notes);
                    }
                    let max_chars = (content_width / (list_size * 0.5)).floor().max(1.0) as usize;
                    for row in soft_wrap(&line, max_chars) {
                        list.push(text(row, &prefs.fonts.lists, list_size, Point { x: inset, y }, ink));
                        y += list_size * LIST_LINE_SPACING;
                    }
                }
                bottom = y;
            }
        }
        bottom
    }

    fn compose_signature(&self, list: &mut PageDisplayList, inset: f32, content_width: f32, top: f32) {
        let prefs = &self.preferences;
        let size = prefs.font_sizes.signature as f32;
        let ink = to_draw_color(prefs.colors.ink);
        let signature = non_empty(&self.entry.signature, SIGNATURE_PLACEHOLDER);
        let width = estimate_text_width(signature, size);
        let floor = PAGE_HEIGHT_PX as f32 - inset - size * 1.2;
        let subtitle_size = prefs.font_sizes.headers as f32;
        let has_subtitle = !self.entry.subtitle.is_empty();
        let reserved = if has_subtitle { subtitle_size * 1.2 } else { 0.0 };
        let y = (floor - reserved).max(top);
        let right = inset + content_width;

        list.push(text(
            signature,
            &prefs.fonts.signature,
            size,
            Point {
                x: (right - width).max(inset),
                y,
            },
            ink,
        ));
        if has_subtitle {
            let sub_width = estimate_text_width(&self.entry.subtitle, subtitle_size);
            list.push(text(
                &self.entry.subtitle,
                &prefs.fonts.subtitle,
                subtitle_size,
                Point {
                    x: (right - sub_width).max(inset),
                    y: y + size * 1.2,
                },
                ink,
            ));
        }
    }
}

/// Captured view of one composed page.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    display_list: PageDisplayList,
    background: Color,
}

impl PreviewSurface {
    pub fn display_list(&self) -> &PageDisplayList {
        &self.display_list
    }
}

impl PageSurface for PreviewSurface {
    fn rasterize(&self, spec: &CaptureSpec) -> Result<RgbaImage, CaptureError> {
        Ok(rasterize(&self.display_list, spec, self.background))
    }
}

impl RenderTarget for LogPreview {
    type Surface = PreviewSurface;

    fn active_page(&self) -> usize {
        self.active
    }

    fn show_page(&mut self, index: usize) {
        self.active = index;
    }

    fn find_surface(&self, id: &str) -> Option<Self::Surface> {
        if id != VISIBLE_PAGE_ID {
            return None;
        }
        let display_list = self.compose_page(self.active)?;
        Some(PreviewSurface {
            display_list,
            background: to_draw_color(self.preferences.colors.parchment),
        })
    }
}

fn text(content: &str, font: &str, size: f32, position: Point, color: Color) -> DisplayCommand {
    DisplayCommand::GlyphRun(GlyphRun {
        text: content.to_string(),
        font_family: font.to_string(),
        font_size_px: size,
        position,
        color,
        background: None,
    })
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn to_draw_color(color: HexColor) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyagelog_printing::{PaginationMetrics, Paginator, TextPaginator};

    fn preview(entry: LogEntry, preferences: Preferences) -> LogPreview {
        let pages = TextPaginator::new(PaginationMetrics::new(48, 24, 70))
            .paginate(&entry.body)
            .pages;
        LogPreview::new(entry, pages, preferences)
    }

    fn texts(list: &PageDisplayList) -> Vec<&str> {
        list.glyph_texts().collect()
    }

    #[test]
    fn blank_log_shows_placeholders() {
        let preview = preview(LogEntry::default(), Preferences::default());
        let list = preview.compose_page(0).unwrap();
        let texts = texts(&list);
        assert!(texts.contains(&TITLE_PLACEHOLDER));
        assert!(texts.contains(&BODY_PLACEHOLDER));
        assert!(texts.contains(&SIGNATURE_PLACEHOLDER));
        assert!(texts.contains(&"Gold: 0"));
    }

    #[test]
    fn extras_only_on_last_page() {
        let mut entry = LogEntry::default();
        entry.load_testing_data();
        entry.body = "first\nsecond\nthird".into();
        let preview = preview(entry, Preferences::default());
        assert_eq!(preview.pages().len(), 2);

        let first = preview.compose_page(0).unwrap();
        let first = texts(&first);
        assert!(first.contains(&"Test Patrol Title"));
        assert!(!first.contains(&"Notable Events"));
        assert!(!first.contains(&"Capt. Test"));

        let last = preview.compose_page(1).unwrap();
        let last = texts(&last);
        assert!(!last.contains(&"Test Patrol Title"));
        assert!(last.contains(&"third"));
        assert!(last.contains(&"Notable Events"));
        assert!(last.contains(&"Crew Manifest"));
        assert!(last.contains(&"Gold: 1000"));
        assert!(last.contains(&"Capt. Test"));
        assert!(last.contains(&"Test Subtitle"));
    }

    #[test]
    fn disabled_sections_are_hidden() {
        let mut entry = LogEntry::default();
        entry.load_testing_data();
        let mut prefs = Preferences::default();
        prefs.content.enable_crew = false;
        prefs.content.enable_events = false;
        let list = preview(entry, prefs).compose_page(0).unwrap();
        let texts = texts(&list);
        assert!(!texts.contains(&"Crew Manifest"));
        assert!(!texts.contains(&"Notable Events"));
    }

    #[test]
    fn skirmish_pages_list_dives() {
        let mut entry = LogEntry {
            mode: LogMode::Skirmish,
            ..LogEntry::default()
        };
        entry.load_testing_data();
        let list = preview(entry, Preferences::default()).compose_page(0).unwrap();
        let texts = texts(&list);
        assert!(texts.contains(&"Team Athena"));
        assert!(texts
            .iter()
            .any(|line| line.starts_with("1. Athena vs. Reaper [loss]")));
    }

    #[test]
    fn surface_follows_active_page() {
        let mut entry = LogEntry::default();
        entry.body = "alpha\nbeta\ngamma".into();
        let mut preview = preview(entry, Preferences::default());
        assert_eq!(preview.active_page(), 1);

        preview.show_page(0);
        let surface = preview.find_surface(VISIBLE_PAGE_ID).unwrap();
        assert!(texts(surface.display_list()).contains(&"alpha"));

        preview.show_page(7);
        assert!(preview.find_surface(VISIBLE_PAGE_ID).is_none());
        assert!(preview.find_surface("writing-area").is_none());
    }

    #[test]
    fn surfaces_rasterize_on_parchment() {
        let preview = preview(LogEntry::default(), Preferences::default());
        let surface = preview.find_surface(VISIBLE_PAGE_ID).unwrap();
        let spec = CaptureSpec {
            width_px: 100,
            height_px: 120,
            scale: 1,
        };
        let bitmap = surface.rasterize(&spec).unwrap();
        assert_eq!(bitmap.dimensions(), (100, 120));
        assert_eq!(bitmap.get_pixel(0, 0).0, [0xEF, 0xE4, 0xC5, 0xFF]);
    }
}
