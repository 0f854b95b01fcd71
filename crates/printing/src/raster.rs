use image::{ImageBuffer, Rgba, RgbaImage};

use crate::display::{Color, DisplayCommand, GlyphRun, PageDisplayList, Stroke};

/// Nominal page width in logical pixels (US Letter at 96 DPI).
pub const PAGE_WIDTH_PX: u32 = 816;
/// Nominal page height in logical pixels (US Letter at 96 DPI).
pub const PAGE_HEIGHT_PX: u32 = 1056;
/// Oversampling factor applied to every capture.
pub const CAPTURE_SCALE: u32 = 2;

/// Fixed canvas a page is captured against, independent of on-screen zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSpec {
    pub width_px: u32,
    pub height_px: u32,
    pub scale: u32,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            width_px: PAGE_WIDTH_PX,
            height_px: PAGE_HEIGHT_PX,
            scale: CAPTURE_SCALE,
        }
    }
}

impl CaptureSpec {
    /// Bitmap dimensions after oversampling.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = self.scale.max(1);
        (
            self.width_px.max(1) * scale,
            self.height_px.max(1) * scale,
        )
    }
}

/// Paints `display_list` onto a fresh bitmap sized by `spec`.
///
/// Text is drawn as ink blocks per glyph using an estimated advance, which is
/// enough to preview layout density without shaping real fonts.
pub fn rasterize(display_list: &PageDisplayList, spec: &CaptureSpec, background: Color) -> RgbaImage {
    let (width_px, height_px) = spec.pixel_size();
    let scale = spec.scale.max(1) as f32;
    let mut image = ImageBuffer::from_pixel(width_px, height_px, color_to_rgba(background));

    for command in &display_list.commands {
        match command {
            DisplayCommand::BackgroundRect(rect) => {
                let x = (rect.origin.x * scale).round() as i32;
                let y = (rect.origin.y * scale).round() as i32;
                let w = (rect.size.width * scale).ceil() as i32;
                let h = (rect.size.height * scale).ceil() as i32;
                fill_rect(&mut image, x, y, w, h, rect.color);
            }
            DisplayCommand::GlyphRun(run) => draw_glyph_run(&mut image, run, scale),
            DisplayCommand::HorizontalRule { start, end, stroke } => {
                let x0 = (start.x * scale).round() as i32;
                let x1 = (end.x * scale).round() as i32;
                let y = (start.y * scale).round() as i32;
                draw_horizontal_line(&mut image, x0, x1, y, stroke, scale);
            }
        }
    }

    image
}

/// Estimated advance of `text` at `font_size` logical pixels.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    (text.chars().count() as f32) * glyph_advance(font_size)
}

fn glyph_advance(font_size: f32) -> f32 {
    font_size.max(1.0) * 0.5
}

fn draw_glyph_run(image: &mut RgbaImage, run: &GlyphRun, scale: f32) {
    let advance = glyph_advance(run.font_size_px);
    let line_box = run.font_size_px.max(1.0) * 1.2;

    if let Some(background) = run.background {
        fill_rect(
            image,
            (run.position.x * scale).round() as i32,
            (run.position.y * scale).round() as i32,
            (estimate_text_width(&run.text, run.font_size_px) * scale).ceil() as i32,
            (line_box * scale).ceil() as i32,
            background,
        );
    }

    let ink_height = (run.font_size_px * 0.7 * scale).ceil().max(1.0) as i32;
    let ink_width = (advance * 0.8 * scale).ceil().max(1.0) as i32;
    let ink_top = ((run.position.y + (line_box - run.font_size_px * 0.7) / 2.0) * scale).round() as i32;

    for (column, ch) in run.text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let x = ((run.position.x + column as f32 * advance) * scale).round() as i32;
        fill_rect(image, x, ink_top, ink_width, ink_height, run.color);
    }
}

fn fill_rect(buffer: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Color) {
    if width <= 0 || height <= 0 {
        return;
    }
    let width_px = buffer.width() as i32;
    let height_px = buffer.height() as i32;
    let x0 = x.clamp(0, width_px);
    let y0 = y.clamp(0, height_px);
    let x1 = (x + width).clamp(0, width_px);
    let y1 = (y + height).clamp(0, height_px);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let rgba = color_to_rgba(color);
    for yy in y0..y1 {
        for xx in x0..x1 {
            blend_pixel(buffer, xx as u32, yy as u32, rgba);
        }
    }
}

fn draw_horizontal_line(
    buffer: &mut RgbaImage,
    x0: i32,
    x1: i32,
    y: i32,
    stroke: &Stroke,
    scale: f32,
) {
    let thickness = (stroke.width * scale).ceil().max(1.0) as i32;
    fill_rect(buffer, x0.min(x1), y, (x1 - x0).abs(), thickness, stroke.color);
}

fn blend_pixel(buffer: &mut RgbaImage, x: u32, y: u32, source: Rgba<u8>) {
    let alpha = u32::from(source[3]);
    if alpha == 255 {
        buffer.put_pixel(x, y, source);
        return;
    }
    let target = buffer.get_pixel_mut(x, y);
    for channel in 0..3 {
        let blended =
            (u32::from(source[channel]) * alpha + u32::from(target[channel]) * (255 - alpha)) / 255;
        target[channel] = blended as u8;
    }
    target[3] = target[3].max(source[3]);
}

fn color_to_rgba(color: Color) -> Rgba<u8> {
    Rgba([
        clamp_to_u8(color.r),
        clamp_to_u8(color.g),
        clamp_to_u8(color.b),
        clamp_to_u8(color.a),
    ])
}

fn clamp_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
