use std::fmt;
use std::sync::LazyLock;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use regex::Regex;
use thiserror::Error;

use crate::pdf::{encode_pdf_page, PdfError};
use crate::raster::CaptureSpec;

/// Base file name used when the log has no title.
pub const DEFAULT_FILE_STEM: &str = "Voyage_Log";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Output kind produced for each captured page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Single-page PDF at the nominal page size.
    Pdf,
    /// Raw page bitmap.
    Png,
}

impl ArtifactKind {
    pub const fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Png => "png",
        }
    }

}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Errors raised while turning a captured bitmap into file bytes.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("PNG encoding failed: {0}")]
    Png(#[source] ImageError),
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] PdfError),
}

/// An encoded page ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub page_index: usize,
    pub kind: ArtifactKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `<title-or-default>_page<N>.<ext>` with whitespace runs collapsed to `-`
/// and a 1-based page number.
pub fn artifact_file_name(title: &str, page_index: usize, kind: ArtifactKind) -> String {
    let stem = if title.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        WHITESPACE_RUN.replace_all(title, "-").into_owned()
    };
    format!("{stem}_page{}.{}", page_index + 1, kind.extension())
}

/// Encodes a captured bitmap as the bytes of `kind`.
pub fn encode_artifact(
    kind: ArtifactKind,
    bitmap: &RgbaImage,
    spec: &CaptureSpec,
) -> Result<Vec<u8>, ArtifactError> {
    match kind {
        ArtifactKind::Pdf => Ok(encode_pdf_page(bitmap, spec.width_px, spec.height_px)?),
        ArtifactKind::Png => encode_png(bitmap),
    }
}

fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>, ArtifactError> {
    let mut data = Vec::new();
    PngEncoder::new(&mut data)
        .write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            ColorType::Rgba8,
        )
        .map_err(ArtifactError::Png)?;
    Ok(data)
}
