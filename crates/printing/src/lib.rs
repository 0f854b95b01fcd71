//! Pagination and page-capture export shared by the log editor and the CLI.

pub mod artifact;
pub mod display;
pub mod export;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod target;

pub use artifact::{
    artifact_file_name, encode_artifact, ArtifactError, ArtifactKind, ExportArtifact,
    DEFAULT_FILE_STEM,
};
pub use display::{Color, DisplayCommand, GlyphRun, PageDisplayList, Point, Rectangle, Size, Stroke};
pub use export::{
    ArtifactSink, CaptureExporter, DirectorySink, ExportError, ExportReport, PageFailure,
    SavedArtifact, SETTLE_DELAY,
};
pub use layout::{
    soft_wrap, split_text_into_pages, LayoutSummary, Page, Pages, PaginationMetrics,
    PaginationResult, Paginator, TextPaginator,
};
pub use pdf::{encode_pdf_page, PdfError, PDF_IMAGE_QUALITY};
pub use raster::{rasterize, CaptureSpec, CAPTURE_SCALE, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
pub use target::{CaptureError, PageSurface, RenderTarget, VISIBLE_PAGE_ID};
