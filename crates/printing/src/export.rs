//! Page-synchronized export: switch the visible page, let it settle, capture
//! it, and hand the encoded artifact to a sink without waiting for the save.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::artifact::{
    artifact_file_name, encode_artifact, ArtifactError, ArtifactKind, ExportArtifact,
};
use crate::layout::Pages;
use crate::raster::CaptureSpec;
use crate::target::{CaptureError, PageSurface, RenderTarget, VISIBLE_PAGE_ID};

/// Time given to the render surface to finish a page switch before capture.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Per-page export failure.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Encode(#[from] ArtifactError),
    #[error("save failed: {0}")]
    Save(String),
    #[error("save task ended abnormally: {0}")]
    Task(String),
}

/// Record of one artifact accepted by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub page_index: usize,
    pub kind: ArtifactKind,
    pub file_name: String,
    pub location: Option<PathBuf>,
    pub size_bytes: usize,
}

impl SavedArtifact {
    pub fn from_artifact(artifact: &ExportArtifact, location: Option<PathBuf>) -> Self {
        Self {
            page_index: artifact.page_index,
            kind: artifact.kind,
            file_name: artifact.file_name.clone(),
            location,
            size_bytes: artifact.bytes.len(),
        }
    }
}

/// A page that produced no artifact. `page_index` is `None` when the save
/// task itself was lost.
#[derive(Debug)]
pub struct PageFailure {
    pub page_index: Option<usize>,
    pub error: ExportError,
}

/// Outcome of one export call, ordered by page index.
#[derive(Debug)]
pub struct ExportReport {
    pub kind: ArtifactKind,
    pub page_count: usize,
    pub saved: Vec<SavedArtifact>,
    pub skipped: Vec<usize>,
    pub failed: Vec<PageFailure>,
}

impl ExportReport {
    fn new(kind: ArtifactKind, page_count: usize) -> Self {
        Self {
            kind,
            page_count,
            saved: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.saved.len() == self.page_count
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.saved.iter().map(|saved| saved.file_name.as_str()).collect()
    }
}

/// Destination for encoded artifacts (a download folder, an upload, memory).
pub trait ArtifactSink: Send + Sync + 'static {
    type Error: fmt::Display + Send + 'static;

    fn save(
        &self,
        artifact: ExportArtifact,
    ) -> impl Future<Output = Result<SavedArtifact, Self::Error>> + Send;
}

/// Writes each artifact as a file inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    type Error = std::io::Error;

    async fn save(&self, artifact: ExportArtifact) -> Result<SavedArtifact, Self::Error> {
        tokio::fs::create_dir_all(&self.root).await?;
        // Titles may contain path separators; keep every file inside the root.
        let file_name = artifact.file_name.replace(['/', '\\'], "-");
        let path = self.root.join(&file_name);
        let tmp_path = self.root.join(format!("{file_name}.part"));
        tokio::fs::write(&tmp_path, &artifact.bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(SavedArtifact::from_artifact(&artifact, Some(path)))
    }
}

/// Drives the switch, settle, capture and save cycle over every page.
pub struct CaptureExporter<S> {
    sink: Arc<S>,
    title: String,
    spec: CaptureSpec,
}

impl<S> CaptureExporter<S>
where
    S: ArtifactSink,
{
    pub fn new(sink: S, title: impl Into<String>) -> Self {
        Self::with_shared_sink(Arc::new(sink), title)
    }

    pub fn with_shared_sink(sink: Arc<S>, title: impl Into<String>) -> Self {
        Self {
            sink,
            title: title.into(),
            spec: CaptureSpec::default(),
        }
    }

    pub fn with_capture_spec(mut self, spec: CaptureSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Exports one single-page PDF per page.
    pub async fn export_paged<T: RenderTarget>(&self, pages: &Pages, target: &mut T) -> ExportReport {
        self.capture_pages(ArtifactKind::Pdf, pages, target).await
    }

    /// Exports one PNG image per page.
    pub async fn export_images<T: RenderTarget>(&self, pages: &Pages, target: &mut T) -> ExportReport {
        self.capture_pages(ArtifactKind::Png, pages, target).await
    }

    async fn capture_pages<T: RenderTarget>(
        &self,
        kind: ArtifactKind,
        pages: &Pages,
        target: &mut T,
    ) -> ExportReport {
        let mut report = ExportReport::new(kind, pages.len());
        let mut in_flight = JoinSet::new();
        let mut restore = RestoreActivePage::new(target);

        for page in pages {
            let index = page.index();
            restore.target.show_page(index);
            tokio::time::sleep(SETTLE_DELAY).await;

            let Some(surface) = restore.target.find_surface(VISIBLE_PAGE_ID) else {
                warn!(page = page.number(), %kind, "visible page not found, skipping");
                report.skipped.push(index);
                continue;
            };
            let bitmap = match surface.rasterize(&self.spec) {
                Ok(bitmap) => bitmap,
                Err(err) => {
                    warn!(page = page.number(), %kind, error = %err, "page capture failed");
                    report.failed.push(PageFailure {
                        page_index: Some(index),
                        error: err.into(),
                    });
                    continue;
                }
            };
            debug!(
                page = page.number(),
                width = bitmap.width(),
                height = bitmap.height(),
                "captured page"
            );

            let file_name = artifact_file_name(&self.title, index, kind);
            let sink = Arc::clone(&self.sink);
            let spec = self.spec;
            in_flight.spawn(async move {
                let result = match encode_artifact(kind, &bitmap, &spec) {
                    Ok(bytes) => {
                        let artifact = ExportArtifact {
                            page_index: index,
                            kind,
                            file_name,
                            bytes,
                        };
                        sink.save(artifact)
                            .await
                            .map_err(|err| ExportError::Save(err.to_string()))
                    }
                    Err(err) => Err(ExportError::from(err)),
                };
                (index, result)
            });
        }

        drop(restore);

        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((_, Ok(saved))) => report.saved.push(saved),
                Ok((index, Err(err))) => {
                    warn!(page = index + 1, %kind, error = %err, "page save failed");
                    report.failed.push(PageFailure {
                        page_index: Some(index),
                        error: err,
                    });
                }
                Err(join_error) => {
                    error!(%kind, error = %join_error, "save task lost");
                    report.failed.push(PageFailure {
                        page_index: None,
                        error: ExportError::Task(join_error.to_string()),
                    });
                }
            }
        }

        report.saved.sort_by_key(|saved| saved.page_index);
        report.failed.sort_by_key(|failure| failure.page_index);
        info!(
            %kind,
            pages = report.page_count,
            saved = report.saved.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "export finished"
        );
        report
    }
}

/// Puts the target back on the page it showed before the export, also when
/// the export future is dropped part way through the loop.
struct RestoreActivePage<'a, T: RenderTarget> {
    target: &'a mut T,
    original: usize,
}

impl<'a, T: RenderTarget> RestoreActivePage<'a, T> {
    fn new(target: &'a mut T) -> Self {
        let original = target.active_page();
        Self { target, original }
    }
}

impl<T: RenderTarget> Drop for RestoreActivePage<'_, T> {
    fn drop(&mut self) {
        self.target.show_page(self.original);
    }
}
