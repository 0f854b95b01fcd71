use image::RgbaImage;
use thiserror::Error;

use crate::raster::CaptureSpec;

/// Stable identifier of the page surface that is currently visible.
/// 目前顯示中頁面的固定識別碼。
pub const VISIBLE_PAGE_ID: &str = "visible-page";

/// Errors raised while rasterizing a located surface.
/// 將頁面點陣化時可能發生的錯誤。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("surface was detached before capture")]
    Detached,
    #[error("rasterization failed: {0}")]
    Rasterize(String),
}

/// A rendered page that can be captured into an owned bitmap.
/// 可擷取為點陣圖的已渲染頁面。
pub trait PageSurface {
    /// Returns a bitmap detached from the live surface, so later page
    /// switches cannot alter an in-flight save.
    fn rasterize(&self, spec: &CaptureSpec) -> Result<RgbaImage, CaptureError>;
}

/// Surface that renders exactly one page at a time.
/// 一次僅渲染單一頁面的顯示介面。
pub trait RenderTarget {
    type Surface: PageSurface;

    /// Index of the page currently shown.
    fn active_page(&self) -> usize;

    /// Makes page `index` the visible one. Rendering may complete later.
    fn show_page(&mut self, index: usize);

    /// Looks up the surface registered under `id`, if it has been rendered.
    fn find_surface(&self, id: &str) -> Option<Self::Surface>;
}

/// Scripted render target used by exporter tests.
/// 測試使用的可編排顯示介面。
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use image::{Rgba, RgbaImage};
    use tokio::time::Instant;

    use super::{CaptureError, PageSurface, RenderTarget, VISIBLE_PAGE_ID};
    use crate::raster::CaptureSpec;

    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTarget {
        pub active: usize,
        pub shown: Vec<usize>,
        pub shown_at: Vec<Instant>,
        pub missing: HashSet<usize>,
        pub broken: HashSet<usize>,
        pub events: Option<Arc<Mutex<Vec<String>>>>,
    }

    impl ScriptedTarget {
        pub(crate) fn starting_at(active: usize) -> Self {
            Self {
                active,
                ..Self::default()
            }
        }
    }

    pub(crate) struct ScriptedSurface {
        page: usize,
        broken: bool,
    }

    impl PageSurface for ScriptedSurface {
        fn rasterize(&self, spec: &CaptureSpec) -> Result<RgbaImage, CaptureError> {
            if self.broken {
                return Err(CaptureError::Rasterize(format!("page {} is broken", self.page)));
            }
            let shade = (self.page * 40 % 256) as u8;
            let (width, height) = spec.pixel_size();
            Ok(RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255])))
        }
    }

    impl RenderTarget for ScriptedTarget {
        type Surface = ScriptedSurface;

        fn active_page(&self) -> usize {
            self.active
        }

        fn show_page(&mut self, index: usize) {
            self.active = index;
            self.shown.push(index);
            self.shown_at.push(Instant::now());
            if let Some(events) = &self.events {
                events.lock().unwrap().push(format!("show {index}"));
            }
        }

        fn find_surface(&self, id: &str) -> Option<Self::Surface> {
            if id != VISIBLE_PAGE_ID || self.missing.contains(&self.active) {
                return None;
            }
            Some(ScriptedSurface {
                page: self.active,
                broken: self.broken.contains(&self.active),
            })
        }
    }
}
