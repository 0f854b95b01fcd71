use std::ops::Index;

/// Usable writing-area height of a page, in logical pixels.
/// 頁面可書寫區域的高度（邏輯像素）。
pub const DEFAULT_AREA_HEIGHT_PX: u32 = 982;
/// Approximate rendered height of one text row.
/// 單一文字列的估計高度。
pub const DEFAULT_LINE_HEIGHT_PX: u32 = 24;
/// Assumed number of characters that fit on one rendered row.
/// 假設每一列可容納的字元數。
pub const DEFAULT_CHARS_PER_LINE: usize = 70;

/// Tuning constants for the text-flow estimate used by the paginator.
/// 分頁器估算文字流時所使用的參數。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationMetrics {
    pub area_height_px: u32,
    pub line_height_px: u32,
    pub chars_per_line: usize,
}

impl Default for PaginationMetrics {
    fn default() -> Self {
        Self::new(
            DEFAULT_AREA_HEIGHT_PX,
            DEFAULT_LINE_HEIGHT_PX,
            DEFAULT_CHARS_PER_LINE,
        )
    }
}

impl PaginationMetrics {
    pub const fn new(area_height_px: u32, line_height_px: u32, chars_per_line: usize) -> Self {
        Self {
            area_height_px,
            line_height_px,
            chars_per_line,
        }
    }

    pub fn line_height(&self) -> u32 {
        self.line_height_px.max(1)
    }

    pub fn chars_per_line(&self) -> usize {
        self.chars_per_line.max(1)
    }

    /// Height budget of a page; never smaller than one row.
    /// 每頁的高度上限，至少容納一列。
    pub fn height_budget(&self) -> u64 {
        u64::from(self.area_height_px.max(self.line_height()))
    }

    pub fn lines_per_page(&self) -> usize {
        (self.height_budget() / u64::from(self.line_height())) as usize
    }

    pub fn chars_per_page(&self) -> usize {
        self.lines_per_page() * self.chars_per_line()
    }

    /// Number of visual rows a line of `char_count` characters wraps into.
    /// A blank line counts as zero rows.
    pub fn estimate_rows(&self, char_count: usize) -> usize {
        char_count.div_ceil(self.chars_per_line())
    }

    pub fn estimate_height(&self, char_count: usize) -> u64 {
        self.estimate_rows(char_count) as u64 * u64::from(self.line_height())
    }
}

/// One page-sized slice of the narrative text.
/// 敘事文字中一頁大小的片段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    index: usize,
    text: String,
    continues_line: bool,
}

impl Page {
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based page number used for display and file names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the next page starts in the middle of the same source line
    /// (a hard-split boundary, no newline was consumed).
    pub fn continues_line(&self) -> bool {
        self.continues_line
    }
}

/// Ordered, never-empty sequence of pages.
/// 依序排列且永不為空的頁面集合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    pages: Vec<Page>,
}

impl Default for Pages {
    fn default() -> Self {
        Self::blank()
    }
}

impl Pages {
    /// A single empty page, the layout of an empty document.
    pub fn blank() -> Self {
        Self {
            pages: vec![Page {
                index: 0,
                text: String::new(),
                continues_line: false,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn last_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.pages.iter().map(Page::text).collect()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.pages.into_iter().map(|page| page.text).collect()
    }

    /// Rebuilds the source text, rejoining on the separators consumed by pagination.
    /// 依分頁時消耗的分隔符號重建原始文字。
    pub fn reconstruct(&self) -> String {
        let mut output = String::new();
        for (position, page) in self.pages.iter().enumerate() {
            output.push_str(&page.text);
            if position + 1 < self.pages.len() && !page.continues_line {
                output.push('\n');
            }
        }
        output
    }
}

impl Index<usize> for Pages {
    type Output = Page;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pages[index]
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Summary produced after pagination.
/// 分頁完成後的摘要資訊。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub total_pages: usize,
    pub total_lines: usize,
    pub hard_splits: usize,
}

/// Result from running the paginator.
/// 分頁器執行後的整體結果。
#[derive(Debug, Clone)]
pub struct PaginationResult {
    pub pages: Pages,
    pub summary: LayoutSummary,
}

/// Contract implemented by the pagination engine.
/// 分頁引擎需實作的介面契約。
pub trait Paginator {
    fn paginate(&self, text: &str) -> PaginationResult;
}

/// Paginator that simulates soft-wrapped text flow with fixed row metrics.
/// 以固定列高與每列字數模擬自動換行的分頁器。
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPaginator {
    metrics: PaginationMetrics,
}

impl TextPaginator {
    pub const fn new(metrics: PaginationMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &PaginationMetrics {
        &self.metrics
    }
}

impl Paginator for TextPaginator {
    fn paginate(&self, text: &str) -> PaginationResult {
        let mut builder = PageBuilder::new(&self.metrics);
        let mut total_lines = 0usize;
        for line in text.split('\n') {
            builder.push_line(line);
            total_lines += 1;
        }
        builder.finish(total_lines)
    }
}

/// Splits `text` into page texts using the default metrics.
pub fn split_text_into_pages(text: &str) -> Vec<String> {
    TextPaginator::default().paginate(text).pages.into_texts()
}

/// Breaks a single line into rows of at most `chars_per_line` characters,
/// matching the wrap the paginator assumes.
pub fn soft_wrap(line: &str, chars_per_line: usize) -> Vec<&str> {
    let width = chars_per_line.max(1);
    let mut rows = Vec::new();
    let mut rest = line;
    while let Some((split_at, _)) = rest.char_indices().nth(width) {
        let (row, tail) = rest.split_at(split_at);
        rows.push(row);
        rest = tail;
    }
    rows.push(rest);
    rows
}

struct PageBuilder<'m> {
    metrics: &'m PaginationMetrics,
    pages: Vec<Page>,
    current: Option<String>,
    current_height: u64,
    hard_splits: usize,
}

impl<'m> PageBuilder<'m> {
    fn new(metrics: &'m PaginationMetrics) -> Self {
        Self {
            metrics,
            pages: Vec::new(),
            current: None,
            current_height: 0,
            hard_splits: 0,
        }
    }

    fn push_line(&mut self, line: &str) {
        let char_count = line.chars().count();
        if char_count > self.metrics.chars_per_page() {
            self.flush();
            self.hard_split(line);
            return;
        }

        let height = self.metrics.estimate_height(char_count);
        match self.current.as_mut() {
            Some(buffer) if self.current_height + height <= self.metrics.height_budget() => {
                buffer.push('\n');
                buffer.push_str(line);
                self.current_height += height;
            }
            Some(_) => {
                self.flush();
                self.start(line, height);
            }
            None => self.start(line, height),
        }
    }

    fn start(&mut self, line: &str, height: u64) {
        self.current = Some(line.to_string());
        self.current_height = height;
    }

    fn flush(&mut self) {
        if let Some(text) = self.current.take() {
            self.push_page(text, false);
        }
        self.current_height = 0;
    }

    // Oversized line: emit full chunks as their own pages, keep the remainder open.
    fn hard_split(&mut self, line: &str) {
        let chars_per_page = self.metrics.chars_per_page();
        let mut rest = line;
        while let Some((split_at, _)) = rest.char_indices().nth(chars_per_page) {
            let (chunk, tail) = rest.split_at(split_at);
            self.push_page(chunk.to_string(), true);
            rest = tail;
        }
        self.hard_splits += 1;
        self.start(rest, self.metrics.estimate_height(rest.chars().count()));
    }

    fn push_page(&mut self, text: String, continues_line: bool) {
        let index = self.pages.len();
        self.pages.push(Page {
            index,
            text,
            continues_line,
        });
    }

    fn finish(mut self, total_lines: usize) -> PaginationResult {
        self.flush();
        let pages = if self.pages.is_empty() {
            Pages::blank()
        } else {
            Pages { pages: self.pages }
        };
        let summary = LayoutSummary {
            total_pages: pages.len(),
            total_lines,
            hard_splits: self.hard_splits,
        };
        PaginationResult { pages, summary }
    }
}
