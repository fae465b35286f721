//! Raw content providers: statement documents, their text layer, detected
//! tables and rendered page images.

mod extractor;
mod layout_table;

pub use extractor::PdfDocument;
pub use layout_table::LayoutTableDetector;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// One detected table: rows of cell strings.
pub type Table = Vec<Vec<String>>;

/// A document the extraction pipeline can read. Pages are 1-indexed.
pub trait StatementDocument {
    fn page_count(&self) -> u32;

    /// Raw text of one page, spacing preserved.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Text of the whole document, read in a single pass.
    fn document_text(&self) -> Result<String> {
        let mut pages = Vec::with_capacity(self.page_count() as usize);
        for page in 1..=self.page_count() {
            pages.push(self.page_text(page)?);
        }
        Ok(pages.join("\n"))
    }

    /// Non-blank lines of one page in reading order.
    fn page_lines(&self, page: u32) -> Result<Vec<String>> {
        Ok(self
            .page_text(page)?
            .lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.trim().is_empty())
            .collect())
    }

    /// Tables detected on one page. An empty list is a valid answer.
    fn tables(&self, page: u32) -> Result<Vec<Table>> {
        Ok(LayoutTableDetector::default().detect(&self.page_text(page)?))
    }

    /// Render one page for OCR.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}

/// A document held in memory: page texts, optional explicit tables and
/// optional page images. Used for image input and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<String>,
    tables: Vec<Option<Vec<Table>>>,
    images: Vec<Option<DynamicImage>>,
}

impl MemoryDocument {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        let pages: Vec<String> = pages.into_iter().map(Into::into).collect();
        let count = pages.len();
        Self {
            pages,
            tables: vec![None; count],
            images: vec![None; count],
        }
    }

    /// A single-page document with no text layer, for scanned images.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            pages: vec![String::new()],
            tables: vec![None],
            images: vec![Some(image)],
        }
    }

    /// Replace the detected tables of a page.
    pub fn with_tables(mut self, page: u32, tables: Vec<Table>) -> Self {
        if let Some(slot) = self.slot(page) {
            self.tables[slot] = Some(tables);
        }
        self
    }

    pub fn with_page_image(mut self, page: u32, image: DynamicImage) -> Self {
        if let Some(slot) = self.slot(page) {
            self.images[slot] = Some(image);
        }
        self
    }

    fn slot(&self, page: u32) -> Option<usize> {
        let index = (page as usize).checked_sub(1)?;
        (index < self.pages.len()).then_some(index)
    }
}

impl StatementDocument for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let slot = self.slot(page).ok_or(PdfError::InvalidPage(page))?;
        Ok(self.pages[slot].clone())
    }

    fn tables(&self, page: u32) -> Result<Vec<Table>> {
        let slot = self.slot(page).ok_or(PdfError::InvalidPage(page))?;
        match &self.tables[slot] {
            Some(tables) => Ok(tables.clone()),
            None => Ok(LayoutTableDetector::default().detect(&self.pages[slot])),
        }
    }

    fn render_page(&self, page: u32, _dpi: u32) -> Result<DynamicImage> {
        let slot = self.slot(page).ok_or(PdfError::InvalidPage(page))?;
        self.images[slot]
            .clone()
            .ok_or_else(|| PdfError::ImageExtraction(format!("page {} has no image", page)))
    }
}
