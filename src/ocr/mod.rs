pub mod batch;
pub mod bridge;
pub mod renderer;

pub use batch::{fit_within, ocr_lines, OcrBatchRunner, OcrOutput, PageReport};
pub use bridge::TesseractCli;
pub use renderer::{PopplerDocument, PopplerDocuments, RenderedPage};

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;

/// Opens documents for rasterization. The returned handle releases its
/// resources when dropped.
pub trait DocumentProvider {
    fn open(&self, pdf_path: &Path) -> Result<Box<dyn PageSource>>;
}

/// An open document that can render single pages.
pub trait PageSource {
    fn page_count(&self) -> Result<usize>;

    /// Renders the 0-based page at `dpi` and decodes it into pixels.
    fn render_page(&self, page_idx: usize, dpi: u32) -> Result<DynamicImage>;

    /// Frees cached per-page resources. Called once per batch.
    fn reclaim(&self) {}
}

pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String>;
}
