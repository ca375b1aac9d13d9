pub mod layout_builder;
pub mod pdf_reader;
pub mod text_extractor;

pub use layout_builder::{ParserLayoutBuilder, TextLine, TextSpan};
pub use pdf_reader::{PdfInfo, PdfReader};
pub use text_extractor::{page_spans, LopdfExtractor};

use anyhow::Result;
use std::path::Path;

use crate::core::model::RawFragment;

/// Native layout extraction: text containers in reading order.
pub trait NativeExtractor {
    fn extract_blocks(&self, pdf_path: &Path) -> Result<Vec<RawFragment>>;
}
