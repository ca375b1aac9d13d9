use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot open {}: {reason}", .path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("cannot render page {} of {}: {reason}", .page_idx + 1, .path.display())]
    PageRender {
        path: PathBuf,
        page_idx: usize,
        reason: String,
    },

    #[error("OCR failed on page {} of {}: {reason}", .page_idx + 1, .path.display())]
    OcrEngine {
        path: PathBuf,
        page_idx: usize,
        reason: String,
    },

    #[error("invalid input {}: {reason}", .path.display())]
    InvalidInputPath { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub fn document_open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DocumentOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn page_render(path: impl Into<PathBuf>, page_idx: usize, reason: impl ToString) -> Self {
        Self::PageRender {
            path: path.into(),
            page_idx,
            reason: reason.to_string(),
        }
    }

    pub fn ocr_engine(path: impl Into<PathBuf>, page_idx: usize, reason: impl ToString) -> Self {
        Self::OcrEngine {
            path: path.into(),
            page_idx,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_one_based_pages() {
        let err = ConvertError::page_render("doc.pdf", 2, "bad raster");
        assert_eq!(err.to_string(), "cannot render page 3 of doc.pdf: bad raster");
    }
}
