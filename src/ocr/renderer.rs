use anyhow::{Context, Result};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::ocr::{DocumentProvider, PageSource};
use crate::parser::pdf_reader::PdfReader;

/// A raster written by `pdftoppm`. The file is removed on drop.
#[derive(Debug)]
pub struct RenderedPage {
    pub path: PathBuf,
    pub page_idx: usize,
}

impl RenderedPage {
    pub fn decode(&self) -> Result<DynamicImage> {
        image::open(&self.path)
            .with_context(|| format!("failed to decode raster {}", self.path.display()))
    }
}

impl Drop for RenderedPage {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Opens documents through poppler-utils.
#[derive(Debug, Default, Clone, Copy)]
pub struct PopplerDocuments;

impl PopplerDocuments {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentProvider for PopplerDocuments {
    fn open(&self, pdf_path: &Path) -> Result<Box<dyn PageSource>> {
        Ok(Box::new(PopplerDocument::open(pdf_path)?))
    }
}

/// Open document with a private scratch directory for rasters. Dropping the
/// handle deletes the directory and everything left in it.
#[derive(Debug)]
pub struct PopplerDocument {
    reader: PdfReader,
    scratch: TempDir,
}

impl PopplerDocument {
    pub fn open(pdf_path: &Path) -> Result<Self> {
        let reader = PdfReader::new(pdf_path.to_path_buf())?;
        let scratch = tempfile::Builder::new()
            .prefix("pdfparagraphs-")
            .tempdir()
            .with_context(|| "failed to create raster scratch directory")?;
        Ok(Self { reader, scratch })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn render_to_file(&self, page_idx: usize, dpi: u32) -> Result<RenderedPage> {
        // pdftoppm uses 1-based page indices
        let page_number = page_idx + 1;
        let prefix = self.scratch.path().join(format!("page_{:04}", page_number));
        let prefix_str = prefix
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 scratch path not supported"))?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(self.reader.path())
            .arg(prefix_str)
            .output()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdftoppm failed with status {}: {}", output.status, stderr.trim());
        }

        // -singlefile writes exactly `<prefix>.png`
        let rendered = RenderedPage {
            path: prefix.with_extension("png"),
            page_idx,
        };
        if !rendered.path.exists() {
            anyhow::bail!(
                "expected rendered image not found: {}",
                rendered.path.display()
            );
        }
        Ok(rendered)
    }
}

impl PageSource for PopplerDocument {
    fn page_count(&self) -> Result<usize> {
        self.reader.page_count()
    }

    fn render_page(&self, page_idx: usize, dpi: u32) -> Result<DynamicImage> {
        let rendered = self.render_to_file(page_idx, dpi)?;
        rendered.decode()
    }

    fn reclaim(&self) {
        let Ok(entries) = fs::read_dir(self.scratch.path()) else {
            return;
        };
        for entry in entries.flatten() {
            let _ = fs::remove_file(entry.path());
        }
    }
}
