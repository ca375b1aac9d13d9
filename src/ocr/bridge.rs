use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use std::process::Command;

use crate::ocr::OcrEngine;

/// Runs the `tesseract` command line tool on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
        }
    }

    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String> {
        let input = tempfile::Builder::new()
            .prefix("ocr-")
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create OCR input file")?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .with_context(|| "failed to encode page image for OCR")?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(lang)
            .output()
            .with_context(|| format!("failed to invoke {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
