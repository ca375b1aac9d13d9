use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The `Key: value` table printed by poppler's `pdfinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    fields: BTreeMap<String, String>,
}

impl PdfInfo {
    pub fn parse(output: &str) -> Self {
        let fields = output
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn pages(&self) -> Result<usize> {
        let raw = self.get("Pages").context("pdfinfo reported no page count")?;
        raw.parse()
            .with_context(|| format!("unreadable page count '{raw}'"))
    }
}

/// A PDF on disk, inspected through `pdfinfo`.
#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("not a readable file: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> Result<PdfInfo> {
        let output = Command::new("pdfinfo")
            .arg(&self.path)
            .output()
            .context("failed to invoke pdfinfo; is poppler-utils installed?")?;

        if !output.status.success() {
            anyhow::bail!(
                "pdfinfo rejected {}: {}",
                self.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(PdfInfo::parse(&String::from_utf8_lossy(&output.stdout)))
    }

    pub fn page_count(&self) -> Result<usize> {
        self.info()?
            .pages()
            .with_context(|| format!("cannot count pages of {}", self.path.display()))
    }
}
