use std::fs;
use std::path::{Path, PathBuf};

use crate::assembly::BlockAssembler;
use crate::core::config::ConverterConfig;
use crate::core::error::ConvertError;
use crate::core::model::ExtractionResult;
use crate::export::{Exporter, JsonExporter};
use crate::ocr::{DocumentProvider, OcrBatchRunner, OcrEngine, PopplerDocuments, TesseractCli};
use crate::parser::{LopdfExtractor, NativeExtractor};
use crate::report::{Reporter, TracingReporter};
use crate::strategy::StrategySelector;

/// Converts PDF documents into paragraph JSON.
///
/// Holds only read-only configuration and stateless collaborators, so one
/// converter can process any number of documents one after another.
pub struct Converter {
    config: ConverterConfig,
    native: Box<dyn NativeExtractor>,
    documents: Box<dyn DocumentProvider>,
    engine: Box<dyn OcrEngine>,
    reporter: Box<dyn Reporter>,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            native: Box::new(LopdfExtractor::new()),
            documents: Box::new(PopplerDocuments::new()),
            engine: Box::new(TesseractCli::new()),
            reporter: Box::new(TracingReporter),
        }
    }

    pub fn with_native_extractor(mut self, native: Box<dyn NativeExtractor>) -> Self {
        self.native = native;
        self
    }

    pub fn with_document_provider(mut self, documents: Box<dyn DocumentProvider>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_ocr_engine(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Block-mode paragraphs from the embedded text layer.
    pub fn extract_native(&self, pdf_path: &Path) -> ExtractionResult {
        let blocks = self
            .native
            .extract_blocks(pdf_path)
            .map_err(|err| ConvertError::document_open(pdf_path, format!("{err:#}")))?;
        Ok(BlockAssembler::from_config(&self.config).assemble(&blocks))
    }

    /// Line-mode paragraphs from rasterized pages.
    pub fn extract_ocr(&self, pdf_path: &Path) -> ExtractionResult {
        let runner = OcrBatchRunner::new(
            self.documents.as_ref(),
            self.engine.as_ref(),
            &self.config,
            self.reporter.as_ref(),
        );
        let output = runner.run(pdf_path)?;
        self.reporter.info(&format!(
            "OCR recognized {}/{} page(s) of {}",
            output.report.recognized,
            output.report.total,
            pdf_path.display()
        ));
        Ok(output.paragraphs)
    }

    pub fn extract_paragraphs(&self, pdf_path: &Path) -> ExtractionResult {
        self.reporter
            .info(&format!("Processing: {}", pdf_path.display()));
        StrategySelector::from_config(&self.config).run(
            pdf_path,
            self.reporter.as_ref(),
            || self.extract_native(pdf_path),
            || self.extract_ocr(pdf_path),
        )
    }

    /// Extracts `pdf_path` and writes the JSON next to it, or to
    /// `output_path` when given. Nothing is written if extraction fails.
    pub fn convert_pdf_to_json(
        &self,
        pdf_path: &Path,
        output_path: Option<&Path>,
    ) -> ExtractionResult {
        let paragraphs = match self.extract_paragraphs(pdf_path) {
            Ok(paragraphs) => paragraphs,
            Err(err) => {
                self.reporter
                    .error(&format!("Error processing {}: {err}", pdf_path.display()));
                return Err(err);
            }
        };

        let output = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(pdf_path));
        if let Err(err) = JsonExporter::new(output.clone()).export(&paragraphs) {
            self.reporter
                .error(&format!("Error writing {}: {err}", output.display()));
            return Err(err);
        }

        self.reporter.info(&format!(
            "Successfully converted {} to {}",
            pdf_path.display(),
            output.display()
        ));
        Ok(paragraphs)
    }
}

pub fn default_output_path(pdf_path: &Path) -> PathBuf {
    pdf_path.with_extension("json")
}

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Checks a user-supplied input before any conversion is attempted.
pub fn validate_input_path(path: &Path) -> Result<(), ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::InvalidInputPath {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }
    if !has_pdf_extension(path) {
        return Err(ConvertError::InvalidInputPath {
            path: path.to_path_buf(),
            reason: "expected a .pdf file".to_string(),
        });
    }
    Ok(())
}

/// PDF files directly inside `dir`, sorted by path.
pub fn find_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}
