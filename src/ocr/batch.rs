use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

use crate::assembly::LineAssembler;
use crate::core::config::ConverterConfig;
use crate::core::error::ConvertError;
use crate::core::model::{ParagraphSet, Provenance, RawFragment};
use crate::ocr::{DocumentProvider, OcrEngine, PageSource};
use crate::report::Reporter;

/// Per-document page accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub total: usize,
    pub recognized: usize,
    pub skipped: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutput {
    pub paragraphs: ParagraphSet,
    pub report: PageReport,
}

/// Downscales `image` so neither side exceeds `max_dimension`, keeping the
/// aspect ratio. Images already within bounds are returned untouched.
pub fn fit_within(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return image;
    }
    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Recognized page text as ordered line fragments, numbered from `first_order`.
pub fn ocr_lines(text: &str, page_idx: usize, first_order: usize) -> Vec<RawFragment> {
    text.lines()
        .enumerate()
        .map(|(i, line)| RawFragment::new(line, page_idx, first_order + i, Provenance::Ocr))
        .collect()
}

/// Rasterizes and recognizes a document page by page.
///
/// Pages go through in `batch_size` chunks. Batching only controls progress
/// reporting and how often the document is asked to reclaim resources; the
/// output does not depend on it. A page that fails to render or recognize is
/// skipped. Failing to open the document or count its pages aborts the run.
pub struct OcrBatchRunner<'a> {
    documents: &'a dyn DocumentProvider,
    engine: &'a dyn OcrEngine,
    config: &'a ConverterConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> OcrBatchRunner<'a> {
    pub fn new(
        documents: &'a dyn DocumentProvider,
        engine: &'a dyn OcrEngine,
        config: &'a ConverterConfig,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            documents,
            engine,
            config,
            reporter,
        }
    }

    pub fn run(&self, pdf_path: &Path) -> Result<OcrOutput, ConvertError> {
        // Dropping `document` releases it, whichever way this returns.
        let document = self
            .documents
            .open(pdf_path)
            .map_err(|err| ConvertError::document_open(pdf_path, format!("{err:#}")))?;
        let page_count = document
            .page_count()
            .map_err(|err| ConvertError::document_open(pdf_path, format!("{err:#}")))?;

        let mut assembler = LineAssembler::new(self.config.min_paragraph_length);
        let mut report = PageReport {
            total: page_count,
            ..PageReport::default()
        };
        let batch_size = self.config.batch_size.max(1);
        let mut next_order = 0;

        for batch_start in (0..page_count).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(page_count);
            self.reporter.debug(&format!(
                "OCR {}: pages {}-{} of {}",
                pdf_path.display(),
                batch_start + 1,
                batch_end,
                page_count
            ));

            for page_idx in batch_start..batch_end {
                match self.recognize_page(document.as_ref(), pdf_path, page_idx) {
                    Ok(text) => {
                        let lines = ocr_lines(&text, page_idx, next_order);
                        next_order += lines.len();
                        for line in &lines {
                            assembler.push_fragment(line);
                        }
                        report.recognized += 1;
                    }
                    Err(err) => {
                        self.reporter.warn(&format!("Skipping page: {err}"));
                        report.skipped.push(page_idx);
                    }
                }
            }

            document.reclaim();
            self.reporter
                .debug(&format!("Reclaimed resources after page {batch_end}"));
        }

        Ok(OcrOutput {
            paragraphs: assembler.finish(),
            report,
        })
    }

    // The page image lives only for the duration of this call.
    fn recognize_page(
        &self,
        document: &dyn PageSource,
        pdf_path: &Path,
        page_idx: usize,
    ) -> Result<String, ConvertError> {
        let image = document
            .render_page(page_idx, self.config.dpi)
            .map_err(|err| ConvertError::page_render(pdf_path, page_idx, format!("{err:#}")))?;
        let image = fit_within(image, self.config.max_image_dimension);
        self.engine
            .recognize(&image, &self.config.ocr_lang)
            .map_err(|err| ConvertError::ocr_engine(pdf_path, page_idx, format!("{err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MemoryReporter, Severity};
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    // Page `n` renders as an image n+1 pixels wide so the engine can tell
    // pages apart.
    struct FakeDocument {
        pages: usize,
        failing_render: Vec<usize>,
        count_fails: bool,
        reclaims: Rc<Cell<usize>>,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for FakeDocument {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    impl PageSource for FakeDocument {
        fn page_count(&self) -> Result<usize> {
            if self.count_fails {
                anyhow::bail!("page tree is damaged");
            }
            Ok(self.pages)
        }

        fn render_page(&self, page_idx: usize, _dpi: u32) -> Result<DynamicImage> {
            if self.failing_render.contains(&page_idx) {
                anyhow::bail!("corrupt page stream");
            }
            Ok(DynamicImage::new_luma8(page_idx as u32 + 1, 1))
        }

        fn reclaim(&self) {
            self.reclaims.set(self.reclaims.get() + 1);
        }
    }

    #[derive(Default)]
    struct FakeDocuments {
        pages: usize,
        failing_render: Vec<usize>,
        count_fails: bool,
        reclaims: Rc<Cell<usize>>,
        drops: Rc<Cell<usize>>,
    }

    impl DocumentProvider for FakeDocuments {
        fn open(&self, _pdf_path: &Path) -> Result<Box<dyn PageSource>> {
            Ok(Box::new(FakeDocument {
                pages: self.pages,
                failing_render: self.failing_render.clone(),
                count_fails: self.count_fails,
                reclaims: Rc::clone(&self.reclaims),
                drops: Rc::clone(&self.drops),
            }))
        }
    }

    struct UnopenableDocuments;

    impl DocumentProvider for UnopenableDocuments {
        fn open(&self, _pdf_path: &Path) -> Result<Box<dyn PageSource>> {
            anyhow::bail!("not a PDF")
        }
    }

    struct PageEchoEngine {
        failing_pages: Vec<usize>,
    }

    impl OcrEngine for PageEchoEngine {
        fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String> {
            let page_idx = image.dimensions().0 as usize - 1;
            if self.failing_pages.contains(&page_idx) {
                anyhow::bail!("engine crashed");
            }
            Ok(format!(
                "Recognized text for page number {} in {lang}\n\n",
                page_idx + 1
            ))
        }
    }

    fn run(
        documents: &dyn DocumentProvider,
        engine: &dyn OcrEngine,
    ) -> (Result<OcrOutput, ConvertError>, MemoryReporter) {
        let config = ConverterConfig::default();
        let reporter = MemoryReporter::new();
        let result =
            OcrBatchRunner::new(documents, engine, &config, &reporter).run(Path::new("scan.pdf"));
        (result, reporter)
    }

    #[test]
    fn failing_page_is_skipped_and_the_rest_contribute() -> Result<()> {
        let documents = FakeDocuments {
            pages: 10,
            failing_render: vec![2],
            ..FakeDocuments::default()
        };
        let engine = PageEchoEngine { failing_pages: vec![] };
        let (result, reporter) = run(&documents, &engine);
        let output = result?;

        assert_eq!(output.paragraphs.len(), 9);
        assert_eq!(output.report.skipped, vec![2]);
        assert_eq!(output.report.recognized, 9);
        assert_eq!(
            output.paragraphs.get("Paragraph_3"),
            Some("Recognized text for page number 4 in eng")
        );
        let warnings = reporter.messages(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("page 3"));
        Ok(())
    }

    #[test]
    fn engine_failures_are_isolated_per_page() -> Result<()> {
        let documents = FakeDocuments {
            pages: 3,
            ..FakeDocuments::default()
        };
        let engine = PageEchoEngine { failing_pages: vec![0] };
        let (result, _) = run(&documents, &engine);
        let output = result?;
        assert_eq!(output.report.skipped, vec![0]);
        assert_eq!(output.paragraphs.len(), 2);
        Ok(())
    }

    #[test]
    fn progress_is_reported_once_per_batch() -> Result<()> {
        let documents = FakeDocuments {
            pages: 12,
            ..FakeDocuments::default()
        };
        let engine = PageEchoEngine { failing_pages: vec![] };
        let (result, reporter) = run(&documents, &engine);
        result?;
        assert_eq!(documents.reclaims.get(), 3);
        let progress: Vec<String> = reporter
            .messages(Severity::Debug)
            .into_iter()
            .filter(|m| m.starts_with("OCR "))
            .collect();
        assert_eq!(
            progress,
            vec![
                "OCR scan.pdf: pages 1-5 of 12",
                "OCR scan.pdf: pages 6-10 of 12",
                "OCR scan.pdf: pages 11-12 of 12",
            ]
        );
        Ok(())
    }

    #[test]
    fn document_is_released_after_page_failures() -> Result<()> {
        let documents = FakeDocuments {
            pages: 4,
            failing_render: vec![1],
            ..FakeDocuments::default()
        };
        let engine = PageEchoEngine { failing_pages: vec![3] };
        let (result, _) = run(&documents, &engine);
        assert_eq!(result?.report.skipped, vec![1, 3]);
        assert_eq!(documents.drops.get(), 1);
        Ok(())
    }

    #[test]
    fn document_is_released_when_counting_pages_fails() {
        let documents = FakeDocuments {
            count_fails: true,
            ..FakeDocuments::default()
        };
        let engine = PageEchoEngine { failing_pages: vec![] };
        let (result, _) = run(&documents, &engine);
        assert!(matches!(result, Err(ConvertError::DocumentOpen { .. })));
        assert_eq!(documents.drops.get(), 1);
        assert_eq!(documents.reclaims.get(), 0);
    }

    #[test]
    fn recognized_lines_keep_page_and_order() {
        let lines = ocr_lines("First line\n\nThird line", 4, 10);
        let placed: Vec<(&str, usize, usize, Provenance)> = lines
            .iter()
            .map(|f| (f.text.as_str(), f.page_idx, f.order, f.source))
            .collect();
        assert_eq!(
            placed,
            vec![
                ("First line", 4, 10, Provenance::Ocr),
                ("", 4, 11, Provenance::Ocr),
                ("Third line", 4, 12, Provenance::Ocr),
            ]
        );
    }

    #[test]
    fn unopenable_document_aborts_the_run() {
        let engine = PageEchoEngine { failing_pages: vec![] };
        let (result, _) = run(&UnopenableDocuments, &engine);
        assert!(matches!(result, Err(ConvertError::DocumentOpen { .. })));
    }

    #[test]
    fn large_images_are_capped_on_the_longer_side() {
        let wide = fit_within(DynamicImage::new_luma8(400, 100), 200);
        assert_eq!(wide.dimensions(), (200, 50));

        let tall = fit_within(DynamicImage::new_luma8(90, 360), 200);
        assert_eq!(tall.dimensions(), (50, 200));

        let small = fit_within(DynamicImage::new_luma8(150, 120), 200);
        assert_eq!(small.dimensions(), (150, 120));
    }
}
