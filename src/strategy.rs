use std::path::Path;

use crate::core::config::{ConverterConfig, OcrMode};
use crate::core::error::ConvertError;
use crate::core::model::{ExtractionResult, ParagraphSet};
use crate::report::Reporter;

/// What native extraction produced, as seen by the selector.
#[derive(Debug)]
pub enum NativeOutcome {
    Success(ParagraphSet),
    /// Structurally fine but too little text to trust.
    InsufficientContent(ParagraphSet),
    NativeFailure(ConvertError),
}

/// Chooses between native extraction and OCR for one document.
#[derive(Debug, Clone, Copy)]
pub struct StrategySelector {
    mode: OcrMode,
    sufficiency_threshold: usize,
}

impl StrategySelector {
    pub fn new(mode: OcrMode, sufficiency_threshold: usize) -> Self {
        Self {
            mode,
            sufficiency_threshold,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.ocr_mode, config.sufficiency_threshold)
    }

    pub fn is_sufficient(&self, paragraphs: &ParagraphSet) -> bool {
        !paragraphs.is_empty() && paragraphs.total_text_len() >= self.sufficiency_threshold
    }

    pub fn assess(&self, native: ExtractionResult) -> NativeOutcome {
        match native {
            Ok(paragraphs) if self.is_sufficient(&paragraphs) => NativeOutcome::Success(paragraphs),
            Ok(paragraphs) => NativeOutcome::InsufficientContent(paragraphs),
            Err(err) => NativeOutcome::NativeFailure(err),
        }
    }

    /// Runs the extractors this mode calls for. Each closure is invoked at
    /// most once and only when needed.
    pub fn run<N, O>(
        &self,
        pdf_path: &Path,
        reporter: &dyn Reporter,
        native: N,
        ocr: O,
    ) -> ExtractionResult
    where
        N: FnOnce() -> ExtractionResult,
        O: FnOnce() -> ExtractionResult,
    {
        match self.mode {
            OcrMode::Never => native(),
            OcrMode::Always => ocr(),
            OcrMode::Auto => match self.assess(native()) {
                NativeOutcome::Success(paragraphs) => Ok(paragraphs),
                NativeOutcome::NativeFailure(err) => {
                    reporter.warn(&format!(
                        "Native extraction failed ({err}); falling back to OCR for {}",
                        pdf_path.display()
                    ));
                    ocr()
                }
                NativeOutcome::InsufficientContent(paragraphs) => {
                    reporter.warn(&format!(
                        "Native extraction of {} found {} paragraph(s), {} characters; trying OCR",
                        pdf_path.display(),
                        paragraphs.len(),
                        paragraphs.total_text_len()
                    ));
                    match ocr() {
                        Ok(ocr_paragraphs) => Ok(ocr_paragraphs),
                        Err(err) => {
                            reporter.warn(&format!(
                                "OCR fallback failed ({err}); keeping native result for {}",
                                pdf_path.display()
                            ));
                            Ok(paragraphs)
                        }
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn text_of_len(len: usize) -> ParagraphSet {
        ParagraphSet::new(vec!["x".repeat(len)])
    }

    fn ocr_set() -> ParagraphSet {
        ParagraphSet::new(vec!["Recognized by OCR from the page image.".to_string()])
    }

    fn open_failure() -> ConvertError {
        ConvertError::document_open("doc.pdf", "broken xref")
    }

    struct Calls {
        native: Cell<usize>,
        ocr: Cell<usize>,
    }

    impl Calls {
        fn new() -> Self {
            Self {
                native: Cell::new(0),
                ocr: Cell::new(0),
            }
        }
    }

    fn select(
        mode: OcrMode,
        native: ExtractionResult,
        ocr: ExtractionResult,
        calls: &Calls,
    ) -> ExtractionResult {
        let reporter = MemoryReporter::new();
        StrategySelector::new(mode, 100).run(
            Path::new("doc.pdf"),
            &reporter,
            || {
                calls.native.set(calls.native.get() + 1);
                native
            },
            || {
                calls.ocr.set(calls.ocr.get() + 1);
                ocr
            },
        )
    }

    #[test]
    fn auto_tries_ocr_when_native_text_is_short() {
        let calls = Calls::new();
        let result = select(OcrMode::Auto, Ok(text_of_len(80)), Ok(ocr_set()), &calls);
        assert_eq!(calls.ocr.get(), 1);
        assert_eq!(result.ok(), Some(ocr_set()));
    }

    #[test]
    fn auto_keeps_sufficient_native_text() {
        let calls = Calls::new();
        let result = select(OcrMode::Auto, Ok(text_of_len(150)), Ok(ocr_set()), &calls);
        assert_eq!(calls.ocr.get(), 0);
        assert_eq!(result.ok(), Some(text_of_len(150)));
    }

    #[test]
    fn auto_treats_empty_native_result_as_insufficient() {
        let calls = Calls::new();
        let result = select(OcrMode::Auto, Ok(ParagraphSet::default()), Ok(ocr_set()), &calls);
        assert_eq!(calls.ocr.get(), 1);
        assert_eq!(result.ok(), Some(ocr_set()));
    }

    #[test]
    fn auto_keeps_short_native_result_when_ocr_fails() {
        let calls = Calls::new();
        let result = select(OcrMode::Auto, Ok(text_of_len(80)), Err(open_failure()), &calls);
        assert_eq!(result.ok(), Some(text_of_len(80)));
    }

    #[test]
    fn auto_falls_back_to_ocr_on_native_failure() {
        let calls = Calls::new();
        let result = select(OcrMode::Auto, Err(open_failure()), Ok(ocr_set()), &calls);
        assert_eq!(result.ok(), Some(ocr_set()));

        let calls = Calls::new();
        let result = select(OcrMode::Auto, Err(open_failure()), Err(open_failure()), &calls);
        assert!(result.is_err());
    }

    #[test]
    fn never_mode_does_not_touch_ocr() {
        let calls = Calls::new();
        let result = select(OcrMode::Never, Err(open_failure()), Ok(ocr_set()), &calls);
        assert!(matches!(result, Err(ConvertError::DocumentOpen { .. })));
        assert_eq!(calls.ocr.get(), 0);

        let calls = Calls::new();
        let result = select(OcrMode::Never, Ok(text_of_len(10)), Ok(ocr_set()), &calls);
        assert_eq!(result.ok(), Some(text_of_len(10)));
        assert_eq!(calls.ocr.get(), 0);
    }

    #[test]
    fn always_mode_skips_native_extraction() {
        let calls = Calls::new();
        let result = select(OcrMode::Always, Ok(text_of_len(500)), Ok(ocr_set()), &calls);
        assert_eq!(calls.native.get(), 0);
        assert_eq!(result.ok(), Some(ocr_set()));

        let calls = Calls::new();
        assert!(select(OcrMode::Always, Ok(text_of_len(500)), Err(open_failure()), &calls).is_err());
    }
}
