use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MIN_PARAGRAPH_LENGTH: usize = 20;
pub const DEFAULT_MERGE_THRESHOLD: usize = 50;
pub const DEFAULT_SUFFICIENCY_THRESHOLD: usize = 100;
pub const DEFAULT_DPI: u32 = 200;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 3000;
pub const DEFAULT_OCR_LANG: &str = "eng";

/// When OCR is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OcrMode {
    /// Native extraction first, OCR on failure or insufficient content.
    #[default]
    Auto,
    /// OCR only.
    Always,
    /// Native extraction only.
    Never,
}

impl fmt::Display for OcrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OcrMode::Auto => "auto",
            OcrMode::Always => "always",
            OcrMode::Never => "never",
        };
        f.write_str(name)
    }
}

impl FromStr for OcrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(OcrMode::Auto),
            "always" => Ok(OcrMode::Always),
            "never" => Ok(OcrMode::Never),
            other => Err(format!("unknown OCR mode '{other}' (expected auto, always or never)")),
        }
    }
}

/// Read-only settings shared by every conversion a converter performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    pub min_paragraph_length: usize,
    pub merge_threshold: usize,
    pub merge_short_paragraphs: bool,
    pub ocr_mode: OcrMode,
    pub ocr_lang: String,
    pub dpi: u32,
    pub batch_size: usize,
    pub sufficiency_threshold: usize,
    pub max_image_dimension: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            min_paragraph_length: DEFAULT_MIN_PARAGRAPH_LENGTH,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            merge_short_paragraphs: true,
            ocr_mode: OcrMode::default(),
            ocr_lang: DEFAULT_OCR_LANG.to_string(),
            dpi: DEFAULT_DPI,
            batch_size: DEFAULT_BATCH_SIZE,
            sufficiency_threshold: DEFAULT_SUFFICIENCY_THRESHOLD,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_paragraph_length(mut self, min: usize) -> Self {
        self.min_paragraph_length = min;
        self
    }

    pub fn with_merge_threshold(mut self, threshold: usize) -> Self {
        self.merge_threshold = threshold;
        self
    }

    pub fn with_merge_short_paragraphs(mut self, enabled: bool) -> Self {
        self.merge_short_paragraphs = enabled;
        self
    }

    pub fn with_ocr_mode(mut self, mode: OcrMode) -> Self {
        self.ocr_mode = mode;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.ocr_lang = lang.into();
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_sufficiency_threshold(mut self, threshold: usize) -> Self {
        self.sufficiency_threshold = threshold;
        self
    }

    pub fn with_max_image_dimension(mut self, max: u32) -> Self {
        self.max_image_dimension = max;
        self
    }
}
