pub mod assembly;
pub mod core;
pub mod export;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod strategy;

pub use crate::core::{ConvertError, ConverterConfig, ExtractionResult, OcrMode, ParagraphSet};
pub use pipeline::Converter;
