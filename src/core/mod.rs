pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod text;

pub use classifier::{LineClassifier, NoiseRule};
pub use config::{ConverterConfig, OcrMode};
pub use error::ConvertError;
pub use model::{ClassifiedLine, ExtractionResult, LineClass, ParagraphSet, Provenance, RawFragment};
