pub mod json_export;

use crate::core::error::ConvertError;
use crate::core::model::ParagraphSet;

pub use json_export::{to_json_string, JsonExporter};

pub trait Exporter {
    fn export(&self, paragraphs: &ParagraphSet) -> Result<(), ConvertError>;
}
