pub mod block;
pub mod line;
pub mod merge;

pub use block::BlockAssembler;
pub use line::LineAssembler;
pub use merge::merge_short_paragraphs;

use crate::core::classifier::LineClassifier;
use crate::core::model::ClassifiedLine;
use crate::core::text::normalize;

pub(crate) fn classify_line(classifier: &LineClassifier, raw: &str) -> ClassifiedLine {
    let text = normalize(raw);
    let class = classifier.classify(&text);
    ClassifiedLine { text, class }
}
