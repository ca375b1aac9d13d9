use crate::assembly::classify_line;
use crate::core::classifier::LineClassifier;
use crate::core::model::{ParagraphSet, RawFragment};
use crate::core::text::char_len;

/// Accumulates a flat stream of lines into paragraphs. Empty and noise lines
/// end the paragraph in progress.
///
/// One accumulator is shared by every page of a document, so a paragraph
/// continues across a page break unless a boundary line separates them.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    classifier: LineClassifier,
    min_paragraph_length: usize,
    current: Vec<String>,
    paragraphs: Vec<String>,
}

impl LineAssembler {
    pub fn new(min_paragraph_length: usize) -> Self {
        Self {
            classifier: LineClassifier::new(),
            min_paragraph_length,
            current: Vec::new(),
            paragraphs: Vec::new(),
        }
    }

    pub fn push_line(&mut self, raw: &str) {
        let line = classify_line(&self.classifier, raw);
        if line.is_content() {
            self.current.push(line.text);
        } else {
            self.flush();
        }
    }

    pub fn push_fragment(&mut self, fragment: &RawFragment) {
        self.push_line(&fragment.text);
    }

    pub fn finish(mut self) -> ParagraphSet {
        self.flush();
        ParagraphSet::new(self.paragraphs)
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let paragraph = self.current.join(" ");
        self.current.clear();
        if char_len(&paragraph) >= self.min_paragraph_length {
            self.paragraphs.push(paragraph);
        }
    }
}
