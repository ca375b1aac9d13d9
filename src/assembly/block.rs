use crate::assembly::{classify_line, merge::merge_short_paragraphs};
use crate::core::classifier::LineClassifier;
use crate::core::config::ConverterConfig;
use crate::core::model::{ParagraphSet, RawFragment};
use crate::core::text::char_len;

/// Builds paragraphs from paragraph-shaped text containers.
#[derive(Debug, Clone)]
pub struct BlockAssembler {
    classifier: LineClassifier,
    min_paragraph_length: usize,
    merge_threshold: Option<usize>,
}

impl BlockAssembler {
    pub fn new(min_paragraph_length: usize) -> Self {
        Self {
            classifier: LineClassifier::new(),
            min_paragraph_length,
            merge_threshold: None,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        let merge_threshold = config
            .merge_short_paragraphs
            .then_some(config.merge_threshold);
        Self::new(config.min_paragraph_length).with_merge_threshold(merge_threshold)
    }

    pub fn with_merge_threshold(mut self, merge_threshold: Option<usize>) -> Self {
        self.merge_threshold = merge_threshold;
        self
    }

    /// Content lines of `block` joined by single spaces, or `None` when the
    /// block holds nothing but noise.
    pub fn candidate(&self, block: &str) -> Option<String> {
        let lines: Vec<String> = block
            .lines()
            .map(|raw| classify_line(&self.classifier, raw))
            .filter(|line| line.is_content())
            .map(|line| line.text)
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" "))
        }
    }

    pub fn assemble(&self, blocks: &[RawFragment]) -> ParagraphSet {
        let candidates = blocks.iter().filter_map(|block| self.candidate(&block.text));

        let paragraphs = match self.merge_threshold {
            // Short candidates are merge input; acceptance is checked on emit.
            Some(threshold) => merge_short_paragraphs(candidates, threshold, self.min_paragraph_length),
            None => candidates
                .filter(|candidate| char_len(candidate) >= self.min_paragraph_length)
                .collect(),
        };

        ParagraphSet::new(paragraphs)
    }
}
