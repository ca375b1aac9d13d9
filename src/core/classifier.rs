use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::core::model::LineClass;

/// Reason a line was discarded as noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseRule {
    Bullet,
    Bracketed,
    PageNumber,
    BareNumber,
    FigureCaption,
    TableCaption,
    DotFill,
    TocEntry,
}

// Each pattern spans the whole line. Order is informational only.
const RULE_PATTERNS: &[(NoiseRule, &str)] = &[
    (NoiseRule::Bullet, r"^\s*•.*$"),
    (NoiseRule::Bullet, r"^\s*●.*$"),
    (NoiseRule::Bracketed, r"^\s*\[.*\]\s*$"),
    (NoiseRule::Bracketed, r"^\s*<.*>\s*$"),
    (NoiseRule::PageNumber, r"^\s*Page\s*\d+\s*$"),
    (NoiseRule::BareNumber, r"^\s*\d+\s*$"),
    (NoiseRule::FigureCaption, r"^Figure\s*\d+[.:]?.*$"),
    (NoiseRule::TableCaption, r"^\s*Table\s*\d+[.:]?.*$"),
    (NoiseRule::DotFill, r"^[.\s]+$"),
    (
        NoiseRule::TocEntry,
        r"^\s*\d+(?:\.\d+)*\.?\s+(?:[^\s.]+\s+){0,4}[^\s.]+\s*\.{3,}\s*\d+\s*$",
    ),
];

static NOISE_RULES: Lazy<Vec<(NoiseRule, Regex)>> = Lazy::new(|| {
    RULE_PATTERNS
        .iter()
        .map(|(rule, pattern)| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("noise rule patterns are valid");
            (*rule, regex)
        })
        .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct LineClassifier;

impl LineClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, line: &str) -> LineClass {
        if self.matching_rule(line).is_some() {
            LineClass::Noise
        } else {
            LineClass::Content
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.classify(line) == LineClass::Noise
    }

    /// First rule that matches `line`, if any.
    pub fn matching_rule(&self, line: &str) -> Option<NoiseRule> {
        NOISE_RULES
            .iter()
            .find(|(_, regex)| regex.is_match(line))
            .map(|(rule, _)| *rule)
    }
}
