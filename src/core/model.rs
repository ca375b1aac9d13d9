use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::ConvertError;
use crate::core::text::char_len;

/// Which extraction path produced a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Native,
    Ocr,
}

/// A unit of extracted text with no guaranteed paragraph alignment: a text
/// container from layout analysis or a line from OCR output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment {
    pub text: String,
    pub page_idx: usize,
    pub order: usize,
    pub source: Provenance,
}

impl RawFragment {
    pub fn new(text: impl Into<String>, page_idx: usize, order: usize, source: Provenance) -> Self {
        Self {
            text: text.into(),
            page_idx,
            order,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Content,
    Noise,
}

/// A normalized line tagged by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub text: String,
    pub class: LineClass,
}

impl ClassifiedLine {
    pub fn is_content(&self) -> bool {
        self.class == LineClass::Content && !self.text.is_empty()
    }
}

/// Either a paragraph set or the reason the document produced none.
pub type ExtractionResult = Result<ParagraphSet, ConvertError>;

const KEY_PREFIX: &str = "Paragraph_";

/// Ordered paragraphs keyed `Paragraph_1..Paragraph_N`.
///
/// Keys are derived from position, so they are always contiguous and 1-based
/// no matter how many candidates were dropped or merged upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphSet {
    paragraphs: Vec<String>,
}

impl ParagraphSet {
    pub fn new(paragraphs: Vec<String>) -> Self {
        Self { paragraphs }
    }

    pub fn key(position: usize) -> String {
        format!("{KEY_PREFIX}{position}")
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let position: usize = key.strip_prefix(KEY_PREFIX)?.parse().ok()?;
        position
            .checked_sub(1)
            .and_then(|idx| self.paragraphs.get(idx))
            .map(String::as_str)
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.paragraphs
            .iter()
            .enumerate()
            .map(|(idx, text)| (Self::key(idx + 1), text.as_str()))
    }

    /// Concatenated text length used by the content-sufficiency check.
    pub fn total_text_len(&self) -> usize {
        self.paragraphs.iter().map(|p| char_len(p)).sum()
    }
}

impl Serialize for ParagraphSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.paragraphs.len()))?;
        for (key, text) in self.iter() {
            map.serialize_entry(&key, text)?;
        }
        map.end()
    }
}

struct ParagraphSetVisitor;

impl<'de> Visitor<'de> for ParagraphSetVisitor {
    type Value = ParagraphSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object keyed Paragraph_1..Paragraph_N in order")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut paragraphs = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, text)) = access.next_entry::<String, String>()? {
            let expected = ParagraphSet::key(paragraphs.len() + 1);
            if key != expected {
                return Err(de::Error::custom(format!(
                    "expected key {expected}, found {key}"
                )));
            }
            paragraphs.push(text);
        }
        Ok(ParagraphSet { paragraphs })
    }
}

impl<'de> Deserialize<'de> for ParagraphSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParagraphSetVisitor)
    }
}
