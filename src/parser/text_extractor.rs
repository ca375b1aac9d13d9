use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object, ObjectId};

use crate::core::model::RawFragment;
use crate::parser::layout_builder::{ParserLayoutBuilder, TextSpan};
use crate::parser::NativeExtractor;

/// Glyph advance as a fraction of the font size; no font metrics are read.
const APPROX_CHAR_WIDTH: f32 = 0.5;

/// TJ adjustments beyond this many thousandths of an em read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 100.0;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Reads the embedded text layer with `lopdf` and recovers text containers
/// from glyph positions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl NativeExtractor for LopdfExtractor {
    fn extract_blocks(&self, pdf_path: &Path) -> Result<Vec<RawFragment>> {
        let document = Document::load(pdf_path)
            .with_context(|| format!("lopdf could not load {}", pdf_path.display()))?;

        let mut layout = ParserLayoutBuilder::new();
        let mut blocks = Vec::new();

        // get_pages is keyed by 1-based page number and already sorted.
        for (page_idx, (page_number, page_id)) in document.get_pages().into_iter().enumerate() {
            let spans = page_spans(&document, page_id)
                .with_context(|| format!("text extraction failed on page {page_number}"))?;
            blocks.extend(layout.add_page(page_idx, spans));
        }

        Ok(blocks)
    }
}

/// Positioned text runs of one page, in content-stream order.
pub fn page_spans(document: &Document, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    // Fonts whose encoding lopdf cannot resolve fall back to text-string decoding.
    let encodings: BTreeMap<Vec<u8>, Encoding> = document
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| font.get_font_encoding(document).ok().map(|enc| (name, enc)))
        .collect();

    let content = document.get_and_decode_page_content(page_id)?;

    let mut state = TextState::default();
    let mut spans = Vec::new();
    for operation in &content.operations {
        state.apply(operation, &encodings, &mut spans);
    }

    Ok(spans)
}

/// Graphics and text state needed to place glyphs on the page.
#[derive(Debug, Clone)]
struct TextState {
    ctm: [f32; 6],
    saved: Vec<[f32; 6]>,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_key: Vec<u8>,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_key: Vec::new(),
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
        }
    }
}

impl TextState {
    fn apply(
        &mut self,
        operation: &Operation,
        encodings: &BTreeMap<Vec<u8>, Encoding>,
        spans: &mut Vec<TextSpan>,
    ) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let (Some(key), Some(size)) = (
                    operands.first().and_then(|o| o.as_name().ok()),
                    number(operands, 1),
                ) {
                    self.font_key = key.to_vec();
                    self.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.leading),
            "TL" => {
                if let Some(leading) = number(operands, 0) {
                    self.leading = leading;
                }
            }
            "Tc" => {
                if let Some(spacing) = number(operands, 0) {
                    self.char_spacing = spacing;
                }
            }
            "Tw" => {
                if let Some(spacing) = number(operands, 0) {
                    self.word_spacing = spacing;
                }
            }
            "Tz" => {
                if let Some(scale) = number(operands, 0) {
                    self.horiz_scale = scale / 100.0;
                }
            }
            "Tj" => {
                if let Some(operand) = operands.first() {
                    let text = self.decode(operand, encodings);
                    self.show(text, spans);
                }
            }
            "'" => {
                self.next_line(0.0, -self.leading);
                if let Some(operand) = operands.first() {
                    let text = self.decode(operand, encodings);
                    self.show(text, spans);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(operand)) =
                    (number(operands, 0), number(operands, 1), operands.get(2))
                {
                    self.word_spacing = aw;
                    self.char_spacing = ac;
                    self.next_line(0.0, -self.leading);
                    let text = self.decode(operand, encodings);
                    self.show(text, spans);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_array(items, encodings, spans);
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn decode(&self, operand: &Object, encodings: &BTreeMap<Vec<u8>, Encoding>) -> String {
        let Object::String(bytes, _) = operand else {
            return String::new();
        };
        encodings
            .get(&self.font_key)
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .or_else(|| lopdf::decode_text_string(operand).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Advance in unscaled text space for `text`.
    fn advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| {
                let word = if ch == ' ' { self.word_spacing } else { 0.0 };
                (self.font_size * APPROX_CHAR_WIDTH + self.char_spacing + word) * self.horiz_scale
            })
            .sum()
    }

    fn show(&mut self, text: String, spans: &mut Vec<TextSpan>) {
        if text.is_empty() {
            return;
        }
        let advance = self.advance(&text);
        self.push_span(text, advance, spans);
        self.translate_text(advance);
    }

    /// A TJ array becomes one span; wide negative adjustments insert spaces.
    fn show_array(
        &mut self,
        items: &[Object],
        encodings: &BTreeMap<Vec<u8>, Encoding>,
        spans: &mut Vec<TextSpan>,
    ) {
        let start = self.text_matrix;
        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                Object::String(..) => {
                    let piece = self.decode(item, encodings);
                    advance += self.advance(&piece);
                    text.push_str(&piece);
                }
                other => {
                    if let Ok(adjust) = other.as_float() {
                        if adjust < -TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                            text.push(' ');
                        }
                        advance -= adjust / 1000.0 * self.font_size * self.horiz_scale;
                    }
                }
            }
        }
        if text.trim().is_empty() {
            self.translate_text(advance);
            return;
        }
        self.text_matrix = start;
        self.push_span(text, advance, spans);
        self.translate_text(advance);
    }

    fn translate_text(&mut self, tx: f32) {
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }

    fn push_span(&self, text: String, advance: f32, spans: &mut Vec<TextSpan>) {
        let render = multiply(&self.text_matrix, &self.ctm);
        let scale_x = (render[0].powi(2) + render[1].powi(2)).sqrt();
        let scale_y = (render[2].powi(2) + render[3].powi(2)).sqrt();
        spans.push(TextSpan {
            text,
            x: render[4],
            y: render[5],
            width: advance * scale_x,
            font_size: (self.font_size * scale_y).abs(),
        });
    }
}

fn number(operands: &[Object], idx: usize) -> Option<f32> {
    operands.get(idx).and_then(|o| o.as_float().ok())
}

fn matrix(operands: &[Object]) -> Option<[f32; 6]> {
    let values: Vec<f32> = operands.iter().take(6).filter_map(|o| o.as_float().ok()).collect();
    values.try_into().ok()
}

/// Product `a × b` of two PDF affine matrices `[a b c d e f]`.
fn multiply(a: &[f32; 6], b: &[f32; 6]) -> [f32; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    /// One-page document drawing `content` with Helvetica as /F1.
    fn single_page(content: &str) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn td_and_t_star_position_lines() -> Result<()> {
        let (doc, page_id) =
            single_page("BT /F1 12 Tf 14 TL 72 720 Td (First line) Tj T* (Second line) Tj ET");
        let spans = page_spans(&doc, page_id)?;

        let placed: Vec<(&str, f32, f32)> =
            spans.iter().map(|s| (s.text.as_str(), s.x, s.y)).collect();
        assert_eq!(
            placed,
            vec![("First line", 72.0, 720.0), ("Second line", 72.0, 706.0)]
        );
        assert_eq!(spans[0].font_size, 12.0);
        Ok(())
    }

    #[test]
    fn tm_and_cm_are_combined() -> Result<()> {
        let (doc, page_id) = single_page("q 2 0 0 2 0 0 cm BT /F1 6 Tf 1 0 0 1 36 300 Tm (Scaled) Tj ET Q");
        let spans = page_spans(&doc, page_id)?;

        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].x, spans[0].y), (72.0, 600.0));
        assert_eq!(spans[0].font_size, 12.0);
        Ok(())
    }

    #[test]
    fn tj_array_kerning_becomes_word_space() -> Result<()> {
        let (doc, page_id) = single_page("BT /F1 10 Tf 72 700 Td [(Two) -300 (words) 20 (joined)] TJ ET");
        let spans = page_spans(&doc, page_id)?;

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Two wordsjoined");
        assert_eq!(spans[0].x, 72.0);
        Ok(())
    }

    #[test]
    fn separated_paragraphs_become_separate_blocks() -> Result<()> {
        let (doc, page_id) = single_page(concat!(
            "BT /F1 12 Tf 72 720 Td (The first paragraph starts here) Tj ET\n",
            "BT /F1 12 Tf 72 706 Td (and ends on this line.) Tj ET\n",
            "BT /F1 12 Tf 72 600 Td (A separate second paragraph.) Tj ET\n",
            "BT /F1 12 Tf 72 586 Td (It has two lines as well.) Tj ET\n",
        ));
        let blocks = ParserLayoutBuilder::new().add_page(0, page_spans(&doc, page_id)?);

        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "The first paragraph starts here\nand ends on this line.",
                "A separate second paragraph.\nIt has two lines as well.",
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(LopdfExtractor::new()
            .extract_blocks(Path::new("/definitely/not/here.pdf"))
            .is_err());
    }
}
