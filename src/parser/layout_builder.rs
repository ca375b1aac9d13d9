use crate::core::model::{Provenance, RawFragment};

/// Spans whose baselines differ by less than this share a line, in points.
const MIN_LINE_TOLERANCE: f32 = 1.0;

/// A vertical gap wider than this multiple of the font size starts a new
/// text container.
const BLOCK_GAP_FACTOR: f32 = 1.5;

/// Horizontal gap, as a fraction of the font size, that reads as a word break
/// between two spans on one line.
const WORD_GAP_FACTOR: f32 = 0.3;

/// A run of text shown at one position, in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Estimated advance of the run.
    pub width: f32,
    pub font_size: f32,
}

/// Spans sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub y: f32,
    pub font_size: f32,
}

/// Groups spans into lines, keeping content-stream order.
///
/// A span joins the current line while its baseline stays within tolerance;
/// any other baseline starts a new line. Sorting by position is avoided so
/// that columns keep the order the producer wrote them in.
pub fn group_spans_into_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();

    for span in spans {
        if let Some(first) = current.first() {
            let tolerance = (first.font_size * 0.5).max(MIN_LINE_TOLERANCE);
            if (span.y - first.y).abs() > tolerance {
                lines.extend(assemble_line(std::mem::take(&mut current)));
            }
        }
        current.push(span);
    }
    lines.extend(assemble_line(current));

    lines
}

fn assemble_line(mut spans: Vec<TextSpan>) -> Option<TextLine> {
    let first = spans.first()?;
    let y = first.y;
    let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);

    spans.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut text = String::new();
    let mut prev_end: Option<f32> = None;
    for span in &spans {
        if let Some(end) = prev_end {
            let gap = span.x - end;
            let boundary_is_space = text.ends_with(char::is_whitespace)
                || span.text.starts_with(char::is_whitespace);
            if !boundary_is_space && gap > span.font_size * WORD_GAP_FACTOR {
                text.push(' ');
            }
        }
        text.push_str(&span.text);
        prev_end = Some(span.x + span.width);
    }

    if text.trim().is_empty() {
        return None;
    }
    Some(TextLine { text, y, font_size })
}

/// Splits lines into text containers at wide vertical gaps and wherever the
/// baseline moves up the page (a new column or a repositioned frame).
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
    let mut blocks = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            let drop = prev.y - line.y;
            let font_size = prev.font_size.max(line.font_size);
            if drop < 0.0 || drop > font_size * BLOCK_GAP_FACTOR {
                blocks.push(std::mem::take(&mut current));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Turns positioned page text into ordered text containers.
#[derive(Debug, Default)]
pub struct ParserLayoutBuilder {
    next_order: usize,
}

impl ParserLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One fragment per container, lines separated by `\n`. Containers never
    /// span pages.
    pub fn add_page(&mut self, page_idx: usize, spans: Vec<TextSpan>) -> Vec<RawFragment> {
        group_lines_into_blocks(group_spans_into_lines(spans))
            .into_iter()
            .map(|block| {
                let text = block
                    .iter()
                    .map(|line| line.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                let fragment = RawFragment::new(text, page_idx, self.next_order, Provenance::Native);
                self.next_order += 1;
                fragment
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * 6.0,
            font_size: 12.0,
        }
    }

    fn texts(fragments: &[RawFragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn vertical_gap_separates_paragraphs() {
        let mut builder = ParserLayoutBuilder::new();
        let blocks = builder.add_page(
            0,
            vec![
                span("The first paragraph starts here", 72.0, 720.0),
                span("and ends on this line.", 72.0, 706.0),
                span("A separate second paragraph.", 72.0, 600.0),
                span("It has two lines as well.", 72.0, 586.0),
            ],
        );

        assert_eq!(
            texts(&blocks),
            vec![
                "The first paragraph starts here\nand ends on this line.",
                "A separate second paragraph.\nIt has two lines as well.",
            ]
        );
        assert_eq!(blocks[1].order, 1);
    }

    #[test]
    fn spans_on_one_baseline_form_one_line() {
        let lines = group_spans_into_lines(vec![
            span("Bold", 72.0, 700.0),
            span("lead-in and the rest", 110.0, 700.3),
            span("Next line", 72.0, 686.0),
        ]);

        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Bold lead-in and the rest", "Next line"]);
    }

    #[test]
    fn adjacent_spans_join_without_a_space() {
        let lines = group_spans_into_lines(vec![span("Para", 72.0, 700.0), span("graph", 96.0, 700.0)]);
        assert_eq!(lines[0].text, "Paragraph");
    }

    #[test]
    fn moving_up_the_page_starts_a_new_container() {
        let blocks = group_lines_into_blocks(group_spans_into_lines(vec![
            span("Left column bottom line", 72.0, 100.0),
            span("Right column top line", 320.0, 720.0),
        ]));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn order_continues_across_pages() {
        let mut builder = ParserLayoutBuilder::new();
        let first = builder.add_page(0, vec![span("Introduction", 72.0, 720.0)]);
        let second = builder.add_page(1, vec![span("Next page text", 72.0, 720.0)]);

        assert_eq!(first[0].order, 0);
        assert_eq!(second[0].order, 1);
        assert_eq!(second[0].page_idx, 1);
    }

    #[test]
    fn blank_spans_produce_nothing() {
        let mut builder = ParserLayoutBuilder::new();
        assert!(builder.add_page(0, vec![span("   ", 72.0, 720.0)]).is_empty());
    }
}
