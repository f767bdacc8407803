//! Printable view of a highlighted document

use serde::Serialize;

use crate::document::Document;
use crate::highlight::BlockSource;

#[derive(Debug, Serialize)]
pub struct SpanReport {
    pub start: usize,
    pub len: usize,
    pub style: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub block: usize,
    pub text: String,
    /// `None` while the block has not been highlighted
    pub spans: Option<Vec<SpanReport>>,
}

/// Collect the text and merged spans of every block
pub fn block_reports(doc: &Document) -> Vec<BlockReport> {
    (0..doc.block_count())
        .map(|block| BlockReport {
            block,
            text: doc.block_text(block).unwrap_or_default(),
            spans: doc.block_formats(block).map(|spans| {
                spans
                    .iter()
                    .map(|span| SpanReport {
                        start: span.start,
                        len: span.len,
                        style: span.style_name(),
                    })
                    .collect()
            }),
        })
        .collect()
}

/// One line per block, followed by its spans
///
/// ```text
///    1 | <p>Hello</p>
///      | punctuation.bracket[0..1] tag[1..2] ...
/// ```
pub fn render_text(doc: &Document) -> String {
    let mut out = String::new();
    for report in block_reports(doc) {
        out.push_str(&format!("{:>4} | {}\n", report.block + 1, report.text));
        match report.spans {
            Some(spans) if !spans.is_empty() => {
                let rendered: Vec<String> = spans
                    .iter()
                    .map(|s| format!("{}[{}..{}]", s.style, s.start, s.start + s.len))
                    .collect();
                out.push_str(&format!("     | {}\n", rendered.join(" ")));
            }
            Some(_) => {}
            None => out.push_str("     | (not highlighted)\n"),
        }
    }
    out
}

pub fn render_json(doc: &Document) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&block_reports(doc))
}
