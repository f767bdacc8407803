//! Markup-tag highlighter
//!
//! Parses each block independently with the tree-sitter HTML grammar. Book
//! content is XHTML split into lines, so a block is usually a fragment
//! (`<p class="x">Some text` or `</p>`); the grammar's error recovery keeps
//! tag names, attributes and brackets recognizable in fragments.

use std::sync::{Mutex, PoisonError};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use super::span::{FormatSpan, MultiFormatList};
use super::strategy::{HighlightError, Highlighter};
use super::style::style_id_for_name;

const HTML_HIGHLIGHTS: &str = include_str!("../../queries/html/highlights.scm");

/// Strategy name used in preferences
pub const MARKUP_HIGHLIGHTER: &str = "markup";

/// Convert a byte offset into a character offset, clamping to the text
fn byte_to_char(text: &str, byte: usize) -> usize {
    let byte = byte.min(text.len());
    // Find the nearest valid char boundary at or before byte
    let mut valid_byte = byte;
    while valid_byte > 0 && !text.is_char_boundary(valid_byte) {
        valid_byte -= 1;
    }
    text[..valid_byte].chars().count()
}

/// Tree-sitter based markup highlighter
///
/// tree-sitter parsers are `!Sync`, so the parser sits behind a mutex. Only
/// the worker thread highlights, so the lock is uncontended in practice.
pub struct MarkupHighlighter {
    parser: Mutex<Parser>,
    query: Query,
}

impl MarkupHighlighter {
    /// Create the highlighter, compiling the embedded highlight query
    pub fn new() -> Result<Self, HighlightError> {
        let language: Language = tree_sitter_html::LANGUAGE.into();

        let mut parser = Parser::new();
        parser.set_language(&language).map_err(|e| {
            HighlightError::new(MARKUP_HIGHLIGHTER, format!("failed to set language: {}", e))
        })?;

        let query = Query::new(&language, HTML_HIGHLIGHTS).map_err(|e| {
            HighlightError::new(MARKUP_HIGHLIGHTER, format!("invalid query: {:?}", e))
        })?;

        Ok(Self {
            parser: Mutex::new(parser),
            query,
        })
    }
}

impl Highlighter for MarkupHighlighter {
    fn name(&self) -> &str {
        MARKUP_HIGHLIGHTER
    }

    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError> {
        if !text.contains(['<', '>']) {
            // Plain prose: nothing for this strategy to do
            return Ok(MultiFormatList::new());
        }

        let tree = {
            let mut parser = self.parser.lock().unwrap_or_else(PoisonError::into_inner);
            parser
                .parse(text, None)
                .ok_or_else(|| HighlightError::new(MARKUP_HIGHLIGHTER, "parse returned no tree"))?
        };

        let mut spans = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&self.query, tree.root_node(), text.as_bytes());
        while let Some((query_match, capture_idx)) = captures.next() {
            let capture = &query_match.captures[*capture_idx];
            let capture_name = &self.query.capture_names()[capture.index as usize];

            let Some(style) = style_id_for_name(capture_name) else {
                continue; // Skip unknown captures
            };

            let start = byte_to_char(text, capture.node.start_byte());
            let end = byte_to_char(text, capture.node.end_byte());
            if start < end {
                spans.push(FormatSpan::new(start, end - start, style));
            }
        }

        // Outer nodes first so nested captures paint over them
        spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.len)));
        spans.dedup();

        tracing::trace!("markup: {} spans for {} chars", spans.len(), text.len());
        Ok(spans.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::style::STYLE_NAMES;

    fn style(name: &str) -> Option<u16> {
        style_id_for_name(name)
    }

    fn highlighter() -> MarkupHighlighter {
        MarkupHighlighter::new().expect("markup highlighter should build")
    }

    #[test]
    fn test_byte_to_char_handles_multibyte() {
        let text = "héllo";
        assert_eq!(byte_to_char(text, 0), 0);
        assert_eq!(byte_to_char(text, 1), 1);
        // Inside the two-byte 'é' rounds down
        assert_eq!(byte_to_char(text, 2), 1);
        assert_eq!(byte_to_char(text, 3), 2);
        assert_eq!(byte_to_char(text, 100), 5);
    }

    #[test]
    fn test_plain_text_has_no_spans() {
        let spans = highlighter().highlight("Just some prose.").unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_element_with_attribute() {
        let text = r#"<p class="intro">Hello</p>"#;
        let spans = highlighter().highlight(text).unwrap();

        assert_eq!(spans.style_at(0), style("punctuation.bracket"));
        assert_eq!(spans.style_at(1), style("tag"));
        assert_eq!(spans.style_at(3), style("attribute"));
        assert_eq!(spans.style_at(10), style("string"));
        assert_eq!(spans.style_at(18), None, "element text is unstyled");
        assert_eq!(spans.style_at(24), style("tag"));
    }

    #[test]
    fn test_offsets_are_in_characters() {
        // 'é' is two bytes; the closing tag name sits at char 10, byte 11
        let text = "<b>héllo</b>";
        let spans = highlighter().highlight(text).unwrap();
        assert_eq!(spans.style_at(10), style("tag"));
        assert_eq!(spans.style_at(4), None);
    }

    #[test]
    fn test_comment_block() {
        let spans = highlighter().highlight("<!-- chapter one -->").unwrap();
        assert_eq!(spans.style_at(5), style("comment"));
    }

    #[test]
    fn test_every_capture_has_its_own_style() {
        let markup = highlighter();
        for name in markup.query.capture_names() {
            assert!(STYLE_NAMES.contains(name), "@{} has no style", name);
        }
    }

    #[test]
    fn test_entities_in_element_text_are_unstyled() {
        let spans = highlighter().highlight("<p>fish &amp; chips</p>").unwrap();
        assert_eq!(spans.style_at(8), None);
        assert_eq!(spans.style_at(3), None);
    }
}
