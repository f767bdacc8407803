//! Document model - the text buffer and per-block formatting
//!
//! Blocks are the rope's lines. Formatting is stored per block and kept
//! aligned with the lines across edits: unchanged blocks keep (and shift)
//! their formatting, edited blocks are cleared until their new results arrive.

use ropey::Rope;

use crate::highlight::{BlockShift, BlockSource, FormatSpan, HighlightTarget};

/// Description of a single edit, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentsChange {
    /// Char offset where the edit starts
    pub position: usize,
    pub chars_removed: usize,
    pub chars_added: usize,
    /// Blocks covered by the edit, before and after
    pub blocks: BlockShift,
}

/// Strip a trailing line terminator (ropey recognizes the Unicode set)
fn strip_line_ending(mut line: String) -> String {
    if line.ends_with("\r\n") {
        line.truncate(line.len() - 2);
    } else if line.ends_with([
        '\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
    ]) {
        line.pop();
    }
    line
}

/// The text buffer and the formatting applied to each block
#[derive(Debug, Clone)]
pub struct Document {
    /// The text buffer
    pub buffer: Rope,
    /// Formatting per block; `None` until highlighted
    formats: Vec<Option<Vec<FormatSpan>>>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::with_text("")
    }

    /// Create a document with initial text
    pub fn with_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        let formats = vec![None; buffer.len_lines()];
        Self { buffer, formats }
    }

    /// Replace the whole text, dropping all formatting
    pub fn set_text(&mut self, text: &str) {
        self.buffer = Rope::from(text);
        self.formats = vec![None; self.buffer.len_lines()];
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    /// Merged formatting of a block, if it has been highlighted
    pub fn block_formats(&self, block: usize) -> Option<&[FormatSpan]> {
        self.formats.get(block)?.as_deref()
    }

    /// Replace `chars_removed` chars at `position` with `text`.
    ///
    /// Out-of-range positions and lengths are clamped.
    pub fn replace(&mut self, position: usize, chars_removed: usize, text: &str) -> ContentsChange {
        let len = self.buffer.len_chars();
        let position = position.min(len);
        let chars_removed = chars_removed.min(len - position);
        let chars_added = text.chars().count();

        let mut first_block = self.buffer.char_to_line(position);
        let old_last_block = self.buffer.char_to_line(position + chars_removed);

        if chars_removed > 0 {
            self.buffer.remove(position..position + chars_removed);
        }
        if chars_added > 0 {
            self.buffer.insert(position, text);
        }

        // A lone '\r' now followed by '\n' pulls its block into the edit
        if position > 0
            && self.buffer.get_char(position - 1) == Some('\r')
            && self.buffer.get_char(position) == Some('\n')
        {
            first_block = first_block.min(self.buffer.char_to_line(position - 1));
        }
        let new_last_block = self.buffer.char_to_line(position + chars_added);

        // Edited blocks lose their formatting; blocks after them shift
        self.formats.splice(
            first_block..=old_last_block,
            std::iter::repeat(None).take(new_last_block - first_block + 1),
        );
        debug_assert_eq!(self.formats.len(), self.buffer.len_lines());

        ContentsChange {
            position,
            chars_removed,
            chars_added,
            blocks: BlockShift {
                first: first_block,
                old_last: old_last_block,
                new_last: new_last_block,
            },
        }
    }

    pub fn insert(&mut self, position: usize, text: &str) -> ContentsChange {
        self.replace(position, 0, text)
    }

    pub fn remove(&mut self, position: usize, chars: usize) -> ContentsChange {
        self.replace(position, chars, "")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSource for Document {
    fn block_count(&self) -> usize {
        self.buffer.len_lines()
    }

    fn block_text(&self, block: usize) -> Option<String> {
        let line = self.buffer.get_line(block)?;
        Some(strip_line_ending(line.to_string()))
    }

    fn is_empty(&self) -> bool {
        self.buffer.len_chars() == 0
    }
}

impl HighlightTarget for Document {
    fn apply_formats(&mut self, block: usize, spans: Vec<FormatSpan>) {
        if let Some(slot) = self.formats.get_mut(block) {
            *slot = Some(spans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Vec<FormatSpan> {
        vec![FormatSpan::new(0, 1, 1)]
    }

    #[test]
    fn test_blocks_are_lines_without_terminators() {
        let doc = Document::with_text("one\r\ntwo\nthree");
        assert_eq!(doc.block_count(), 3);
        assert_eq!(doc.block_text(0).as_deref(), Some("one"));
        assert_eq!(doc.block_text(1).as_deref(), Some("two"));
        assert_eq!(doc.block_text(2).as_deref(), Some("three"));
        assert_eq!(doc.block_text(3), None);
    }

    #[test]
    fn test_trailing_newline_makes_empty_last_block() {
        let doc = Document::with_text("a\n");
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.block_text(1).as_deref(), Some(""));
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(BlockSource::is_empty(&doc));
        assert!(!BlockSource::is_empty(&Document::with_text("\n")));
    }

    #[test]
    fn test_single_block_edit_clears_only_that_block() {
        let mut doc = Document::with_text("a\nb\nc");
        for block in 0..3 {
            doc.apply_formats(block, span());
        }

        let change = doc.insert(2, "x"); // "a\nxb\nc"
        assert_eq!(
            change,
            ContentsChange {
                position: 2,
                chars_removed: 0,
                chars_added: 1,
                blocks: BlockShift::single(1),
            }
        );
        assert!(doc.block_formats(0).is_some());
        assert!(doc.block_formats(1).is_none());
        assert!(doc.block_formats(2).is_some());
    }

    #[test]
    fn test_inserting_lines_shifts_formats_down() {
        let mut doc = Document::with_text("a\nb\nc");
        doc.apply_formats(2, span());

        let change = doc.insert(1, "\nnew\nlines"); // a / new / lines / b / c
        assert_eq!(
            change.blocks,
            BlockShift {
                first: 0,
                old_last: 0,
                new_last: 2
            }
        );
        assert_eq!(doc.block_count(), 5);
        assert_eq!(doc.block_text(4).as_deref(), Some("c"));
        assert!(doc.block_formats(4).is_some());
        assert!(doc.block_formats(2).is_none());
    }

    #[test]
    fn test_removing_lines_shifts_formats_up() {
        let mut doc = Document::with_text("a\nb\nc\nd");
        doc.apply_formats(3, span());

        let change = doc.remove(1, 4); // removes "\nb\nc" -> "a\nd"
        assert_eq!(change.blocks.old_last, 2);
        assert_eq!(change.blocks.new_last, 0);
        assert_eq!(doc.text(), "a\nd");
        assert!(doc.block_formats(1).is_some());
    }

    #[test]
    fn test_joining_cr_with_lf_merges_blocks() {
        let mut doc = Document::with_text("\ra\nb");
        for block in 0..3 {
            doc.apply_formats(block, span());
        }

        let change = doc.remove(1, 1); // "\r\nb"
        assert_eq!(
            change.blocks,
            BlockShift {
                first: 0,
                old_last: 1,
                new_last: 0
            }
        );
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.block_text(0).as_deref(), Some(""));
        assert!(doc.block_formats(0).is_none());
        assert!(doc.block_formats(1).is_some());
    }

    #[test]
    fn test_inserting_lf_after_cr_merges_blocks() {
        let mut doc = Document::with_text("a\r\rb");
        let change = doc.insert(2, "\n"); // "a\r\n\rb"
        assert_eq!(change.blocks.first, 0);
        assert_eq!(change.blocks.new_last, 1);
        assert_eq!(doc.block_count(), 3);
        assert_eq!(doc.block_text(1).as_deref(), Some(""));
        assert_eq!(doc.block_text(2).as_deref(), Some("b"));
    }

    #[test]
    fn test_edits_around_line_breaks_keep_formats_aligned() {
        let fragments = ["\r", "\n", "a", "\r\n", ""];
        for text in ["\ra\n", "a\r\nb", "\r\r\n", "\n\r", "a\rb\n"] {
            let len = text.chars().count();
            for position in 0..=len {
                for removed in 0..=(len - position) {
                    for fragment in fragments {
                        let mut doc = Document::with_text(text);
                        let change = doc.replace(position, removed, fragment);
                        assert!(change.blocks.first <= change.blocks.new_last);
                        assert!(change.blocks.first <= change.blocks.old_last);
                        assert_eq!(doc.block_count(), doc.buffer.len_lines());
                        assert!(doc.block_text(doc.block_count() - 1).is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn test_replace_clamps_out_of_range() {
        let mut doc = Document::with_text("abc");
        let change = doc.replace(10, 5, "!");
        assert_eq!(change.position, 3);
        assert_eq!(change.chars_removed, 0);
        assert_eq!(doc.text(), "abc!");
    }

    #[test]
    fn test_apply_formats_out_of_range_is_ignored() {
        let mut doc = Document::with_text("a");
        doc.apply_formats(9, span());
        assert!(doc.block_formats(9).is_none());
    }
}
