//! Format spans and per-strategy span lists
//!
//! A block's final appearance is built by painting every strategy's
//! [`MultiFormatList`] in registration order, later layers overriding the
//! overlapped parts of earlier ones.

use super::style::{style_name, StyleId};

/// A styled range within a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpan {
    /// Start offset in characters (0-indexed, inclusive)
    pub start: usize,
    /// Length in characters
    pub len: usize,
    /// Index into STYLE_NAMES
    pub style: StyleId,
}

impl FormatSpan {
    pub fn new(start: usize, len: usize, style: StyleId) -> Self {
        Self { start, len, style }
    }

    /// End offset (exclusive)
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Human-readable style name, `"?"` for unknown ids
    pub fn style_name(&self) -> &'static str {
        style_name(self.style).unwrap_or("?")
    }
}

/// The spans one strategy produced for one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiFormatList {
    /// Spans in emission order (may overlap; later spans win)
    pub spans: Vec<FormatSpan>,
}

impl MultiFormatList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span, dropping empty ones
    pub fn push(&mut self, span: FormatSpan) {
        if !span.is_empty() {
            self.spans.push(span);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Style at a character offset, if any (last matching span wins)
    pub fn style_at(&self, offset: usize) -> Option<StyleId> {
        self.spans
            .iter()
            .rev()
            .find(|span| offset >= span.start && offset < span.end())
            .map(|span| span.style)
    }
}

impl From<Vec<FormatSpan>> for MultiFormatList {
    fn from(spans: Vec<FormatSpan>) -> Self {
        let mut list = Self::new();
        for span in spans {
            list.push(span);
        }
        list
    }
}

/// Paint `span` over an ordered, non-overlapping span list.
///
/// Existing spans under the new one are trimmed or split.
fn paint(line: &mut Vec<FormatSpan>, span: FormatSpan) {
    if span.is_empty() {
        return;
    }

    let mut painted = Vec::with_capacity(line.len() + 2);
    for existing in line.drain(..) {
        if existing.end() <= span.start || existing.start >= span.end() {
            painted.push(existing);
            continue;
        }
        // Left remainder
        if existing.start < span.start {
            painted.push(FormatSpan::new(
                existing.start,
                span.start - existing.start,
                existing.style,
            ));
        }
        // Right remainder
        if existing.end() > span.end() {
            painted.push(FormatSpan::new(
                span.end(),
                existing.end() - span.end(),
                existing.style,
            ));
        }
    }
    painted.push(span);
    painted.sort_by_key(|s| s.start);
    *line = painted;
}

/// Merge per-strategy lists into the final span list for a block.
///
/// Layers are painted in order, so later strategies override earlier ones on
/// overlapping ranges. The result is sorted and non-overlapping.
pub fn merge_layers(layers: &[MultiFormatList]) -> Vec<FormatSpan> {
    let mut line = Vec::new();
    for layer in layers {
        for span in &layer.spans {
            paint(&mut line, *span);
        }
    }
    line
}
