//! Editor controller
//!
//! Owns the document, the viewport and the [`HighlightManager`], and turns
//! content changes into highlight registrations:
//!
//! - an edit touching one or two blocks registers them as urgent
//! - a larger edit (paste) registers only the visible part as urgent and
//!   queues the rest as background work, so per-keystroke cost follows the
//!   viewport rather than the paste size
//! - scrolling queues visible blocks that have no formatting yet
//! - an edit that empties the document cancels pending work

use std::ops::Range;
use std::time::Duration;

use crate::config::HighlightConfig;
use crate::document::{ContentsChange, Document};
use crate::highlight::{
    BlockSource, HighlightEvent, HighlightManager, HighlighterSet, Priority,
};

/// Visible window over the document, in blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible block (0-indexed)
    pub top_line: usize,
    /// Number of blocks that fit in the viewport
    pub visible_lines: usize,
}

impl Viewport {
    pub fn new(visible_lines: usize) -> Self {
        Self {
            top_line: 0,
            visible_lines,
        }
    }

    /// Visible block range, clamped to the document
    pub fn visible_range(&self, block_count: usize) -> Range<usize> {
        let start = self.top_line.min(block_count);
        let end = self
            .top_line
            .saturating_add(self.visible_lines)
            .min(block_count);
        start..end
    }
}

/// How the blocks of one edit get registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightPlan {
    pub urgent: Range<usize>,
    pub background: Vec<Range<usize>>,
}

/// Split the edited blocks `first..=last` into urgent and background work.
///
/// One or two blocks (typing, pressing enter) are always urgent. Larger ranges
/// are clamped to the visible range for urgent work; whatever falls outside
/// is queued as background so the document still converges.
pub fn plan_highlight(first: usize, last: usize, visible: Range<usize>) -> HighlightPlan {
    let last = last.max(first);
    if last - first <= 1 {
        return HighlightPlan {
            urgent: first..last + 1,
            background: Vec::new(),
        };
    }

    let start = first.max(visible.start);
    let end = (last + 1).min(visible.end);
    if start >= end {
        // Edit entirely off-screen
        return HighlightPlan {
            urgent: first..first,
            background: vec![first..last + 1],
        };
    }

    let mut background = Vec::new();
    if first < start {
        background.push(first..start);
    }
    if end < last + 1 {
        background.push(end..last + 1);
    }
    HighlightPlan {
        urgent: start..end,
        background,
    }
}

/// Document + viewport + highlighting, driven from one thread
pub struct Editor {
    document: Document,
    viewport: Viewport,
    highlighter: HighlightManager,
}

impl Editor {
    pub fn new(highlighters: HighlighterSet, visible_lines: usize) -> std::io::Result<Self> {
        Ok(Self {
            document: Document::new(),
            viewport: Viewport::new(visible_lines),
            highlighter: HighlightManager::new(highlighters)?,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn highlighter(&self) -> &HighlightManager {
        &self.highlighter
    }

    /// Load new content: the whole document is rehighlighted in the background
    pub fn open(&mut self, text: &str) {
        // Leftover urgent jobs for the old content fail the snapshot check
        self.highlighter.suspend();
        self.document.set_text(text);
        self.viewport.top_line = 0;
        self.highlighter.rehighlight(&self.document);
        self.highlighter.resume();
        tracing::info!(
            "Opened document with {} blocks",
            self.document.block_count()
        );
    }

    /// Replace `chars_removed` chars at `position` with `text`
    pub fn replace(&mut self, position: usize, chars_removed: usize, text: &str) -> ContentsChange {
        let change = self.document.replace(position, chars_removed, text);
        self.contents_changed(change);
        change
    }

    pub fn insert(&mut self, position: usize, text: &str) -> ContentsChange {
        self.replace(position, 0, text)
    }

    pub fn remove(&mut self, position: usize, chars: usize) -> ContentsChange {
        self.replace(position, chars, "")
    }

    fn contents_changed(&mut self, change: ContentsChange) {
        self.highlighter.blocks_moved(change.blocks);
        if self.document.is_empty() {
            self.highlighter.cancel_highlighting();
            return;
        }

        let first = change.blocks.first;
        let last = change.blocks.new_last;
        let visible = self.viewport.visible_range(self.document.block_count());
        let plan = plan_highlight(first, last, visible);

        tracing::debug!(
            "Edit at {} (-{} +{}) -> urgent {:?}, background {:?}",
            change.position,
            change.chars_removed,
            change.chars_added,
            plan.urgent,
            plan.background
        );

        self.highlighter
            .register_blocks(&self.document, plan.urgent, Priority::Urgent);
        for range in plan.background {
            self.highlighter
                .register_blocks(&self.document, range, Priority::Background);
        }
    }

    /// Scroll so `top_line` is the first visible block, queueing any visible
    /// block that has not been highlighted yet
    pub fn scroll_to(&mut self, top_line: usize) {
        let block_count = self.document.block_count();
        self.viewport.top_line = top_line.min(block_count.saturating_sub(1));

        for block in self.viewport.visible_range(block_count) {
            if self.document.block_formats(block).is_none() {
                self.highlighter
                    .register_block_to_highlight(&self.document, block, false);
            }
        }
    }

    /// Apply finished highlighting; call from the event loop
    pub fn process_highlights(&mut self) -> Vec<HighlightEvent> {
        self.highlighter.apply_completed(&mut self.document)
    }

    /// Block until background highlighting settles (batch use)
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        self.highlighter
            .wait_until_settled(&mut self.document, timeout)
    }

    pub fn set_highlighter_enabled(&mut self, name: &str, enabled: bool) -> bool {
        self.highlighter
            .set_highlighter_enabled(name, enabled, &self.document)
    }

    pub fn apply_settings(&mut self, config: &HighlightConfig) -> bool {
        self.highlighter.apply_settings(config, &self.document)
    }

    /// Rehighlight everything, e.g. after the dictionary changed
    pub fn rehighlight(&mut self) {
        self.highlighter.rehighlight(&self.document);
    }
}
