//! Incremental background highlighting
//!
//! Edits register the affected blocks with the [`HighlightManager`]; a
//! single worker thread runs every enabled [`Highlighter`] strategy over
//! block snapshots and the manager applies the merged spans back onto the
//! document from the owning thread.
//!
//! ## Architecture
//!
//! ```text
//! edit → register_block_to_highlight(block, important)
//!      → JobQueue (urgent lane / background lane)
//!      → (worker thread) run strategies → Completion
//!      → apply_completed() on the document thread → HighlightEvent::BlockUpdated
//! ```
//!
//! ## Built-in strategies
//!
//! - `markup` - tag, attribute and comment highlighting (tree-sitter HTML)
//! - `spelling` - underlines words missing from the dictionary

mod manager;
mod markup;
mod queue;
mod span;
mod spelling;
mod strategy;
mod style;
mod worker;

use std::sync::Arc;

pub use manager::{BlockSource, HighlightEvent, HighlightManager, HighlightStats, HighlightTarget};
pub use markup::{MarkupHighlighter, MARKUP_HIGHLIGHTER};
pub use queue::{BlockShift, HighlightJob, JobQueue, Priority};
pub use span::{merge_layers, FormatSpan, MultiFormatList};
pub use spelling::{Dictionary, SpellingHighlighter, SPELLING_HIGHLIGHTER};
pub use strategy::{HighlightError, Highlighter, HighlighterEntry, HighlighterSet};
pub use style::{style_id_for_name, style_name, StyleId, STYLE_NAMES};
pub use worker::{run_strategies, Completion, WORKER_THREAD_NAME};

/// The built-in strategies in their default layer order: markup, then spelling.
///
/// A markup highlighter that fails to initialize is left out with a warning.
pub fn default_highlighters(dictionary: Arc<Dictionary>) -> HighlighterSet {
    let mut set = HighlighterSet::new();
    match MarkupHighlighter::new() {
        Ok(markup) => set.register(Arc::new(markup)),
        Err(e) => tracing::warn!("Markup highlighting unavailable: {}", e),
    }
    set.register(Arc::new(SpellingHighlighter::new(dictionary)));
    set
}
