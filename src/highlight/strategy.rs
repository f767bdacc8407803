//! Highlighter strategy interface
//!
//! A strategy turns one block of text into a [`MultiFormatList`]. Strategies
//! run on the worker thread while the UI thread may read their configuration,
//! so implementations must be `Send + Sync`; any mutable state (a live
//! dictionary, a parser) carries its own synchronization.

use std::fmt;
use std::sync::Arc;

use super::span::MultiFormatList;

/// Failure of one strategy on one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightError {
    /// Name of the failing strategy
    pub strategy: String,
    pub message: String,
}

impl HighlightError {
    pub fn new(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "highlighter '{}' failed: {}", self.strategy, self.message)
    }
}

impl std::error::Error for HighlightError {}

/// A pluggable rule that scans a block's text and emits style spans
pub trait Highlighter: Send + Sync {
    /// Stable identifier, used by preferences to toggle and order strategies
    fn name(&self) -> &str;

    /// Compute spans for a single block
    ///
    /// Offsets are in characters of `text`. An error only drops this
    /// strategy's contribution for this block.
    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError>;
}

/// A registered strategy and its enabled flag
#[derive(Clone)]
pub struct HighlighterEntry {
    pub highlighter: Arc<dyn Highlighter>,
    pub enabled: bool,
}

impl HighlighterEntry {
    pub fn name(&self) -> &str {
        self.highlighter.name()
    }
}

impl fmt::Debug for HighlighterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlighterEntry")
            .field("name", &self.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Ordered list of registered strategies (registration order = layer order)
#[derive(Debug, Clone, Default)]
pub struct HighlighterSet {
    entries: Vec<HighlighterEntry>,
}

impl HighlighterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration, enabled by default
    pub fn with(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.register(Arc::new(highlighter));
        self
    }

    /// Register a strategy at the end of the layer order
    ///
    /// A strategy with the same name replaces the earlier registration in place.
    pub fn register(&mut self, highlighter: Arc<dyn Highlighter>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.name() == highlighter.name())
        {
            entry.highlighter = highlighter;
            return;
        }
        self.entries.push(HighlighterEntry {
            highlighter,
            enabled: true,
        });
    }

    pub fn entries(&self) -> &[HighlighterEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&HighlighterEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Toggle a strategy. Returns true if the flag actually changed.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.name() == name) {
            Some(entry) if entry.enabled != enabled => {
                entry.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    /// Reorder and toggle strategies from a preference list.
    ///
    /// Listed names come first in the given order; unlisted strategies keep
    /// their relative order after them and their current flag. Unknown names
    /// are ignored. Returns true if order or any flag changed.
    pub fn apply_preferences<'a>(
        &mut self,
        prefs: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> bool {
        let before: Vec<(String, bool)> = self
            .entries
            .iter()
            .map(|e| (e.name().to_string(), e.enabled))
            .collect();

        let mut remaining = std::mem::take(&mut self.entries);
        for (name, enabled) in prefs {
            if let Some(pos) = remaining.iter().position(|e| e.name() == name) {
                let mut entry = remaining.remove(pos);
                entry.enabled = enabled;
                self.entries.push(entry);
            }
        }
        self.entries.append(&mut remaining);

        let after: Vec<(String, bool)> = self
            .entries
            .iter()
            .map(|e| (e.name().to_string(), e.enabled))
            .collect();
        before != after
    }

    /// Snapshot of the enabled strategies in layer order
    pub fn active(&self) -> Arc<[Arc<dyn Highlighter>]> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| Arc::clone(&e.highlighter))
            .collect()
    }
}
