//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use milord::highlight::{
    style_id_for_name, FormatSpan, HighlightError, Highlighter, HighlighterSet, MultiFormatList,
};

/// Generous upper bound for background work in tests
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Marks the whole block with one style
pub struct Whole {
    pub name: &'static str,
    pub style: &'static str,
}

impl Whole {
    pub fn new(name: &'static str, style: &'static str) -> Self {
        Self { name, style }
    }
}

impl Highlighter for Whole {
    fn name(&self) -> &str {
        self.name
    }

    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError> {
        let style = style_id_for_name(self.style)
            .ok_or_else(|| HighlightError::new(self.name, "unknown style"))?;
        Ok(vec![FormatSpan::new(0, text.chars().count(), style)].into())
    }
}

/// Records every snapshot it is asked to highlight, in order
#[derive(Clone, Default)]
pub struct Recording {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl Highlighter for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError> {
        self.seen.lock().unwrap().push(text.to_string());
        let style = style_id_for_name("text").unwrap_or_default();
        Ok(vec![FormatSpan::new(0, text.chars().count(), style)].into())
    }
}

/// Always returns an error
pub struct Failing;

impl Highlighter for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn highlight(&self, _text: &str) -> Result<MultiFormatList, HighlightError> {
        Err(HighlightError::new("failing", "always fails"))
    }
}

/// Panics on every block
pub struct Panicking;

impl Highlighter for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn highlight(&self, _text: &str) -> Result<MultiFormatList, HighlightError> {
        panic!("strategy bug");
    }
}

#[derive(Default)]
struct GateState {
    inside: bool,
    open: bool,
}

#[derive(Default)]
struct Gate {
    state: Mutex<GateState>,
    entered: Condvar,
    released: Condvar,
}

/// Holds the worker inside `highlight` until released
#[derive(Clone, Default)]
pub struct Gated {
    gate: Arc<Gate>,
}

impl Gated {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the worker is blocked inside the strategy
    pub fn wait_until_entered(&self, timeout: Duration) -> bool {
        let state = self.gate.state.lock().unwrap();
        let (state, _) = self
            .gate
            .entered
            .wait_timeout_while(state, timeout, |s| !s.inside)
            .unwrap();
        state.inside
    }

    /// Let the current and every later call through
    pub fn release(&self) {
        self.gate.state.lock().unwrap().open = true;
        self.gate.released.notify_all();
    }
}

impl Highlighter for Gated {
    fn name(&self) -> &str {
        "gated"
    }

    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError> {
        let mut state = self.gate.state.lock().unwrap();
        state.inside = true;
        self.gate.entered.notify_all();
        let state = self
            .gate
            .released
            .wait_while(state, |s| !s.open)
            .unwrap();
        drop(state);
        let style = style_id_for_name("text").unwrap_or_default();
        Ok(vec![FormatSpan::new(0, text.chars().count(), style)].into())
    }
}

/// Strategy set containing only a recorder, plus the handle to inspect it
pub fn recording_set() -> (HighlighterSet, Recording) {
    let recording = Recording::new();
    let set = HighlighterSet::new().with(recording.clone());
    (set, recording)
}

/// `count` blocks named "line 0", "line 1", ... without a trailing newline
pub fn numbered_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("line {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}
