//! Highlight manager
//!
//! The single authority for what needs highlighting and when results become
//! visible. Lives on the thread that owns the document: registration is
//! fire-and-forget into the worker's queue, and [`HighlightManager::apply_completed`]
//! is polled from the owning thread's event loop to move finished results
//! onto the document.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::queue::{BlockShift, Priority};
use super::span::{merge_layers, FormatSpan};
use super::strategy::{Highlighter, HighlighterEntry, HighlighterSet};
use super::worker::{Completion, Worker};
use crate::config::HighlightConfig;

/// Read access to the blocks of a document
pub trait BlockSource {
    fn block_count(&self) -> usize;

    /// Text of a block without its line terminator
    fn block_text(&self, block: usize) -> Option<String>;

    /// True when there is nothing to highlight
    fn is_empty(&self) -> bool {
        self.block_count() == 0
    }
}

/// A document that can receive computed formatting
pub trait HighlightTarget: BlockSource {
    /// Replace the formatting of one block with the merged spans
    fn apply_formats(&mut self, block: usize, spans: Vec<FormatSpan>);
}

/// Notifications emitted while applying results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightEvent {
    /// New formatting was applied to this block; the editor should repaint it
    BlockUpdated(usize),
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightStats {
    /// Jobs the worker finished computing
    pub jobs_run: u64,
    /// Strategy runs that failed or panicked
    pub strategy_failures: u64,
    /// Results applied to the document
    pub applied: u64,
    /// Results discarded because the block changed meanwhile
    pub stale: u64,
    /// Results dropped after cancel/rehighlight, or whose block an edit removed
    pub abandoned: u64,
}

/// Schedules background highlighting and applies results to the document
pub struct HighlightManager {
    highlighters: HighlighterSet,
    worker: Worker,
    completions: Receiver<Completion>,
    /// Completions drained early to renumber their blocks after an edit
    backlog: Vec<Completion>,
    applied: u64,
    stale: u64,
    abandoned: u64,
}

impl HighlightManager {
    /// Create a manager and start its worker thread
    pub fn new(highlighters: HighlighterSet) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = Worker::spawn(highlighters.active(), tx)?;

        tracing::debug!(
            "Highlight manager created with strategies: {:?}",
            highlighters
                .entries()
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            highlighters,
            worker,
            completions: rx,
            backlog: Vec::new(),
            applied: 0,
            stale: 0,
            abandoned: 0,
        })
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Enqueue (or replace) a job for one block.
    ///
    /// Urgent jobs supersede any pending job for the block and drain before
    /// background work. Silently ignored when the document is empty or the
    /// block is out of range.
    pub fn register_block_to_highlight<D: BlockSource + ?Sized>(
        &self,
        doc: &D,
        block: usize,
        important: bool,
    ) {
        let priority = if important {
            Priority::Urgent
        } else {
            Priority::Background
        };
        if let Some(end) = block.checked_add(1) {
            self.register_blocks(doc, block..end, priority);
        }
    }

    /// Enqueue jobs for a range of blocks under a single lock
    pub fn register_blocks<D: BlockSource + ?Sized>(
        &self,
        doc: &D,
        blocks: Range<usize>,
        priority: Priority,
    ) {
        if doc.is_empty() {
            return;
        }
        let end = blocks.end.min(doc.block_count());
        let snapshots = snapshot_blocks(doc, blocks.start..end);
        if snapshots.is_empty() {
            return;
        }

        let shared = self.worker.shared();
        {
            let mut state = shared.lock();
            for (block, text) in snapshots {
                state.queue.push(block, text, priority);
            }
        }
        shared.notify();
    }

    /// Drop all pending background work and abandon the in-flight background
    /// job at its next boundary. Urgent work is unaffected. Non-blocking.
    pub fn cancel_highlighting(&self) {
        let shared = self.worker.shared();
        let discarded = {
            let mut state = shared.lock();
            state.generation += 1;
            state.queue.clear_background()
        };
        shared.notify();
        tracing::debug!("Cancelled highlighting, {} background jobs discarded", discarded);
    }

    /// Replace all background work with one job per block, in ascending order
    pub fn rehighlight<D: BlockSource + ?Sized>(&self, doc: &D) {
        let snapshots = if doc.is_empty() {
            Vec::new()
        } else {
            snapshot_blocks(doc, 0..doc.block_count())
        };
        let count = snapshots.len();

        let shared = self.worker.shared();
        {
            let mut state = shared.lock();
            state.generation += 1;
            state.queue.clear_background();
            for (block, text) in snapshots {
                state.queue.push(block, text, Priority::Background);
            }
        }
        shared.notify();
        tracing::debug!("Rehighlight scheduled for {} blocks", count);
    }

    /// Follow an edit that inserted or removed blocks.
    ///
    /// Pending jobs, the running job and undelivered results for blocks after
    /// the edit are renumbered; those for edited blocks are dropped. Call
    /// before registering the edited blocks.
    pub fn blocks_moved(&mut self, shift: BlockShift) {
        if shift.is_identity() {
            return;
        }

        let dropped_jobs = {
            let mut state = self.worker.shared().lock();
            // The worker only sends under this lock, so nothing with a
            // pre-edit index can arrive after this drain
            self.backlog.extend(self.completions.try_iter());
            state.in_flight = state.in_flight.and_then(|block| shift.map(block));
            state.queue.shift_blocks(&shift)
        };

        let before = self.backlog.len();
        self.backlog.retain_mut(|completion| match shift.map(completion.block) {
            Some(block) => {
                completion.block = block;
                true
            }
            None => false,
        });
        self.stale += (before - self.backlog.len()) as u64;

        tracing::trace!(
            "Blocks {}..={} became {}..={}, {} pending jobs dropped",
            shift.first,
            shift.old_last,
            shift.first,
            shift.new_last,
            dropped_jobs
        );
    }

    /// Hold the worker at its next job boundary
    pub fn suspend(&self) {
        self.worker.shared().lock().paused = true;
    }

    pub fn resume(&self) {
        let shared = self.worker.shared();
        shared.lock().paused = false;
        shared.notify();
    }

    /// No queued jobs and the worker is not running one
    pub fn is_idle(&self) -> bool {
        let state = self.worker.shared().lock();
        state.queue.is_empty() && !state.busy
    }

    /// Pending (urgent, background) job counts
    pub fn pending_jobs(&self) -> (usize, usize) {
        let state = self.worker.shared().lock();
        (state.queue.urgent_len(), state.queue.background_len())
    }

    // =========================================================================
    // Strategies
    // =========================================================================

    /// Registered strategies in layer order
    pub fn highlighters(&self) -> &[HighlighterEntry] {
        self.highlighters.entries()
    }

    /// Add a strategy (or replace one with the same name) and rehighlight
    pub fn register_highlighter<D: BlockSource + ?Sized>(
        &mut self,
        highlighter: Arc<dyn Highlighter>,
        doc: &D,
    ) {
        self.highlighters.register(highlighter);
        self.publish_strategies();
        self.rehighlight(doc);
    }

    /// Toggle a strategy; a change triggers a full rehighlight.
    /// Returns true if the flag changed.
    pub fn set_highlighter_enabled<D: BlockSource + ?Sized>(
        &mut self,
        name: &str,
        enabled: bool,
        doc: &D,
    ) -> bool {
        if !self.highlighters.set_enabled(name, enabled) {
            return false;
        }
        tracing::info!("Highlighter '{}' enabled: {}", name, enabled);
        self.publish_strategies();
        self.rehighlight(doc);
        true
    }

    /// Apply preference order/flags; a change triggers a full rehighlight.
    /// Returns true if anything changed.
    pub fn apply_settings<D: BlockSource + ?Sized>(
        &mut self,
        config: &HighlightConfig,
        doc: &D,
    ) -> bool {
        let changed = self.highlighters.apply_preferences(
            config
                .highlighters
                .iter()
                .map(|pref| (pref.name.as_str(), pref.enabled)),
        );
        if changed {
            tracing::info!("Highlighter settings changed, rehighlighting");
            self.publish_strategies();
            self.rehighlight(doc);
        }
        changed
    }

    /// Hand the current active strategies to the worker for subsequent jobs
    fn publish_strategies(&self) {
        self.worker.shared().lock().strategies = self.highlighters.active();
    }

    // =========================================================================
    // Result delivery
    // =========================================================================

    /// Drain finished jobs and apply them to the document. Non-blocking.
    ///
    /// Results whose snapshot no longer matches the block are discarded (the
    /// block has been re-registered since), as are background results from
    /// before the last cancel/rehighlight.
    pub fn apply_completed<D: HighlightTarget + ?Sized>(
        &mut self,
        doc: &mut D,
    ) -> Vec<HighlightEvent> {
        let generation = self.worker.shared().lock().generation;
        let mut ready = std::mem::take(&mut self.backlog);
        loop {
            match self.completions.try_recv() {
                Ok(completion) => ready.push(completion),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Highlighter worker channel disconnected");
                    break;
                }
            }
        }

        let mut events = Vec::new();
        for completion in ready {
            if completion.priority == Priority::Background && completion.generation != generation
            {
                self.abandoned += 1;
                continue;
            }

            let current = doc.block_text(completion.block);
            if current.as_deref() != Some(&*completion.text) {
                tracing::trace!("Discarding stale result for block {}", completion.block);
                self.stale += 1;
                continue;
            }

            let spans = merge_layers(&completion.layers);
            doc.apply_formats(completion.block, spans);
            self.applied += 1;
            events.push(HighlightEvent::BlockUpdated(completion.block));
        }

        if !events.is_empty() {
            tracing::trace!("Applied highlighting to {} blocks", events.len());
        }
        events
    }

    /// Apply results until the worker runs dry or `timeout` elapses.
    ///
    /// Returns true if the queue settled. Meant for batch use (command line,
    /// tests); interactive callers poll [`Self::apply_completed`] instead.
    pub fn wait_until_settled<D: HighlightTarget + ?Sized>(
        &mut self,
        doc: &mut D,
        timeout: Duration,
    ) -> bool {
        let start = Instant::now();
        loop {
            self.apply_completed(doc);
            if self.is_idle() {
                // Everything the worker produced is already in the channel
                self.apply_completed(doc);
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn stats(&self) -> HighlightStats {
        let state = self.worker.shared().lock();
        HighlightStats {
            jobs_run: state.jobs_run,
            strategy_failures: state.strategy_failures,
            applied: self.applied,
            stale: self.stale,
            abandoned: state.abandoned + self.abandoned,
        }
    }
}

/// Capture immutable text snapshots for a range of blocks
fn snapshot_blocks<D: BlockSource + ?Sized>(
    doc: &D,
    blocks: Range<usize>,
) -> Vec<(usize, Arc<str>)> {
    blocks
        .filter_map(|block| doc.block_text(block).map(|text| (block, Arc::from(text))))
        .collect()
}
