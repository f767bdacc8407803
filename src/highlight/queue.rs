//! Two-lane highlight job queue
//!
//! Urgent jobs (blocks under active edit) always drain before background
//! jobs (rehighlight passes, scroll refresh). Each lane is FIFO and holds at
//! most one live job per block: re-registering a block supersedes the older
//! job, which stays in the deque as a tombstone and is skipped on dequeue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Tombstones tolerated per live job before a lane is compacted
const COMPACT_RATIO: usize = 2;
const COMPACT_MIN: usize = 64;

/// Job priority lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// The user is editing this block; highlight now
    Urgent,
    /// Whole-document or scroll-driven pass; cancellable
    Background,
}

/// How an edit moved block indices: `first..=old_last` became `first..=new_last`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockShift {
    pub first: usize,
    pub old_last: usize,
    pub new_last: usize,
}

impl BlockShift {
    /// An edit that stayed within one block
    pub fn single(block: usize) -> Self {
        Self {
            first: block,
            old_last: block,
            new_last: block,
        }
    }

    /// No block after the edit changed its index
    pub fn is_identity(&self) -> bool {
        self.old_last == self.new_last
    }

    /// New index of `block`, or `None` if it was part of the edited range
    pub fn map(&self, block: usize) -> Option<usize> {
        if block < self.first {
            Some(block)
        } else if block <= self.old_last {
            None
        } else {
            Some(block - self.old_last + self.new_last)
        }
    }
}

/// A pending request to highlight one block
#[derive(Debug, Clone)]
pub struct HighlightJob {
    /// Block index, kept current across line-count changes
    pub block: usize,
    /// Immutable snapshot of the block text
    pub text: Arc<str>,
    pub priority: Priority,
    seq: u64,
}

#[derive(Debug, Default)]
struct Lane {
    jobs: VecDeque<HighlightJob>,
    /// block -> seq of its live job
    live: HashMap<usize, u64>,
}

impl Lane {
    fn push(&mut self, job: HighlightJob) {
        self.live.insert(job.block, job.seq);
        self.jobs.push_back(job);
        self.maybe_compact();
    }

    fn pop(&mut self) -> Option<HighlightJob> {
        while let Some(job) = self.jobs.pop_front() {
            if self.live.get(&job.block) == Some(&job.seq) {
                self.live.remove(&job.block);
                return Some(job);
            }
        }
        None
    }

    /// Supersede the live job for `block`, if any
    fn remove(&mut self, block: usize) -> bool {
        self.live.remove(&block).is_some()
    }

    fn clear(&mut self) -> usize {
        let discarded = self.live.len();
        self.jobs.clear();
        self.live.clear();
        discarded
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    /// Move live jobs to their new block indices, dropping tombstones and
    /// jobs for edited blocks. Returns how many live jobs were dropped.
    fn shift(&mut self, shift: &BlockShift) -> usize {
        let before = self.live.len();
        let live = std::mem::take(&mut self.live);
        for mut job in std::mem::take(&mut self.jobs) {
            if live.get(&job.block) != Some(&job.seq) {
                continue;
            }
            if let Some(block) = shift.map(job.block) {
                job.block = block;
                self.live.insert(block, job.seq);
                self.jobs.push_back(job);
            }
        }
        before - self.live.len()
    }

    fn live_job(&self, block: usize) -> Option<&HighlightJob> {
        let seq = self.live.get(&block)?;
        self.jobs
            .iter()
            .rev()
            .find(|job| job.block == block && job.seq == *seq)
    }

    fn live_job_mut(&mut self, block: usize) -> Option<&mut HighlightJob> {
        let seq = *self.live.get(&block)?;
        self.jobs
            .iter_mut()
            .rev()
            .find(|job| job.block == block && job.seq == seq)
    }

    fn maybe_compact(&mut self) {
        if self.jobs.len() > COMPACT_MIN && self.jobs.len() > self.live.len() * COMPACT_RATIO {
            let live = &self.live;
            self.jobs
                .retain(|job| live.get(&job.block) == Some(&job.seq));
        }
    }
}

/// Pending highlight work, split into urgent and background lanes
#[derive(Debug, Default)]
pub struct JobQueue {
    urgent: Lane,
    background: Lane,
    next_seq: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job, superseding any pending job for the same block.
    ///
    /// New jobs join the tail of their lane, so urgent work also runs in
    /// registration order.
    ///
    /// An urgent job also supersedes a pending background job for the block.
    /// A background job for a block with a pending urgent job only refreshes
    /// that job's snapshot, keeping its urgent slot. Returns false if no new
    /// job was queued.
    pub fn push(&mut self, block: usize, text: Arc<str>, priority: Priority) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;
        let job = HighlightJob {
            block,
            text,
            priority,
            seq,
        };

        match priority {
            Priority::Urgent => {
                self.background.remove(block);
                self.urgent.push(job);
                true
            }
            Priority::Background => {
                if let Some(pending) = self.urgent.live_job_mut(block) {
                    pending.text = job.text;
                    return false;
                }
                self.background.push(job);
                true
            }
        }
    }

    /// Take the next job: urgent lane first, FIFO within a lane
    pub fn pop(&mut self) -> Option<HighlightJob> {
        self.urgent.pop().or_else(|| self.background.pop())
    }

    /// Drop every pending background job, returning how many were live
    pub fn clear_background(&mut self) -> usize {
        self.background.clear()
    }

    /// Follow an edit that inserted or removed blocks.
    ///
    /// Jobs after the edit are renumbered; jobs inside the edited range are
    /// dropped since the edit registers those blocks again. Returns the
    /// number of dropped jobs.
    pub fn shift_blocks(&mut self, shift: &BlockShift) -> usize {
        if shift.is_identity() {
            return 0;
        }
        self.urgent.shift(shift) + self.background.shift(shift)
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.urgent.clear();
        self.background.clear();
    }

    pub fn urgent_len(&self) -> usize {
        self.urgent.len()
    }

    pub fn background_len(&self) -> usize {
        self.background.len()
    }

    pub fn len(&self) -> usize {
        self.urgent_len() + self.background_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The live job for a block, urgent lane first
    pub fn pending(&self, block: usize) -> Option<&HighlightJob> {
        self.urgent
            .live_job(block)
            .or_else(|| self.background.live_job(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    fn drain(queue: &mut JobQueue) -> Vec<(usize, String, Priority)> {
        std::iter::from_fn(|| queue.pop())
            .map(|job| (job.block, job.text.to_string(), job.priority))
            .collect()
    }

    #[test]
    fn test_urgent_drains_before_background() {
        let mut queue = JobQueue::new();
        queue.push(0, text("a"), Priority::Background);
        queue.push(1, text("b"), Priority::Background);
        queue.push(5, text("f"), Priority::Urgent);

        let order: Vec<usize> = drain(&mut queue).into_iter().map(|j| j.0).collect();
        assert_eq!(order, vec![5, 0, 1]);
    }

    #[test]
    fn test_fifo_within_lane() {
        let mut queue = JobQueue::new();
        for block in [3, 1, 2] {
            queue.push(block, text("x"), Priority::Urgent);
        }
        let order: Vec<usize> = drain(&mut queue).into_iter().map(|j| j.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_urgent_reregistration_keeps_latest_only() {
        let mut queue = JobQueue::new();
        queue.push(2, text("old"), Priority::Urgent);
        queue.push(2, text("new"), Priority::Urgent);

        assert_eq!(queue.urgent_len(), 1);
        assert_eq!(
            drain(&mut queue),
            vec![(2, "new".to_string(), Priority::Urgent)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_urgent_supersedes_background_for_same_block() {
        let mut queue = JobQueue::new();
        queue.push(4, text("snapshot"), Priority::Background);
        queue.push(4, text("edited"), Priority::Urgent);

        assert_eq!(queue.background_len(), 0);
        assert_eq!(
            drain(&mut queue),
            vec![(4, "edited".to_string(), Priority::Urgent)]
        );
    }

    #[test]
    fn test_background_refreshes_pending_urgent_snapshot() {
        let mut queue = JobQueue::new();
        queue.push(4, text("typed"), Priority::Urgent);
        assert!(!queue.push(4, text("pasted over"), Priority::Background));
        assert_eq!(queue.len(), 1);
        assert_eq!(
            drain(&mut queue),
            vec![(4, "pasted over".to_string(), Priority::Urgent)]
        );
    }

    #[test]
    fn test_clear_background_keeps_urgent() {
        let mut queue = JobQueue::new();
        for block in 0..10 {
            queue.push(block, text("x"), Priority::Background);
        }
        queue.push(3, text("typing"), Priority::Urgent);

        // Block 3's background job was superseded, so 9 live background jobs
        assert_eq!(queue.clear_background(), 9);
        assert_eq!(
            drain(&mut queue),
            vec![(3, "typing".to_string(), Priority::Urgent)]
        );
    }

    #[test]
    fn test_pending_returns_live_snapshot() {
        let mut queue = JobQueue::new();
        queue.push(1, text("first"), Priority::Background);
        queue.push(1, text("second"), Priority::Background);
        assert_eq!(&*queue.pending(1).unwrap().text, "second");
        assert!(queue.pending(2).is_none());
    }

    #[test]
    fn test_block_shift_map() {
        // Block 2 split into 2..=4
        let shift = BlockShift {
            first: 2,
            old_last: 2,
            new_last: 4,
        };
        assert_eq!(shift.map(1), Some(1));
        assert_eq!(shift.map(2), None);
        assert_eq!(shift.map(3), Some(5));

        // Blocks 2..=4 joined into 2
        let shift = BlockShift {
            first: 2,
            old_last: 4,
            new_last: 2,
        };
        assert_eq!(shift.map(4), None);
        assert_eq!(shift.map(7), Some(5));
    }

    #[test]
    fn test_shift_blocks_renumbers_pending_jobs() {
        let mut queue = JobQueue::new();
        for block in 0..5 {
            queue.push(block, text(&format!("b{}", block)), Priority::Background);
        }
        queue.push(4, text("typed"), Priority::Urgent);

        // Enter pressed in block 1
        let dropped = queue.shift_blocks(&BlockShift {
            first: 1,
            old_last: 1,
            new_last: 2,
        });
        assert_eq!(dropped, 1);
        assert_eq!(
            drain(&mut queue),
            vec![
                (5, "typed".to_string(), Priority::Urgent),
                (0, "b0".to_string(), Priority::Background),
                (3, "b2".to_string(), Priority::Background),
                (4, "b3".to_string(), Priority::Background),
            ]
        );
    }

    #[test]
    fn test_shift_blocks_identity_is_noop() {
        let mut queue = JobQueue::new();
        queue.push(3, text("x"), Priority::Urgent);
        assert_eq!(queue.shift_blocks(&BlockShift::single(3)), 0);
        assert!(queue.pending(3).is_some());
    }

    #[test]
    fn test_tombstones_are_compacted() {
        let mut queue = JobQueue::new();
        for i in 0..1000 {
            queue.push(7, text(&i.to_string()), Priority::Background);
        }
        assert_eq!(queue.background_len(), 1);
        assert!(queue.background.jobs.len() <= COMPACT_MIN + 1);
        assert_eq!(&*queue.pop().unwrap().text, "999");
    }
}
