//! Background highlighting worker
//!
//! A single thread drains the [`JobQueue`], runs every active strategy over
//! each job's snapshot and posts a [`Completion`] back over an mpsc channel.
//! The queue, the strategy snapshot and the control flags live together
//! behind one mutex/condvar pair; nothing else is shared with the UI thread.
//!
//! ```text
//! register → queue (mutex) ──wake──► worker: pop → run strategies
//!                                            → Completion ──mpsc──► manager
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::queue::{JobQueue, Priority};
use super::span::MultiFormatList;
use super::strategy::{HighlightError, Highlighter};

/// Name of the worker thread
pub const WORKER_THREAD_NAME: &str = "milord-highlighter";

/// Active strategies in layer order
pub type StrategySnapshot = Arc<[Arc<dyn Highlighter>]>;

/// Result of one highlighting job, delivered to the document-owning thread
#[derive(Debug, Clone)]
pub struct Completion {
    pub block: usize,
    /// The snapshot the layers were computed from
    pub text: Arc<str>,
    pub priority: Priority,
    /// Cancellation generation at dequeue time
    pub generation: u64,
    /// One list per active strategy, in layer order (empty on failure)
    pub layers: Vec<MultiFormatList>,
}

/// State shared between the manager and the worker thread
pub(crate) struct WorkerState {
    pub queue: JobQueue,
    pub strategies: StrategySnapshot,
    /// Bumped by cancel/rehighlight; older background work is abandoned
    pub generation: u64,
    /// Worker is running a job
    pub busy: bool,
    /// Current index of the running job's block; cleared if an edit removed it
    pub in_flight: Option<usize>,
    /// Worker holds at its next job boundary
    pub paused: bool,
    pub shutdown: bool,
    pub jobs_run: u64,
    pub strategy_failures: u64,
    pub abandoned: u64,
}

pub(crate) struct Shared {
    state: Mutex<WorkerState>,
    wake: Condvar,
}

impl Shared {
    fn new(strategies: StrategySnapshot) -> Self {
        Self {
            state: Mutex::new(WorkerState {
                queue: JobQueue::new(),
                strategies,
                generation: 0,
                busy: false,
                in_flight: None,
                paused: false,
                shutdown: false,
                jobs_run: 0,
                strategy_failures: 0,
                abandoned: 0,
            }),
            wake: Condvar::new(),
        }
    }

    /// Lock the state. Strategies never run under this lock, so a poisoned
    /// mutex still holds consistent data.
    pub fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake the worker after changing the queue or a flag
    pub fn notify(&self) {
        self.wake.notify_all();
    }
}

/// Handle to the background worker thread
pub struct Worker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread
    pub(crate) fn spawn(
        strategies: StrategySnapshot,
        completions: Sender<Completion>,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared::new(strategies));
        let thread_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run(&thread_shared, &completions))?;

        tracing::info!("Started highlighter worker thread");

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Ask the worker to stop and wait for it. The job in progress, if any,
    /// finishes first.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
        }
        self.shared.notify();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Highlighter worker thread panicked");
            } else {
                tracing::info!("Stopped highlighter worker thread");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker loop: block until a job is available, run it, post the result.
fn run(shared: &Shared, completions: &Sender<Completion>) {
    loop {
        let (job, strategies, generation) = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if !state.paused {
                    if let Some(job) = state.queue.pop() {
                        state.busy = true;
                        state.in_flight = Some(job.block);
                        let strategies = Arc::clone(&state.strategies);
                        let generation = state.generation;
                        break (job, strategies, generation);
                    }
                }
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        tracing::trace!(
            "Highlighting block {} ({:?}, {} chars)",
            job.block,
            job.priority,
            job.text.len()
        );
        let (layers, failures) = run_strategies(&strategies, &job.text);

        let mut state = shared.lock();
        state.busy = false;
        state.jobs_run += 1;
        state.strategy_failures += failures as u64;
        let block = state.in_flight.take();

        // Cancellation is observed at the job boundary: background work from
        // an older generation is dropped, urgent work is always delivered.
        let cancelled = job.priority == Priority::Background && state.generation != generation;
        match block {
            Some(block) if !cancelled => {
                let completion = Completion {
                    block,
                    text: job.text,
                    priority: job.priority,
                    generation,
                    layers,
                };
                if completions.send(completion).is_err() {
                    tracing::debug!("Completion receiver dropped, stopping highlighter worker");
                    state.shutdown = true;
                }
            }
            _ => {
                state.abandoned += 1;
                tracing::debug!("Abandoned job for block {}", job.block);
            }
        }
        drop(state);
        shared.notify();
    }
}

/// Run every strategy over `text`.
///
/// A failing or panicking strategy contributes an empty list; the others are
/// unaffected. Returns the layers and the number of failures.
pub fn run_strategies(
    strategies: &[Arc<dyn Highlighter>],
    text: &str,
) -> (Vec<MultiFormatList>, usize) {
    let mut failures = 0;
    let layers = strategies
        .iter()
        .map(|strategy| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.highlight(text)))
                .unwrap_or_else(|payload| {
                    Err(HighlightError::new(
                        strategy.name(),
                        format!("panicked: {}", panic_message(payload.as_ref())),
                    ))
                });

            match result {
                Ok(list) => list,
                Err(e) => {
                    failures += 1;
                    tracing::warn!("{}", e);
                    MultiFormatList::new()
                }
            }
        })
        .collect();
    (layers, failures)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
