//! File watching for highlighting inputs
//!
//! Uses the `notify` crate with debouncing to detect changes to the config
//! file, the spelling dictionary or the open document, so the caller can
//! reload and rehighlight.

use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// What a changed file means for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// Preferences changed: reapply strategy order/flags
    Config,
    /// Word list changed: reload it and rehighlight
    Dictionary,
    /// The document changed on disk: reload it
    Document,
}

/// Debounced watcher over a handful of files
///
/// Files are watched through their parent directory so that editors which
/// save by rename, and files created after startup, are still seen.
pub struct ConfigWatcher {
    /// The debouncer handles watching and event coalescing
    debouncer: Debouncer<notify::RecommendedWatcher>,
    /// Receiver for debounced events
    rx: Receiver<DebounceEventResult>,
    targets: Vec<(PathBuf, WatchKind)>,
    watched_dirs: Vec<PathBuf>,
}

impl ConfigWatcher {
    /// Create a watcher with nothing registered yet
    ///
    /// Events are debounced with a 300ms delay to coalesce the bursts of
    /// writes editors produce on save.
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let debouncer = new_debouncer(Duration::from_millis(300), tx)?;

        Ok(Self {
            debouncer,
            rx,
            targets: Vec::new(),
            watched_dirs: Vec::new(),
        })
    }

    /// Start reporting changes of `path` as `kind`
    pub fn watch(&mut self, path: &Path, kind: WatchKind) -> Result<(), notify::Error> {
        let file_name = path
            .file_name()
            .ok_or_else(|| notify::Error::generic("watched path has no file name"))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // Events carry canonical paths on some platforms
        let parent = parent.canonicalize().unwrap_or(parent);

        if !self.watched_dirs.contains(&parent) {
            self.debouncer
                .watcher()
                .watch(&parent, notify::RecursiveMode::NonRecursive)?;
            tracing::info!("Watching {} for changes", parent.display());
            self.watched_dirs.push(parent.clone());
        }

        self.targets.push((parent.join(file_name), kind));
        Ok(())
    }

    /// Map a changed path to the kind it was registered as
    fn classify(&self, path: &Path) -> Option<WatchKind> {
        self.targets
            .iter()
            .find(|(target, _)| target == path)
            .map(|(_, kind)| *kind)
    }

    /// Poll for pending changes (non-blocking), deduplicated
    pub fn poll_events(&self) -> Vec<WatchKind> {
        let mut kinds = Vec::new();

        // Drain all pending events from the channel
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(events) => {
                    for event in events {
                        if let Some(kind) = self.classify(&event.path) {
                            if !kinds.contains(&kind) {
                                kinds.push(kind);
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("File watcher error: {:?}", e);
                }
            }
        }

        if !kinds.is_empty() {
            tracing::debug!("File watcher detected changes: {:?}", kinds);
        }

        kinds
    }
}
