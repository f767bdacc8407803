//! milord - incremental background highlighting for a book editor
//!
//! This crate provides the document model, the editor controller and the
//! background highlighting engine (queue, worker, strategies) that keeps
//! markup and spelling formatting up to date while text is edited.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod config_watch;
pub mod document;
pub mod editor;
pub mod highlight;
pub mod report;
pub mod tracing;

// Re-export commonly used types
pub use config::HighlightConfig;
pub use document::{ContentsChange, Document};
pub use editor::Editor;
pub use highlight::{HighlightEvent, HighlightManager, Highlighter, HighlighterSet};
