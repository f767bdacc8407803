//! milord - background markup and spelling highlighter
//!
//! Loads a book file into the editor model, lets the background worker
//! highlight every block and prints the merged spans. With `--watch` it keeps
//! running and re-highlights when the file, the config or the dictionary
//! changes on disk.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use milord::cli::{CliArgs, OutputFormat, RunConfig};
use milord::config::HighlightConfig;
use milord::config_watch::{ConfigWatcher, WatchKind};
use milord::editor::Editor;
use milord::highlight::{default_highlighters, Dictionary};
use milord::report;

/// Blocks treated as visible for edit coalescing
const VISIBLE_LINES: usize = 50;

/// How often watch mode polls for file changes
const WATCH_POLL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    milord::tracing::init();

    let run = CliArgs::parse().into_config().map_err(anyhow::Error::msg)?;
    tracing::debug!("Run config: {:?}", run);

    let mut config = load_config(&run);
    for name in &run.disabled {
        config.set_highlighter_enabled(name, false);
    }
    if run.save_config {
        save_config(&run, &config)?;
    }

    let dictionary_path = run.dictionary.clone().or_else(|| config.dictionary_path());
    let dictionary = Arc::new(Dictionary::new());
    if let Some(path) = &dictionary_path {
        load_dictionary(&dictionary, path);
    }

    let mut editor = Editor::new(default_highlighters(Arc::clone(&dictionary)), VISIBLE_LINES)
        .context("Failed to start highlighter worker")?;
    editor.apply_settings(&config);

    let text = read_document(&run.path)?;
    editor.open(&text);
    settle_and_print(&mut editor, &run)?;

    if run.watch {
        watch(&mut editor, &run, &mut config, &dictionary, dictionary_path.as_deref())?;
    }

    Ok(())
}

fn load_config(run: &RunConfig) -> HighlightConfig {
    match &run.config_path {
        Some(path) => HighlightConfig::load_from(path),
        None => HighlightConfig::load(),
    }
}

fn save_config(run: &RunConfig, config: &HighlightConfig) -> Result<()> {
    match &run.config_path {
        Some(path) => config.save_to(path),
        None => config.save(),
    }
    .map_err(anyhow::Error::msg)
}

fn load_dictionary(dictionary: &Dictionary, path: &Path) {
    if !path.exists() {
        tracing::info!(
            "No dictionary at {}, spell checking disabled",
            path.display()
        );
        return;
    }
    if let Err(e) = dictionary.reload_from(path) {
        tracing::warn!("Failed to load dictionary {}: {}", path.display(), e);
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn settle_and_print(editor: &mut Editor, run: &RunConfig) -> Result<()> {
    if !editor.wait_until_settled(run.timeout) {
        tracing::warn!(
            "Highlighting did not settle within {:?}, printing partial results",
            run.timeout
        );
    }

    let output = match run.output {
        OutputFormat::Text => report::render_text(editor.document()),
        OutputFormat::Json => report::render_json(editor.document())
            .context("Failed to serialize highlighting")?,
    };
    println!("{}", output);
    Ok(())
}

fn watch(
    editor: &mut Editor,
    run: &RunConfig,
    config: &mut HighlightConfig,
    dictionary: &Dictionary,
    dictionary_path: Option<&Path>,
) -> Result<()> {
    let mut watcher = ConfigWatcher::new().context("Failed to create file watcher")?;
    watcher
        .watch(&run.path, WatchKind::Document)
        .with_context(|| format!("Failed to watch {}", run.path.display()))?;

    // Config and dictionary may not exist yet; watching them is best effort
    let config_path = run
        .config_path
        .clone()
        .or_else(milord::config_paths::config_file);
    let optional = [
        (config_path.as_deref(), WatchKind::Config),
        (dictionary_path, WatchKind::Dictionary),
    ];
    for (path, kind) in optional {
        if let Some(path) = path {
            if let Err(e) = watcher.watch(path, kind) {
                tracing::warn!("Not watching {}: {}", path.display(), e);
            }
        }
    }

    loop {
        let kinds = watcher.poll_events();
        if kinds.is_empty() {
            std::thread::sleep(WATCH_POLL);
            continue;
        }

        for kind in kinds {
            match kind {
                WatchKind::Document => {
                    let text = read_document(&run.path)?;
                    editor.open(&text);
                }
                WatchKind::Config => {
                    *config = load_config(run);
                    for name in &run.disabled {
                        config.set_highlighter_enabled(name, false);
                    }
                    editor.apply_settings(config);
                }
                WatchKind::Dictionary => {
                    if let Some(path) = dictionary_path {
                        load_dictionary(dictionary, path);
                    }
                    editor.rehighlight();
                }
            }
        }
        settle_and_print(editor, run)?;
    }
}
