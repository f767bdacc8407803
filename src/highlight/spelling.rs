//! Spell-check highlighter
//!
//! Underlines words missing from a word-list dictionary. The dictionary can
//! be swapped at runtime from the UI thread while the worker is reading it,
//! so it carries its own `RwLock`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock};

use super::span::{FormatSpan, MultiFormatList};
use super::strategy::{HighlightError, Highlighter};
use super::style::{style_id_for_name, StyleId};

/// Strategy name used in preferences
pub const SPELLING_HIGHLIGHTER: &str = "spelling";

/// A live, internally synchronized word list
#[derive(Debug, Default)]
pub struct Dictionary {
    words: RwLock<HashSet<String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dict = Self::new();
        dict.replace_words(words);
        dict
    }

    /// Load a dictionary from a word list (one word per line, `#` comments)
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let dict = Self::new();
        dict.reload_from(path)?;
        Ok(dict)
    }

    /// Replace the word list with the contents of `path`, returning the word count
    pub fn reload_from(&self, path: &Path) -> std::io::Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        let count = self.replace_words(words);
        tracing::info!("Loaded {} dictionary words from {}", count, path.display());
        Ok(count)
    }

    /// Swap in a new word list, returning the word count
    pub fn replace_words<I, S>(&self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        let count = set.len();
        match self.words.write() {
            Ok(mut guard) => *guard = set,
            Err(poisoned) => *poisoned.into_inner() = set,
        }
        count
    }

    pub fn len(&self) -> usize {
        self.words.read().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive lookup
    pub fn check_word(&self, word: &str) -> bool {
        self.words
            .read()
            .map(|w| w.contains(&word.to_lowercase()))
            .unwrap_or(true)
    }
}

/// Split a block into candidate words, skipping markup tags and entities.
///
/// Returns (char offset, char length, word) triples. Apostrophes are part of
/// a word only between letters ("don't", "l’amour").
fn words(text: &str) -> Vec<(usize, usize, String)> {
    let mut out = Vec::new();
    let mut in_tag = false;
    let mut in_entity = false;
    let mut current = String::new();
    let mut start = 0;
    let mut len = 0;

    let chars: Vec<char> = text.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        let is_apostrophe = (ch == '\'' || ch == '’')
            && len > 0
            && chars.get(i + 1).is_some_and(|c| c.is_alphabetic());
        let in_word = !in_tag && !in_entity && (ch.is_alphabetic() || is_apostrophe);

        if in_word {
            if len == 0 {
                start = i;
            }
            current.push(ch);
            len += 1;
            continue;
        }

        if len > 0 {
            out.push((start, len, std::mem::take(&mut current)));
            len = 0;
        }

        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '&' if !in_tag => in_entity = true,
            ';' => in_entity = false,
            c if c.is_whitespace() => in_entity = false,
            _ => {}
        }
    }

    if len > 0 {
        out.push((start, len, current));
    }
    out
}

/// Underlines words the dictionary does not know
pub struct SpellingHighlighter {
    dictionary: Arc<Dictionary>,
    style: StyleId,
}

impl SpellingHighlighter {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self {
            dictionary,
            style: style_id_for_name("misspelled").unwrap_or_default(),
        }
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }
}

impl Highlighter for SpellingHighlighter {
    fn name(&self) -> &str {
        SPELLING_HIGHLIGHTER
    }

    fn highlight(&self, text: &str) -> Result<MultiFormatList, HighlightError> {
        let words_guard = self.dictionary.words.read().map_err(|_| {
            HighlightError::new(SPELLING_HIGHLIGHTER, "dictionary lock poisoned")
        })?;

        let mut list = MultiFormatList::new();
        if words_guard.is_empty() {
            return Ok(list);
        }

        for (start, len, word) in words(text) {
            if !words_guard.contains(&word.to_lowercase()) {
                list.push(FormatSpan::new(start, len, self.style));
            }
        }
        Ok(list)
    }
}
