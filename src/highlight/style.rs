//! Style tags shared by all highlighter strategies
//!
//! Strategies emit style names (e.g. `tag`, `punctuation.bracket`), which are
//! resolved once into compact [`StyleId`] indices. The editor maps ids to
//! colors/underlines; this module only defines the vocabulary.

/// Known style names. Index into this array is the StyleId.
pub const STYLE_NAMES: &[&str] = &[
    "attribute",             // attribute name inside a tag
    "comment",               // <!-- ... -->
    "constant",              // doctype
    "error",                 // unmatched end tag
    "punctuation",           // general
    "punctuation.bracket",   // < > </ />
    "punctuation.delimiter", // =
    "string",                // attribute values
    "tag",                   // element names
    "text",                  // plain text
    "misspelled",            // spell-check underline
];

/// Index into STYLE_NAMES
pub type StyleId = u16;

/// Look up a style id by name
///
/// Hierarchical names fall back to their parent, so `tag.error` resolves to
/// `tag` when there is no dedicated entry.
pub fn style_id_for_name(name: &str) -> Option<StyleId> {
    let mut current = name;
    loop {
        if let Some(pos) = STYLE_NAMES.iter().position(|&n| n == current) {
            return Some(pos as StyleId);
        }

        let Some(dot_pos) = current.rfind('.') else {
            break;
        };
        current = &current[..dot_pos];
    }

    None
}

/// Name of a style id, if it is in range
pub fn style_name(id: StyleId) -> Option<&'static str> {
    STYLE_NAMES.get(id as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_id_lookup() {
        assert!(style_id_for_name("tag").is_some());
        assert!(style_id_for_name("punctuation.bracket").is_some());
        assert!(style_id_for_name("misspelled").is_some());
        assert!(style_id_for_name("nonexistent").is_none());
    }

    #[test]
    fn test_style_id_falls_back_to_parent() {
        assert_eq!(style_id_for_name("tag.builtin"), style_id_for_name("tag"));
        assert_eq!(
            style_id_for_name("punctuation.special"),
            style_id_for_name("punctuation")
        );
    }

    #[test]
    fn test_style_name_round_trip() {
        let id = style_id_for_name("string").unwrap();
        assert_eq!(style_name(id), Some("string"));
        assert_eq!(style_name(StyleId::MAX), None);
    }
}
