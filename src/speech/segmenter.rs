//! Sentence segmentation for speech playback
//!
//! Text is split into speakable units so playback can advance, pause and
//! skip at sentence granularity.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Punctuation that ends a clause when Unicode segmentation finds nothing
static CLAUSE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^.!?;:。！？\n]+[.!?;:。！？\n]*").expect("clause regex is valid")
});

/// Split text into an ordered sequence of trimmed, non-empty units
///
/// Rules are tried in order and the first non-empty result wins:
/// Unicode sentence boundaries, then punctuation, then the whole text.
pub fn segment(text: Option<&str>) -> Vec<String> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Vec::new(),
    };

    let units = collect(text.split_sentence_bounds());
    if !units.is_empty() {
        return units;
    }

    let units = collect(CLAUSE_END.find_iter(text).map(|m| m.as_str()));
    if !units.is_empty() {
        return units;
    }

    vec![text.to_string()]
}

fn collect<'a>(pieces: impl Iterator<Item = &'a str>) -> Vec<String> {
    pieces
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
