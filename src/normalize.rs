//! Text normalization shared by the parser and every table lookup.
//!
//! A lyric line goes through `normalize_punctuation` and `strip_chords`
//! before it is split into words; each word is then reduced to its lookup
//! form with `normalize_word`. Table keys are normalized the same way when
//! the lexicon is loaded, so lookups never disagree about case or accents.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// A single chord symbol: "Am", "G7", "F#m7", "Csus4", "D/F#".
pub static CHORD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-G][#b]?(?:maj|min|dim|aug|sus|add|m)?\d*(?:sus\d*|add\d*)?(?:/[A-G][#b]?)?$").unwrap()
});

/// Chord annotations embedded in a line: "[Am]" or "(G7)".
pub static INLINE_CHORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\[(][A-G][#b]?(?:maj|min|dim|aug|sus|add|m)?\d*(?:sus\d*|add\d*)?(?:/[A-G][#b]?)?[\])]").unwrap()
});

/// Leading chord label: "Am: walking down the road".
pub static LEADING_CHORD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-G][#b]?(?:maj|min|dim|aug|sus|add|m)?\d*(?:/[A-G][#b]?)?:\s+").unwrap()
});

/// Tablature rows: "e|---0---3---|" or a bare run of dashes, bars and frets.
pub static TAB_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[eBGDAE]\|)?[\s\-|x0-9hpb/\\~]+$").unwrap()
});

/// Characters that separate words inside a line.
pub static WORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-–—/]+").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// CHARACTER FOLDING
// ============================================================================

/// Check if a character is a Unicode combining diacritical mark.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII: NFKD, drop combining marks, then
/// transliterate whatever is left. "Café" → "cafe", "naïve" → "naive".
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Straighten quotes and repair "?" standing in for an apostrophe
/// ("Can?t" → "Can't"), then collapse runs of whitespace.
pub fn normalize_punctuation(s: &str) -> String {
    let mut result = s
        .replace(['\u{2018}', '\u{2019}', '\u{02BC}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{00B4}', '\u{0060}'], "'")
        .replace(" & ", " and ");
    for suffix in ["t", "s", "m", "ve", "re", "ll", "d"] {
        let broken = format!("?{} ", suffix);
        let fixed = format!("'{} ", suffix);
        result = result.replace(&broken, &fixed);
        if result.ends_with(&broken[..broken.len() - 1]) {
            let cut = result.len() - suffix.len() - 1;
            result = format!("{}'{}", &result[..cut], suffix);
        }
    }
    MULTI_SPACE.replace_all(&result, " ").to_string()
}

// ============================================================================
// LINE CLEANUP
// ============================================================================

/// True when more than half of the words on the line are chord symbols.
pub fn is_chord_line(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    let chords = words.iter().filter(|w| CHORD_TOKEN.is_match(w)).count();
    chords * 2 > words.len()
}

/// True for tablature rows and other lines made only of fret notation.
pub fn is_tab_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.contains(['-', '|']) && TAB_LINE.is_match(trimmed)
}

/// Remove chord annotations from a lyric line.
///
/// Returns `None` when nothing lyrical is left (chord-only or tab lines).
pub fn strip_chords(line: &str) -> Option<String> {
    if is_tab_line(line) || is_chord_line(line) {
        return None;
    }
    let without_inline = INLINE_CHORD.replace_all(line, "");
    let without_label = LEADING_CHORD_LABEL.replace(without_inline.trim(), "");
    let cleaned = MULTI_SPACE.replace_all(without_label.trim(), " ").to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

// ============================================================================
// WORDS
// ============================================================================

/// Split a cleaned line into surface words (punctuation still attached).
pub fn split_words(line: &str) -> Vec<&str> {
    WORD_SEPARATOR
        .split(line)
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .collect()
}

/// Lookup form of a word: ASCII-folded, lowercase, punctuation removed
/// except apostrophes between letters. "Lovin'" → "lovin", "Don’t" → "don't".
pub fn normalize_word(word: &str) -> String {
    let folded = fold_to_ascii(word);
    let kept: String = folded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '\'')
        .collect();
    kept.trim_matches('\'').to_string()
}

/// Surface text of a word with leading and trailing punctuation removed.
/// A trailing apostrophe is kept when it marks a dropped letter ("lovin'").
pub fn trim_surface(word: &str) -> &str {
    let start = word
        .char_indices()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(word.len());
    let end = word
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start);
    if start >= end {
        return "";
    }
    let rest = &word[end..];
    if word[start..end].ends_with("in") && (rest.starts_with('\'') || rest.starts_with('\u{2019}')) {
        let apostrophe = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(0);
        return &word[start..end + apostrophe];
    }
    &word[start..end]
}

/// Alternative spellings tried, in order, when a normalized word misses a
/// table: apostrophes removed ("o'er" → "oer"), and a dropped final g
/// restored ("lovin" → "loving").
pub fn lookup_variants(norm: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if norm.contains('\'') {
        variants.push(norm.replace('\'', ""));
    }
    if norm.len() > 3 && norm.ends_with("in") {
        variants.push(format!("{}g", norm));
    }
    variants
}
