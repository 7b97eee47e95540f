//! Syllables, stress and rhyme keys.
//!
//! Words found in the pronunciation table get their phonemes from it; every
//! other word goes through `heuristic_syllables`, a fixed vowel-cluster rule
//! set. Each result carries its `SyllableSource` so a report can tell the
//! two apart.

use serde::{Deserialize, Serialize};

use crate::config::RhymeConfig;
use crate::lexicon::Lexicon;
use crate::models::{Line, Section, Song};

/// Scheme letter for a line with no rhyme key (no words).
pub const NO_RHYME: char = '-';

// ============================================================================
// Words
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyllableSource {
    Dictionary,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSound {
    pub word: String,
    pub syllables: usize,
    pub source: SyllableSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phonemes: Vec<String>,
    /// One digit per syllable: 1 primary, 2 secondary, 0 unstressed.
    /// Heuristic words are all 0.
    pub stress: String,
}

/// Sound of a line ending. Dictionary keys are space-joined phonemes from
/// the last stressed vowel ("AY T"); heuristic keys are a lowercase spelling
/// tail ("ight"). Keys from different sources never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhymeKey {
    pub source: SyllableSource,
    pub sound: String,
}

/// CMU vowels always carry a stress digit.
pub fn is_vowel_phone(p: &str) -> bool {
    p.ends_with(|c: char| c.is_ascii_digit())
}

fn strip_stress(p: &str) -> &str {
    p.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Look a normalized word up, falling back to the spelling heuristic.
pub fn analyze_word(lexicon: &Lexicon, norm: &str) -> WordSound {
    match lexicon.pronunciation(norm) {
        Some(phones) => {
            let stress: String = phones
                .iter()
                .filter(|p| is_vowel_phone(p))
                .filter_map(|p| p.chars().last())
                .collect();
            WordSound {
                word: norm.to_string(),
                syllables: stress.len(),
                source: SyllableSource::Dictionary,
                phonemes: phones.to_vec(),
                stress,
            }
        }
        None => {
            let syllables = heuristic_syllables(norm);
            WordSound {
                word: norm.to_string(),
                syllables,
                source: SyllableSource::Heuristic,
                phonemes: Vec::new(),
                stress: "0".repeat(syllables),
            }
        }
    }
}

fn is_vowel_letter(chars: &[char], i: usize) -> bool {
    match chars[i] {
        'a' | 'e' | 'i' | 'o' | 'u' => true,
        'y' => i > 0,
        _ => false,
    }
}

/// Start indices of vowel clusters in a lowercase letter sequence.
fn vowel_groups(chars: &[char]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut prev = false;
    for i in 0..chars.len() {
        let v = is_vowel_letter(chars, i);
        if v && !prev {
            starts.push(i);
        }
        prev = v;
    }
    starts
}

/// True when the final vowel cluster is not pronounced: silent "e"
/// ("stone"), "-ed" not after t/d ("jumped"), "-es" not after a sibilant
/// ("stones"). Consonant + "le" ("table") is voiced.
fn final_group_silent(chars: &[char]) -> bool {
    let n = chars.len();
    if n < 3 {
        return false;
    }
    let before = |k: usize| chars[n - k];
    let consonant = |k: usize| !is_vowel_letter(chars, n - k);
    match (chars[n - 2], chars[n - 1]) {
        (_, 'e') => consonant(2) && !(before(2) == 'l' && consonant(3)),
        ('e', 'd') => consonant(3) && !matches!(before(3), 't' | 'd'),
        ('e', 's') => {
            consonant(3)
                && !matches!(before(3), 's' | 'x' | 'z' | 'g' | 'c')
                && !(n >= 4 && matches!((before(4), before(3)), ('c', 'h') | ('s', 'h')))
        }
        _ => false,
    }
}

/// Deterministic syllable estimate from spelling.
///
/// Counts vowel clusters (y counts except word-initially), subtracts a silent
/// final cluster, and splits a word-final "ia"/"io"/"eo" into two syllables.
/// Never returns less than 1.
pub fn heuristic_syllables(word: &str) -> usize {
    let chars: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if chars.is_empty() {
        return 1;
    }
    let mut count = vowel_groups(&chars).len();
    if count > 1 && final_group_silent(&chars) {
        count -= 1;
    }
    let n = chars.len();
    if n >= 3 && matches!((chars[n - 2], chars[n - 1]), ('i', 'a') | ('i', 'o') | ('e', 'o')) {
        count += 1;
    }
    count.max(1)
}

/// Spelling tail used as a rhyme key for words missing from the dictionary:
/// from the last voiced vowel cluster to the end ("stone" → "one").
pub fn heuristic_rhyme_tail(word: &str) -> String {
    let chars: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let groups = vowel_groups(&chars);
    let len = chars.len();
    let syllabic_le = len >= 3
        && chars[len - 2] == 'l'
        && chars[len - 1] == 'e'
        && !is_vowel_letter(&chars, len - 3);
    let start = match groups.len() {
        0 => 0,
        1 => groups[0],
        n if syllabic_le || final_group_silent(&chars) => groups[n - 2],
        n => groups[n - 1],
    };
    chars[start..].iter().collect()
}

/// Rhyme key of a word: phonemes from the last stressed vowel to the end.
/// Words with no stressed vowel use their last vowel.
pub fn rhyme_key(sound: &WordSound) -> Option<RhymeKey> {
    match sound.source {
        SyllableSource::Dictionary => {
            let phones = &sound.phonemes;
            let start = phones
                .iter()
                .rposition(|p| p.ends_with('1') || p.ends_with('2'))
                .or_else(|| phones.iter().rposition(|p| is_vowel_phone(p)))
                .unwrap_or(0);
            let tail: Vec<&str> = phones[start..].iter().map(|p| strip_stress(p)).collect();
            if tail.is_empty() {
                return None;
            }
            Some(RhymeKey {
                source: SyllableSource::Dictionary,
                sound: tail.join(" "),
            })
        }
        SyllableSource::Heuristic => {
            let tail = heuristic_rhyme_tail(&sound.word);
            if tail.is_empty() {
                return None;
            }
            Some(RhymeKey {
                source: SyllableSource::Heuristic,
                sound: tail,
            })
        }
    }
}

// ============================================================================
// Lines and Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSound {
    pub syllables: usize,
    pub stress: String,
    pub rhyme_key: Option<RhymeKey>,
    /// Scheme letter within the section
    pub letter: char,
    pub meter: Meter,
    pub heuristic_words: usize,
    pub words: Vec<WordSound>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSound {
    pub scheme: String,
    pub lines: Vec<LineSound>,
}

impl SectionSound {
    pub fn letters(&self) -> Vec<char> {
        self.lines.iter().map(|l| l.letter).collect()
    }
}

/// Phonetic profile of a whole song, parallel to `Song::sections`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongSound {
    pub sections: Vec<SectionSound>,
}

impl SongSound {
    pub fn lines(&self) -> impl Iterator<Item = &LineSound> {
        self.sections.iter().flat_map(|s| s.lines.iter())
    }
}

pub fn analyze_line(lexicon: &Lexicon, line: &Line) -> LineSound {
    let words: Vec<WordSound> = line
        .tokens
        .iter()
        .map(|t| analyze_word(lexicon, &t.norm))
        .collect();
    let stress: String = words.iter().map(|w| w.stress.as_str()).collect();
    LineSound {
        syllables: words.iter().map(|w| w.syllables).sum(),
        rhyme_key: words.last().and_then(rhyme_key),
        letter: NO_RHYME,
        meter: detect_meter(&stress),
        stress,
        heuristic_words: words
            .iter()
            .filter(|w| w.source == SyllableSource::Heuristic)
            .count(),
        words,
    }
}

pub fn analyze_section(lexicon: &Lexicon, section: &Section, rhyme: &RhymeConfig) -> SectionSound {
    let mut lines: Vec<LineSound> = section.lines.iter().map(|l| analyze_line(lexicon, l)).collect();
    let keys: Vec<Option<RhymeKey>> = lines.iter().map(|l| l.rhyme_key.clone()).collect();
    let letters = assign_scheme(&keys, rhyme.near_rhyme_threshold);
    for (line, letter) in lines.iter_mut().zip(&letters) {
        line.letter = *letter;
    }
    SectionSound {
        scheme: letters.into_iter().collect(),
        lines,
    }
}

pub fn analyze_song(lexicon: &Lexicon, song: &Song, rhyme: &RhymeConfig) -> SongSound {
    SongSound {
        sections: song
            .sections
            .iter()
            .map(|s| analyze_section(lexicon, s, rhyme))
            .collect(),
    }
}

/// Letter for the n-th distinct rhyme group: A–Z, then a–z, then '*'.
pub fn scheme_letter(n: usize) -> char {
    match n {
        0..=25 => (b'A' + n as u8) as char,
        26..=51 => (b'a' + (n - 26) as u8) as char,
        _ => '*',
    }
}

/// Label rhyme keys by order of first appearance. A line whose key matches
/// an earlier line takes that line's letter; with a near-rhyme threshold, a
/// key of the same source whose similarity reaches it also matches.
pub fn assign_scheme(keys: &[Option<RhymeKey>], near_threshold: Option<f64>) -> Vec<char> {
    let mut groups: Vec<(&RhymeKey, char)> = Vec::new();
    let mut letters = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(key) = key else {
            letters.push(NO_RHYME);
            continue;
        };
        let exact = groups.iter().find(|(k, _)| *k == key).map(|(_, c)| *c);
        let near = || {
            let threshold = near_threshold?;
            groups
                .iter()
                .find(|(k, _)| {
                    k.source == key.source
                        && strsim::normalized_levenshtein(&k.sound, &key.sound) >= threshold
                })
                .map(|(_, c)| *c)
        };
        let letter = match exact.or_else(near) {
            Some(letter) => letter,
            None => {
                let letter = scheme_letter(groups.len());
                groups.push((key, letter));
                letter
            }
        };
        letters.push(letter);
    }
    letters
}

// ============================================================================
// Scheme Shapes, Meter, Alliteration
// ============================================================================

/// Classic stanza forms found in a scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RhymeForms {
    /// Two adjacent lines rhyme (AA)
    pub couplet: bool,
    /// ABAB
    pub alternate: bool,
    /// ABBA
    pub enclosed: bool,
    /// Interlocking tercets, ABA BCB
    pub terza_rima: bool,
}

pub fn rhyme_forms(letters: &[char]) -> RhymeForms {
    let rhymes = |a: char, b: char| a != NO_RHYME && a == b;
    let mut forms = RhymeForms::default();
    for w in letters.windows(2) {
        forms.couplet |= rhymes(w[0], w[1]);
    }
    for w in letters.windows(4) {
        let distinct = w[0] != w[1];
        forms.alternate |= distinct && rhymes(w[0], w[2]) && rhymes(w[1], w[3]);
        forms.enclosed |= distinct && rhymes(w[0], w[3]) && rhymes(w[1], w[2]);
    }
    for w in letters.windows(6) {
        let middle = w[4] != NO_RHYME && w[4] != w[0] && w[4] != w[1];
        forms.terza_rima |= w[0] != w[1]
            && middle
            && rhymes(w[0], w[2])
            && rhymes(w[1], w[3])
            && rhymes(w[1], w[5]);
    }
    forms
}

/// Fraction of lines sharing their letter with at least one other line.
pub fn rhyme_density(letters: &[char]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    let rhyming = letters
        .iter()
        .filter(|c| **c != NO_RHYME && letters.iter().filter(|o| o == c).count() > 1)
        .count();
    rhyming as f64 / letters.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Meter {
    Iambic,
    Trochaic,
    Dactylic,
    Anapestic,
    Free,
    Unknown,
}

/// Classify a stress pattern by counting aligned feet. Fewer than two
/// matching feet of any kind is free verse.
pub fn detect_meter(stress: &str) -> Meter {
    if stress.is_empty() {
        return Meter::Unknown;
    }
    let simple: Vec<u8> = stress
        .bytes()
        .map(|b| if b == b'1' || b == b'2' { 1 } else { 0 })
        .collect();
    let feet = |size: usize, foot: &[u8]| simple.chunks_exact(size).filter(|c| *c == foot).count();
    let counts = [
        (Meter::Iambic, feet(2, &[0, 1])),
        (Meter::Trochaic, feet(2, &[1, 0])),
        (Meter::Dactylic, feet(3, &[1, 0, 0])),
        (Meter::Anapestic, feet(3, &[0, 0, 1])),
    ];
    let best = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if best < 2 {
        return Meter::Free;
    }
    counts
        .iter()
        .find(|(_, n)| *n == best)
        .map(|(m, _)| *m)
        .unwrap_or(Meter::Free)
}

/// Adjacent dictionary words in a line that open with the same consonant
/// phoneme.
pub fn alliteration_count(line: &LineSound) -> usize {
    let initials: Vec<Option<&str>> = line
        .words
        .iter()
        .map(|w| w.phonemes.first().map(|p| p.as_str()).filter(|p| !is_vowel_phone(p)))
        .collect();
    initials
        .windows(2)
        .filter(|w| matches!((w[0], w[1]), (Some(a), Some(b)) if a == b))
        .count()
}
