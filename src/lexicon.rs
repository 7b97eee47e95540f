//! Read-only lexical tables: pronunciations, concreteness ratings, cliché
//! phrases, sense vocabularies, verb classes, adjectives and function words.
//!
//! The built-in tables are compiled into the binary from `data/`. A SQLite
//! lexicon produced by `build-lexicon` can be overlaid on top of them before
//! analysis starts; after that the `Lexicon` is only ever borrowed, so any
//! number of analyzers can share it.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::normalize::{lookup_variants, normalize_word, split_words};

const CMUDICT: &str = include_str!("../data/cmudict.txt");
const CONCRETENESS: &str = include_str!("../data/concreteness.tsv");
const CLICHES: &str = include_str!("../data/cliches.txt");
const CLICHE_RHYMES: &str = include_str!("../data/cliche_rhymes.txt");
const SENSES: &str = include_str!("../data/senses.tsv");
const VERBS: &str = include_str!("../data/verbs.tsv");
const FUNCTION_WORDS: &str = include_str!("../data/function_words.tsv");
const ADJECTIVES: &str = include_str!("../data/adjectives.txt");

/// Schema of a lexicon database written by `build-lexicon`.
pub const SQLITE_SCHEMA: &str = "
    CREATE TABLE pronunciations (word TEXT PRIMARY KEY, phonemes TEXT NOT NULL);
    CREATE TABLE concreteness (word TEXT PRIMARY KEY, rating REAL NOT NULL);
    CREATE TABLE cliches (phrase TEXT PRIMARY KEY);
    CREATE TABLE senses (word TEXT NOT NULL, sense TEXT NOT NULL, PRIMARY KEY (word, sense));
    CREATE TABLE verbs (form TEXT PRIMARY KEY, lemma TEXT NOT NULL, class TEXT NOT NULL);
    CREATE TABLE adjectives (word TEXT PRIMARY KEY);
";

// ============================================================================
// Table Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Sight,
    Sound,
    Touch,
    Smell,
    Taste,
}

impl Sense {
    pub const ALL: [Sense; 5] = [Sense::Sight, Sense::Sound, Sense::Touch, Sense::Smell, Sense::Taste];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sight" => Some(Sense::Sight),
            "sound" => Some(Sense::Sound),
            "touch" => Some(Sense::Touch),
            "smell" => Some(Sense::Smell),
            "taste" => Some(Sense::Taste),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Sight => "sight",
            Sense::Sound => "sound",
            Sense::Touch => "touch",
            Sense::Smell => "smell",
            Sense::Taste => "taste",
        }
    }
}

/// State verbs tell (be, feel, know); action verbs show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbClass {
    State,
    Action,
}

impl VerbClass {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "state" => Some(VerbClass::State),
            "action" => Some(VerbClass::Action),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VerbClass::State => "state",
            VerbClass::Action => "action",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbEntry {
    pub lemma: String,
    pub class: VerbClass,
}

/// Closed-class word categories the tagger relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Subject pronoun: i, you, she
    Subject,
    /// Pronoun fused with a form of be: i'm, it's
    SubjectBe,
    /// Pronoun fused with have: i've
    SubjectHave,
    /// Pronoun fused with a modal: i'll, we'd
    SubjectModal,
    AuxBe,
    AuxHave,
    AuxDo,
    Modal,
    Pronoun,
    Possessive,
    Determiner,
    /// "to", infinitive marker or preposition
    To,
    Preposition,
    Conjunction,
    Adverb,
    Interjection,
    Numeral,
}

impl FunctionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.trim() {
            "subject" => FunctionKind::Subject,
            "subject_be" => FunctionKind::SubjectBe,
            "subject_have" => FunctionKind::SubjectHave,
            "subject_modal" => FunctionKind::SubjectModal,
            "aux_be" => FunctionKind::AuxBe,
            "aux_have" => FunctionKind::AuxHave,
            "aux_do" => FunctionKind::AuxDo,
            "modal" => FunctionKind::Modal,
            "pronoun" => FunctionKind::Pronoun,
            "possessive" => FunctionKind::Possessive,
            "determiner" => FunctionKind::Determiner,
            "to" => FunctionKind::To,
            "preposition" => FunctionKind::Preposition,
            "conjunction" => FunctionKind::Conjunction,
            "adverb" => FunctionKind::Adverb,
            "interjection" => FunctionKind::Interjection,
            "numeral" => FunctionKind::Numeral,
            _ => return None,
        })
    }
}

/// Parsed entries of one table plus the 1-based source lines that were
/// skipped as malformed.
#[derive(Debug, Clone)]
pub struct TableLoad<T> {
    pub entries: Vec<T>,
    pub skipped: Vec<usize>,
}

impl<T> Default for TableLoad<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Entry counts, for status output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LexiconStats {
    pub pronunciations: usize,
    pub concreteness: usize,
    pub cliches: usize,
    pub sense_words: usize,
    pub verb_forms: usize,
    pub adjectives: usize,
    pub function_words: usize,
}

// ============================================================================
// Lexicon
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    pronunciations: FxHashMap<String, Vec<String>>,
    concreteness: FxHashMap<String, f64>,
    cliches: FxHashSet<String>,
    max_cliche_words: usize,
    cliche_rhymes: FxHashMap<String, usize>,
    senses: FxHashMap<String, Vec<Sense>>,
    verbs: FxHashMap<String, VerbEntry>,
    adjectives: FxHashSet<String>,
    function_words: FxHashMap<String, FunctionKind>,
}

impl Lexicon {
    /// Tables compiled into the binary.
    pub fn builtin() -> Self {
        let mut lexicon = Lexicon::default();
        for (word, phones) in parse_cmudict(CMUDICT).entries {
            lexicon.pronunciations.entry(word).or_insert(phones);
        }
        for (word, rating) in parse_ratings(CONCRETENESS, 1).entries {
            lexicon.concreteness.insert(word, rating);
        }
        for phrase in parse_phrases(CLICHES).entries {
            lexicon.add_cliche(phrase);
        }
        for (family, words) in parse_rhyme_families(CLICHE_RHYMES).entries.into_iter().enumerate() {
            for word in words {
                lexicon.cliche_rhymes.entry(word).or_insert(family);
            }
        }
        for (word, sense) in parse_senses(SENSES).entries {
            lexicon.add_sense(word, sense);
        }
        for (form, entry) in parse_verbs(VERBS).entries {
            lexicon.verbs.entry(form).or_insert(entry);
        }
        lexicon.adjectives.extend(parse_word_list(ADJECTIVES).entries);
        for (word, kind) in parse_function_words(FUNCTION_WORDS).entries {
            lexicon.function_words.insert(word, kind);
        }
        lexicon
    }

    /// Overlay tables from a lexicon database. Rows override built-in
    /// entries; tables missing from the file are left alone.
    pub fn overlay_sqlite(&mut self, path: &Path) -> Result<LexiconStats> {
        if !path.exists() {
            bail!("Lexicon database not found: {:?}", path);
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open lexicon database: {:?}", path))?;
        let mut added = LexiconStats::default();

        if has_table(&conn, "pronunciations")? {
            let mut stmt = conn.prepare("SELECT word, phonemes FROM pronunciations")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let word: String = row.get(0)?;
                let phonemes: String = row.get(1)?;
                let phones: Vec<String> = phonemes.split_whitespace().map(str::to_uppercase).collect();
                if phones.is_empty() || !phones.iter().all(|p| is_phoneme(p)) {
                    continue;
                }
                self.pronunciations.insert(normalize_word(&word), phones);
                added.pronunciations += 1;
            }
        }

        if has_table(&conn, "concreteness")? {
            let mut stmt = conn.prepare("SELECT word, rating FROM concreteness")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let word: String = row.get(0)?;
                let rating: f64 = row.get(1)?;
                if (1.0..=5.0).contains(&rating) {
                    self.concreteness.insert(normalize_word(&word), rating);
                    added.concreteness += 1;
                }
            }
        }

        if has_table(&conn, "cliches")? {
            let mut stmt = conn.prepare("SELECT phrase FROM cliches")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let phrase: String = row.get(0)?;
                if let Some(normalized) = normalize_phrase(&phrase) {
                    self.add_cliche(normalized);
                    added.cliches += 1;
                }
            }
        }

        if has_table(&conn, "senses")? {
            let mut stmt = conn.prepare("SELECT word, sense FROM senses")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let word: String = row.get(0)?;
                let sense: String = row.get(1)?;
                if let Some(sense) = Sense::from_name(&sense) {
                    self.add_sense(normalize_word(&word), sense);
                    added.sense_words += 1;
                }
            }
        }

        if has_table(&conn, "verbs")? {
            let mut stmt = conn.prepare("SELECT form, lemma, class FROM verbs")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let form: String = row.get(0)?;
                let lemma: String = row.get(1)?;
                let class: String = row.get(2)?;
                if let Some(class) = VerbClass::from_name(&class) {
                    self.verbs.insert(
                        normalize_word(&form),
                        VerbEntry {
                            lemma: normalize_word(&lemma),
                            class,
                        },
                    );
                    added.verb_forms += 1;
                }
            }
        }

        if has_table(&conn, "adjectives")? {
            let mut stmt = conn.prepare("SELECT word FROM adjectives")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let word = normalize_word(&row.get::<_, String>(0)?);
                if !word.is_empty() {
                    self.adjectives.insert(word);
                    added.adjectives += 1;
                }
            }
        }

        Ok(added)
    }

    pub fn stats(&self) -> LexiconStats {
        LexiconStats {
            pronunciations: self.pronunciations.len(),
            concreteness: self.concreteness.len(),
            cliches: self.cliches.len(),
            sense_words: self.senses.len(),
            verb_forms: self.verbs.len(),
            adjectives: self.adjectives.len(),
            function_words: self.function_words.len(),
        }
    }

    fn add_cliche(&mut self, phrase: String) {
        let words = phrase.split(' ').count();
        self.max_cliche_words = self.max_cliche_words.max(words);
        self.cliches.insert(phrase);
    }

    fn add_sense(&mut self, word: String, sense: Sense) {
        let senses = self.senses.entry(word).or_default();
        if !senses.contains(&sense) {
            senses.push(sense);
            senses.sort();
        }
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Phonemes of a normalized word, trying spelling variants on a miss.
    pub fn pronunciation(&self, norm: &str) -> Option<&[String]> {
        if let Some(phones) = self.pronunciations.get(norm) {
            return Some(phones);
        }
        lookup_variants(norm)
            .iter()
            .find_map(|v| self.pronunciations.get(v.as_str()))
            .map(|p| p.as_slice())
    }

    /// Concreteness rating and the table form that carried it. Plurals fall
    /// back to their singular ("nails" → "nail").
    pub fn concreteness(&self, norm: &str) -> Option<(f64, String)> {
        singular_candidates(norm)
            .into_iter()
            .find_map(|w| self.concreteness.get(&w).map(|r| (*r, w)))
    }

    /// True when the word (or its singular) is in the concreteness table,
    /// i.e. it has a nominal reading.
    pub fn is_rated(&self, norm: &str) -> bool {
        self.concreteness(norm).is_some()
    }

    /// Senses evoked by a word, checked on the word itself, its singular
    /// and the lemma of any verb reading.
    pub fn senses(&self, norm: &str) -> Vec<Sense> {
        let mut found: Vec<Sense> = Vec::new();
        let mut forms = singular_candidates(norm);
        if let Some(verb) = self.verb(norm) {
            forms.push(verb.lemma.clone());
        }
        for form in forms {
            if let Some(senses) = self.senses.get(&form) {
                for sense in senses {
                    if !found.contains(sense) {
                        found.push(*sense);
                    }
                }
            }
        }
        found.sort();
        found
    }

    pub fn verb(&self, norm: &str) -> Option<&VerbEntry> {
        self.verbs.get(norm).or_else(|| {
            lookup_variants(norm)
                .iter()
                .find_map(|v| self.verbs.get(v.as_str()))
        })
    }

    pub fn is_adjective(&self, norm: &str) -> bool {
        self.adjectives.contains(norm)
    }

    pub fn function_kind(&self, norm: &str) -> Option<FunctionKind> {
        self.function_words.get(norm).copied()
    }

    pub fn is_cliche(&self, phrase: &str) -> bool {
        self.cliches.contains(phrase)
    }

    /// Length in words of the longest cliché phrase.
    pub fn max_cliche_words(&self) -> usize {
        self.max_cliche_words
    }

    /// Family id of a worn-out end rhyme word (love/above, fire/desire).
    pub fn cliche_rhyme_family(&self, norm: &str) -> Option<usize> {
        self.cliche_rhymes.get(norm).copied()
    }
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// The word itself followed by plausible singulars.
fn singular_candidates(norm: &str) -> Vec<String> {
    let mut forms = vec![norm.to_string()];
    if norm.len() > 3 {
        if let Some(stem) = norm.strip_suffix("ies") {
            forms.push(format!("{}y", stem));
        }
        if let Some(stem) = norm.strip_suffix("es") {
            forms.push(stem.to_string());
        }
    }
    if norm.len() > 2 && norm.ends_with('s') && !norm.ends_with("ss") {
        forms.push(norm[..norm.len() - 1].to_string());
    }
    forms
}

// ============================================================================
// Table Parsers
// ============================================================================

fn is_comment(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#') || t.starts_with(";;;")
}

/// ARPAbet symbol, optionally carrying a stress digit: "AH0", "K".
pub fn is_phoneme(p: &str) -> bool {
    let letters = p.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = p.len() - letters.len();
    !letters.is_empty()
        && letters.len() <= 2
        && letters.chars().all(|c| c.is_ascii_uppercase())
        && digits <= 1
}

/// CMU dictionary format: `WORD  PH1 PH2 ...`. Alternate pronunciations
/// (`WORD(1)`) are skipped so the first listed one wins.
pub fn parse_cmudict(text: &str) -> TableLoad<(String, Vec<String>)> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or("");
        if word.ends_with(')') {
            continue;
        }
        let phones: Vec<String> = parts.map(str::to_string).collect();
        let norm = normalize_word(word);
        if norm.is_empty() || phones.is_empty() || !phones.iter().all(|p| is_phoneme(p)) {
            load.skipped.push(i + 1);
            continue;
        }
        load.entries.push((norm, phones));
    }
    load
}

/// Word/rating rows separated by tabs or commas; `column` picks the rating
/// field (0-based). Header rows and ratings outside 1..=5 are skipped.
pub fn parse_ratings(text: &str, column: usize) -> TableLoad<(String, f64)> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let fields: Vec<&str> = if line.contains('\t') {
            line.split('\t').collect()
        } else {
            line.split(',').collect()
        };
        let word = normalize_word(fields[0]);
        let rating = fields
            .get(column)
            .and_then(|f| f.trim().trim_matches('"').parse::<f64>().ok());
        match rating {
            Some(r) if !word.is_empty() && (1.0..=5.0).contains(&r) => load.entries.push((word, r)),
            _ => load.skipped.push(i + 1),
        }
    }
    load
}

/// Normalize a phrase to space-joined lookup forms. Single words are not
/// phrases and yield `None`.
pub fn normalize_phrase(phrase: &str) -> Option<String> {
    let words: Vec<String> = split_words(phrase)
        .into_iter()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() < 2 {
        None
    } else {
        Some(words.join(" "))
    }
}

/// One cliché phrase per line.
pub fn parse_phrases(text: &str) -> TableLoad<String> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        match normalize_phrase(line) {
            Some(phrase) => load.entries.push(phrase),
            None => load.skipped.push(i + 1),
        }
    }
    load
}

/// One rhyme family per line, whitespace separated.
pub fn parse_rhyme_families(text: &str) -> TableLoad<Vec<String>> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let words: Vec<String> = line.split_whitespace().map(normalize_word).collect();
        if words.len() < 2 {
            load.skipped.push(i + 1);
        } else {
            load.entries.push(words);
        }
    }
    load
}

/// `sense<TAB>word,word,...`
pub fn parse_senses(text: &str) -> TableLoad<(String, Sense)> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let Some((name, words)) = line.split_once('\t') else {
            load.skipped.push(i + 1);
            continue;
        };
        let Some(sense) = Sense::from_name(name) else {
            load.skipped.push(i + 1);
            continue;
        };
        for word in words.split(',').map(normalize_word).filter(|w| !w.is_empty()) {
            load.entries.push((word, sense));
        }
    }
    load
}

/// `lemma<TAB>class[<TAB>irregular,forms]`, expanded to every inflected
/// form. Lemmas come first so a lemma is never shadowed by another verb's
/// inflection.
pub fn parse_verbs(text: &str) -> TableLoad<(String, VerbEntry)> {
    let mut load = TableLoad::default();
    let mut inflected = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let lemma = normalize_word(fields[0]);
        let class = fields.get(1).and_then(|c| VerbClass::from_name(c));
        let (Some(class), false) = (class, lemma.is_empty()) else {
            load.skipped.push(i + 1);
            continue;
        };
        let irregular: Vec<String> = fields
            .get(2)
            .map(|f| f.split(',').map(normalize_word).filter(|w| !w.is_empty()).collect())
            .unwrap_or_default();
        let entry = VerbEntry {
            lemma: lemma.clone(),
            class,
        };
        for form in inflect(&lemma, !irregular.is_empty()).into_iter().chain(irregular) {
            if form != lemma {
                inflected.push((form, entry.clone()));
            }
        }
        load.entries.push((lemma, entry));
    }
    load.entries.extend(inflected);
    load
}

/// One word per line.
pub fn parse_word_list(text: &str) -> TableLoad<String> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let word = normalize_word(line.trim());
        if word.is_empty() || line.trim().contains(char::is_whitespace) {
            load.skipped.push(i + 1);
        } else {
            load.entries.push(word);
        }
    }
    load
}

/// `word<TAB>kind`
pub fn parse_function_words(text: &str) -> TableLoad<(String, FunctionKind)> {
    let mut load = TableLoad::default();
    for (i, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }
        let parsed = line.split_once('\t').and_then(|(word, kind)| {
            let word = normalize_word(word);
            FunctionKind::from_name(kind).filter(|_| !word.is_empty()).map(|k| (word, k))
        });
        match parsed {
            Some(entry) => load.entries.push(entry),
            None => load.skipped.push(i + 1),
        }
    }
    load
}

// ============================================================================
// Regular Inflection
// ============================================================================

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// One vowel group ending consonant-vowel-consonant: "stab", "drop", "stir".
fn doubles_final_consonant(lemma: &str) -> bool {
    let chars: Vec<char> = lemma.chars().collect();
    let n = chars.len();
    if n < 3 {
        return false;
    }
    let (a, b, c) = (chars[n - 3], chars[n - 2], chars[n - 1]);
    let vowel_groups = chars
        .iter()
        .enumerate()
        .filter(|(i, ch)| is_vowel(**ch) && (*i == 0 || !is_vowel(chars[i - 1])))
        .count();
    vowel_groups == 1 && !is_vowel(a) && is_vowel(b) && !is_vowel(c) && !matches!(c, 'w' | 'x' | 'y')
}

/// Third person, -ing and (unless irregular) -ed forms of a lemma.
pub fn inflect(lemma: &str, irregular_past: bool) -> Vec<String> {
    let mut forms = Vec::with_capacity(3);
    let consonant_y = lemma.len() > 1
        && lemma.ends_with('y')
        && !lemma[..lemma.len() - 1].ends_with(is_vowel);
    let doubled = doubles_final_consonant(lemma);
    let last = lemma.chars().last().map(String::from).unwrap_or_default();

    if ["s", "x", "z", "ch", "sh", "o"].iter().any(|s| lemma.ends_with(s)) {
        forms.push(format!("{}es", lemma));
    } else if consonant_y {
        forms.push(format!("{}ies", &lemma[..lemma.len() - 1]));
    } else {
        forms.push(format!("{}s", lemma));
    }

    if let Some(stem) = lemma.strip_suffix("ie") {
        forms.push(format!("{}ying", stem));
    } else if lemma.ends_with('e') && !lemma.ends_with("ee") && lemma.len() > 2 {
        forms.push(format!("{}ing", &lemma[..lemma.len() - 1]));
    } else if doubled {
        forms.push(format!("{}{}ing", lemma, last));
    } else {
        forms.push(format!("{}ing", lemma));
    }

    if !irregular_past {
        if lemma.ends_with('e') {
            forms.push(format!("{}d", lemma));
        } else if consonant_y {
            forms.push(format!("{}ied", &lemma[..lemma.len() - 1]));
        } else if doubled {
            forms.push(format!("{}{}ed", lemma, last));
        } else {
            forms.push(format!("{}ed", lemma));
        }
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_parse_cleanly() {
        assert!(parse_cmudict(CMUDICT).skipped.is_empty());
        assert!(parse_ratings(CONCRETENESS, 1).skipped.is_empty());
        assert!(parse_phrases(CLICHES).skipped.is_empty());
        assert!(parse_rhyme_families(CLICHE_RHYMES).skipped.is_empty());
        assert!(parse_senses(SENSES).skipped.is_empty());
        assert!(parse_verbs(VERBS).skipped.is_empty());
        assert!(parse_function_words(FUNCTION_WORDS).skipped.is_empty());
        assert!(parse_word_list(ADJECTIVES).skipped.is_empty());
    }

    #[test]
    fn test_pronunciation_lookup() {
        let lex = Lexicon::builtin();
        assert_eq!(
            lex.pronunciation("river").unwrap(),
            &["R", "IH1", "V", "ER0"].map(String::from)
        );
        assert_eq!(lex.pronunciation("can't").unwrap().len(), 4);
        assert!(lex.pronunciation("zyzzyva").is_none());
    }

    #[test]
    fn test_concreteness_plural() {
        let lex = Lexicon::builtin();
        let (rating, form) = lex.concreteness("nails").unwrap();
        assert_eq!(form, "nail");
        assert!(rating > 4.5);
        assert_eq!(lex.concreteness("truth").unwrap().0, 2.12);
        assert!(lex.concreteness("guitarist").is_none());
    }

    #[test]
    fn test_verb_forms() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.verb("drove").unwrap().lemma, "drive");
        assert_eq!(lex.verb("hammered").unwrap().class, VerbClass::Action);
        assert_eq!(lex.verb("stabbed").unwrap().lemma, "stab");
        assert_eq!(lex.verb("felt").unwrap().class, VerbClass::State);
        assert_eq!(lex.verb("is").unwrap().lemma, "be");
        assert_eq!(lex.verb("left").unwrap().lemma, "leave");
    }

    #[test]
    fn test_inflect() {
        assert_eq!(inflect("stab", false), vec!["stabs", "stabbing", "stabbed"]);
        assert_eq!(inflect("carry", false), vec!["carries", "carrying", "carried"]);
        assert_eq!(inflect("smash", false), vec!["smashes", "smashing", "smashed"]);
        assert_eq!(inflect("lie", true), vec!["lies", "lying"]);
        assert_eq!(inflect("pour", false), vec!["pours", "pouring", "poured"]);
        assert_eq!(inflect("hammer", false), vec!["hammers", "hammering", "hammered"]);
    }

    #[test]
    fn test_senses_use_verb_lemma() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.senses("chewing"), vec![Sense::Taste]);
        assert_eq!(lex.senses("musty"), vec![Sense::Smell]);
        assert_eq!(lex.senses("sweet"), vec![Sense::Smell, Sense::Taste]);
        assert!(lex.senses("truth").is_empty());
    }

    #[test]
    fn test_cliche_phrases() {
        let lex = Lexicon::builtin();
        assert!(lex.is_cliche("meant to be"));
        assert!(lex.is_cliche("at the end of the day"));
        assert!(!lex.is_cliche("love"));
        assert!(lex.max_cliche_words() >= 6);
        assert_eq!(lex.cliche_rhyme_family("fire"), lex.cliche_rhyme_family("desire"));
    }

    #[test]
    fn test_function_words() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.function_kind("i'm"), Some(FunctionKind::SubjectBe));
        assert_eq!(lex.function_kind("the"), Some(FunctionKind::Determiner));
        assert_eq!(lex.function_kind("barn"), None);
    }

    #[test]
    fn test_parse_word_list() {
        let load = parse_word_list("# adjectives\nRed\nvery old\n\nmusty\n");
        assert_eq!(load.entries, vec!["red", "musty"]);
        assert_eq!(load.skipped, vec![3]);
        assert!(Lexicon::builtin().is_adjective("yellow"));
        assert!(!Lexicon::builtin().is_adjective("light"));
    }

    #[test]
    fn test_parse_ratings_skips_header() {
        let load = parse_ratings("Word,Conc.M\napple,4.9\nidea,1.9\nbad,9\n", 1);
        assert_eq!(load.entries.len(), 2);
        assert_eq!(load.skipped, vec![1, 4]);
    }

    #[test]
    fn test_overlay_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-lexicon.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SQLITE_SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO pronunciations (word, phonemes) VALUES ('zyzzyva', 'Z IH1 Z IH0 V AH0')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO concreteness (word, rating) VALUES ('truth', 3.0)", []).unwrap();
        conn.execute("INSERT INTO cliches (phrase) VALUES ('Baby, baby, baby')", []).unwrap();
        conn.execute("INSERT INTO adjectives (word) VALUES ('Glassy')", []).unwrap();
        drop(conn);

        let mut lex = Lexicon::builtin();
        let added = lex.overlay_sqlite(&path).unwrap();
        assert_eq!(added.pronunciations, 1);
        assert_eq!(lex.pronunciation("zyzzyva").unwrap().len(), 6);
        assert_eq!(lex.concreteness("truth").unwrap().0, 3.0);
        assert!(lex.is_cliche("baby baby baby"));
        assert_eq!(added.adjectives, 1);
        assert!(lex.is_adjective("glassy"));
    }

    #[test]
    fn test_overlay_missing_file() {
        let mut lex = Lexicon::builtin();
        assert!(lex.overlay_sqlite(Path::new("/nonexistent/lexicon.sqlite3")).is_err());
    }
}
