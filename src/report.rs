//! Reading songs, writing reports, and the report shapes themselves.
//!
//! Formats follow the file extension: `.json` and `.yaml`/`.yml` hold the
//! structured song representation, anything else is raw marked-up lyrics.
//! Reports go to the output path (JSON, or YAML for a YAML extension) or to
//! stdout, and files are replaced atomically through a `.tmp` sibling.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::AnalyzerConfig;
use crate::lexicon::{Lexicon, Sense};
use crate::models::{Gap, ParseWarning, SectionKind, Song};
use crate::parser::{parse_lyrics, rebuild_song};
use crate::phonetics::{
    alliteration_count, analyze_song, is_vowel_phone, rhyme_density, rhyme_forms, Meter, RhymeForms, RhymeKey,
    SongSound, SyllableSource,
};
use crate::scoring::{score_songs, StructuralScore};
use crate::tagger::{tag_song, TaggedWord, VerbUse, WordClass};
use crate::taste::{find_cliches, TasteReport};

// ============================================================================
// Formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    Yaml,
    Markdown,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("md") => Format::Markdown,
            _ => Format::Text,
        }
    }
}

/// Title for a song read from `path`: the file stem.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

/// Parse raw lyrics or read a structured song. Structured input goes
/// through `rebuild_song`, so ordinals, tokens, gaps and warnings never come
/// from the file and an empty song fails the same way empty text does.
pub fn load_song(path: &Path) -> Result<Song> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let song: Song = match Format::from_path(path) {
        Format::Json => serde_json::from_str(&text)
            .with_context(|| format!("Invalid song JSON: {}", path.display()))?,
        Format::Yaml => serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid song YAML: {}", path.display()))?,
        Format::Text | Format::Markdown => {
            return parse_lyrics(&text, &title_from_path(path))
                .with_context(|| format!("Failed to parse {}", path.display()));
        }
    };
    rebuild_song(song).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Replace `path` with `contents` through a temporary sibling.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Create {}", parent.display()))?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("Create {}", tmp.display()))?;
        f.write_all(contents.as_bytes())?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("Rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

pub fn render<T: Serialize>(value: &T, format: Format) -> Result<String> {
    match format {
        Format::Yaml => serde_yaml::to_string(value).context("Failed to serialize YAML"),
        _ => {
            let mut json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write a report to `output`, or pretty JSON to stdout.
pub fn write_report<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_atomic(path, &render(value, Format::from_path(path))?),
        None => {
            let text = render(value, Format::Json)?;
            std::io::stdout().write_all(text.as_bytes())?;
            Ok(())
        }
    }
}

// ============================================================================
// Candidate Paths
// ============================================================================

fn pattern_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            _ => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).with_context(|| format!("Invalid pattern {}", pattern))
}

/// Expand plain paths and `*`/`?` file-name patterns. Each pattern's matches
/// are sorted; argument order is kept.
pub fn expand_candidates(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.contains(['*', '?']) {
            if !path.is_file() {
                bail!("Candidate not found: {}", path.display());
            }
            paths.push(path.to_path_buf());
            continue;
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let re = pattern_regex(name)?;
        let mut matched: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_str().map_or(false, |n| re.is_match(n)))
            .map(|e| e.into_path())
            .collect();
        if matched.is_empty() {
            bail!("No candidates match {}", arg);
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}

// ============================================================================
// Annotated Song (parse output)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedToken {
    pub text: String,
    pub norm: String,
    pub syllables: usize,
    pub syllable_source: SyllableSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phonemes: Vec<String>,
    pub stress: String,
    pub class: WordClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<VerbUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concreteness: Option<f64>,
    /// Noun or adjective missing from the concreteness table
    pub unrated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<Sense>,
    pub in_cliche: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedLine {
    pub number: usize,
    pub text: String,
    pub syllables: usize,
    pub stress: String,
    pub meter: Meter,
    pub rhyme_key: Option<RhymeKey>,
    pub letter: char,
    pub tokens: Vec<AnnotatedToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSection {
    pub kind: SectionKind,
    pub label: String,
    pub ordinal: usize,
    pub marker_line: usize,
    pub scheme: String,
    pub lines: Vec<AnnotatedLine>,
    pub gaps: Vec<Gap>,
}

/// A song with every derived annotation. Field names match `Song`, so the
/// file reads back as a song (annotations are dropped and recomputed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSong {
    pub title: String,
    pub sections: Vec<AnnotatedSection>,
    pub warnings: Vec<ParseWarning>,
}

pub fn annotate(lexicon: &Lexicon, song: &Song, config: &AnalyzerConfig) -> AnnotatedSong {
    let sound = analyze_song(lexicon, song, &config.rhyme);
    let tags = tag_song(lexicon, song);

    let sections = song
        .sections
        .iter()
        .zip(&sound.sections)
        .zip(&tags)
        .map(|((section, section_sound), section_tags)| {
            let lines = section
                .lines
                .iter()
                .zip(&section_sound.lines)
                .zip(section_tags)
                .map(|((line, line_sound), line_tags)| {
                    let mut in_cliche = vec![false; line.tokens.len()];
                    for span in find_cliches(lexicon, &line.tokens, config.cliche.max_window) {
                        for flag in &mut in_cliche[span.start..span.start + span.len] {
                            *flag = true;
                        }
                    }
                    let tokens = line
                        .tokens
                        .iter()
                        .zip(&line_sound.words)
                        .zip(line_tags)
                        .zip(in_cliche)
                        .map(|(((token, word), tag), in_cliche)| {
                            let concreteness = lexicon.concreteness(&token.norm).map(|(r, _)| r);
                            AnnotatedToken {
                                text: token.text.clone(),
                                norm: token.norm.clone(),
                                syllables: word.syllables,
                                syllable_source: word.source,
                                phonemes: word.phonemes.clone(),
                                stress: word.stress.clone(),
                                class: tag.class,
                                verb: tag.verb.clone(),
                                unrated: tag.class.is_nominal() && concreteness.is_none(),
                                concreteness,
                                senses: if tag.is_content() {
                                    lexicon.senses(&token.norm)
                                } else {
                                    Vec::new()
                                },
                                in_cliche,
                            }
                        })
                        .collect();
                    AnnotatedLine {
                        number: line.number,
                        text: line.text.clone(),
                        syllables: line_sound.syllables,
                        stress: line_sound.stress.clone(),
                        meter: line_sound.meter,
                        rhyme_key: line_sound.rhyme_key.clone(),
                        letter: line_sound.letter,
                        tokens,
                    }
                })
                .collect();
            AnnotatedSection {
                kind: section.kind.clone(),
                label: section.label.clone(),
                ordinal: section.ordinal,
                marker_line: section.marker_line,
                scheme: section_sound.scheme.clone(),
                lines,
                gaps: section.gaps.clone(),
            }
        })
        .collect();

    AnnotatedSong {
        title: song.title.clone(),
        sections,
        warnings: song.warnings.clone(),
    }
}

// ============================================================================
// Analysis Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAnalysis {
    pub number: usize,
    pub text: String,
    pub syllables: usize,
    pub stress: String,
    pub meter: Meter,
    pub rhyme_key: Option<RhymeKey>,
    pub letter: char,
    pub alliteration: usize,
    /// Words whose syllables came from the spelling heuristic
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub heuristic_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionAnalysis {
    pub id: String,
    pub label: String,
    pub scheme: String,
    pub rhyme_density: f64,
    pub rhyme_forms: RhymeForms,
    pub lines: Vec<LineAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneticSummary {
    pub avg_syllables_per_line: f64,
    pub syllable_variance: f64,
    pub dominant_meter: Meter,
    pub meter_distribution: BTreeMap<String, usize>,
    /// Share of lines in the dominant meter
    pub meter_regularity: f64,
    pub rhyme_density: f64,
    pub alliteration: usize,
    pub dictionary_words: usize,
    pub heuristic_words: usize,
    pub dictionary_coverage: f64,
    /// Phoneme counts over dictionary words
    pub consonants: usize,
    pub vowels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consonant_vowel_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularyStats {
    pub total_words: usize,
    pub unique_words: usize,
    pub type_token_ratio: f64,
    pub avg_syllables_per_word: f64,
    pub polysyllabic_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartsOfSpeech {
    pub nouns: usize,
    pub verbs: usize,
    pub adjectives: usize,
    pub adverbs: usize,
    /// Undefined for a song without verbs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noun_verb_ratio: Option<f64>,
    pub top_nouns: Vec<WordCount>,
    /// Counted by lemma
    pub top_verbs: Vec<WordCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionLength {
    pub section: String,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureSummary {
    pub section_counts: BTreeMap<String, usize>,
    pub section_lengths: Vec<SectionLength>,
    pub avg_section_length: f64,
    pub has_chorus: bool,
    pub has_bridge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    pub section_count: usize,
    pub line_count: usize,
    pub structure: StructureSummary,
    pub phonetics: PhoneticSummary,
    pub vocabulary: VocabularyStats,
    pub parts_of_speech: PartsOfSpeech,
    pub sections: Vec<SectionAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural: Option<StructuralScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
}

fn meter_name(meter: Meter) -> String {
    serde_json::to_value(meter)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Most common meter among lines with stress, first in declaration order on
/// ties, and the share of lines in it.
fn dominant_meter(sound: &SongSound) -> (Meter, BTreeMap<String, usize>, f64) {
    let mut counts: BTreeMap<Meter, usize> = BTreeMap::new();
    for line in sound.lines().filter(|l| l.meter != Meter::Unknown) {
        *counts.entry(line.meter).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    let mut best = (Meter::Unknown, 0usize);
    for (meter, n) in &counts {
        if *n > best.1 {
            best = (*meter, *n);
        }
    }
    let regularity = if total == 0 { 0.0 } else { best.1 as f64 / total as f64 };
    let distribution = counts.into_iter().map(|(m, n)| (meter_name(m), n)).collect();
    (best.0, distribution, regularity)
}

fn vocabulary(song: &Song, sound: &SongSound) -> VocabularyStats {
    let words: Vec<&str> = song.tokens().map(|t| t.norm.as_str()).collect();
    let syllables: Vec<f64> = sound
        .lines()
        .flat_map(|l| l.words.iter().map(|w| w.syllables as f64))
        .collect();
    let mut unique = words.clone();
    unique.sort_unstable();
    unique.dedup();
    VocabularyStats {
        total_words: words.len(),
        unique_words: unique.len(),
        type_token_ratio: if words.is_empty() {
            0.0
        } else {
            unique.len() as f64 / words.len() as f64
        },
        avg_syllables_per_word: mean(&syllables),
        polysyllabic_words: syllables.iter().filter(|s| **s >= 3.0).count(),
    }
}

const TOP_WORDS: usize = 10;

/// Most frequent words, ties alphabetical.
fn top_words<'a>(words: impl Iterator<Item = &'a str>) -> Vec<WordCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in words {
        *counts.entry(word).or_insert(0) += 1;
    }
    let mut ranked: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(TOP_WORDS);
    ranked
}

fn parts_of_speech(tags: &[Vec<Vec<TaggedWord>>]) -> PartsOfSpeech {
    let words: Vec<&TaggedWord> = tags.iter().flatten().flatten().collect();
    let count = |class: WordClass| words.iter().filter(|t| t.class == class).count();
    let (nouns, verbs) = (count(WordClass::Noun), count(WordClass::Verb));
    PartsOfSpeech {
        nouns,
        verbs,
        adjectives: count(WordClass::Adjective),
        adverbs: count(WordClass::Adverb),
        noun_verb_ratio: (verbs > 0).then(|| nouns as f64 / verbs as f64),
        top_nouns: top_words(
            words
                .iter()
                .filter(|t| t.class == WordClass::Noun)
                .map(|t| t.word.as_str()),
        ),
        top_verbs: top_words(
            words
                .iter()
                .filter(|t| t.class == WordClass::Verb)
                .map(|t| t.verb.as_ref().map_or(t.word.as_str(), |v| v.lemma.as_str())),
        ),
    }
}

fn structure(song: &Song) -> StructureSummary {
    let mut section_counts = BTreeMap::new();
    for section in &song.sections {
        *section_counts.entry(section.kind.as_str().to_string()).or_insert(0) += 1;
    }
    let section_lengths: Vec<SectionLength> = song
        .sections
        .iter()
        .map(|s| SectionLength {
            section: s.id(),
            lines: s.lines.len(),
        })
        .collect();
    let lengths: Vec<f64> = section_lengths.iter().map(|s| s.lines as f64).collect();
    let has = |kind: SectionKind| song.sections.iter().any(|s| s.kind == kind);
    StructureSummary {
        section_counts,
        avg_section_length: mean(&lengths),
        section_lengths,
        has_chorus: has(SectionKind::Chorus),
        has_bridge: has(SectionKind::Bridge),
    }
}

/// Phonetic and structural report for one song, optionally scored against
/// a model.
pub fn analyze(lexicon: &Lexicon, song: &Song, config: &AnalyzerConfig, model: Option<&Song>) -> AnalysisReport {
    let sound = analyze_song(lexicon, song, &config.rhyme);

    let sections: Vec<SectionAnalysis> = song
        .sections
        .iter()
        .zip(&sound.sections)
        .map(|(section, s)| {
            let letters = s.letters();
            SectionAnalysis {
                id: section.id(),
                label: section.label.clone(),
                scheme: s.scheme.clone(),
                rhyme_density: rhyme_density(&letters),
                rhyme_forms: rhyme_forms(&letters),
                lines: section
                    .lines
                    .iter()
                    .zip(&s.lines)
                    .map(|(line, ls)| LineAnalysis {
                        number: line.number,
                        text: line.text.clone(),
                        syllables: ls.syllables,
                        stress: ls.stress.clone(),
                        meter: ls.meter,
                        rhyme_key: ls.rhyme_key.clone(),
                        letter: ls.letter,
                        alliteration: alliteration_count(ls),
                        heuristic_words: ls
                            .words
                            .iter()
                            .filter(|w| w.source == SyllableSource::Heuristic)
                            .map(|w| w.word.clone())
                            .collect(),
                    })
                    .collect(),
            }
        })
        .collect();

    let per_line: Vec<f64> = sound.lines().map(|l| l.syllables as f64).collect();
    let heuristic_words: usize = sound.lines().map(|l| l.heuristic_words).sum();
    let all_words: usize = sound.lines().map(|l| l.words.len()).sum();
    let (dominant, distribution, regularity) = dominant_meter(&sound);
    let rhyming: f64 = sections
        .iter()
        .map(|s| s.rhyme_density * s.lines.len() as f64)
        .sum();

    let (vowels, consonants) = sound
        .lines()
        .flat_map(|l| l.words.iter())
        .flat_map(|w| w.phonemes.iter())
        .fold((0usize, 0usize), |(v, c), p| {
            if is_vowel_phone(p) {
                (v + 1, c)
            } else {
                (v, c + 1)
            }
        });

    let phonetics = PhoneticSummary {
        avg_syllables_per_line: mean(&per_line),
        syllable_variance: variance(&per_line),
        dominant_meter: dominant,
        meter_distribution: distribution,
        meter_regularity: regularity,
        rhyme_density: if per_line.is_empty() {
            0.0
        } else {
            rhyming / per_line.len() as f64
        },
        alliteration: sound.lines().map(alliteration_count).sum(),
        dictionary_words: all_words - heuristic_words,
        heuristic_words,
        dictionary_coverage: if all_words == 0 {
            0.0
        } else {
            (all_words - heuristic_words) as f64 / all_words as f64
        },
        consonants,
        vowels,
        consonant_vowel_ratio: (vowels > 0).then(|| consonants as f64 / vowels as f64),
    };

    AnalysisReport {
        title: song.title.clone(),
        section_count: song.sections.len(),
        line_count: song.line_count(),
        structure: structure(song),
        vocabulary: vocabulary(song, &sound),
        parts_of_speech: parts_of_speech(&tag_song(lexicon, song)),
        phonetics,
        sections,
        structural: model.map(|m| score_songs(lexicon, m, song, config)),
        warnings: song.warnings.clone(),
    }
}

/// Taste output for one song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteDocument {
    pub title: String,
    #[serde(flatten)]
    pub taste: TasteReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = "[Verse 1]\nThe river runs beside the town\nI walk the gravel road at night\nMy father left an old guitar\nThe window holds a yellow light\n";

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.md")), Format::Markdown);
        assert_eq!(Format::from_path(Path::new("a.txt")), Format::Text);
        assert_eq!(Format::from_path(Path::new("lyrics")), Format::Text);
    }

    #[test]
    fn test_annotated_song_reads_back() {
        let lex = Lexicon::builtin();
        let song = parse_lyrics(SONG, "river").unwrap();
        let annotated = annotate(&lex, &song, &AnalyzerConfig::default());
        assert_eq!(annotated.sections[0].scheme, "ABCB");

        let json = serde_json::to_string(&annotated).unwrap();
        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(rebuild_song(back).unwrap(), song);

        let yaml = serde_yaml::to_string(&annotated).unwrap();
        let back: Song = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.sections[0].lines.len(), 4);
    }

    #[test]
    fn test_annotation_marks_cliches_and_verbs() {
        let lex = Lexicon::builtin();
        let song = parse_lyrics("[Verse]\nI know it was meant to be\n", "x").unwrap();
        let annotated = annotate(&lex, &song, &AnalyzerConfig::default());
        let tokens = &annotated.sections[0].lines[0].tokens;
        let flags: Vec<bool> = tokens.iter().map(|t| t.in_cliche).collect();
        assert_eq!(flags, vec![false, false, false, false, true, true, true]);
        assert!(tokens[1].verb.is_some());
    }

    #[test]
    fn test_analyze_report() {
        let lex = Lexicon::builtin();
        let song = parse_lyrics(SONG, "river").unwrap();
        let report = analyze(&lex, &song, &AnalyzerConfig::default(), Some(&song));
        assert_eq!(report.line_count, 4);
        assert_eq!(report.sections[0].scheme, "ABCB");
        assert!((report.sections[0].rhyme_density - 0.5).abs() < 1e-12);
        assert_eq!(report.phonetics.avg_syllables_per_line, 8.0);
        assert_eq!(report.phonetics.syllable_variance, 0.0);
        assert_eq!(report.phonetics.heuristic_words, 0);
        assert_eq!(report.structural.as_ref().unwrap().score, 1.0);
        assert!(report.vocabulary.unique_words < report.vocabulary.total_words);
    }

    #[test]
    fn test_load_song_formats() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("river.txt");
        fs::write(&txt, SONG).unwrap();
        let song = load_song(&txt).unwrap();
        assert_eq!(song.title, "river");

        let yaml = dir.path().join("river.yaml");
        write_report(&annotate(&Lexicon::builtin(), &song, &AnalyzerConfig::default()), Some(&yaml)).unwrap();
        let back = load_song(&yaml).unwrap();
        assert_eq!(back, song);
        assert!(!dir.path().join("river.yaml.tmp").exists());
    }

    #[test]
    fn test_load_song_structured_input_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        fs::write(&empty, r#"{"title":"x","sections":[]}"#).unwrap();
        let err = load_song(&empty).unwrap_err();
        assert!(format!("{:#}", err).contains("empty.json"));

        let text = format!("{}\n[Verse 2]\nThe kitchen table holds the bread\n", SONG);
        let song = parse_lyrics(&text, "river").unwrap();
        let mut edited = song.clone();
        edited.sections[1].ordinal = 1;
        edited.warnings.push(ParseWarning {
            line: 3,
            message: "hand-written".to_string(),
        });
        let json = dir.path().join("river.json");
        fs::write(&json, serde_json::to_string(&edited).unwrap()).unwrap();

        let back = load_song(&json).unwrap();
        assert_eq!(back.sections[1].ordinal, 2);
        assert!(back.warnings.is_empty());
        let lex = Lexicon::builtin();
        assert_eq!(score_songs(&lex, &song, &back, &AnalyzerConfig::default()).score, 1.0);
    }

    #[test]
    fn test_load_song_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.txt");
        fs::write(&bad, "no marker here\n").unwrap();
        let err = load_song(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.txt"));
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn test_expand_candidates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c.md", "a1.txt"] {
            fs::write(dir.path().join(name), SONG).unwrap();
        }
        let pattern = dir.path().join("*.txt").to_string_lossy().to_string();
        let paths = expand_candidates(&[pattern]).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "a1.txt", "b.txt"]);

        let single = dir.path().join("a?.txt").to_string_lossy().to_string();
        assert_eq!(expand_candidates(&[single]).unwrap().len(), 1);

        let missing = dir.path().join("*.lyrics").to_string_lossy().to_string();
        assert!(expand_candidates(&[missing]).is_err());
    }
}
