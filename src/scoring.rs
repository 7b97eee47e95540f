//! Structural fitness of a candidate against the model.
//!
//! Three terms, each in [0,1]:
//! - syllable alignment over position-aligned lines
//! - rhyme-scheme agreement over the same positions
//! - section shape (matching kinds/ordinals, count and order)
//!
//! Sections pair up by (kind, ordinal); lines pair up by index inside a
//! paired section. Any position without a counterpart scores 0 on both line
//! terms, so missing or extra material always costs something.

use serde::{Deserialize, Serialize};

use crate::config::{AnalyzerConfig, StructuralWeights};
use crate::lexicon::Lexicon;
use crate::models::{SectionKind, Song};
use crate::phonetics::{analyze_song, SongSound};

// ============================================================================
// Profiles
// ============================================================================

/// The parts of a section the structural terms look at.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionProfile {
    pub kind: SectionKind,
    pub ordinal: usize,
    pub id: String,
    pub syllables: Vec<usize>,
    pub letters: Vec<char>,
    pub line_numbers: Vec<usize>,
}

impl SectionProfile {
    fn key(&self) -> (&SectionKind, usize) {
        (&self.kind, self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongProfile {
    pub sections: Vec<SectionProfile>,
}

impl SongProfile {
    /// Pair a song with its already computed phonetics.
    pub fn new(song: &Song, sound: &SongSound) -> Self {
        let sections = song
            .sections
            .iter()
            .zip(&sound.sections)
            .map(|(section, s)| SectionProfile {
                kind: section.kind.clone(),
                ordinal: section.ordinal,
                id: section.id(),
                syllables: s.lines.iter().map(|l| l.syllables).collect(),
                letters: s.letters(),
                line_numbers: section.lines.iter().map(|l| l.number).collect(),
            })
            .collect();
        SongProfile { sections }
    }

    pub fn build(lexicon: &Lexicon, song: &Song, config: &AnalyzerConfig) -> Self {
        let sound = analyze_song(lexicon, song, &config.rhyme);
        Self::new(song, &sound)
    }

    fn line_count(&self) -> usize {
        self.sections.iter().map(|s| s.syllables.len()).sum()
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// An explainable difference between candidate and model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    MissingSection {
        section: String,
    },
    ExtraSection {
        section: String,
    },
    SectionMoved {
        section: String,
        model_position: usize,
        candidate_position: usize,
    },
    LineCount {
        section: String,
        model: usize,
        candidate: usize,
    },
    SyllableMismatch {
        section: String,
        line_index: usize,
        candidate_line: usize,
        model: usize,
        candidate: usize,
    },
    RhymeMismatch {
        section: String,
        line_index: usize,
        candidate_line: usize,
        model: char,
        candidate: char,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralScore {
    /// Weighted combination of the three terms
    pub score: f64,
    pub syllable_alignment: f64,
    pub rhyme_scheme: f64,
    pub section_shape: f64,
    #[serde(default)]
    pub mismatches: Vec<Mismatch>,
}

// ============================================================================
// Scoring
// ============================================================================

/// Normalized complement of a syllable-count difference.
pub fn syllable_similarity(a: usize, b: usize) -> f64 {
    let max = a.max(b);
    if max == 0 {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / max as f64
}

/// Marks the members of one longest increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    let n = values.len();
    let mut best = vec![1usize; n];
    let mut prev = vec![None; n];
    for i in 0..n {
        for j in 0..i {
            if values[j] < values[i] && best[j] + 1 > best[i] {
                best[i] = best[j] + 1;
                prev[i] = Some(j);
            }
        }
    }
    let mut keep = vec![false; n];
    let mut cursor = (0..n).max_by_key(|&i| (best[i], std::cmp::Reverse(i)));
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}

fn weighted(weights: &StructuralWeights, syllables: f64, rhyme: f64, shape: f64) -> f64 {
    let total = weights.syllable_alignment * syllables
        + weights.rhyme_scheme * rhyme
        + weights.section_shape * shape;
    let sum = weights.syllable_alignment + weights.rhyme_scheme + weights.section_shape;
    if sum <= 0.0 {
        return 0.0;
    }
    (total / sum).clamp(0.0, 1.0)
}

/// Score a candidate profile against the model profile.
pub fn structural_score(
    model: &SongProfile,
    candidate: &SongProfile,
    weights: &StructuralWeights,
) -> StructuralScore {
    let mut mismatches = Vec::new();

    // model index -> candidate index, each candidate section used once
    let mut used = vec![false; candidate.sections.len()];
    let pairs: Vec<(usize, Option<usize>)> = model
        .sections
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let found = candidate
                .sections
                .iter()
                .enumerate()
                .position(|(ci, c)| !used[ci] && c.key() == m.key());
            if let Some(ci) = found {
                used[ci] = true;
            }
            (i, found)
        })
        .collect();

    let mut positions = 0usize;
    let mut syllable_sum = 0.0;
    let mut rhyme_hits = 0usize;

    for (mi, ci) in &pairs {
        let m = &model.sections[*mi];
        let Some(ci) = ci else {
            positions += m.syllables.len();
            mismatches.push(Mismatch::MissingSection { section: m.id.clone() });
            continue;
        };
        let c = &candidate.sections[*ci];
        let len = m.syllables.len().max(c.syllables.len());
        positions += len;
        if m.syllables.len() != c.syllables.len() {
            mismatches.push(Mismatch::LineCount {
                section: m.id.clone(),
                model: m.syllables.len(),
                candidate: c.syllables.len(),
            });
        }
        for i in 0..m.syllables.len().min(c.syllables.len()) {
            let (ms, cs) = (m.syllables[i], c.syllables[i]);
            syllable_sum += syllable_similarity(ms, cs);
            if ms != cs {
                mismatches.push(Mismatch::SyllableMismatch {
                    section: m.id.clone(),
                    line_index: i,
                    candidate_line: c.line_numbers[i],
                    model: ms,
                    candidate: cs,
                });
            }
            let (ml, cl) = (m.letters[i], c.letters[i]);
            if ml == cl {
                rhyme_hits += 1;
            } else {
                mismatches.push(Mismatch::RhymeMismatch {
                    section: m.id.clone(),
                    line_index: i,
                    candidate_line: c.line_numbers[i],
                    model: ml,
                    candidate: cl,
                });
            }
        }
    }

    let matched: Vec<usize> = pairs.iter().filter_map(|(_, c)| *c).collect();
    for (ci, c) in candidate.sections.iter().enumerate() {
        if !matched.contains(&ci) {
            positions += c.syllables.len();
            mismatches.push(Mismatch::ExtraSection { section: c.id.clone() });
        }
    }

    let in_order = longest_increasing(&matched);
    let mut matched_iter = matched.iter().zip(&in_order);
    for (mi, ci) in &pairs {
        if ci.is_none() {
            continue;
        }
        if let Some((ci, keep)) = matched_iter.next() {
            if !keep {
                mismatches.push(Mismatch::SectionMoved {
                    section: model.sections[*mi].id.clone(),
                    model_position: *mi,
                    candidate_position: *ci,
                });
            }
        }
    }

    let (syllable_alignment, rhyme_scheme) = if positions == 0 {
        let both_empty = model.line_count() == 0 && candidate.line_count() == 0;
        if both_empty { (1.0, 1.0) } else { (0.0, 0.0) }
    } else {
        (
            syllable_sum / positions as f64,
            rhyme_hits as f64 / positions as f64,
        )
    };

    let (m_count, c_count) = (model.sections.len(), candidate.sections.len());
    let section_shape = match (m_count, c_count) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => {
            let found = matched.len() as f64;
            let recall = found / m_count as f64;
            let precision = found / c_count as f64;
            let count_ratio = m_count.min(c_count) as f64 / m_count.max(c_count) as f64;
            let order = if matched.is_empty() {
                0.0
            } else {
                in_order.iter().filter(|k| **k).count() as f64 / found
            };
            (recall + precision) / 2.0 * count_ratio * order
        }
    };

    StructuralScore {
        score: weighted(weights, syllable_alignment, rhyme_scheme, section_shape),
        syllable_alignment,
        rhyme_scheme,
        section_shape,
        mismatches,
    }
}

/// Convenience for one-off comparisons outside a session.
pub fn score_songs(lexicon: &Lexicon, model: &Song, candidate: &Song, config: &AnalyzerConfig) -> StructuralScore {
    structural_score(
        &SongProfile::build(lexicon, model, config),
        &SongProfile::build(lexicon, candidate, config),
        &config.structural,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lyrics;

    fn section(kind: SectionKind, ordinal: usize, syllables: &[usize], letters: &str) -> SectionProfile {
        SectionProfile {
            id: format!("{} {}", kind, ordinal),
            kind,
            ordinal,
            syllables: syllables.to_vec(),
            letters: letters.chars().collect(),
            line_numbers: (1..=syllables.len()).collect(),
        }
    }

    fn model() -> SongProfile {
        SongProfile {
            sections: vec![
                section(SectionKind::Verse, 1, &[8, 8, 8, 8], "ABCB"),
                section(SectionKind::Chorus, 1, &[6, 6], "AA"),
                section(SectionKind::Verse, 2, &[8, 8, 8, 8], "ABCB"),
            ],
        }
    }

    #[test]
    fn test_identical_scores_exactly_one() {
        let m = model();
        let s = structural_score(&m, &m.clone(), &StructuralWeights::default());
        assert_eq!(s.score, 1.0);
        assert_eq!(s.syllable_alignment, 1.0);
        assert_eq!(s.rhyme_scheme, 1.0);
        assert_eq!(s.section_shape, 1.0);
        assert!(s.mismatches.is_empty());
    }

    #[test]
    fn test_identical_parsed_song() {
        let lex = Lexicon::builtin();
        let text = "[Verse 1]\nThe river runs beside the town\nI walk the gravel road at night\n[Chorus]\nThe window holds a yellow light\n";
        let song = parse_lyrics(text, "m").unwrap();
        let s = score_songs(&lex, &song, &song.clone(), &AnalyzerConfig::default());
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let empty = SongProfile { sections: vec![] };
        let s = structural_score(&model(), &empty, &StructuralWeights::default());
        assert_eq!(s.section_shape, 0.0);
        assert_eq!(s.syllable_alignment, 0.0);
        assert_eq!(s.score, 0.0);
        assert_eq!(
            s.mismatches.iter().filter(|m| matches!(m, Mismatch::MissingSection { .. })).count(),
            3
        );
    }

    #[test]
    fn test_syllable_similarity() {
        assert_eq!(syllable_similarity(0, 0), 1.0);
        assert_eq!(syllable_similarity(8, 8), 1.0);
        assert_eq!(syllable_similarity(8, 6), 0.75);
        assert_eq!(syllable_similarity(0, 4), 0.0);
    }

    #[test]
    fn test_near_clone_scores_high_not_one() {
        let mut c = model();
        c.sections[0].syllables[1] = 9;
        let s = structural_score(&model(), &c, &StructuralWeights::default());
        assert!(s.score < 1.0);
        assert!(s.score > 0.95);
        assert!(matches!(
            s.mismatches[0],
            Mismatch::SyllableMismatch { line_index: 1, model: 8, candidate: 9, .. }
        ));
    }

    #[test]
    fn test_rhyme_pattern_mismatch() {
        let mut c = model();
        c.sections[0].letters = "ABCD".chars().collect();
        let s = structural_score(&model(), &c, &StructuralWeights::default());
        assert_eq!(s.syllable_alignment, 1.0);
        assert!((s.rhyme_scheme - 9.0 / 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_section_degrades_shape() {
        let mut c = model();
        c.sections.remove(1);
        let s = structural_score(&model(), &c, &StructuralWeights::default());
        // recall 2/3, precision 1, count ratio 2/3
        assert!((s.section_shape - (5.0 / 6.0) * (2.0 / 3.0)).abs() < 1e-12);
        assert!((s.syllable_alignment - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_extra_lines_penalized() {
        let mut c = model();
        c.sections[1].syllables.push(6);
        c.sections[1].letters.push('A');
        c.sections[1].line_numbers.push(3);
        let s = structural_score(&model(), &c, &StructuralWeights::default());
        assert!(s.syllable_alignment < 1.0);
        assert!(s
            .mismatches
            .contains(&Mismatch::LineCount { section: "chorus 1".to_string(), model: 2, candidate: 3 }));
    }

    #[test]
    fn test_moved_section_flagged() {
        let mut c = model();
        c.sections.swap(0, 1);
        let s = structural_score(&model(), &c, &StructuralWeights::default());
        assert!(s.section_shape < 1.0);
        assert!(s.mismatches.iter().any(|m| matches!(m, Mismatch::SectionMoved { .. })));
        assert_eq!(s.syllable_alignment, 1.0);
    }

    #[test]
    fn test_numbered_marker_pairs_with_same_number() {
        let lex = Lexicon::builtin();
        let config = AnalyzerConfig::default();
        let model = parse_lyrics(
            "[Verse 1]\nThe river runs beside the town\n[Verse 2]\nThe kitchen table holds the bread\nWe keep the fire burning long\n",
            "m",
        )
        .unwrap();
        let candidate = parse_lyrics("[Verse 2]\nMy mother sings a morning song\nThe dog is sleeping by the door\n", "c").unwrap();
        let s = score_songs(&lex, &model, &candidate, &config);
        assert!(s.mismatches.contains(&Mismatch::MissingSection { section: "verse 1".to_string() }));
        assert!(!s.mismatches.iter().any(|m| matches!(m, Mismatch::ExtraSection { .. })));
        assert!(!s.mismatches.iter().any(|m| matches!(m, Mismatch::LineCount { .. })));
    }

    #[test]
    fn test_repeated_section_numbers_pair_once() {
        let lex = Lexicon::builtin();
        let text = "[Chorus 1]\nThe window holds a yellow light\n[Verse]\nI walk the gravel road at night\n[Chorus 1]\nThe window holds a yellow light\n";
        let song = parse_lyrics(text, "m").unwrap();
        assert_eq!(song.sections[2].ordinal, 1);
        let s = score_songs(&lex, &song, &song.clone(), &AnalyzerConfig::default());
        assert_eq!(s.score, 1.0);
        assert!(s.mismatches.is_empty());
    }

    #[test]
    fn test_weights_applied() {
        let mut c = model();
        c.sections[0].letters = "AAAA".chars().collect();
        let only_syllables = StructuralWeights {
            syllable_alignment: 1.0,
            rhyme_scheme: 0.0,
            section_shape: 0.0,
        };
        let s = structural_score(&model(), &c, &only_syllables);
        assert_eq!(s.score, 1.0);
    }
}
