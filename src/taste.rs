//! Lexical taste: concreteness, cliché-freedom, show-vs-tell and sensory
//! richness, plus their weighted composite.
//!
//! Every measurement here reads only the candidate's own text. A sub-score
//! whose denominator is empty is `SubScore::Undefined` and drops out of the
//! composite; the remaining weights are renormalized.

use serde::{Deserialize, Serialize};

use crate::config::{AnalyzerConfig, TasteWeights};
use crate::lexicon::{Lexicon, Sense, VerbClass};
use crate::models::{Song, Token};
use crate::tagger::{tag_song, TaggedWord};

/// Lowest and highest ratings in the concreteness table.
pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;

const EXAMPLE_LIMIT: usize = 5;

// ============================================================================
// Scores
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubScore {
    Defined { value: f64 },
    Undefined { reason: String },
}

impl SubScore {
    pub fn undefined(reason: &str) -> Self {
        SubScore::Undefined {
            reason: reason.to_string(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            SubScore::Defined { value } => Some(*value),
            SubScore::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value().is_some()
    }
}

impl std::fmt::Display for SubScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubScore::Defined { value } => write!(f, "{:.1}", value),
            SubScore::Undefined { .. } => f.write_str("undefined"),
        }
    }
}

/// Composite plus the four named sub-scores, all on 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteScores {
    pub composite: SubScore,
    pub concreteness: SubScore,
    pub cliche_freedom: SubScore,
    pub show_vs_tell: SubScore,
    pub sensory_richness: SubScore,
}

/// Weighted mean over the defined sub-scores only.
pub fn composite(
    weights: &TasteWeights,
    concreteness: &SubScore,
    cliche_freedom: &SubScore,
    show_vs_tell: &SubScore,
    sensory_richness: &SubScore,
) -> SubScore {
    let parts = [
        (weights.concreteness, concreteness),
        (weights.cliche_freedom, cliche_freedom),
        (weights.show_vs_tell, show_vs_tell),
        (weights.sensory_richness, sensory_richness),
    ];
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (weight, score) in parts {
        if let Some(value) = score.value() {
            total += weight * value;
            weight_sum += weight;
        }
    }
    if weight_sum <= 0.0 {
        return SubScore::undefined("no defined sub-score carries weight");
    }
    SubScore::Defined {
        value: total / weight_sum,
    }
}

// ============================================================================
// Report Details
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordRef {
    pub line: usize,
    pub word: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConcretenessBands {
    pub very_concrete: usize,
    pub concrete: usize,
    pub moderate: usize,
    #[serde(rename = "abstract")]
    pub abstract_: usize,
    pub very_abstract: usize,
}

impl ConcretenessBands {
    fn add(&mut self, rating: f64) {
        match rating {
            r if r >= 4.5 => self.very_concrete += 1,
            r if r >= 3.5 => self.concrete += 1,
            r if r >= 2.5 => self.moderate += 1,
            r if r >= 1.5 => self.abstract_ += 1,
            _ => self.very_abstract += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionConcreteness {
    pub section: String,
    pub mean_rating: Option<f64>,
    pub rated_count: usize,
    pub score: SubScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcretenessDetail {
    pub mean_rating: Option<f64>,
    pub rated_count: usize,
    pub sections: Vec<SectionConcreteness>,
    /// Content words with no rating, excluded from the mean
    pub unrated: Vec<WordRef>,
    pub bands: ConcretenessBands,
    pub concrete_examples: Vec<String>,
    pub abstract_examples: Vec<String>,
}

/// Cliché phrase located in a token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClicheSpan {
    pub start: usize,
    pub len: usize,
    pub phrase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClicheMatch {
    pub line: usize,
    pub phrase: String,
}

/// Two end words from one worn rhyme family (love/above).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClicheRhyme {
    pub section: String,
    pub lines: (usize, usize),
    pub words: (String, String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClicheDetail {
    pub line_count: usize,
    pub matches: Vec<ClicheMatch>,
    /// Reported for revision, not scored
    pub rhyme_pairs: Vec<ClicheRhyme>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerbDetail {
    pub action_count: usize,
    pub state_count: usize,
    pub showing_examples: Vec<String>,
    pub telling_examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenseHits {
    pub sense: Sense,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensoryDetail {
    pub distinct: usize,
    pub by_sense: Vec<SenseHits>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteReport {
    pub scores: TasteScores,
    pub concreteness: ConcretenessDetail,
    pub cliches: ClicheDetail,
    pub verbs: VerbDetail,
    pub sensory: SensoryDetail,
    pub recommendations: Vec<String>,
}

// ============================================================================
// Cliché Matching
// ============================================================================

/// Longest-first, non-overlapping cliché spans of 2..=`max_window` tokens.
pub fn find_cliches(lexicon: &Lexicon, tokens: &[Token], max_window: usize) -> Vec<ClicheSpan> {
    let window = max_window.min(lexicon.max_cliche_words());
    let mut spans = Vec::new();
    let mut i = 0;
    'outer: while i < tokens.len() {
        let longest = window.min(tokens.len() - i);
        for len in (2..=longest).rev() {
            let phrase = tokens[i..i + len]
                .iter()
                .map(|t| t.norm.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if lexicon.is_cliche(&phrase) {
                spans.push(ClicheSpan {
                    start: i,
                    len,
                    phrase,
                });
                i += len;
                continue 'outer;
            }
        }
        i += 1;
    }
    spans
}

fn cliche_rhymes(lexicon: &Lexicon, song: &Song) -> Vec<ClicheRhyme> {
    let mut pairs = Vec::new();
    for section in &song.sections {
        let ends: Vec<(usize, &str, usize)> = section
            .lines
            .iter()
            .filter_map(|l| {
                let word = l.last_token()?.norm.as_str();
                Some((l.number, word, lexicon.cliche_rhyme_family(word)?))
            })
            .collect();
        for (j, (line, word, family)) in ends.iter().enumerate() {
            let earlier = ends[..j]
                .iter()
                .rev()
                .find(|(_, w, f)| f == family && w != word);
            if let Some((first_line, first_word, _)) = earlier {
                pairs.push(ClicheRhyme {
                    section: section.id(),
                    lines: (*first_line, *line),
                    words: (first_word.to_string(), word.to_string()),
                });
            }
        }
    }
    pairs
}

// ============================================================================
// Analysis
// ============================================================================

fn push_example(list: &mut Vec<String>, word: &str) {
    if list.len() < EXAMPLE_LIMIT && !list.iter().any(|w| w == word) {
        list.push(word.to_string());
    }
}

/// Map a mean rating on 1–5 onto 0–100.
pub fn scale_rating(mean: f64) -> f64 {
    ((mean - RATING_MIN) / (RATING_MAX - RATING_MIN) * 100.0).clamp(0.0, 100.0)
}

fn mean_rating(ratings: &[f64]) -> Option<f64> {
    if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}

fn rating_score(mean: Option<f64>) -> SubScore {
    match mean {
        Some(mean) => SubScore::Defined {
            value: scale_rating(mean),
        },
        None => SubScore::undefined("no rated content words"),
    }
}

fn concreteness_detail(lexicon: &Lexicon, song: &Song, tags: &[Vec<Vec<TaggedWord>>]) -> ConcretenessDetail {
    let mut ratings: Vec<(f64, String)> = Vec::new();
    let mut unrated = Vec::new();
    let mut bands = ConcretenessBands::default();
    let mut sections = Vec::with_capacity(song.sections.len());

    for (section, section_tags) in song.sections.iter().zip(tags) {
        let first = ratings.len();
        for (line, line_tags) in section.lines.iter().zip(section_tags) {
            for tag in line_tags.iter().filter(|t| t.class.is_nominal()) {
                match lexicon.concreteness(&tag.word) {
                    Some((rating, _)) => {
                        bands.add(rating);
                        ratings.push((rating, tag.word.clone()));
                    }
                    None => unrated.push(WordRef {
                        line: line.number,
                        word: tag.word.clone(),
                    }),
                }
            }
        }
        let section_ratings: Vec<f64> = ratings[first..].iter().map(|(r, _)| *r).collect();
        let mean = mean_rating(&section_ratings);
        sections.push(SectionConcreteness {
            section: section.id(),
            mean_rating: mean,
            rated_count: section_ratings.len(),
            score: rating_score(mean),
        });
    }

    let all: Vec<f64> = ratings.iter().map(|(r, _)| *r).collect();

    let mut sorted = ratings.clone();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let mut concrete_examples = Vec::new();
    for (_, word) in sorted.iter().filter(|(r, _)| *r >= 4.5) {
        push_example(&mut concrete_examples, word);
    }
    let mut abstract_examples = Vec::new();
    for (_, word) in sorted.iter().rev().filter(|(r, _)| *r <= 2.5) {
        push_example(&mut abstract_examples, word);
    }

    ConcretenessDetail {
        mean_rating: mean_rating(&all),
        rated_count: ratings.len(),
        sections,
        unrated,
        bands,
        concrete_examples,
        abstract_examples,
    }
}

fn verb_detail(tags: &[Vec<Vec<TaggedWord>>]) -> VerbDetail {
    let mut detail = VerbDetail {
        action_count: 0,
        state_count: 0,
        showing_examples: Vec::new(),
        telling_examples: Vec::new(),
    };
    for tag in tags.iter().flatten().flatten() {
        match tag.finite_verb() {
            Some(VerbClass::Action) => {
                detail.action_count += 1;
                push_example(&mut detail.showing_examples, &tag.word);
            }
            Some(VerbClass::State) => {
                detail.state_count += 1;
                push_example(&mut detail.telling_examples, &tag.word);
            }
            None => {}
        }
    }
    detail
}

fn sensory_detail(lexicon: &Lexicon, tags: &[Vec<Vec<TaggedWord>>]) -> SensoryDetail {
    let mut by_sense: Vec<SenseHits> = Sense::ALL
        .iter()
        .map(|s| SenseHits {
            sense: *s,
            words: Vec::new(),
        })
        .collect();
    for tag in tags.iter().flatten().flatten().filter(|t| t.is_content()) {
        for sense in lexicon.senses(&tag.word) {
            if let Some(hits) = by_sense.iter_mut().find(|h| h.sense == sense) {
                push_example(&mut hits.words, &tag.word);
            }
        }
    }
    SensoryDetail {
        distinct: by_sense.iter().filter(|h| !h.words.is_empty()).count(),
        by_sense,
    }
}

fn recommendations(
    scores: &TasteScores,
    concreteness: &ConcretenessDetail,
    cliches: &ClicheDetail,
    verbs: &VerbDetail,
    sensory: &SensoryDetail,
) -> Vec<String> {
    let mut recs = Vec::new();

    if let Some(mean) = concreteness.mean_rating.filter(|m| *m < 3.5) {
        recs.push(format!(
            "CONCRETENESS: mean rating {:.2}/5.00 is low. Replace abstract words like [{}] with physical, tangible nouns.",
            mean,
            concreteness.abstract_examples.join(", ")
        ));
    }

    if !cliches.matches.is_empty() {
        let phrases: Vec<String> = cliches
            .matches
            .iter()
            .take(3)
            .map(|m| format!("line {}: {}", m.line, m.phrase))
            .collect();
        recs.push(format!(
            "CLICHES: found {} stock phrase(s) [{}]. Replace with original imagery.",
            cliches.matches.len(),
            phrases.join("; ")
        ));
    }

    if scores.show_vs_tell.value().map_or(false, |v| v < 40.0) {
        recs.push(format!(
            "SHOW DON'T TELL: {} state verb(s) like [{}]. Let action carry the feeling.",
            verbs.state_count,
            verbs.telling_examples.join(", ")
        ));
    }

    if sensory.distinct < 3 {
        let missing: Vec<&str> = sensory
            .by_sense
            .iter()
            .filter(|h| h.words.is_empty())
            .take(2)
            .map(|h| h.sense.as_str())
            .collect();
        recs.push(format!(
            "SENSORY: only {} sense(s) engaged. Add {} imagery.",
            sensory.distinct,
            missing.join(" and ")
        ));
    }

    if !cliches.rhyme_pairs.is_empty() {
        let pairs: Vec<String> = cliches
            .rhyme_pairs
            .iter()
            .map(|p| format!("{}/{}", p.words.0, p.words.1))
            .collect();
        recs.push(format!("RHYMES: worn rhyme pair(s) [{}].", pairs.join(", ")));
    }

    if recs.is_empty() {
        recs.push("Strong taste metrics across all dimensions. Minor polish only.".to_string());
    }
    recs
}

/// Full taste analysis of one song.
pub fn analyze_taste(lexicon: &Lexicon, song: &Song, config: &AnalyzerConfig) -> TasteReport {
    let tags = tag_song(lexicon, song);

    let concreteness = concreteness_detail(lexicon, song, &tags);
    let concreteness_score = rating_score(concreteness.mean_rating);

    let line_count = song.line_count();
    let matches: Vec<ClicheMatch> = song
        .lines()
        .flat_map(|line| {
            find_cliches(lexicon, &line.tokens, config.cliche.max_window)
                .into_iter()
                .map(move |span| ClicheMatch {
                    line: line.number,
                    phrase: span.phrase,
                })
        })
        .collect();
    let cliche_score = if line_count == 0 {
        SubScore::undefined("no lines")
    } else {
        SubScore::Defined {
            value: (100.0 * (1.0 - matches.len() as f64 / line_count as f64)).max(0.0),
        }
    };
    let cliches = ClicheDetail {
        line_count,
        matches,
        rhyme_pairs: cliche_rhymes(lexicon, song),
    };

    let verbs = verb_detail(&tags);
    let verb_total = verbs.action_count + verbs.state_count;
    let show_score = if verb_total == 0 {
        SubScore::undefined("no finite verbs")
    } else {
        SubScore::Defined {
            value: 100.0 * verbs.action_count as f64 / verb_total as f64,
        }
    };

    let sensory = sensory_detail(lexicon, &tags);
    let sensory_score = SubScore::Defined {
        value: 100.0 * sensory.distinct as f64 / Sense::ALL.len() as f64,
    };

    let scores = TasteScores {
        composite: composite(
            &config.taste,
            &concreteness_score,
            &cliche_score,
            &show_score,
            &sensory_score,
        ),
        concreteness: concreteness_score,
        cliche_freedom: cliche_score,
        show_vs_tell: show_score,
        sensory_richness: sensory_score,
    };
    let recommendations = recommendations(&scores, &concreteness, &cliches, &verbs, &sensory);

    TasteReport {
        scores,
        concreteness,
        cliches,
        verbs,
        sensory,
        recommendations,
    }
}

pub fn taste_scores(lexicon: &Lexicon, song: &Song, config: &AnalyzerConfig) -> TasteScores {
    analyze_taste(lexicon, song, config).scores
}
