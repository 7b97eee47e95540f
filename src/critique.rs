//! Boundary to an external judgment step.
//!
//! A `CritiqueRequest` carries the candidate text, its metrics, the rubric
//! and a rendered Markdown prompt. Whatever produces the judgment sits
//! behind the `Judge` trait; its `CritiqueResponse` is validated against the
//! rubric and merged next to the numbers. Nothing here judges anything.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compare::{Candidate, ComparisonSession};
use crate::config::AnalyzerConfig;
use crate::error::JudgmentError;
use crate::lexicon::Lexicon;
use crate::models::MetricSet;
use crate::scoring::StructuralScore;
use crate::taste::{analyze_taste, TasteScores};

/// Reported and recomputed overall scores may differ by this much.
pub const OVERALL_TOLERANCE: f64 = 0.05;

// ============================================================================
// Rubric
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Criterion {
    pub key: &'static str,
    pub title: &'static str,
    pub question: &'static str,
    pub high: &'static str,
    pub mid: &'static str,
    pub low: &'static str,
}

pub const CRITERIA: [Criterion; 6] = [
    Criterion {
        key: "imagery_concreteness",
        title: "Imagery & Concreteness",
        question: "Does the song use specific, tangible images, or vague abstractions?",
        high: "Rich physical imagery throughout (rain on a tin roof, calloused hands)",
        mid: "Mixed, some concrete images and some abstract",
        low: "Mostly abstract (love, pain, feelings, things)",
    },
    Criterion {
        key: "originality",
        title: "Originality",
        question: "Are the phrases fresh, or stock phrases heard a thousand times?",
        high: "Surprising, memorable phrases",
        mid: "Some original moments, some familiar territory",
        low: "Wall-to-wall clichés",
    },
    Criterion {
        key: "emotional_authenticity",
        title: "Emotional Authenticity",
        question: "Does this read as lived experience or greeting-card sentiment?",
        high: "Raw, specific, earned emotion",
        mid: "Genuine feeling, generic expression",
        low: "Hollow, sentimental or performative",
    },
    Criterion {
        key: "narrative_coherence",
        title: "Narrative Coherence",
        question: "Does the story or emotion build toward something?",
        high: "Clear progression with an earned resolution",
        mid: "Some structure but meandering",
        low: "Disconnected ideas, no through-line",
    },
    Criterion {
        key: "craft",
        title: "Craft",
        question: "Meter, rhyme, line breaks and word choice.",
        high: "Every word earns its place",
        mid: "Competent with some awkward moments",
        low: "Forced rhymes, broken meter, filler words",
    },
    Criterion {
        key: "singability",
        title: "Singability",
        question: "Would these words sit naturally in a singer's mouth?",
        high: "Natural phrasing, open vowels on stressed notes",
        mid: "Mostly singable with a few awkward spots",
        low: "Tongue-twisters, harsh clusters, unnatural stress",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Ready,
    Polish,
    Revise,
    Reject,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [Verdict::Ready, Verdict::Polish, Verdict::Revise, Verdict::Reject];

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ready => "READY",
            Verdict::Polish => "POLISH",
            Verdict::Revise => "REVISE",
            Verdict::Reject => "REJECT",
        }
    }

    pub fn meaning(self) -> &'static str {
        match self {
            Verdict::Ready => "Publication quality, minor tweaks at most",
            Verdict::Polish => "Good bones, needs line-level work",
            Verdict::Revise => "Major issues, needs significant rewriting",
            Verdict::Reject => "Not worth revising, start over",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Verdict::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMetrics {
    /// Present when a model was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural: Option<StructuralScore>,
    /// Present with `--include-taste`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taste: Option<TasteScores>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelContext {
    pub id: String,
    pub lyrics: String,
    pub metrics: MetricSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictOption {
    pub verdict: Verdict,
    pub meaning: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritiqueRequest {
    pub candidate: String,
    pub lyrics: String,
    pub metrics: CandidateMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelContext>,
    pub rubric: Vec<Criterion>,
    pub verdicts: Vec<VerdictOption>,
    pub prompt: String,
}

/// Assemble the request for one candidate.
pub fn build_request(
    lexicon: &Lexicon,
    config: &AnalyzerConfig,
    candidate: &Candidate,
    model: Option<&Candidate>,
    include_taste: bool,
) -> CritiqueRequest {
    let (structural, model) = match model {
        Some(m) => {
            let session = ComparisonSession::new(lexicon, config, &m.id, &m.song);
            let structural = session.structural(&candidate.song);
            let context = ModelContext {
                id: m.id.clone(),
                lyrics: m.song.to_marked_text(),
                metrics: session.model_metrics().clone(),
            };
            (Some(structural), Some(context))
        }
        None => (None, None),
    };

    let (taste, recommendations) = if include_taste {
        let report = analyze_taste(lexicon, &candidate.song, config);
        (Some(report.scores), report.recommendations)
    } else {
        (None, Vec::new())
    };

    let mut request = CritiqueRequest {
        candidate: candidate.id.clone(),
        lyrics: candidate.song.to_marked_text(),
        metrics: CandidateMetrics {
            structural,
            taste,
            recommendations,
        },
        model,
        rubric: CRITERIA.to_vec(),
        verdicts: Verdict::ALL
            .into_iter()
            .map(|v| VerdictOption {
                verdict: v,
                meaning: v.meaning(),
            })
            .collect(),
        prompt: String::new(),
    };
    request.prompt = render_prompt(&request);
    request
}

/// Markdown prompt for a human or model judge.
pub fn render_prompt(request: &CritiqueRequest) -> String {
    let mut out = String::from("# LYRICS CRITIQUE REQUEST\n\n");
    out.push_str(
        "Evaluate the lyrics below against each criterion. Give your reasoning before each score.\n",
    );

    if let Some(model) = &request.model {
        out.push_str(&format!(
            "\n## MODEL SONG ({})\n\n```\n{}```\n",
            model.id, model.lyrics
        ));
    }

    out.push_str(&format!(
        "\n## CANDIDATE LYRICS ({})\n\n```\n{}```\n",
        request.candidate, request.lyrics
    ));

    if let Some(structural) = &request.metrics.structural {
        out.push_str(&format!(
            "\n## STRUCTURAL FIT\n\nStructural score: {:.3} (syllables {:.3}, rhyme {:.3}, sections {:.3})\n",
            structural.score,
            structural.syllable_alignment,
            structural.rhyme_scheme,
            structural.section_shape
        ));
    }

    if let Some(taste) = &request.metrics.taste {
        out.push_str("\n## AUTOMATED TASTE METRICS\n\n");
        out.push_str(&format!("Overall taste score: {}/100\n\n", taste.composite));
        out.push_str(&format!("- Concreteness: {}\n", taste.concreteness));
        out.push_str(&format!("- Cliché-free: {}\n", taste.cliche_freedom));
        out.push_str(&format!("- Show don't tell: {}\n", taste.show_vs_tell));
        out.push_str(&format!("- Sensory richness: {}\n", taste.sensory_richness));
        if !request.metrics.recommendations.is_empty() {
            out.push_str("\nAutomated recommendations:\n");
            for rec in &request.metrics.recommendations {
                out.push_str(&format!("- {}\n", rec));
            }
        }
    }

    out.push_str("\n---\n\n## EVALUATION CRITERIA\n\nScore each criterion 1-5.\n");
    for (i, c) in request.rubric.iter().enumerate() {
        out.push_str(&format!(
            "\n### {}. {} (1-5)\n{}\n- 5 = {}\n- 3 = {}\n- 1 = {}\n",
            i + 1,
            c.title.to_uppercase(),
            c.question,
            c.high,
            c.mid,
            c.low
        ));
    }

    out.push_str("\n---\n\n## REQUIRED OUTPUT FORMAT\n\nRespond with JSON in exactly this shape:\n\n```json\n{\n");
    for c in &request.rubric {
        out.push_str(&format!(
            "  \"{}\": {{ \"reasoning\": \"2-3 sentences\", \"score\": 3 }},\n",
            c.key
        ));
    }
    out.push_str("  \"overall_score\": 3.0,\n");
    out.push_str(&format!(
        "  \"verdict\": \"{}\",\n",
        Verdict::ALL.map(|v| v.as_str()).join("|")
    ));
    out.push_str("  \"top_3_improvements\": [\"...\", \"...\", \"...\"],\n");
    out.push_str("  \"strongest_lines\": [\"...\"],\n");
    out.push_str("  \"weakest_lines\": [\"...\"]\n}\n```\n\nVerdict meanings:\n");
    for v in &request.verdicts {
        out.push_str(&format!("- {} = {}\n", v.verdict.as_str(), v.meaning));
    }
    out
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResponse {
    pub score: i64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Judgment as returned by the judge, before validation. Extra fields
/// (examples, arc descriptions) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResponse {
    pub imagery_concreteness: CriterionResponse,
    pub originality: CriterionResponse,
    pub emotional_authenticity: CriterionResponse,
    pub narrative_coherence: CriterionResponse,
    pub craft: CriterionResponse,
    pub singability: CriterionResponse,
    #[serde(default)]
    pub overall_score: Option<f64>,
    pub verdict: String,
    #[serde(default, alias = "improvements")]
    pub top_3_improvements: Vec<String>,
    #[serde(default)]
    pub strongest_lines: Vec<String>,
    #[serde(default)]
    pub weakest_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub criterion: &'static str,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgment {
    pub criteria: Vec<CriterionScore>,
    /// Mean of the criterion scores
    pub overall_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_overall: Option<f64>,
    pub overall_disagrees: bool,
    pub verdict: Verdict,
    pub improvements: Vec<String>,
    pub strongest_lines: Vec<String>,
    pub weakest_lines: Vec<String>,
}

impl CritiqueResponse {
    fn criteria(&self) -> [&CriterionResponse; 6] {
        [
            &self.imagery_concreteness,
            &self.originality,
            &self.emotional_authenticity,
            &self.narrative_coherence,
            &self.craft,
            &self.singability,
        ]
    }

    /// Check scores and verdict against the rubric and recompute the
    /// overall average.
    pub fn validate(&self) -> Result<Judgment, JudgmentError> {
        let mut criteria = Vec::with_capacity(CRITERIA.len());
        for (rubric, response) in CRITERIA.iter().zip(self.criteria()) {
            let score = u8::try_from(response.score)
                .ok()
                .filter(|s| (1..=5).contains(s))
                .ok_or(JudgmentError::ScoreOutOfRange {
                    criterion: rubric.key,
                    score: response.score,
                })?;
            criteria.push(CriterionScore {
                criterion: rubric.key,
                score,
                reasoning: response.reasoning.clone(),
            });
        }

        let verdict = Verdict::from_name(&self.verdict)
            .ok_or_else(|| JudgmentError::UnknownVerdict(self.verdict.clone()))?;

        let overall_score =
            criteria.iter().map(|c| c.score as f64).sum::<f64>() / criteria.len() as f64;
        let overall_disagrees = self
            .overall_score
            .map_or(false, |r| (r - overall_score).abs() > OVERALL_TOLERANCE);

        Ok(Judgment {
            criteria,
            overall_score,
            reported_overall: self.overall_score,
            overall_disagrees,
            verdict,
            improvements: self.top_3_improvements.clone(),
            strongest_lines: self.strongest_lines.clone(),
            weakest_lines: self.weakest_lines.clone(),
        })
    }
}

// ============================================================================
// Judges
// ============================================================================

/// Anything that can turn a request into a rubric response.
pub trait Judge {
    fn judge(&self, request: &CritiqueRequest) -> Result<CritiqueResponse>;
}

/// A judgment produced out of band and saved as JSON.
pub struct ResponseFileJudge {
    path: PathBuf,
}

impl ResponseFileJudge {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Judge for ResponseFileJudge {
    fn judge(&self, _request: &CritiqueRequest) -> Result<CritiqueResponse> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read critique response: {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid critique response JSON: {}", self.path.display()))
    }
}

/// Request plus the validated judgment, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritiqueReport {
    pub request: CritiqueRequest,
    pub judgment: Judgment,
}

pub fn run_critique(judge: &dyn Judge, request: CritiqueRequest) -> Result<CritiqueReport> {
    let response = judge.judge(&request)?;
    let judgment = response
        .validate()
        .with_context(|| format!("Critique response for {} does not fit the rubric", request.candidate))?;
    Ok(CritiqueReport { request, judgment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lyrics;

    const RESPONSE: &str = r#"{
        "imagery_concreteness": {"reasoning": "Physical.", "score": 5, "examples": ["barn"]},
        "originality": {"reasoning": "Fresh.", "score": 4},
        "emotional_authenticity": {"score": 4},
        "narrative_coherence": {"score": 3, "arc_description": "work day"},
        "craft": {"score": 4},
        "singability": {"score": 4},
        "overall_score": 4.0,
        "verdict": "POLISH",
        "top_3_improvements": ["a", "b", "c"],
        "strongest_lines": ["She hammered nails into the barn"],
        "weakest_lines": []
    }"#;

    struct FixedJudge(&'static str);

    impl Judge for FixedJudge {
        fn judge(&self, _request: &CritiqueRequest) -> Result<CritiqueResponse> {
            Ok(serde_json::from_str(self.0)?)
        }
    }

    fn candidate(text: &str, id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            song: parse_lyrics(text, id).unwrap(),
        }
    }

    #[test]
    fn test_request_without_taste_or_model() {
        let lex = Lexicon::builtin();
        let c = candidate("[Verse]\nShe hammered nails into the barn\n", "c");
        let req = build_request(&lex, &AnalyzerConfig::default(), &c, None, false);
        assert!(req.metrics.taste.is_none());
        assert!(req.metrics.structural.is_none());
        assert!(req.model.is_none());
        assert_eq!(req.rubric.len(), 6);
        assert!(req.prompt.contains("She hammered nails into the barn"));
        assert!(!req.prompt.contains("AUTOMATED TASTE METRICS"));
        assert!(req.prompt.contains("READY|POLISH|REVISE|REJECT"));
    }

    #[test]
    fn test_request_with_taste_and_model() {
        let lex = Lexicon::builtin();
        let c = candidate("[Verse]\nShe hammered nails into the barn\n", "c");
        let m = candidate("[Verse]\nThe river runs beside the town\n", "m");
        let req = build_request(&lex, &AnalyzerConfig::default(), &c, Some(&m), true);
        assert!(req.metrics.taste.is_some());
        assert!(req.metrics.structural.is_some());
        assert_eq!(req.model.as_ref().unwrap().metrics.structural.score, 1.0);
        assert!(req.prompt.contains("AUTOMATED TASTE METRICS"));
        assert!(req.prompt.contains("MODEL SONG (m)"));
    }

    #[test]
    fn test_validate_response() {
        let response: CritiqueResponse = serde_json::from_str(RESPONSE).unwrap();
        let judgment = response.validate().unwrap();
        assert_eq!(judgment.verdict, Verdict::Polish);
        assert!((judgment.overall_score - 4.0).abs() < 1e-12);
        assert!(!judgment.overall_disagrees);
        assert_eq!(judgment.criteria[0].criterion, "imagery_concreteness");
        assert_eq!(judgment.improvements.len(), 3);
    }

    #[test]
    fn test_overall_disagreement_flagged() {
        let mut response: CritiqueResponse = serde_json::from_str(RESPONSE).unwrap();
        response.overall_score = Some(4.5);
        assert!(response.validate().unwrap().overall_disagrees);
    }

    #[test]
    fn test_score_out_of_range() {
        let mut response: CritiqueResponse = serde_json::from_str(RESPONSE).unwrap();
        response.craft.score = 6;
        assert_eq!(
            response.validate().unwrap_err(),
            JudgmentError::ScoreOutOfRange {
                criterion: "craft",
                score: 6
            }
        );
        response.craft.score = 0;
        assert!(response.validate().is_err());
    }

    #[test]
    fn test_unknown_verdict() {
        let mut response: CritiqueResponse = serde_json::from_str(RESPONSE).unwrap();
        response.verdict = "MAYBE".to_string();
        assert_eq!(
            response.validate().unwrap_err(),
            JudgmentError::UnknownVerdict("MAYBE".to_string())
        );
        response.verdict = "reject".to_string();
        assert_eq!(response.validate().unwrap().verdict, Verdict::Reject);
    }

    #[test]
    fn test_run_critique_with_judge() {
        let lex = Lexicon::builtin();
        let c = candidate("[Verse]\nShe hammered nails into the barn\n", "c");
        let req = build_request(&lex, &AnalyzerConfig::default(), &c, None, true);
        let report = run_critique(&FixedJudge(RESPONSE), req).unwrap();
        assert_eq!(report.judgment.verdict, Verdict::Polish);
        assert_eq!(report.request.candidate, "c");
    }

    #[test]
    fn test_response_file_judge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.json");
        std::fs::write(&path, RESPONSE).unwrap();
        let lex = Lexicon::builtin();
        let c = candidate("[Verse]\nShe hammered nails into the barn\n", "c");
        let req = build_request(&lex, &AnalyzerConfig::default(), &c, None, false);
        let report = run_critique(&ResponseFileJudge::new(&path), req).unwrap();
        assert_eq!(report.judgment.criteria.len(), 6);
    }
}
