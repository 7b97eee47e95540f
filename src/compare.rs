//! Batch comparison of candidates against one model.
//!
//! The model's profile and metrics are computed once per session. Candidates
//! are analysed in parallel with rayon; results are collected in input order
//! and then ranked by structural score first and taste composite second, with
//! a stable sort so ties keep input order.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::lexicon::Lexicon;
use crate::models::{MetricSet, Song};
use crate::progress::{Phase, PhaseProgress};
use crate::scoring::{structural_score, SongProfile, StructuralScore};
use crate::taste::{taste_scores, SubScore};

/// A song under evaluation, named by where it came from.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub song: Song,
}

/// One ranked candidate. Structural and taste scores stay in separate
/// columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub rank: usize,
    pub candidate: String,
    pub structural_score: f64,
    pub taste_score: SubScore,
    pub concreteness: SubScore,
    pub cliche_freedom: SubScore,
    pub show_vs_tell: SubScore,
    pub sensory_richness: SubScore,
    pub metrics: MetricSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub model: String,
    pub model_metrics: MetricSet,
    pub rows: Vec<ComparisonRow>,
}

pub struct ComparisonSession<'a> {
    lexicon: &'a Lexicon,
    config: &'a AnalyzerConfig,
    model_id: String,
    model_profile: SongProfile,
    model_metrics: MetricSet,
}

impl<'a> ComparisonSession<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a AnalyzerConfig, model_id: &str, model: &Song) -> Self {
        let model_profile = SongProfile::build(lexicon, model, config);
        let model_metrics = MetricSet {
            structural: structural_score(&model_profile, &model_profile, &config.structural),
            taste: taste_scores(lexicon, model, config),
        };
        Self {
            lexicon,
            config,
            model_id: model_id.to_string(),
            model_profile,
            model_metrics,
        }
    }

    /// Baseline metrics of the model against itself.
    pub fn model_metrics(&self) -> &MetricSet {
        &self.model_metrics
    }

    pub fn structural(&self, song: &Song) -> StructuralScore {
        let profile = SongProfile::build(self.lexicon, song, self.config);
        structural_score(&self.model_profile, &profile, &self.config.structural)
    }

    pub fn evaluate(&self, song: &Song) -> MetricSet {
        MetricSet {
            structural: self.structural(song),
            taste: taste_scores(self.lexicon, song, self.config),
        }
    }

    pub fn compare(&self, candidates: &[Candidate]) -> ComparisonReport {
        let progress = PhaseProgress::new(Phase::ScoreCandidates, candidates.len() as u64);
        let metrics: Vec<MetricSet> = candidates
            .par_iter()
            .map(|c| {
                let m = self.evaluate(&c.song);
                progress.inc();
                m
            })
            .collect();
        progress.finish();

        let order = rank_order(&metrics, self.config.ranking.structural_bucket);
        let mut slots: Vec<Option<MetricSet>> = metrics.into_iter().map(Some).collect();
        let rows = order
            .into_iter()
            .enumerate()
            .filter_map(|(position, index)| {
                let metrics = slots[index].take()?;
                Some(ComparisonRow {
                    rank: position + 1,
                    candidate: candidates[index].id.clone(),
                    structural_score: metrics.structural.score,
                    taste_score: metrics.taste.composite.clone(),
                    concreteness: metrics.taste.concreteness.clone(),
                    cliche_freedom: metrics.taste.cliche_freedom.clone(),
                    show_vs_tell: metrics.taste.show_vs_tell.clone(),
                    sensory_richness: metrics.taste.sensory_richness.clone(),
                    metrics,
                })
            })
            .collect();

        ComparisonReport {
            model: self.model_id.clone(),
            model_metrics: self.model_metrics.clone(),
            rows,
        }
    }
}

/// Quantize a structural score when a bucket width is configured.
fn structural_key(score: f64, bucket: f64) -> f64 {
    if bucket > 0.0 {
        (score / bucket).floor()
    } else {
        score
    }
}

/// Undefined composites sort after every defined one.
fn compare_taste(a: &SubScore, b: &SubScore) -> Ordering {
    match (a.value(), b.value()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Indices of `metrics` in ranked order.
pub fn rank_order(metrics: &[MetricSet], bucket: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..metrics.len()).collect();
    order.sort_by(|&a, &b| {
        let (ma, mb) = (&metrics[a], &metrics[b]);
        structural_key(mb.structural.score, bucket)
            .total_cmp(&structural_key(ma.structural.score, bucket))
            .then_with(|| compare_taste(&ma.taste.composite, &mb.taste.composite))
    });
    order
}
