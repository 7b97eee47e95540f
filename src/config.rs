//! Scoring configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! documented weighting: syllables 0.5 / rhyme 0.3 / shape 0.2 for the
//! structural score and an equal split for the four taste sub-scores.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub structural: StructuralWeights,
    pub taste: TasteWeights,
    pub rhyme: RhymeConfig,
    pub cliche: ClicheConfig,
    pub ranking: RankingConfig,
}

impl AnalyzerConfig {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AnalyzerConfig =
            toml::from_str(text).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check every weight and threshold against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weights(
            "structural",
            &[
                ("structural.syllable_alignment", self.structural.syllable_alignment),
                ("structural.rhyme_scheme", self.structural.rhyme_scheme),
                ("structural.section_shape", self.structural.section_shape),
            ],
        )?;
        check_weights(
            "taste",
            &[
                ("taste.concreteness", self.taste.concreteness),
                ("taste.cliche_freedom", self.taste.cliche_freedom),
                ("taste.show_vs_tell", self.taste.show_vs_tell),
                ("taste.sensory_richness", self.taste.sensory_richness),
            ],
        )?;

        if let Some(threshold) = self.rhyme.near_rhyme_threshold {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    name: "rhyme.near_rhyme_threshold",
                    value: threshold,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        if !(2..=12).contains(&self.cliche.max_window) {
            return Err(ConfigError::OutOfRange {
                name: "cliche.max_window",
                value: self.cliche.max_window as f64,
                min: 2.0,
                max: 12.0,
            });
        }

        let bucket = self.ranking.structural_bucket;
        if !(bucket.is_finite() && (0.0..=1.0).contains(&bucket)) {
            return Err(ConfigError::OutOfRange {
                name: "ranking.structural_bucket",
                value: bucket,
                min: 0.0,
                max: 1.0,
            });
        }

        Ok(())
    }
}

fn check_weights(group: &'static str, weights: &[(&str, f64)]) -> Result<(), ConfigError> {
    for (name, value) in weights {
        if !value.is_finite() || *value < 0.0 {
            return Err(ConfigError::NegativeWeight {
                name: name.to_string(),
                value: *value,
            });
        }
    }
    if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
        return Err(ConfigError::ZeroWeights { group });
    }
    Ok(())
}

/// Weights of the three structural sub-comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StructuralWeights {
    pub syllable_alignment: f64,
    pub rhyme_scheme: f64,
    pub section_shape: f64,
}

impl Default for StructuralWeights {
    fn default() -> Self {
        Self {
            syllable_alignment: 0.5,
            rhyme_scheme: 0.3,
            section_shape: 0.2,
        }
    }
}

/// Weights of the four taste sub-scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TasteWeights {
    pub concreteness: f64,
    pub cliche_freedom: f64,
    pub show_vs_tell: f64,
    pub sensory_richness: f64,
}

impl Default for TasteWeights {
    fn default() -> Self {
        Self {
            concreteness: 0.25,
            cliche_freedom: 0.25,
            show_vs_tell: 0.25,
            sensory_richness: 0.25,
        }
    }
}

/// Rhyme matching. Exact phonemic identity unless a near-rhyme threshold is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RhymeConfig {
    /// Normalized Levenshtein similarity (0, 1] at which two rhyme keys of
    /// the same kind share a scheme letter.
    pub near_rhyme_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClicheConfig {
    /// Longest phrase window, in tokens, scanned for cliché matches.
    #[serde(default = "default_max_window")]
    pub max_window: usize,
}

fn default_max_window() -> usize {
    6
}

impl Default for ClicheConfig {
    fn default() -> Self {
        Self {
            max_window: default_max_window(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RankingConfig {
    /// Width of structural score buckets used as the primary sort key.
    /// 0 sorts on the exact structural score.
    pub structural_bucket: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.structural.syllable_alignment, 0.5);
        assert_eq!(config.structural.rhyme_scheme, 0.3);
        assert_eq!(config.structural.section_shape, 0.2);
        assert_eq!(config.taste.concreteness, 0.25);
        assert_eq!(config.cliche.max_window, 6);
        assert!(config.rhyme.near_rhyme_threshold.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = AnalyzerConfig::from_toml("").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AnalyzerConfig::from_toml(
            "[taste]\nconcreteness = 0.4\ncliche_freedom = 0.4\n\n[rhyme]\nnear_rhyme_threshold = 0.75\n",
        )
        .unwrap();
        assert_eq!(config.taste.concreteness, 0.4);
        assert_eq!(config.taste.show_vs_tell, 0.25);
        assert_eq!(config.rhyme.near_rhyme_threshold, Some(0.75));
        assert_eq!(config.structural, StructuralWeights::default());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let result = AnalyzerConfig::from_toml("[structural]\nrhyme_scheme = -0.1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let config = AnalyzerConfig {
            taste: TasteWeights {
                concreteness: 0.0,
                cliche_freedom: 0.0,
                show_vs_tell: 0.0,
                sensory_richness: 0.0,
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroWeights { group: "taste" })
        );
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(AnalyzerConfig::from_toml("[rhyme]\nnear_rhyme_threshold = 0.0\n").is_err());
        assert!(AnalyzerConfig::from_toml("[cliche]\nmax_window = 1\n").is_err());
        assert!(AnalyzerConfig::from_toml("[ranking]\nstructural_bucket = 2.0\n").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(AnalyzerConfig::from_toml("[taste]\nrhythm = 1.0\n").is_err());
    }
}
