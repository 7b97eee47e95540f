//! Typed errors for the places where input is rejected outright:
//! malformed lyric text, invalid scoring configuration and an external
//! judgment that breaks the rubric.
//!
//! Everything else flows through `anyhow` with context attached at the
//! call site (file paths, table names).

use thiserror::Error;

/// Lyric text that cannot be turned into a song.
///
/// Line numbers are 1-based and refer to the raw input text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("input contains no lyric text")]
    Empty,

    #[error("line {line}: lyric text appears before any section marker: {text:?}")]
    TextBeforeMarker { line: usize, text: String },

    #[error("line {line}: section marker is never closed: {text:?}")]
    UnterminatedMarker { line: usize, text: String },

    #[error("line {line}: malformed section marker: {text:?}")]
    MalformedMarker { line: usize, text: String },
}

impl ParseError {
    /// Line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Empty => None,
            ParseError::TextBeforeMarker { line, .. }
            | ParseError::UnterminatedMarker { line, .. }
            | ParseError::MalformedMarker { line, .. } => Some(*line),
        }
    }
}

/// A configuration value outside its allowed range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weight {name} must be finite and non-negative, got {value}")]
    NegativeWeight { name: String, value: f64 },

    #[error("{group} weights sum to zero")]
    ZeroWeights { group: &'static str },

    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A critique response that does not fit the rubric.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgmentError {
    #[error("criterion {criterion} scored {score}, expected 1..=5")]
    ScoreOutOfRange { criterion: &'static str, score: i64 },

    #[error("unknown verdict {0:?}, expected READY, POLISH, REVISE or REJECT")]
    UnknownVerdict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_line() {
        let err = ParseError::TextBeforeMarker {
            line: 3,
            text: "hello".to_string(),
        };
        assert_eq!(err.line(), Some(3));
        assert_eq!(ParseError::Empty.line(), None);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::OutOfRange {
            name: "rhyme.near_rhyme_threshold",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert!(err.to_string().contains("rhyme.near_rhyme_threshold"));
    }
}
