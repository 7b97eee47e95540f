//! Core data models for lyric analysis.
//!
//! A `Song` is an ordered list of typed `Section`s, each holding ordered
//! `Line`s of `Token`s. Songs are immutable once parsed; everything derived
//! from them (phonetics, tags, scores) lives in separate structures that are
//! recomputed from scratch whenever the text changes.

use serde::{Deserialize, Serialize};

use crate::scoring::StructuralScore;
use crate::taste::TasteScores;

// ============================================================================
// Section Kinds
// ============================================================================

/// Section type named by a marker. Unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionKind {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Outro,
    Hook,
    Refrain,
    Interlude,
    Solo,
    Coda,
    Tag,
    Other(String),
}

impl SectionKind {
    /// Resolve a marker name ("Pre-Chorus", "verse", "Breakdown").
    /// Case, spaces, hyphens and underscores are ignored for known kinds.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "intro" => SectionKind::Intro,
            "verse" => SectionKind::Verse,
            "prechorus" => SectionKind::PreChorus,
            "chorus" => SectionKind::Chorus,
            "bridge" => SectionKind::Bridge,
            "outro" => SectionKind::Outro,
            "hook" => SectionKind::Hook,
            "refrain" => SectionKind::Refrain,
            "interlude" => SectionKind::Interlude,
            "solo" => SectionKind::Solo,
            "coda" => SectionKind::Coda,
            "tag" => SectionKind::Tag,
            _ => SectionKind::Other(name.trim().to_lowercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Intro => "intro",
            SectionKind::Verse => "verse",
            SectionKind::PreChorus => "pre-chorus",
            SectionKind::Chorus => "chorus",
            SectionKind::Bridge => "bridge",
            SectionKind::Outro => "outro",
            SectionKind::Hook => "hook",
            SectionKind::Refrain => "refrain",
            SectionKind::Interlude => "interlude",
            SectionKind::Solo => "solo",
            SectionKind::Coda => "coda",
            SectionKind::Tag => "tag",
            SectionKind::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SectionKind::Other(_))
    }
}

impl From<String> for SectionKind {
    fn from(s: String) -> Self {
        SectionKind::from_name(&s)
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Song Structure
// ============================================================================

/// One word as written and its lookup form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text with surrounding punctuation removed
    pub text: String,
    /// Lowercase ASCII lookup form (see `normalize::normalize_word`)
    pub norm: String,
}

/// A lyric line with its 1-based position in the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub number: usize,
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Line {
    pub fn last_token(&self) -> Option<&Token> {
        self.tokens.last()
    }
}

/// A run of blank lines inside a section, kept as an intended rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Index (within the section) of the lyric line the gap follows
    pub after_line: usize,
    /// Number of blank source lines
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    /// Marker text as written, without brackets
    pub label: String,
    /// Occurrence of this kind in the song, starting at 1
    pub ordinal: usize,
    /// Source line of the marker
    pub marker_line: usize,
    pub lines: Vec<Line>,
    #[serde(default)]
    pub gaps: Vec<Gap>,
}

impl Section {
    /// Human label used in reports: "verse 2".
    pub fn id(&self) -> String {
        format!("{} {}", self.kind, self.ordinal)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Non-fatal parse finding (e.g. a marker with no lines under it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub warnings: Vec<ParseWarning>,
}

impl Song {
    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|s| s.lines.len()).sum()
    }

    /// Every line in song order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.sections.iter().flat_map(|s| s.lines.iter())
    }

    /// Every token in song order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines().flat_map(|l| l.tokens.iter())
    }

    /// Plain lyric text with markers, used for critique requests.
    pub fn to_marked_text(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section.label));
            for (j, line) in section.lines.iter().enumerate() {
                out.push_str(&line.text);
                out.push('\n');
                for gap in section.gaps.iter().filter(|g| g.after_line == j) {
                    for _ in 0..gap.length {
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Both top-level measurements for one song.
///
/// Structural fitness (form against the model) and taste (craft of the text
/// itself) stay in separate fields and are never blended into one number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub structural: StructuralScore,
    pub taste: TasteScores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_from_name() {
        assert_eq!(SectionKind::from_name("Verse"), SectionKind::Verse);
        assert_eq!(SectionKind::from_name("Pre-Chorus"), SectionKind::PreChorus);
        assert_eq!(SectionKind::from_name("pre chorus"), SectionKind::PreChorus);
        assert_eq!(
            SectionKind::from_name("Breakdown"),
            SectionKind::Other("breakdown".to_string())
        );
    }

    #[test]
    fn test_section_kind_serde() {
        let json = serde_json::to_string(&SectionKind::PreChorus).unwrap();
        assert_eq!(json, "\"pre-chorus\"");
        let kind: SectionKind = serde_json::from_str("\"chorus\"").unwrap();
        assert_eq!(kind, SectionKind::Chorus);
        let other: SectionKind = serde_json::from_str("\"breakdown\"").unwrap();
        assert!(!other.is_known());
    }

    #[test]
    fn test_marked_text_keeps_gaps() {
        let token = |t: &str| Token {
            text: t.to_string(),
            norm: t.to_lowercase(),
        };
        let song = Song {
            title: "t".to_string(),
            sections: vec![Section {
                kind: SectionKind::Verse,
                label: "Verse 1".to_string(),
                ordinal: 1,
                marker_line: 1,
                lines: vec![
                    Line {
                        number: 2,
                        text: "One".to_string(),
                        tokens: vec![token("One")],
                    },
                    Line {
                        number: 4,
                        text: "Two".to_string(),
                        tokens: vec![token("Two")],
                    },
                ],
                gaps: vec![Gap {
                    after_line: 0,
                    length: 1,
                }],
            }],
            warnings: vec![],
        };
        assert_eq!(song.to_marked_text(), "[Verse 1]\nOne\n\nTwo\n");
        assert_eq!(song.line_count(), 2);
        assert_eq!(song.sections[0].id(), "verse 1");
    }
}
