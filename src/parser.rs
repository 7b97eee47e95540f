//! Raw marked-up lyrics → `Song`.
//!
//! Sections open with a marker line, either bracketed (`[Verse 1]`,
//! `[Chorus: Both]`) or slashed (`/verse-1/`). Chord annotations and tab
//! lines are dropped, blank lines inside a section become `Gap`s, and a
//! marker with nothing under it produces an empty section plus a warning.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::models::{Gap, Line, ParseWarning, Section, SectionKind, Song, Token};
use crate::normalize::{
    is_chord_line, normalize_punctuation, normalize_word, split_words, strip_chords, trim_surface,
};

/// Section name: a letter, then letters, digits, spaces, and - _ ' & .
static MARKER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9 _\-'&.]*$").unwrap());

/// Trailing section number: "Verse 2", "verse-2", "Chorus2".
static MARKER_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-_]*(\d+)$").unwrap());

struct Marker {
    label: String,
    kind: SectionKind,
    number: Option<usize>,
}

enum LineKind {
    Blank,
    Marker(Marker),
    Lyric(String),
    /// Lyric text behind a bracketed performance note: "[Spoken] hey there"
    Directed { direction: String, text: String },
}

fn classify(raw: &str, number: usize) -> Result<LineKind, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(LineKind::Blank);
    }

    if let Some(rest) = trimmed.strip_prefix('[') {
        let Some(close) = rest.find(']') else {
            return Err(ParseError::UnterminatedMarker {
                line: number,
                text: trimmed.to_string(),
            });
        };
        let inner = &rest[..close];
        if !inner.is_empty() && is_chord_line(inner) {
            // "[Am]" alone or "[Am]Walking down": chords, not a marker
            return Ok(lyric_or_blank(trimmed));
        }
        if close + 1 != rest.len() {
            let direction = inner.trim();
            return match lyric_or_blank(&rest[close + 1..]) {
                LineKind::Lyric(text) if !direction.is_empty() => Ok(LineKind::Directed {
                    direction: direction.to_string(),
                    text,
                }),
                _ => Err(ParseError::MalformedMarker {
                    line: number,
                    text: trimmed.to_string(),
                }),
            };
        }
        return parse_marker(inner, trimmed, number).map(LineKind::Marker);
    }

    if let Some(rest) = trimmed.strip_prefix('/') {
        let Some(inner) = rest.strip_suffix('/') else {
            return Err(ParseError::UnterminatedMarker {
                line: number,
                text: trimmed.to_string(),
            });
        };
        return parse_marker(inner, trimmed, number).map(LineKind::Marker);
    }

    Ok(lyric_or_blank(trimmed))
}

fn lyric_or_blank(line: &str) -> LineKind {
    match strip_chords(&normalize_punctuation(line)) {
        Some(text) if split_words(&text).iter().any(|w| !normalize_word(w).is_empty()) => {
            LineKind::Lyric(text)
        }
        _ => LineKind::Blank,
    }
}

/// Validate a marker body. A credit after a colon ("Chorus: Both") is kept
/// in the label but ignored for the kind; a trailing number is the
/// section's ordinal.
fn parse_marker(inner: &str, raw: &str, number: usize) -> Result<Marker, ParseError> {
    let label = inner.trim();
    let name = label.split(':').next().unwrap_or("").trim();
    if !MARKER_NAME.is_match(name) {
        return Err(ParseError::MalformedMarker {
            line: number,
            text: raw.to_string(),
        });
    }
    let explicit = MARKER_NUMBER
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| *n > 0);
    let base = MARKER_NUMBER.replace(name, "").trim().to_string();
    let (name, explicit) = if base.is_empty() {
        (name.to_string(), None)
    } else {
        (base, explicit)
    };
    Ok(Marker {
        label: label.to_string(),
        kind: SectionKind::from_name(&name),
        number: explicit,
    })
}

/// Ordinal of the next section of `kind`: the marker's own number, or how
/// many sections of that kind have been seen so far.
fn assign_ordinal(counts: &mut FxHashMap<SectionKind, usize>, marker: &Marker) -> usize {
    let seen = counts.entry(marker.kind.clone()).or_insert(0);
    *seen += 1;
    marker.number.unwrap_or(*seen)
}

/// Split a cleaned lyric line into tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    split_words(text)
        .into_iter()
        .filter_map(|w| {
            let norm = normalize_word(w);
            if norm.is_empty() {
                None
            } else {
                Some(Token {
                    text: trim_surface(w).to_string(),
                    norm,
                })
            }
        })
        .collect()
}

/// Reject songs without a single lyric line and add the empty-section
/// warnings.
fn finish_song(title: &str, sections: Vec<Section>, mut warnings: Vec<ParseWarning>) -> Result<Song, ParseError> {
    if sections.iter().all(|s| s.is_empty()) {
        return Err(ParseError::Empty);
    }
    warnings.extend(sections.iter().filter(|s| s.is_empty()).map(|s| ParseWarning {
        line: s.marker_line,
        message: format!("section [{}] has no lines", s.label),
    }));
    warnings.sort_by_key(|w| w.line);
    Ok(Song {
        title: title.to_string(),
        sections,
        warnings,
    })
}

/// Parse marked-up lyric text into a song.
pub fn parse_lyrics(text: &str, title: &str) -> Result<Song, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut sections: Vec<Section> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut counts: FxHashMap<SectionKind, usize> = FxHashMap::default();
    let mut pending_blank = 0usize;

    for (i, raw) in text.lines().enumerate() {
        let number = i + 1;
        let cleaned = match classify(raw, number)? {
            LineKind::Blank => {
                pending_blank += 1;
                continue;
            }
            LineKind::Marker(marker) => {
                let ordinal = assign_ordinal(&mut counts, &marker);
                sections.push(Section {
                    kind: marker.kind,
                    label: marker.label,
                    ordinal,
                    marker_line: number,
                    lines: Vec::new(),
                    gaps: Vec::new(),
                });
                pending_blank = 0;
                continue;
            }
            LineKind::Lyric(cleaned) => cleaned,
            LineKind::Directed { direction, text } => {
                warnings.push(ParseWarning {
                    line: number,
                    message: format!("direction [{}] dropped from lyric line", direction),
                });
                text
            }
        };

        let Some(section) = sections.last_mut() else {
            return Err(ParseError::TextBeforeMarker {
                line: number,
                text: raw.trim().to_string(),
            });
        };
        if pending_blank > 0 && !section.lines.is_empty() {
            section.gaps.push(Gap {
                after_line: section.lines.len() - 1,
                length: pending_blank,
            });
        }
        pending_blank = 0;
        section.lines.push(Line {
            number,
            tokens: tokenize(&cleaned),
            text: cleaned,
        });
    }

    finish_song(title, sections, warnings)
}

/// Re-derive everything a structured song carries besides its text.
///
/// Kinds and ordinals come from the section labels exactly as they would
/// from marker lines, line text is cleaned and tokenized again, gaps that
/// no longer sit between two lines are dropped, and warnings are
/// regenerated. A song with no lyric lines is `ParseError::Empty`.
pub fn rebuild_song(song: Song) -> Result<Song, ParseError> {
    let mut counts: FxHashMap<SectionKind, usize> = FxHashMap::default();
    let mut sections = Vec::with_capacity(song.sections.len());

    for section in song.sections {
        let raw = format!("[{}]", section.label);
        let marker = parse_marker(&section.label, &raw, section.marker_line)?;
        let ordinal = assign_ordinal(&mut counts, &marker);

        // kept[j]: index of old line j in the rebuilt section
        let mut kept: Vec<Option<usize>> = Vec::with_capacity(section.lines.len());
        let mut lines = Vec::with_capacity(section.lines.len());
        for line in section.lines {
            match lyric_or_blank(&line.text) {
                LineKind::Lyric(text) => {
                    kept.push(Some(lines.len()));
                    lines.push(Line {
                        number: line.number,
                        tokens: tokenize(&text),
                        text,
                    });
                }
                _ => kept.push(None),
            }
        }

        let mut gaps: Vec<Gap> = Vec::new();
        for gap in section.gaps {
            if gap.length == 0 || gap.after_line >= kept.len() {
                continue;
            }
            let after = kept[..=gap.after_line].iter().rev().find_map(|k| *k);
            let Some(after_line) = after.filter(|a| a + 1 < lines.len()) else {
                continue;
            };
            match gaps.iter_mut().find(|g| g.after_line == after_line) {
                Some(existing) => existing.length += gap.length,
                None => gaps.push(Gap {
                    after_line,
                    length: gap.length,
                }),
            }
        }
        gaps.sort_by_key(|g| g.after_line);

        sections.push(Section {
            kind: marker.kind,
            label: marker.label,
            ordinal,
            marker_line: section.marker_line,
            lines,
            gaps,
        });
    }

    finish_song(&song.title, sections, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[Verse 1]\nThe river runs beside the town\nI walk the gravel road at night\n\n\nMy father left an old guitar\n\n[Chorus]\nOh the window holds a yellow light\n/verse-2/\nThe kitchen table holds the bread\n";

    #[test]
    fn test_parse_sections() {
        let song = parse_lyrics(SAMPLE, "sample").unwrap();
        assert_eq!(song.title, "sample");
        assert_eq!(song.sections.len(), 3);
        assert_eq!(song.sections[0].kind, SectionKind::Verse);
        assert_eq!(song.sections[0].ordinal, 1);
        assert_eq!(song.sections[0].label, "Verse 1");
        assert_eq!(song.sections[1].kind, SectionKind::Chorus);
        assert_eq!(song.sections[2].kind, SectionKind::Verse);
        assert_eq!(song.sections[2].ordinal, 2);
        assert_eq!(song.line_count(), 5);
        assert!(song.warnings.is_empty());
    }

    #[test]
    fn test_inner_gap_kept_trailing_dropped() {
        let song = parse_lyrics(SAMPLE, "sample").unwrap();
        assert_eq!(
            song.sections[0].gaps,
            vec![Gap {
                after_line: 1,
                length: 2
            }]
        );
        assert!(song.sections[1].gaps.is_empty());
    }

    #[test]
    fn test_line_numbers_and_tokens() {
        let song = parse_lyrics(SAMPLE, "sample").unwrap();
        let line = &song.sections[0].lines[2];
        assert_eq!(line.number, 6);
        let norms: Vec<&str> = line.tokens.iter().map(|t| t.norm.as_str()).collect();
        assert_eq!(norms, vec!["my", "father", "left", "an", "old", "guitar"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_lyrics("", "x"), Err(ParseError::Empty));
        assert_eq!(parse_lyrics("  \n\t\n", "x"), Err(ParseError::Empty));
    }

    #[test]
    fn test_text_before_marker() {
        let err = parse_lyrics("hello there\n[Verse]\nline\n", "x").unwrap_err();
        assert_eq!(
            err,
            ParseError::TextBeforeMarker {
                line: 1,
                text: "hello there".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_marker() {
        let err = parse_lyrics("[Verse 1\nline\n", "x").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedMarker { line: 1, .. }));
        let err = parse_lyrics("/verse-1\nline\n", "x").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedMarker { line: 1, .. }));
    }

    #[test]
    fn test_malformed_marker() {
        for text in ["[]\nline\n", "[Verse!]\nline\n", "[#1]\nline\n", "//\nline\n", "[Verse]]\nline\n"] {
            let err = parse_lyrics(text, "x").unwrap_err();
            assert!(matches!(err, ParseError::MalformedMarker { line: 1, .. }), "{}", text);
        }
    }

    #[test]
    fn test_empty_section_warns() {
        let song = parse_lyrics("[Intro]\n[Verse]\nline one\n", "x").unwrap();
        assert_eq!(song.sections.len(), 2);
        assert!(song.sections[0].is_empty());
        assert_eq!(song.warnings.len(), 1);
        assert_eq!(song.warnings[0].line, 1);
    }

    #[test]
    fn test_chords_are_stripped() {
        let song = parse_lyrics("[Am]\n[Verse]\nAm   G   C\n[Am]Walking [G]down the road\n", "x").unwrap();
        assert_eq!(song.sections.len(), 1);
        assert_eq!(song.sections[0].lines.len(), 1);
        assert_eq!(song.sections[0].lines[0].text, "Walking down the road");
    }

    #[test]
    fn test_free_form_and_credit_markers() {
        let song = parse_lyrics("[Breakdown]\nline\n[Chorus: Both]\nline\n[Pre-Chorus]\nline\n", "x").unwrap();
        assert_eq!(song.sections[0].kind, SectionKind::Other("breakdown".to_string()));
        assert_eq!(song.sections[1].kind, SectionKind::Chorus);
        assert_eq!(song.sections[1].label, "Chorus: Both");
        assert_eq!(song.sections[2].kind, SectionKind::PreChorus);
    }

    #[test]
    fn test_marker_numbers_set_ordinals() {
        let song = parse_lyrics("[Chorus 2]\nline\n[Chorus 1]\nline\n[Verse 2]\nline\n[Chorus]\nline\n", "x").unwrap();
        let ordinals: Vec<usize> = song.sections.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![2, 1, 2, 3]);
        assert_eq!(song.sections[2].id(), "verse 2");
    }

    #[test]
    fn test_markers_without_lines_are_empty() {
        assert_eq!(parse_lyrics("[Intro]\n\n[Verse]\n", "x"), Err(ParseError::Empty));
    }

    #[test]
    fn test_inline_direction_kept_as_lyric() {
        let song = parse_lyrics("[Verse]\n[Spoken] hey there\nsecond line\n", "x").unwrap();
        assert_eq!(song.sections.len(), 1);
        assert_eq!(song.sections[0].lines[0].text, "hey there");
        assert_eq!(song.sections[0].lines[0].number, 2);
        assert_eq!(song.warnings.len(), 1);
        assert_eq!(song.warnings[0].line, 2);
        assert!(song.warnings[0].message.contains("Spoken"));

        let err = parse_lyrics("[Spoken] hey there\n[Verse]\nline\n", "x").unwrap_err();
        assert!(matches!(err, ParseError::TextBeforeMarker { line: 1, .. }));
    }

    #[test]
    fn test_rebuild_song_rederives_structure() {
        let mut song = parse_lyrics(SAMPLE, "sample").unwrap();
        let expected = song.clone();
        song.sections[2].ordinal = 1;
        song.sections[1].kind = SectionKind::Bridge;
        song.sections[0].lines[0].text = "New Words".to_string();
        song.sections[0].lines[0].tokens.clear();
        song.sections[0].gaps.push(Gap {
            after_line: 9,
            length: 1,
        });
        song.warnings.push(ParseWarning {
            line: 1,
            message: "stale".to_string(),
        });

        let rebuilt = rebuild_song(song).unwrap();
        assert_eq!(rebuilt.sections[2].ordinal, 2);
        assert_eq!(rebuilt.sections[1].kind, SectionKind::Chorus);
        assert_eq!(rebuilt.sections[0].lines[0].tokens[0].norm, "new");
        assert_eq!(rebuilt.sections[0].gaps, expected.sections[0].gaps);
        assert!(rebuilt.warnings.is_empty());
        assert_eq!(rebuilt.sections[1..], expected.sections[1..]);
    }

    #[test]
    fn test_rebuild_song_gap_follows_dropped_line() {
        let mut song = parse_lyrics("[Verse]\none\n\ntwo\nthree\n", "x").unwrap();
        song.sections[0].lines[1].text = "   ".to_string();
        let rebuilt = rebuild_song(song).unwrap();
        assert_eq!(rebuilt.sections[0].lines.len(), 2);
        assert_eq!(
            rebuilt.sections[0].gaps,
            vec![Gap {
                after_line: 0,
                length: 1
            }]
        );
    }

    #[test]
    fn test_rebuild_song_rejects_empty() {
        let song = Song {
            title: "x".to_string(),
            sections: vec![],
            warnings: vec![],
        };
        assert_eq!(rebuild_song(song), Err(ParseError::Empty));

        let mut song = parse_lyrics("[Intro]\n[Verse]\nline\n", "x").unwrap();
        assert_eq!(song.warnings.len(), 1);
        song.sections[1].lines.clear();
        assert_eq!(rebuild_song(song), Err(ParseError::Empty));
    }
}
