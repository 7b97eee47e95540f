//! Whole-pipeline checks: parse, score, rank and write reports.

use std::fs;

use lyrics_analyzer::compare::{Candidate, ComparisonSession};
use lyrics_analyzer::config::AnalyzerConfig;
use lyrics_analyzer::lexicon::{Lexicon, SQLITE_SCHEMA};
use lyrics_analyzer::parser::parse_lyrics;
use lyrics_analyzer::report::{analyze, expand_candidates, load_song, write_report};
use lyrics_analyzer::scoring::score_songs;
use lyrics_analyzer::taste::{analyze_taste, taste_scores};
use rusqlite::{params, Connection};
use tempfile::TempDir;

const MODEL: &str = "[Verse 1]
The river runs beside the town
I walk the gravel road at night
My father left an old guitar
The window holds a yellow light

[Verse 2]
The kitchen table holds the bread
My mother sings a morning song
The dog is sleeping by the door
We keep the fire burning long
";

const CONCRETE: &str = "[Verse 1]
She hammered nails into the barn
I poured black coffee on the stove
The rough pine table cracked in two
We loaded salt and pine and drove

[Verse 2]
The musty cellar held the rain
A whisper cracked across the yard
My brother chewed a salty plum
We hung the laundry, stiff and hard
";

const ABSTRACT: &str = "[Verse 1]
I feel like love is meant to be
I know the truth is in my soul
My heart of gold is feeling sad
And I believe that love is whole

[Verse 2]
At the end of the day I know
It is what it is, I feel free
The meaning of my life is change
I think that love is meant to be
";

fn value(score: &lyrics_analyzer::taste::SubScore) -> f64 {
    score.value().expect("defined sub-score")
}

#[test]
fn test_same_form_different_craft() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let model = parse_lyrics(MODEL, "model").unwrap();
    let concrete = parse_lyrics(CONCRETE, "concrete").unwrap();
    let abstract_ = parse_lyrics(ABSTRACT, "abstract").unwrap();

    let s_concrete = score_songs(&lex, &model, &concrete, &config);
    let s_abstract = score_songs(&lex, &model, &abstract_, &config);
    assert!(s_concrete.score > 0.9, "{:?}", s_concrete);
    assert!(s_abstract.score > 0.9, "{:?}", s_abstract);
    assert!((s_concrete.score - s_abstract.score).abs() <= 0.05);

    let t_concrete = taste_scores(&lex, &concrete, &config);
    let t_abstract = taste_scores(&lex, &abstract_, &config);
    assert!(value(&t_concrete.composite) - value(&t_abstract.composite) >= 30.0);
    assert!(value(&t_concrete.concreteness) > value(&t_abstract.concreteness));
    assert!(value(&t_concrete.cliche_freedom) > value(&t_abstract.cliche_freedom));
    assert!(value(&t_concrete.show_vs_tell) > value(&t_abstract.show_vs_tell));
    assert!(value(&t_concrete.sensory_richness) > value(&t_abstract.sensory_richness));
}

#[test]
fn test_session_ranks_concrete_first() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let model = parse_lyrics(MODEL, "model").unwrap();
    let session = ComparisonSession::new(&lex, &config, "model.txt", &model);

    let candidates = vec![
        Candidate {
            id: "abstract.txt".to_string(),
            song: parse_lyrics(ABSTRACT, "abstract").unwrap(),
        },
        Candidate {
            id: "concrete.txt".to_string(),
            song: parse_lyrics(CONCRETE, "concrete").unwrap(),
        },
    ];
    let report = session.compare(&candidates);
    assert_eq!(report.model, "model.txt");
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].candidate, "concrete.txt");
    assert_eq!(report.rows[0].rank, 1);
    assert_eq!(report.rows[1].rank, 2);
    for row in &report.rows {
        assert_eq!(row.structural_score, row.metrics.structural.score);
        assert_eq!(row.taste_score, row.metrics.taste.composite);
    }
}

#[test]
fn test_taste_report_recommends_for_abstract_lyrics() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let song = parse_lyrics(ABSTRACT, "abstract").unwrap();
    let report = analyze_taste(&lex, &song, &config);

    assert!(!report.cliches.matches.is_empty());
    assert!(report.cliches.matches.iter().any(|m| m.phrase == "meant to be"));
    assert!(!report.recommendations.is_empty());

    let concrete = analyze_taste(&lex, &parse_lyrics(CONCRETE, "concrete").unwrap(), &config);
    assert!(concrete.cliches.matches.is_empty());
    assert!(concrete.recommendations.len() < report.recommendations.len());
}

#[test]
fn test_zero_verb_song_composite_from_remaining_scores() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let song = parse_lyrics("[Verse]\nThe red barn\nA cold black road\n", "still").unwrap();
    let t = taste_scores(&lex, &song, &config);

    assert!(!t.show_vs_tell.is_defined());
    let w = &config.taste;
    let expected = (w.concreteness * value(&t.concreteness)
        + w.cliche_freedom * value(&t.cliche_freedom)
        + w.sensory_richness * value(&t.sensory_richness))
        / (w.concreteness + w.cliche_freedom + w.sensory_richness);
    assert!((value(&t.composite) - expected).abs() < 1e-9);
}

#[test]
fn test_identical_text_scores_one_and_empty_scores_zero() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let model = parse_lyrics(MODEL, "model").unwrap();
    let clone = parse_lyrics(MODEL, "clone").unwrap();
    assert_eq!(score_songs(&lex, &model, &clone, &config).score, 1.0);

    let mut emptied = clone.clone();
    emptied.sections.clear();
    assert_eq!(score_songs(&lex, &model, &emptied, &config).score, 0.0);
}

#[test]
fn test_files_to_ranked_report() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("model.txt"), MODEL).unwrap();
    fs::write(dir.path().join("cand_a.txt"), ABSTRACT).unwrap();
    fs::write(dir.path().join("cand_b.txt"), CONCRETE).unwrap();
    fs::write(dir.path().join("notes.md"), "not a candidate").unwrap();

    let pattern = dir.path().join("cand_*.txt").to_string_lossy().to_string();
    let paths = expand_candidates(&[pattern]).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("cand_a.txt"));

    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let model = load_song(&dir.path().join("model.txt")).unwrap();
    let candidates: Vec<Candidate> = paths
        .iter()
        .map(|p| Candidate {
            id: p.display().to_string(),
            song: load_song(p).unwrap(),
        })
        .collect();
    let report = ComparisonSession::new(&lex, &config, "model.txt", &model).compare(&candidates);

    let json_path = dir.path().join("ranking.json");
    write_report(&report, Some(&json_path)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert!(json["rows"][0]["candidate"].as_str().unwrap().ends_with("cand_b.txt"));
    assert_eq!(json["rows"][0]["taste_score"]["status"], "defined");

    let yaml_path = dir.path().join("ranking.yaml");
    write_report(&report, Some(&yaml_path)).unwrap();
    let yaml: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&yaml_path).unwrap()).unwrap();
    assert_eq!(yaml["model"].as_str(), Some("model.txt"));
    assert!(!dir.path().join("ranking.yaml.tmp").exists());
}

#[test]
fn test_analysis_report_against_model() {
    let lex = Lexicon::builtin();
    let config = AnalyzerConfig::default();
    let model = parse_lyrics(MODEL, "model").unwrap();
    let song = parse_lyrics(CONCRETE, "concrete").unwrap();
    let report = analyze(&lex, &song, &config, Some(&model));
    assert_eq!(report.section_count, 2);
    assert_eq!(report.line_count, 8);
    assert!(report.structural.is_some());

    let structure = &report.structure;
    assert!(!structure.has_chorus);
    assert!(!structure.has_bridge);
    assert_eq!(structure.section_counts.get("verse"), Some(&2));
    let lengths: Vec<usize> = structure.section_lengths.iter().map(|s| s.lines).collect();
    assert_eq!(lengths, vec![4, 4]);
    assert_eq!(structure.avg_section_length, 4.0);

    let pos = &report.parts_of_speech;
    assert!(pos.nouns > 0 && pos.verbs > 0 && pos.adjectives > 0);
    assert_eq!(pos.noun_verb_ratio, Some(pos.nouns as f64 / pos.verbs as f64));
    assert_eq!(pos.top_nouns[0].word, "pine");
    assert_eq!(pos.top_nouns[0].count, 2);
    assert!(pos.top_verbs.iter().any(|v| v.word == "crack" && v.count == 2));

    let phonetics = &report.phonetics;
    assert!(phonetics.vowels > 0);
    assert!(phonetics.consonants > phonetics.vowels);
    assert_eq!(
        phonetics.consonant_vowel_ratio,
        Some(phonetics.consonants as f64 / phonetics.vowels as f64)
    );

    let chorus = parse_lyrics("[Verse]\nA line here\n\n[Chorus]\nSing it out\n\n[Bridge]\nOver the hill\n", "c").unwrap();
    let structure = analyze(&lex, &chorus, &config, None).structure;
    assert!(structure.has_chorus && structure.has_bridge);
    assert_eq!(structure.section_counts.get("chorus"), Some(&1));
}

#[test]
fn test_sqlite_overlay_changes_scores() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("custom_lexicon.db");
    {
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(SQLITE_SCHEMA).unwrap();
        conn.execute("INSERT INTO cliches (phrase) VALUES (?1)", params!["gravel road"])
            .unwrap();
    }

    let config = AnalyzerConfig::default();
    let model = parse_lyrics(MODEL, "model").unwrap();
    let before = taste_scores(&Lexicon::builtin(), &model, &config);

    let mut lex = Lexicon::builtin();
    let added = lex.overlay_sqlite(&db).unwrap();
    assert_eq!(added.cliches, 1);
    let after = taste_scores(&lex, &model, &config);
    assert!(value(&after.cliche_freedom) < value(&before.cliche_freedom));
}
