//! Build a SQLite lexicon from plain-text word lists.
//!
//! The result can be passed to `lyrics-analyzer --lexicon` to extend or
//! override the built-in tables.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rusqlite::{params, Connection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Instant;

use lyrics_analyzer::lexicon::{
    parse_cmudict, parse_phrases, parse_ratings, parse_senses, parse_verbs, parse_word_list, Lexicon,
    TableLoad, SQLITE_SCHEMA,
};
use lyrics_analyzer::progress::{format_duration, set_log_only, Phase, PhaseProgress};
use lyrics_analyzer::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "build-lexicon")]
#[command(about = "Build a SQLite lexicon overlay from word lists")]
struct Args {
    /// Output database (file name must contain "lexicon")
    output: PathBuf,

    /// CMU pronouncing dictionary
    #[arg(long)]
    cmudict: Option<PathBuf>,

    /// Concreteness ratings (TSV or CSV)
    #[arg(long)]
    concreteness: Option<PathBuf>,

    /// 0-based field holding the rating in the concreteness file
    #[arg(long, default_value = "1")]
    rating_column: usize,

    /// Cliché phrases, one per line
    #[arg(long)]
    cliches: Option<PathBuf>,

    /// Sense vocabularies: sense<TAB>word,word,...
    #[arg(long)]
    senses: Option<PathBuf>,

    /// Verb classes: lemma<TAB>class[<TAB>irregular,forms]
    #[arg(long)]
    verbs: Option<PathBuf>,

    /// Adjectives, one per line
    #[arg(long)]
    adjectives: Option<PathBuf>,

    /// Plain log lines instead of progress bars
    #[arg(long)]
    log_only: bool,
}

const WRITE_BATCH_SIZE: usize = 10_000;

struct TableSummary {
    table: &'static str,
    rows: usize,
    skipped: usize,
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn report_skipped<T>(path: &Path, load: &TableLoad<T>) {
    if load.skipped.is_empty() {
        return;
    }
    let preview: Vec<String> = load.skipped.iter().take(10).map(|n| n.to_string()).collect();
    eprintln!(
        "  [WARN] {:?}: skipped {} malformed lines (first: {})",
        path,
        load.skipped.len(),
        preview.join(", ")
    );
}

/// Insert rows in batches of `WRITE_BATCH_SIZE`, one transaction per batch.
fn write_rows<T>(
    conn: &mut Connection,
    table: &'static str,
    sql: &str,
    rows: &[T],
    insert: impl Fn(&Transaction, &str, &T) -> rusqlite::Result<usize>,
) -> Result<usize> {
    let progress = PhaseProgress::new(Phase::WriteTable(table), rows.len() as u64);
    let mut written = 0;
    for chunk in rows.chunks(WRITE_BATCH_SIZE) {
        let tx = conn.transaction()?;
        for row in chunk {
            written += insert(&tx, sql, row)?;
            progress.inc();
        }
        tx.commit()?;
    }
    progress.finish();
    Ok(written)
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);
    let start = Instant::now();

    let sources: Vec<&Path> = [
        &args.cmudict,
        &args.concreteness,
        &args.cliches,
        &args.senses,
        &args.verbs,
        &args.adjectives,
    ]
    .into_iter()
    .filter_map(|p| p.as_deref())
    .collect();
    if sources.is_empty() {
        bail!("Nothing to build: pass at least one of --cmudict, --concreteness, --cliches, --senses, --verbs, --adjectives");
    }
    validate_output_path(&args.output, "lexicon", &sources)?;

    if args.output.exists() {
        std::fs::remove_file(&args.output).context("Failed to remove existing output file")?;
    }

    eprintln!("Creating lexicon database: {:?}", args.output);
    let mut conn = Connection::open(&args.output).context("Failed to create output database")?;
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;",
    )?;
    conn.execute_batch(SQLITE_SCHEMA)?;

    let mut summary = Vec::new();

    if let Some(path) = &args.cmudict {
        let load = parse_cmudict(&read_source(path)?);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "pronunciations",
            "INSERT OR REPLACE INTO pronunciations (word, phonemes) VALUES (?1, ?2)",
            &load.entries,
            |tx, sql, (word, phones)| tx.prepare_cached(sql)?.execute(params![word, phones.join(" ")]),
        )?;
        summary.push(TableSummary {
            table: "pronunciations",
            rows,
            skipped: load.skipped.len(),
        });
    }

    if let Some(path) = &args.concreteness {
        let load = parse_ratings(&read_source(path)?, args.rating_column);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "concreteness",
            "INSERT OR REPLACE INTO concreteness (word, rating) VALUES (?1, ?2)",
            &load.entries,
            |tx, sql, (word, rating)| tx.prepare_cached(sql)?.execute(params![word, rating]),
        )?;
        summary.push(TableSummary {
            table: "concreteness",
            rows,
            skipped: load.skipped.len(),
        });
    }

    if let Some(path) = &args.cliches {
        let load = parse_phrases(&read_source(path)?);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "cliches",
            "INSERT OR IGNORE INTO cliches (phrase) VALUES (?1)",
            &load.entries,
            |tx, sql, phrase| tx.prepare_cached(sql)?.execute(params![phrase]),
        )?;
        summary.push(TableSummary {
            table: "cliches",
            rows,
            skipped: load.skipped.len(),
        });
    }

    if let Some(path) = &args.senses {
        let load = parse_senses(&read_source(path)?);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "senses",
            "INSERT OR IGNORE INTO senses (word, sense) VALUES (?1, ?2)",
            &load.entries,
            |tx, sql, (word, sense)| tx.prepare_cached(sql)?.execute(params![word, sense.as_str()]),
        )?;
        summary.push(TableSummary {
            table: "senses",
            rows,
            skipped: load.skipped.len(),
        });
    }

    if let Some(path) = &args.verbs {
        // Lemmas precede inflections, so the first row for a form wins.
        let load = parse_verbs(&read_source(path)?);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "verbs",
            "INSERT OR IGNORE INTO verbs (form, lemma, class) VALUES (?1, ?2, ?3)",
            &load.entries,
            |tx, sql, (form, entry)| {
                tx.prepare_cached(sql)?
                    .execute(params![form, entry.lemma, entry.class.as_str()])
            },
        )?;
        summary.push(TableSummary {
            table: "verbs",
            rows,
            skipped: load.skipped.len(),
        });
    }

    if let Some(path) = &args.adjectives {
        let load = parse_word_list(&read_source(path)?);
        report_skipped(path, &load);
        let rows = write_rows(
            &mut conn,
            "adjectives",
            "INSERT OR IGNORE INTO adjectives (word) VALUES (?1)",
            &load.entries,
            |tx, sql, word| tx.prepare_cached(sql)?.execute(params![word]),
        )?;
        summary.push(TableSummary {
            table: "adjectives",
            rows,
            skipped: load.skipped.len(),
        });
    }

    conn.execute_batch("VACUUM; ANALYZE;")?;
    drop(conn);

    // Read the file back the way the analyzer will.
    let mut check = Lexicon::builtin();
    let loaded = check
        .overlay_sqlite(&args.output)
        .context("Built lexicon failed to load")?;

    let file_size = std::fs::metadata(&args.output)?.len();
    eprintln!("\n{:=<60}", "");
    eprintln!("Lexicon complete!");
    for table in &summary {
        eprintln!(
            "  {:<16} {:>8} rows ({} skipped)",
            table.table, table.rows, table.skipped
        );
    }
    eprintln!(
        "  Overlay check: {} pronunciations, {} ratings, {} cliches, {} sense words, {} verb forms, {} adjectives",
        loaded.pronunciations,
        loaded.concreteness,
        loaded.cliches,
        loaded.sense_words,
        loaded.verb_forms,
        loaded.adjectives
    );
    eprintln!("  Output size: {:.2} MB", file_size as f64 / 1_048_576.0);
    eprintln!("  Elapsed: {}", format_duration(start.elapsed()));
    eprintln!("{:=<60}", "");

    Ok(())
}
