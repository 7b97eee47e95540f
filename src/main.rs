use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use lyrics_analyzer::compare::{Candidate, ComparisonReport, ComparisonSession};
use lyrics_analyzer::config::AnalyzerConfig;
use lyrics_analyzer::critique::{build_request, run_critique, ResponseFileJudge};
use lyrics_analyzer::lexicon::Lexicon;
use lyrics_analyzer::progress::{format_duration, set_log_only, Phase, PhaseProgress};
use lyrics_analyzer::report::{
    analyze, annotate, expand_candidates, load_song, title_from_path, write_atomic, write_report,
    AnalysisReport, Format, TasteDocument,
};
use lyrics_analyzer::safety::ensure_distinct_output;
use lyrics_analyzer::taste::analyze_taste;

#[derive(Parser, Debug)]
#[command(name = "lyrics-analyzer")]
#[command(about = "Measure lyric form against a model song and lyric craft against curated word tables")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Scoring configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite lexicon from build-lexicon, layered over the built-in tables
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    /// Worker threads for batch analysis (0 = one per core)
    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long, global = true)]
    log_only: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse marked-up lyrics into the annotated song representation
    Parse(IoArgs),

    /// Phonetic and structural metrics for one song
    Analyze(AnalyzeArgs),

    /// Concreteness, cliché, show-vs-tell and sensory metrics for one song
    Taste(IoArgs),

    /// Rank candidates against a model song
    Compare(CompareArgs),

    /// Build a critique request, or merge a judgment with --response
    Critique(CritiqueArgs),
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Lyrics (.txt), or a structured song (.json, .yaml)
    #[arg(short, long)]
    input: PathBuf,

    /// Report path (.json, .yaml); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Model song to score structural fit against
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Model song
    #[arg(long)]
    model: PathBuf,

    /// Candidate paths or file-name patterns ("drafts/*.txt")
    #[arg(long, num_args = 1.., required = true)]
    candidates: Vec<String>,

    /// Report path (.json, .yaml); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CritiqueArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Model song for context and structural fit
    #[arg(long)]
    model: Option<PathBuf>,

    /// Include taste sub-scores and recommendations in the request
    #[arg(long)]
    include_taste: bool,

    /// Judgment JSON to validate and merge into the report
    #[arg(long)]
    response: Option<PathBuf>,
}

struct Env {
    lexicon: Lexicon,
    config: AnalyzerConfig,
}

fn load_env(cli: &Cli) -> Result<Env> {
    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };

    let mut lexicon = Lexicon::builtin();
    if let Some(path) = &cli.lexicon {
        let spinner = PhaseProgress::spinner(Phase::LoadLexicon);
        let stats = lexicon.overlay_sqlite(path)?;
        spinner.finish();
        eprintln!(
            "Lexicon {}: {} pronunciations, {} ratings, {} clichés, {} verb forms",
            path.display(),
            stats.pronunciations,
            stats.concreteness,
            stats.cliches,
            stats.verb_forms
        );
    }

    Ok(Env { lexicon, config })
}

fn check_output(output: Option<&Path>, inputs: &[&Path]) -> Result<()> {
    match output {
        Some(out) => ensure_distinct_output(out, inputs),
        None => Ok(()),
    }
}

fn report_written(output: Option<&Path>) {
    if let Some(path) = output {
        eprintln!("Report written to: {}", path.display());
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_parse(env: &Env, args: &IoArgs) -> Result<()> {
    check_output(args.output.as_deref(), &[&args.input])?;
    let song = load_song(&args.input)?;
    let annotated = annotate(&env.lexicon, &song, &env.config);
    write_report(&annotated, args.output.as_deref())?;

    eprintln!("Parsed {}: {} sections, {} lines", song.title, song.sections.len(), song.line_count());
    for warning in &song.warnings {
        eprintln!("  warning: line {}: {}", warning.line, warning.message);
    }
    report_written(args.output.as_deref());
    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    eprintln!("\n{:=<60}", "");
    eprintln!("Analysis: {}", report.title);
    eprintln!("  Sections: {}  Lines: {}", report.section_count, report.line_count);
    for section in &report.sections {
        eprintln!("  [{}] scheme {} (density {:.2})", section.id, section.scheme, section.rhyme_density);
    }
    let p = &report.phonetics;
    eprintln!(
        "  Syllables/line: {:.1} (variance {:.2})",
        p.avg_syllables_per_line, p.syllable_variance
    );
    eprintln!(
        "  Meter: {:?} ({:.0}% regular)",
        p.dominant_meter,
        p.meter_regularity * 100.0
    );
    eprintln!(
        "  Dictionary coverage: {:.0}% ({} heuristic words)",
        p.dictionary_coverage * 100.0,
        p.heuristic_words
    );
    let pos = &report.parts_of_speech;
    eprintln!(
        "  Words: {} nouns, {} verbs, {} adjectives, {} adverbs",
        pos.nouns, pos.verbs, pos.adjectives, pos.adverbs
    );
    eprintln!(
        "  Chorus: {}  Bridge: {}  Avg section: {:.1} lines",
        report.structure.has_chorus, report.structure.has_bridge, report.structure.avg_section_length
    );
    if let Some(s) = &report.structural {
        eprintln!(
            "  Structural: {:.3} (syllables {:.3}, rhyme {:.3}, sections {:.3}, {} mismatches)",
            s.score,
            s.syllable_alignment,
            s.rhyme_scheme,
            s.section_shape,
            s.mismatches.len()
        );
    }
    eprintln!("{:=<60}", "");
}

fn cmd_analyze(env: &Env, args: &AnalyzeArgs) -> Result<()> {
    let mut inputs: Vec<&Path> = vec![&args.io.input];
    if let Some(model) = &args.model {
        inputs.push(model);
    }
    check_output(args.io.output.as_deref(), &inputs)?;

    let song = load_song(&args.io.input)?;
    let model = args.model.as_deref().map(load_song).transpose()?;
    let report = analyze(&env.lexicon, &song, &env.config, model.as_ref());
    write_report(&report, args.io.output.as_deref())?;
    print_analysis(&report);
    report_written(args.io.output.as_deref());
    Ok(())
}

fn cmd_taste(env: &Env, args: &IoArgs) -> Result<()> {
    check_output(args.output.as_deref(), &[&args.input])?;
    let song = load_song(&args.input)?;
    let taste = analyze_taste(&env.lexicon, &song, &env.config);

    eprintln!("\n{:=<60}", "");
    eprintln!("Taste: {}", song.title);
    eprintln!("  Composite:        {}", taste.scores.composite);
    eprintln!("  Concreteness:     {}", taste.scores.concreteness);
    eprintln!("  Cliché-freedom:   {}", taste.scores.cliche_freedom);
    eprintln!("  Show vs tell:     {}", taste.scores.show_vs_tell);
    eprintln!("  Sensory richness: {}", taste.scores.sensory_richness);
    for rec in &taste.recommendations {
        eprintln!("  - {}", rec);
    }
    eprintln!("{:=<60}", "");

    let document = TasteDocument {
        title: song.title.clone(),
        taste,
    };
    write_report(&document, args.output.as_deref())?;
    report_written(args.output.as_deref());
    Ok(())
}

fn print_ranking(report: &ComparisonReport) {
    eprintln!("\n{:=<60}", "");
    eprintln!("Model: {}", report.model);
    eprintln!("{:<5} {:<30} {:>10} {:>10}", "Rank", "Candidate", "Structural", "Taste");
    for row in &report.rows {
        eprintln!(
            "{:<5} {:<30} {:>10.3} {:>10}",
            row.rank,
            row.candidate,
            row.structural_score,
            row.taste_score.to_string()
        );
    }
    eprintln!("{:=<60}", "");
}

fn cmd_compare(env: &Env, args: &CompareArgs) -> Result<()> {
    let paths = expand_candidates(&args.candidates)?;
    let mut inputs: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();
    inputs.push(&args.model);
    check_output(args.output.as_deref(), &inputs)?;

    let start = Instant::now();
    let model = load_song(&args.model)?;
    let candidates = paths
        .iter()
        .map(|p| {
            Ok(Candidate {
                id: p.display().to_string(),
                song: load_song(p)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    eprintln!("Comparing {} candidates against {}", candidates.len(), args.model.display());

    let session = ComparisonSession::new(&env.lexicon, &env.config, &args.model.display().to_string(), &model);
    let report = session.compare(&candidates);
    write_report(&report, args.output.as_deref())?;

    print_ranking(&report);
    eprintln!("Elapsed: {}", format_duration(start.elapsed()));
    report_written(args.output.as_deref());
    Ok(())
}

fn cmd_critique(env: &Env, args: &CritiqueArgs) -> Result<()> {
    let mut inputs: Vec<&Path> = vec![&args.io.input];
    if let Some(model) = &args.model {
        inputs.push(model);
    }
    if let Some(response) = &args.response {
        inputs.push(response);
    }

    let output = match (&args.io.output, &args.response) {
        (Some(out), _) => Some(out.clone()),
        (None, None) => Some(args.io.input.with_extension("critique.md")),
        (None, Some(_)) => None,
    };
    check_output(output.as_deref(), &inputs)?;

    let candidate = Candidate {
        id: title_from_path(&args.io.input),
        song: load_song(&args.io.input)?,
    };
    let model = match &args.model {
        Some(path) => Some(Candidate {
            id: title_from_path(path),
            song: load_song(path)?,
        }),
        None => None,
    };
    let request = build_request(&env.lexicon, &env.config, &candidate, model.as_ref(), args.include_taste);

    let as_markdown = output
        .as_deref()
        .map_or(false, |p| Format::from_path(p) == Format::Markdown);

    match &args.response {
        Some(response) => {
            if as_markdown {
                bail!("A merged critique report is JSON or YAML, not Markdown");
            }
            let report = run_critique(&ResponseFileJudge::new(response), request)?;
            write_report(&report, output.as_deref())?;
            let j = &report.judgment;
            eprintln!("\n{:=<60}", "");
            eprintln!("Critique: {}", report.request.candidate);
            for c in &j.criteria {
                eprintln!("  {:<24} {}", c.criterion, c.score);
            }
            eprintln!("  Overall: {:.2}  Verdict: {}", j.overall_score, j.verdict.as_str());
            if j.overall_disagrees {
                eprintln!(
                    "  warning: reported overall {:.2} does not match the criterion mean",
                    j.reported_overall.unwrap_or_default()
                );
            }
            eprintln!("{:=<60}", "");
        }
        None => {
            match output.as_deref() {
                Some(path) if as_markdown => write_atomic(path, &request.prompt)?,
                other => write_report(&request, other)?,
            }
            if args.include_taste {
                eprintln!("Taste metrics included in the request.");
            }
        }
    }

    report_written(output.as_deref());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_log_only(cli.log_only);

    if cli.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let env = load_env(&cli)?;

    match &cli.cmd {
        Command::Parse(args) => cmd_parse(&env, args),
        Command::Analyze(args) => cmd_analyze(&env, args),
        Command::Taste(args) => cmd_taste(&env, args),
        Command::Compare(args) => cmd_compare(&env, args),
        Command::Critique(args) => cmd_critique(&env, args),
    }
}
