//! Progress display for the analyzer's long-running phases.
//!
//! Interactive runs get an indicatif bar (or a spinner when the amount of
//! work is unknown). With `--log-only` nothing is drawn; each phase logs a
//! start line, `[phase] n/total (pct%)` at every tenth of the work, and a
//! finish line with its elapsed time, which reads well in `tail -f`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Work the analyzer reports progress for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Overlaying a SQLite lexicon on the built-in tables
    LoadLexicon,
    /// Scoring candidates against the model
    ScoreCandidates,
    /// Writing one table of a lexicon database
    WriteTable(&'static str),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::LoadLexicon => f.write_str("lexicon"),
            Phase::ScoreCandidates => f.write_str("candidates"),
            Phase::WriteTable(table) => write!(f, "table {}", table),
        }
    }
}

/// Progress of one phase. Safe to tick from rayon workers.
pub struct PhaseProgress {
    phase: Phase,
    total: Option<u64>,
    interval: u64,
    done: AtomicU64,
    started: Instant,
    bar: ProgressBar,
}

impl PhaseProgress {
    /// A phase with a known amount of work.
    pub fn new(phase: Phase, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self::start(phase, Some(total), bar)
    }

    /// A phase that runs to completion without countable steps.
    pub fn spinner(phase: Phase) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        if !is_log_only() {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        Self::start(phase, None, bar)
    }

    fn start(phase: Phase, total: Option<u64>, bar: ProgressBar) -> Self {
        if is_log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
            match total {
                Some(n) => eprintln!("[{}] started ({} items)", phase, n),
                None => eprintln!("[{}] started", phase),
            }
        }
        bar.set_message(phase.to_string());
        Self {
            phase,
            total,
            interval: total.map_or(1, |n| (n / 10).max(1)),
            done: AtomicU64::new(0),
            started: Instant::now(),
            bar,
        }
    }

    pub fn inc(&self) {
        let current = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.bar.inc(1);
        if let (true, Some(total)) = (is_log_only(), self.total) {
            if total > 0 && (current % self.interval == 0 || current == total) {
                let pct = 100.0 * current as f64 / total as f64;
                eprintln!("[{}] {}/{} ({:.1}%)", self.phase, current, total, pct);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
        if is_log_only() {
            eprintln!("[{}] done in {}", self.phase, format_duration(self.started.elapsed()));
        }
    }

    pub fn position(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::LoadLexicon.to_string(), "lexicon");
        assert_eq!(Phase::ScoreCandidates.to_string(), "candidates");
        assert_eq!(Phase::WriteTable("verbs").to_string(), "table verbs");
    }

    #[test]
    fn test_phase_progress_counts() {
        let progress = PhaseProgress::new(Phase::ScoreCandidates, 3);
        progress.inc();
        progress.inc();
        assert_eq!(progress.position(), 2);
        assert_eq!(progress.interval, 1);
        progress.finish();

        let spinner = PhaseProgress::spinner(Phase::LoadLexicon);
        assert_eq!(spinner.total, None);
        spinner.finish();
    }
}
