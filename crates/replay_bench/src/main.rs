use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use match_result::{write_json_atomic, MatchResult};
use replay_core::{AggregateResult, AnalysisError, SamplingConfig, SkillBracket};
use runner::MatchOutcome;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod chart;
mod corpus;
mod match_result;
mod report;
mod runner;
mod summary;

#[derive(Parser)]
#[command(
    name = "replay_bench",
    about = "Per-player match analysis and skill-bracket averaging over replay corpora"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every replay in a corpus manifest and average per bracket.
    Run {
        /// Path to the corpus JSON file.
        #[arg(long)]
        corpus: PathBuf,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
        /// Worker threads (default: one per core).
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Analyze a single decoded replay and print per-player results.
    Analyze {
        /// Path to the JSON-lines replay.
        #[arg(long)]
        replay: PathBuf,
        /// Snapshot every N minutes.
        #[arg(long, default_value_t = 2)]
        interval_minutes: u64,
        /// Trailing window for action distances, in seconds.
        #[arg(long, default_value_t = 120)]
        window_seconds: u32,
        /// Also write the CSV reports into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Per-bracket aggregates plus the matches that made it into them.
struct BracketRollup<'a> {
    aggregates: BTreeMap<SkillBracket, AggregateResult>,
    stats: Vec<summary::BracketStats>,
    folded: Vec<&'a MatchOutcome>,
    failed: usize,
}

/// Fold every analyzed match into its bracket. A match that cannot be folded
/// is marked failed and left out; the rest of its bracket still aggregates.
fn aggregate_outcomes<'a>(
    outcomes: &'a [MatchOutcome],
    corpus_name: &str,
) -> Result<BracketRollup<'a>> {
    let mut by_bracket: BTreeMap<SkillBracket, Vec<&MatchOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        by_bracket.entry(outcome.bracket).or_default().push(outcome);
    }

    let mut rollup = BracketRollup {
        aggregates: BTreeMap::new(),
        stats: Vec::new(),
        folded: Vec::new(),
        failed: 0,
    };
    for (bracket, members) in by_bracket {
        let mut accumulator = replay_core::BracketAccumulator::new();
        let mut analyses = Vec::new();
        for outcome in members {
            match accumulator.fold(&outcome.analysis) {
                Ok(()) => {
                    analyses.push(&outcome.analysis);
                    rollup.folded.push(outcome);
                }
                Err(err) => {
                    rollup.failed += 1;
                    record_fold_failure(outcome, corpus_name, err);
                }
            }
        }
        if accumulator.match_count() == 0 {
            continue;
        }
        rollup
            .aggregates
            .insert(bracket, accumulator.finish(bracket)?);
        rollup
            .stats
            .push(summary::compute_bracket_stats(bracket, &analyses));
    }
    Ok(rollup)
}

fn record_fold_failure(outcome: &MatchOutcome, corpus_name: &str, err: AnalysisError) {
    let err = anyhow::Error::new(err)
        .context(format!("aggregating {}", outcome.replay_path.display()));
    tracing::warn!(
        replay = %outcome.replay_path.display(),
        error = %format!("{err:#}"),
        "match left out of its bracket"
    );
    let result_path = outcome.match_dir.join("match_result.json");
    let failed = MatchResult::failed(
        outcome.run_id.clone(),
        corpus_name,
        &outcome.replay_path,
        outcome.bracket,
        &err,
    );
    if let Err(write_err) = failed.write_atomic(&result_path) {
        tracing::warn!(
            path = %result_path.display(),
            error = %write_err,
            "could not record failed match"
        );
    }
}

fn run(corpus_path: &Path, output_dir: &Path, jobs: Option<usize>) -> Result<()> {
    let corpus = corpus::load_corpus(corpus_path)?;
    println!(
        "Loading corpus '{}': {} matches, snapshots every {} min",
        corpus.name,
        corpus.matches.len(),
        corpus.sampling.interval_minutes
    );

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("{}_{}", corpus.name, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;
    std::fs::copy(corpus_path, run_dir.join("corpus.json")).context("copying corpus file")?;
    println!("Output: {}", run_dir.display());

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("building worker pool")?;

    let results: Vec<Result<MatchOutcome>> = pool.install(|| {
        corpus
            .matches
            .par_iter()
            .enumerate()
            .map(|(index, entry)| {
                let match_dir = run_dir.join(format!("match_{index:03}_{}", entry.label()));
                runner::run_match(entry, corpus.sampling, &match_dir, &corpus.name)
            })
            .collect()
    });

    let mut outcomes = Vec::new();
    let mut failed_count = 0;
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                failed_count += 1;
                tracing::warn!(error = %format!("{err:#}"), "match failed");
            }
        }
    }
    if outcomes.is_empty() {
        anyhow::bail!("all matches failed");
    }

    let rollup = aggregate_outcomes(&outcomes, &corpus.name)?;
    failed_count += rollup.failed;
    if rollup.aggregates.is_empty() {
        anyhow::bail!("no match could be aggregated");
    }

    summary::print_summary(&corpus.name, &rollup.aggregates, &rollup.stats);

    let batch_id = Uuid::new_v4().to_string();
    let mut bracket_summary = summary::build_bracket_summary(
        &batch_id,
        &corpus.name,
        failed_count,
        &rollup.aggregates,
        &rollup.stats,
    );
    bracket_summary["run_ids"] = rollup.folded.iter().map(|o| o.run_id.as_str()).collect();
    bracket_summary["replays"] = rollup
        .folded
        .iter()
        .map(|o| o.replay_path.display().to_string())
        .collect();
    let summary_path = run_dir.join("bracket_summary.json");
    write_json_atomic(&summary_path, &bracket_summary)?;

    let charts_path = run_dir.join("charts.json");
    chart::write_chart_data(&charts_path, &chart::build_chart_data(&rollup.aggregates))?;

    println!("\nBracket summary written to {}", summary_path.display());
    println!("Chart data written to {}", charts_path.display());
    if failed_count > 0 {
        println!("{failed_count} match(es) failed; see match_result.json in their directories");
    }
    Ok(())
}

fn analyze_one(
    replay: &Path,
    sampling: SamplingConfig,
    output_dir: Option<&Path>,
) -> Result<()> {
    sampling.validate()?;
    let (analysis, skipped) = runner::analyze_replay(replay, sampling)?;
    println!(
        "\n=== {} ({} players, {} min, clock {}) ===\n",
        replay.display(),
        analysis.player_count(),
        analysis.duration_minutes(),
        analysis.clock_label()
    );
    println!(
        "{:<8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6}",
        "Player", "eAPM", "Eco", "Mil", "EcoBld", "MilBld", "Techs"
    );
    println!("{}", "-".repeat(62));
    for player in analysis.players() {
        let row = match_result::PlayerSummary::from_player(player, analysis.duration_minutes());
        let eapm = row
            .average_eapm
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        println!(
            "{:<8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6}",
            row.player,
            eapm,
            row.economic_units,
            row.military_units,
            row.economic_buildings,
            row.military_buildings,
            row.technologies_researched
        );
    }
    if skipped > 0 {
        println!("\n{skipped} malformed line(s) skipped");
    }

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory: {}", dir.display()))?;
        report::write_match_reports(dir, &analysis)?;
        println!("Reports written to {}", dir.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Run {
            corpus,
            output_dir,
            jobs,
        } => run(&corpus, &output_dir, jobs)?,
        Commands::Analyze {
            replay,
            interval_minutes,
            window_seconds,
            output_dir,
        } => analyze_one(
            &replay,
            SamplingConfig {
                interval_minutes,
                trailing_window_seconds: window_seconds,
            },
            output_dir.as_deref(),
        )?,
    }
    Ok(())
}
