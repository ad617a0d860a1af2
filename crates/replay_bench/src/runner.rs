use crate::corpus::MatchEntry;
use crate::match_result::MatchResult;
use crate::report;
use anyhow::{Context, Result};
use replay_core::{MatchAnalysis, SamplingConfig, SkillBracket};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

pub struct MatchOutcome {
    pub replay_path: PathBuf,
    /// Directory holding the reports and `match_result.json`.
    pub match_dir: PathBuf,
    pub bracket: SkillBracket,
    pub analysis: MatchAnalysis,
    pub run_id: String,
}

/// Decode and analyze one replay. Returns the analysis and the number of
/// malformed lines that were skipped.
pub fn analyze_replay(path: &Path, sampling: SamplingConfig) -> Result<(MatchAnalysis, usize)> {
    let mut source = replay_source::open_replay(path)?;
    let analysis = replay_core::analyze(&mut source, sampling)
        .with_context(|| format!("analyzing {}", path.display()))?;
    Ok((analysis, source.skipped_lines()))
}

/// Analyze one corpus entry and write its reports and `match_result.json`
/// into `match_dir`. A failed match still leaves a `failed` result behind.
pub fn run_match(
    entry: &MatchEntry,
    sampling: SamplingConfig,
    match_dir: &Path,
    corpus_name: &str,
) -> Result<MatchOutcome> {
    let run_id = Uuid::new_v4().to_string();
    let bracket = entry
        .bracket()
        .with_context(|| format!("no bracket for {}", entry.path.display()))?;
    std::fs::create_dir_all(match_dir)
        .with_context(|| format!("creating match directory: {}", match_dir.display()))?;
    let result_path = match_dir.join("match_result.json");

    let start = Instant::now();
    let attempt = analyze_replay(&entry.path, sampling).and_then(|(analysis, skipped)| {
        report::write_match_reports(match_dir, &analysis)?;
        Ok((analysis, skipped))
    });

    let (analysis, skipped_lines) = match attempt {
        Ok(done) => done,
        Err(err) => {
            let failed = MatchResult::failed(run_id, corpus_name, &entry.path, bracket, &err);
            if let Err(write_err) = failed.write_atomic(&result_path) {
                tracing::warn!(
                    path = %result_path.display(),
                    error = %write_err,
                    "could not record failed match"
                );
            }
            return Err(err.context(format!("match {}", entry.path.display())));
        }
    };

    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;
    MatchResult::completed(
        run_id.clone(),
        corpus_name,
        &entry.path,
        bracket,
        &analysis,
        skipped_lines,
        wall_time_ms,
    )
    .write_atomic(&result_path)
    .context("writing match_result.json")?;

    tracing::info!(
        replay = %entry.path.display(),
        %bracket,
        duration_minutes = analysis.duration_minutes(),
        players = analysis.player_count(),
        "match analyzed"
    );

    Ok(MatchOutcome {
        replay_path: entry.path.clone(),
        match_dir: match_dir.to_path_buf(),
        bracket,
        analysis,
        run_id,
    })
}
