use anyhow::Context;
use replay_core::{MatchAnalysis, PlayerState, SkillBracket};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const MATCH_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Completed,
    Failed,
}

/// Machine-readable record of one match pass, written next to its reports.
#[derive(Debug, Serialize)]
pub struct MatchResult {
    pub match_schema_version: u32,
    pub match_status: MatchStatus,
    pub run_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub corpus_name: String,
    pub replay_path: String,
    pub bracket: SkillBracket,
    pub map_size: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub clock: Option<String>,
    pub player_count: usize,
    pub players: Vec<PlayerSummary>,
    pub unknown_events: u64,
    pub skipped_lines: usize,
    pub wall_time_ms: u64,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayerSummary {
    pub player: u8,
    pub average_eapm: Option<f64>,
    pub economic_units: u32,
    pub military_units: u32,
    pub economic_buildings: u32,
    pub military_buildings: u32,
    pub walls: u32,
    pub technologies_researched: usize,
}

impl PlayerSummary {
    /// Final cumulative totals. `duration_minutes` is the snapshot key past
    /// the end of play, so the window is irrelevant here.
    pub fn from_player(player: &PlayerState, duration_minutes: u32) -> Self {
        let last = player.snapshot(duration_minutes.saturating_mul(60), 0);
        Self {
            player: player.id().0,
            average_eapm: player.average_eapm().ok(),
            economic_units: last.units.economic,
            military_units: last.units.military,
            economic_buildings: last.buildings.economic,
            military_buildings: last.buildings.military,
            walls: last.buildings.walls,
            technologies_researched: player.technologies().recorded().count(),
        }
    }
}

impl MatchResult {
    pub fn completed(
        run_id: String,
        corpus_name: &str,
        replay_path: &Path,
        bracket: SkillBracket,
        analysis: &MatchAnalysis,
        skipped_lines: usize,
        wall_time_ms: u64,
    ) -> Self {
        let duration = analysis.duration_minutes();
        Self {
            match_schema_version: MATCH_SCHEMA_VERSION,
            match_status: MatchStatus::Completed,
            run_id,
            git_sha: git_sha(),
            git_dirty: git_dirty(),
            corpus_name: corpus_name.to_string(),
            replay_path: replay_path.display().to_string(),
            bracket,
            map_size: Some(analysis.map_size()),
            duration_minutes: Some(duration),
            clock: Some(analysis.clock_label()),
            player_count: analysis.player_count(),
            players: analysis
                .players()
                .map(|player| PlayerSummary::from_player(player, duration))
                .collect(),
            unknown_events: analysis.tally().unknown,
            skipped_lines,
            wall_time_ms,
            error_message: None,
        }
    }

    pub fn failed(
        run_id: String,
        corpus_name: &str,
        replay_path: &Path,
        bracket: SkillBracket,
        error: &anyhow::Error,
    ) -> Self {
        Self {
            match_schema_version: MATCH_SCHEMA_VERSION,
            match_status: MatchStatus::Failed,
            run_id,
            git_sha: git_sha(),
            git_dirty: git_dirty(),
            corpus_name: corpus_name.to_string(),
            replay_path: replay_path.display().to_string(),
            bracket,
            map_size: None,
            duration_minutes: None,
            clock: None,
            player_count: 0,
            players: Vec::new(),
            unknown_events: 0,
            skipped_lines: 0,
            wall_time_ms: 0,
            error_message: Some(format!("{error:#}")),
        }
    }

    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        write_json_atomic(path, self)
    }
}

/// Write JSON atomically: write to `.tmp` then rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serializing json")?;
    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming to {}", path.display()))?;
    Ok(())
}

pub fn git_sha() -> String {
    env!("GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("GIT_DIRTY") == "true"
}
