use crate::match_result::PlayerSummary;
use replay_core::{AggregateResult, MatchAnalysis, SkillBracket};
use serde::Serialize;
use std::collections::BTreeMap;

type Extractor = (&'static str, fn(&PlayerSummary) -> Option<f64>);

/// Per-player figures summarized across a bracket. `None` means the figure is
/// undefined for that player and is left out of the spread.
const EXTRACTORS: [Extractor; 7] = [
    ("average_eapm", |p| p.average_eapm),
    ("economic_units", |p| Some(f64::from(p.economic_units))),
    ("military_units", |p| Some(f64::from(p.military_units))),
    ("economic_buildings", |p| Some(f64::from(p.economic_buildings))),
    ("military_buildings", |p| Some(f64::from(p.military_buildings))),
    ("walls", |p| Some(f64::from(p.walls))),
    ("technologies_researched", |p| Some(p.technologies_researched as f64)),
];

#[derive(Debug, Serialize)]
pub struct BracketStats {
    pub bracket: SkillBracket,
    pub match_count: usize,
    pub player_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

/// Spread of the match duration and the per-player final figures over
/// every match in one bracket.
pub fn compute_bracket_stats(bracket: SkillBracket, matches: &[&MatchAnalysis]) -> BracketStats {
    let players: Vec<PlayerSummary> = matches
        .iter()
        .flat_map(|analysis| {
            analysis
                .players()
                .map(|player| PlayerSummary::from_player(player, analysis.duration_minutes()))
        })
        .collect();

    let durations: Vec<f64> = matches
        .iter()
        .map(|analysis| f64::from(analysis.duration_minutes()))
        .collect();
    let mut metrics = vec![compute_metric_summary("duration_minutes", &durations)];
    metrics.extend(EXTRACTORS.iter().map(|(name, extract)| {
        let values: Vec<f64> = players.iter().filter_map(extract).collect();
        compute_metric_summary(name, &values)
    }));

    BracketStats {
        bracket,
        match_count: matches.len(),
        player_count: players.len(),
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    if values.is_empty() {
        return MetricSummary {
            name: name.to_string(),
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            stddev: 0.0,
        };
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let stddev = variance.sqrt();

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev,
    }
}

/// Contents of `bracket_summary.json`.
pub fn build_bracket_summary(
    batch_id: &str,
    corpus_name: &str,
    failed_count: usize,
    aggregates: &BTreeMap<SkillBracket, AggregateResult>,
    stats: &[BracketStats],
) -> serde_json::Value {
    let brackets: serde_json::Map<String, serde_json::Value> = aggregates
        .iter()
        .map(|(bracket, result)| {
            let spread = stats.iter().find(|s| s.bracket == *bracket);
            (
                bracket.to_string(),
                serde_json::json!({
                    "aggregate": result,
                    "spread": spread.map(|s| &s.metrics),
                }),
            )
        })
        .collect();
    serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": batch_id,
        "corpus_name": corpus_name,
        "match_count": aggregates.values().map(|r| r.match_count).sum::<usize>(),
        "failed_count": failed_count,
        "brackets": brackets,
    })
}

pub fn print_summary(
    corpus_name: &str,
    aggregates: &BTreeMap<SkillBracket, AggregateResult>,
    stats: &[BracketStats],
) {
    let match_count: usize = aggregates.values().map(|r| r.match_count).sum();
    println!(
        "\n=== {} ({} matches, {} brackets) ===\n",
        corpus_name,
        match_count,
        aggregates.len()
    );
    println!(
        "{:<8} {:>7} {:>7} {:>9} {:>8} {:>7}",
        "Bracket", "Matches", "Players", "Duration", "eAPM", "Techs"
    );
    println!("{}", "-".repeat(52));
    for (bracket, result) in aggregates {
        println!(
            "{:<8} {:>7} {:>7} {:>9} {:>8.2} {:>7}",
            bracket.to_string(),
            result.match_count,
            result.player_count,
            format!("{}m", result.reported_duration_minutes),
            result.average_eapm,
            result.technologies.len()
        );
    }

    for bracket_stats in stats {
        println!("\n--- {} ---", bracket_stats.bracket);
        println!(
            "{:<26} {:>8} {:>8} {:>8} {:>8}",
            "Metric", "Mean", "Min", "Max", "StdDev"
        );
        for metric in &bracket_stats.metrics {
            println!(
                "{:<26} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                metric.name, metric.mean, metric.min, metric.max, metric.stddev
            );
        }
    }
}
