//! Chart hand-off: bracket-keyed series aligned on a shared time axis.
//!
//! Every line has one value per axis point; a bracket with no sample at a
//! point gets `null` so plotting tools leave a gap instead of a zero.

use anyhow::{Context, Result};
use replay_core::{AggregateResult, AveragedSnapshot, SkillBracket, Technology};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

type SeriesMetric = (&'static str, fn(&AveragedSnapshot) -> f64);

const SERIES_METRICS: [SeriesMetric; 8] = [
    ("villagers", |s| s.economic_units),
    ("military", |s| s.military_units),
    ("economic_buildings", |s| s.economic_buildings),
    ("military_buildings", |s| s.military_buildings),
    ("walls", |s| s.walls),
    ("movement_distance", |s| s.movement.magnitude()),
    ("directed_distance", |s| s.directed.magnitude()),
    ("directed_count", |s| s.directed.count),
];

/// Age-ups and the economy and military upgrades worth marking on a timeline.
const MARKER_TECHNOLOGIES: [Technology; 9] = [
    Technology::FeudalAge,
    Technology::CastleAge,
    Technology::ImperialAge,
    Technology::Loom,
    Technology::Wheelbarrow,
    Technology::HandCart,
    Technology::Fletching,
    Technology::Forging,
    Technology::Ballistics,
];

#[derive(Debug, Serialize)]
pub struct TechMarker {
    pub technology: &'static str,
    pub minute: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    pub timestamps_minutes: Vec<u32>,
    pub series: BTreeMap<&'static str, BTreeMap<SkillBracket, Vec<Option<f64>>>>,
    pub eapm: BTreeMap<SkillBracket, f64>,
    pub duration_minutes: BTreeMap<SkillBracket, u32>,
    pub technology_markers: BTreeMap<SkillBracket, Vec<TechMarker>>,
}

pub fn build_chart_data(aggregates: &BTreeMap<SkillBracket, AggregateResult>) -> ChartData {
    let axis: BTreeSet<u32> = aggregates
        .values()
        .flat_map(|result| result.series.keys().copied())
        .collect();

    let series = SERIES_METRICS
        .iter()
        .map(|(name, extract)| {
            let lines = aggregates
                .iter()
                .map(|(bracket, result)| {
                    let padded = axis
                        .iter()
                        .map(|seconds| result.series.get(seconds).map(extract))
                        .collect();
                    (*bracket, padded)
                })
                .collect();
            (*name, lines)
        })
        .collect();

    let technology_markers = aggregates
        .iter()
        .map(|(bracket, result)| {
            let markers = MARKER_TECHNOLOGIES
                .iter()
                .filter_map(|tech| {
                    result.technologies.get(tech).map(|seconds| TechMarker {
                        technology: tech.name(),
                        minute: seconds / 60.0,
                    })
                })
                .collect();
            (*bracket, markers)
        })
        .collect();

    ChartData {
        timestamps_minutes: axis.iter().map(|seconds| seconds / 60).collect(),
        series,
        eapm: aggregates
            .iter()
            .map(|(bracket, result)| (*bracket, result.average_eapm))
            .collect(),
        duration_minutes: aggregates
            .iter()
            .map(|(bracket, result)| (*bracket, result.reported_duration_minutes))
            .collect(),
        technology_markers,
    }
}

pub fn write_chart_data(path: &Path, chart: &ChartData) -> Result<()> {
    crate::match_result::write_json_atomic(path, chart)
        .with_context(|| format!("writing chart data to {}", path.display()))
}
