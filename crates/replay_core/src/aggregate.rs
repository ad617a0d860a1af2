//! Cross-match averaging within one skill bracket.
//!
//! Sums are accumulated in a `BracketAccumulator` and divided exactly once in
//! `finish`. Series are merged per timestamp with a per-key contribution
//! count, so a short match simply stops contributing after its last mark.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{ActionDistance, AnalysisError, MatchAnalysis, SkillBracket, Snapshot, Technology};

/// Averaged trailing-window aggregate for one action class.
///
/// Every field is averaged over all contributing snapshots. A snapshot whose
/// window held no action contributes its zero mean.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AveragedDistance {
    pub mean_x: f64,
    pub mean_y: f64,
    pub count: f64,
}

impl AveragedDistance {
    pub fn magnitude(&self) -> f64 {
        self.mean_x.hypot(self.mean_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AveragedSnapshot {
    pub economic_units: f64,
    pub military_units: f64,
    pub economic_buildings: f64,
    pub military_buildings: f64,
    pub walls: f64,
    pub movement: AveragedDistance,
    pub directed: AveragedDistance,
    /// Player series that had a snapshot at this timestamp.
    pub contributors: u32,
}

/// Close-out of one bracket. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub bracket: SkillBracket,
    pub match_count: usize,
    pub player_count: usize,
    pub average_duration_minutes: f64,
    /// Mean duration rounded up to whole minutes.
    pub reported_duration_minutes: u32,
    pub average_eapm: f64,
    /// Keyed by elapsed seconds.
    pub series: BTreeMap<u32, AveragedSnapshot>,
    /// Mean completion time (seconds) over the players who researched it.
    pub technologies: BTreeMap<Technology, f64>,
}

#[derive(Debug, Default)]
struct DistanceSum {
    sum_x: f64,
    sum_y: f64,
    count: u64,
}

impl DistanceSum {
    fn add(&mut self, distance: &ActionDistance) {
        self.sum_x += distance.mean_x;
        self.sum_y += distance.mean_y;
        self.count += u64::from(distance.count);
    }

    fn finish(&self, contributors: u32) -> AveragedDistance {
        let n = f64::from(contributors);
        AveragedDistance {
            mean_x: self.sum_x / n,
            mean_y: self.sum_y / n,
            count: self.count as f64 / n,
        }
    }
}

#[derive(Debug, Default)]
struct SnapshotSum {
    economic_units: u64,
    military_units: u64,
    economic_buildings: u64,
    military_buildings: u64,
    walls: u64,
    movement: DistanceSum,
    directed: DistanceSum,
    contributors: u32,
}

impl SnapshotSum {
    fn add(&mut self, snapshot: &Snapshot) {
        self.economic_units += u64::from(snapshot.units.economic);
        self.military_units += u64::from(snapshot.units.military);
        self.economic_buildings += u64::from(snapshot.buildings.economic);
        self.military_buildings += u64::from(snapshot.buildings.military);
        self.walls += u64::from(snapshot.buildings.walls);
        self.movement.add(&snapshot.movement);
        self.directed.add(&snapshot.directed);
        self.contributors += 1;
    }

    fn finish(&self) -> AveragedSnapshot {
        let n = f64::from(self.contributors);
        AveragedSnapshot {
            economic_units: self.economic_units as f64 / n,
            military_units: self.military_units as f64 / n,
            economic_buildings: self.economic_buildings as f64 / n,
            military_buildings: self.military_buildings as f64 / n,
            walls: self.walls as f64 / n,
            movement: self.movement.finish(self.contributors),
            directed: self.directed.finish(self.contributors),
            contributors: self.contributors,
        }
    }
}

/// Running sums for one bracket: construct, `fold` each match, `finish`.
#[derive(Debug, Default)]
pub struct BracketAccumulator {
    match_count: usize,
    duration_sum: u64,
    player_count: usize,
    eapm_sum: f64,
    series: BTreeMap<u32, SnapshotSum>,
    technologies: BTreeMap<Technology, (f64, u32)>,
}

impl BracketAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// Add one finished match. Fails if any player's eAPM cannot be computed,
    /// leaving the accumulator unchanged.
    pub fn fold(&mut self, analysis: &MatchAnalysis) -> Result<(), AnalysisError> {
        let eapm = analysis
            .players()
            .map(crate::PlayerState::average_eapm)
            .collect::<Result<Vec<f64>, _>>()?;

        self.match_count += 1;
        self.duration_sum += u64::from(analysis.duration_minutes());
        self.player_count += eapm.len();
        self.eapm_sum += eapm.iter().sum::<f64>();

        for player in analysis.players() {
            for (seconds, snapshot) in player.snapshots() {
                self.series.entry(*seconds).or_default().add(snapshot);
            }
            for (tech, time) in player.technologies().recorded() {
                let entry = self.technologies.entry(tech).or_insert((0.0, 0));
                entry.0 += time;
                entry.1 += 1;
            }
        }
        Ok(())
    }

    pub fn finish(self, bracket: SkillBracket) -> Result<AggregateResult, AnalysisError> {
        if self.match_count == 0 {
            return Err(AnalysisError::EmptyBracket { bracket });
        }
        let average_duration_minutes = self.duration_sum as f64 / self.match_count as f64;
        let reported_duration_minutes =
            u32::try_from(self.duration_sum.div_ceil(self.match_count as u64)).unwrap_or(u32::MAX);
        let average_eapm = if self.player_count == 0 {
            0.0
        } else {
            self.eapm_sum / self.player_count as f64
        };
        let series = self
            .series
            .iter()
            .map(|(seconds, sum)| (*seconds, sum.finish()))
            .collect();
        let technologies = self
            .technologies
            .iter()
            .map(|(tech, (sum, players))| (*tech, sum / f64::from(*players)))
            .collect();
        tracing::debug!(
            %bracket,
            matches = self.match_count,
            players = self.player_count,
            "bracket aggregated"
        );
        Ok(AggregateResult {
            bracket,
            match_count: self.match_count,
            player_count: self.player_count,
            average_duration_minutes,
            reported_duration_minutes,
            average_eapm,
            series,
            technologies,
        })
    }
}

/// Fold every match of one bracket and close out.
pub fn aggregate_bracket(
    bracket: SkillBracket,
    matches: &[MatchAnalysis],
) -> Result<AggregateResult, AnalysisError> {
    let mut accumulator = BracketAccumulator::new();
    for analysis in matches {
        accumulator.fold(analysis)?;
    }
    accumulator.finish(bracket)
}
