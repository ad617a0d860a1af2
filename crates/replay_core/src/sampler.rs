//! Drives when live player state is frozen into snapshots.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, PlayerState};

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Snapshot every N whole minutes of match time.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Look-back length for the action-distance aggregates.
    #[serde(default = "default_trailing_window_seconds")]
    pub trailing_window_seconds: u32,
}

fn default_interval_minutes() -> u64 {
    2
}

fn default_trailing_window_seconds() -> u32 {
    120
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            trailing_window_seconds: default_trailing_window_seconds(),
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.interval_minutes == 0 {
            return Err(AnalysisError::InvalidSampling {
                interval_minutes: self.interval_minutes,
            });
        }
        Ok(())
    }
}

/// Elapsed-time clock plus the set of minute marks already sampled.
///
/// Several time-advance records can land inside the same minute; the mark set
/// makes sure each due minute is captured exactly once.
#[derive(Debug, Clone)]
pub struct PeriodicSampler {
    config: SamplingConfig,
    elapsed_ms: u64,
    recorded_marks: AHashSet<u64>,
}

impl PeriodicSampler {
    pub fn new(config: SamplingConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        // Minute 0 is the all-zero origin of every series.
        let mut recorded_marks = AHashSet::new();
        recorded_marks.insert(0);
        Ok(Self {
            config,
            elapsed_ms: 0,
            recorded_marks,
        })
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }

    /// Advance the clock. Returns the snapshot key (seconds) when the current
    /// minute mark is due and has not been sampled yet.
    pub fn advance(&mut self, delta_ms: u64) -> Option<u32> {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        let mark = self.elapsed_ms / MS_PER_MINUTE;
        if !mark.is_multiple_of(self.config.interval_minutes) || !self.recorded_marks.insert(mark) {
            return None;
        }
        Some(u32::try_from(mark * 60).unwrap_or(u32::MAX))
    }

    /// Advance the clock and, when a mark is due, snapshot every player.
    pub fn tick<'a>(
        &mut self,
        delta_ms: u64,
        players: impl IntoIterator<Item = &'a mut PlayerState>,
    ) -> Option<u32> {
        let key = self.advance(delta_ms)?;
        for player in players {
            player.record_snapshot(key, self.config.trailing_window_seconds);
        }
        tracing::trace!(seconds = key, "snapshot recorded");
        Some(key)
    }

    /// Match duration in whole minutes, rounded up.
    pub fn duration_minutes(&self) -> u32 {
        u32::try_from(self.elapsed_ms.div_ceil(MS_PER_MINUTE)).unwrap_or(u32::MAX)
    }

    /// Stamp the final duration on every player. Must run before any rate
    /// metric is read.
    pub fn finalize<'a>(&self, players: impl IntoIterator<Item = &'a mut PlayerState>) -> u32 {
        let minutes = self.duration_minutes();
        for player in players {
            player.set_duration_minutes(minutes);
        }
        minutes
    }

    /// Sampled minute marks in ascending order (always starts with 0).
    pub fn recorded_marks(&self) -> Vec<u64> {
        let mut marks: Vec<u64> = self.recorded_marks.iter().copied().collect();
        marks.sort_unstable();
        marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    fn sampler() -> PeriodicSampler {
        PeriodicSampler::new(SamplingConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SamplingConfig {
            interval_minutes: 0,
            ..SamplingConfig::default()
        };
        assert!(matches!(
            PeriodicSampler::new(config),
            Err(AnalysisError::InvalidSampling { .. })
        ));
    }

    #[test]
    fn test_marks_fire_on_interval_only() {
        let mut s = sampler();
        assert_eq!(s.advance(30_000), None);
        assert_eq!(s.advance(40_000), None); // minute 1
        assert_eq!(s.advance(60_000), Some(120)); // minute 2
        assert_eq!(s.advance(60_000), None); // minute 3
        assert_eq!(s.advance(60_000), Some(240)); // minute 4
    }

    #[test]
    fn test_same_minute_sampled_once() {
        let mut s = sampler();
        assert_eq!(s.advance(120_000), Some(120));
        assert_eq!(s.advance(1_000), None);
        assert_eq!(s.advance(1_000), None);
        assert_eq!(s.recorded_marks(), vec![0, 2]);
    }

    #[test]
    fn test_jumped_marks_not_backfilled() {
        let mut s = sampler();
        assert_eq!(s.advance(120_000), Some(120));
        assert_eq!(s.advance(360_000), Some(480));
        assert_eq!(s.recorded_marks(), vec![0, 2, 8]);
    }

    #[test]
    fn test_minute_zero_never_resampled() {
        let mut s = sampler();
        assert_eq!(s.advance(500), None);
        assert_eq!(s.advance(0), None);
    }

    #[test]
    fn test_tick_snapshots_all_players() {
        let mut s = sampler();
        let mut players = vec![PlayerState::new(PlayerId(1)), PlayerState::new(PlayerId(2))];
        players[0].record_unit_queued(83);
        assert_eq!(s.tick(120_000, players.iter_mut()), Some(120));
        assert_eq!(players[0].snapshots()[&120].units.economic, 1);
        assert_eq!(players[1].snapshots()[&120].units.economic, 0);
        assert_eq!(s.tick(1_000, players.iter_mut()), None);
        assert_eq!(players[0].snapshots().len(), 2);
    }

    #[test]
    fn test_duration_rounds_up() {
        let mut s = sampler();
        assert_eq!(s.duration_minutes(), 0);
        s.advance(60_000);
        assert_eq!(s.duration_minutes(), 1);
        s.advance(1);
        assert_eq!(s.duration_minutes(), 2);
    }

    #[test]
    fn test_finalize_stamps_players() {
        let mut s = sampler();
        s.advance(125_000);
        let mut players = vec![PlayerState::new(PlayerId(1))];
        assert_eq!(s.finalize(players.iter_mut()), 3);
        assert_eq!(players[0].duration_minutes(), Some(3));
    }
}
