//! One full pass over a decoded match recording.
//!
//! Order of operations per event:
//! 1. Look up (or lazily create) the player the event belongs to.
//! 2. Route production, research and action events to that player's tracker.
//! 3. On time-advance, move the clock and let the sampler snapshot everyone.
//!
//! At end of input the duration is stamped on every player before anything
//! can ask for a rate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    categories, AnalysisError, EventSource, MatchHeader, PeriodicSampler, PlayerId, PlayerState,
    ReplayEvent, SamplingConfig,
};

/// How the events of a match were handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventTally {
    /// Routed to a player tracker (resolved or not).
    pub routed: u64,
    pub time_advances: u64,
    /// Recognized kinds with no tracked effect: chat, resignation, gather point.
    pub ignored: u64,
    pub unknown: u64,
}

/// Completed analysis of one match. Every player's duration is set.
#[derive(Debug, Clone)]
pub struct MatchAnalysis {
    map_size: u32,
    players: BTreeMap<PlayerId, PlayerState>,
    elapsed_ms: u64,
    duration_minutes: u32,
    sampled_marks: Vec<u64>,
    tally: EventTally,
}

impl MatchAnalysis {
    pub fn map_size(&self) -> u32 {
        self.map_size
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Total match length in whole minutes, rounded up.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Minute marks at which snapshots were taken, including 0.
    pub fn sampled_marks(&self) -> &[u64] {
        &self.sampled_marks
    }

    pub fn tally(&self) -> EventTally {
        self.tally
    }

    /// Elapsed match clock as `mm:ss`.
    pub fn clock_label(&self) -> String {
        format_clock(self.elapsed_ms)
    }
}

pub fn format_clock(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Event router for a single match. Owns the players exclusively for the
/// duration of the pass.
#[derive(Debug)]
pub struct MatchAnalyzer {
    map_size: u32,
    sampler: PeriodicSampler,
    players: BTreeMap<PlayerId, PlayerState>,
    tally: EventTally,
}

impl MatchAnalyzer {
    /// Seed players from the header. A town center among a player's starting
    /// objects fixes the starting position; otherwise it is deferred until
    /// one is built.
    pub fn new(header: &MatchHeader, config: SamplingConfig) -> Result<Self, AnalysisError> {
        let sampler = PeriodicSampler::new(config)?;
        let mut players = BTreeMap::new();
        for info in &header.players {
            let player = players
                .entry(info.id)
                .or_insert_with(|| PlayerState::new(info.id));
            let town_center = info.objects.iter().find(|object| {
                categories::resolve_building(object.object_id).is_some_and(|b| b.is_town_center())
            });
            if let Some(object) = town_center {
                player.assign_starting_position(object.position);
            }
        }
        Ok(Self {
            map_size: header.map_size,
            sampler,
            players,
            tally: EventTally::default(),
        })
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        self.players.entry(id).or_insert_with(|| {
            tracing::debug!(player = %id, "player first observed mid-stream");
            PlayerState::new(id)
        })
    }

    pub fn apply(&mut self, event: ReplayEvent) {
        let elapsed_seconds = self.sampler.elapsed_seconds();
        match event {
            ReplayEvent::UnitQueued { player, unit_id } => {
                self.player_mut(player).record_unit_queued(unit_id);
                self.tally.routed += 1;
            }
            ReplayEvent::BuildingCompleted {
                player,
                building_id,
                position,
            } => {
                self.player_mut(player)
                    .record_building_completed(building_id, position);
                self.tally.routed += 1;
            }
            ReplayEvent::TechnologyResearched {
                player,
                technology_id,
            } => {
                self.player_mut(player)
                    .record_technology_researched(technology_id, elapsed_seconds);
                self.tally.routed += 1;
            }
            ReplayEvent::PlayerAction {
                player,
                action,
                position,
            } => {
                self.player_mut(player)
                    .record_action(position, action, elapsed_seconds);
                self.tally.routed += 1;
            }
            ReplayEvent::TimeAdvance { delta_ms } => {
                self.sampler.tick(delta_ms, self.players.values_mut());
                self.tally.time_advances += 1;
            }
            ReplayEvent::GatherPoint { .. }
            | ReplayEvent::Chat { .. }
            | ReplayEvent::Resign { .. } => {
                self.tally.ignored += 1;
            }
            ReplayEvent::Unknown => {
                tracing::debug!(
                    clock = %format_clock(self.sampler.elapsed_ms()),
                    "skipping unknown event kind"
                );
                self.tally.unknown += 1;
            }
        }
    }

    /// Close the pass: stamp the duration on every player.
    pub fn finish(mut self) -> MatchAnalysis {
        let duration_minutes = self.sampler.finalize(self.players.values_mut());
        MatchAnalysis {
            map_size: self.map_size,
            players: self.players,
            elapsed_ms: self.sampler.elapsed_ms(),
            duration_minutes,
            sampled_marks: self.sampler.recorded_marks(),
            tally: self.tally,
        }
    }
}

/// Consume `source` to the end of input and return the finished analysis.
/// A source error aborts the pass immediately.
pub fn analyze<S: EventSource>(
    mut source: S,
    config: SamplingConfig,
) -> Result<MatchAnalysis, AnalysisError> {
    let mut analyzer = MatchAnalyzer::new(source.header(), config)?;
    while let Some(event) = source
        .next_event()
        .map_err(|err| AnalysisError::Source(Box::new(err)))?
    {
        analyzer.apply(event);
    }
    let analysis = analyzer.finish();
    tracing::debug!(
        players = analysis.player_count(),
        duration_minutes = analysis.duration_minutes(),
        unknown = analysis.tally().unknown,
        "match analysis complete"
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{header_with_players, ReplayScript, ScriptedSource};
    use crate::{ActionKind, Building, Position, Snapshot, Technology, Unit};

    #[test]
    fn test_header_town_center_seeds_start() {
        let header = header_with_players(&[(1, Some(Position::new(20.0, 30.0))), (2, None)]);
        let analyzer = MatchAnalyzer::new(&header, SamplingConfig::default()).unwrap();
        let analysis = analyzer.finish();
        assert_eq!(
            analysis.player(PlayerId(1)).unwrap().starting_position(),
            Some(Position::new(20.0, 30.0))
        );
        assert_eq!(analysis.player(PlayerId(2)).unwrap().starting_position(), None);
    }

    #[test]
    fn test_players_created_lazily() {
        let source = ReplayScript::new(&[])
            .queue(3, Unit::Villager)
            .advance_seconds(60)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        assert_eq!(analysis.player_count(), 1);
        assert_eq!(
            analysis.player(PlayerId(3)).unwrap().units().get(Unit::Villager),
            1
        );
    }

    #[test]
    fn test_snapshots_reflect_state_up_to_mark() {
        let source = ReplayScript::new(&[(1, None)])
            .queue(1, Unit::Villager)
            .advance_seconds(120)
            .queue(1, Unit::Villager)
            .queue(1, Unit::Knight)
            .advance_seconds(120)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        let series = analysis.player(PlayerId(1)).unwrap().snapshots();
        assert_eq!(series[&0], Snapshot::default());
        assert_eq!(series[&120].units.economic, 1);
        assert_eq!(series[&120].units.military, 0);
        assert_eq!(series[&240].units.economic, 2);
        assert_eq!(series[&240].units.military, 1);
        assert_eq!(analysis.sampled_marks(), &[0, 2, 4]);
    }

    #[test]
    fn test_events_before_first_mark_do_not_touch_origin() {
        let source = ReplayScript::new(&[(1, None)])
            .queue(1, Unit::Villager)
            .advance_seconds(10)
            .queue(1, Unit::Villager)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        let series = analysis.player(PlayerId(1)).unwrap().snapshots();
        assert_eq!(series.len(), 1);
        assert_eq!(series[&0], Snapshot::default());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_research_uses_match_clock() {
        let source = ReplayScript::new(&[(1, None)])
            .advance_seconds(95)
            .research(1, Technology::Loom)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        let player = analysis.player(PlayerId(1)).unwrap();
        assert_eq!(player.technologies().get(Technology::Loom), Some(95.0));
    }

    #[test]
    fn test_ignored_and_unknown_events_are_skipped() {
        let source = ReplayScript::new(&[(1, None)])
            .event(ReplayEvent::Chat {
                player: Some(PlayerId(1)),
                text: "gl hf".to_string(),
            })
            .event(ReplayEvent::Unknown)
            .event(ReplayEvent::GatherPoint {
                player: PlayerId(1),
                position: Position::new(1.0, 1.0),
            })
            .queue(1, Unit::Villager)
            .event(ReplayEvent::Resign { player: PlayerId(1) })
            .advance_seconds(61)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        let tally = analysis.tally();
        assert_eq!(tally.ignored, 3);
        assert_eq!(tally.unknown, 1);
        assert_eq!(tally.routed, 1);
        assert_eq!(analysis.duration_minutes(), 2);
        assert_eq!(analysis.player(PlayerId(1)).unwrap().eapm_count(), 0);
    }

    #[test]
    fn test_building_in_stream_sets_deferred_start() {
        let source = ReplayScript::new(&[(1, None)])
            .build(1, Building::TownCenter, Position::new(70.0, 80.0))
            .action(1, ActionKind::Move, Position::new(80.0, 80.0))
            .advance_seconds(120)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        let player = analysis.player(PlayerId(1)).unwrap();
        assert_eq!(player.starting_position(), Some(Position::new(70.0, 80.0)));
        // An action at t=0 falls outside the open window (0, 120).
        assert_eq!(player.snapshots()[&120].movement.count, 0);
    }

    #[test]
    fn test_duration_stamped_and_eapm_available() {
        let source = ReplayScript::new(&[(1, None)])
            .advance_seconds(30)
            .action(1, ActionKind::Move, Position::new(1.0, 1.0))
            .action(1, ActionKind::Order, Position::new(1.0, 1.0))
            .advance_seconds(60)
            .into_source();
        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        assert_eq!(analysis.duration_minutes(), 2);
        assert_eq!(analysis.clock_label(), "01:30");
        let player = analysis.player(PlayerId(1)).unwrap();
        assert!((player.average_eapm().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_source_error_aborts() {
        let header = header_with_players(&[(1, None)]);
        let source = ScriptedSource::failing_after(header, Vec::new(), 0);
        let result = analyze(source, SamplingConfig::default());
        assert!(matches!(result, Err(AnalysisError::Source(_))));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(61_999), "01:01");
        assert_eq!(format_clock(3_600_000), "60:00");
    }
}
