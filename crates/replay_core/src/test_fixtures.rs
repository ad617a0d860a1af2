//! Shared test fixtures for replay_core and downstream crates.
//!
//! `ReplayScript` builds an in-memory event stream from typed categories so
//! tests never spell raw ids. `random_match()` produces a seeded, noisy
//! stream for lifecycle tests.

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    categories, ActionKind, Building, Category, EventSource, MatchHeader, PlayerId, PlayerInfo,
    Position, RawId, ReplayEvent, StartingObject, Technology, Unit,
};

/// Error raised by a `ScriptedSource` configured to fail.
#[derive(Debug, thiserror::Error)]
#[error("scripted source failed after {delivered} events")]
pub struct ScriptedFailure {
    pub delivered: usize,
}

/// In-memory `EventSource` over a fixed event list.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    header: MatchHeader,
    events: VecDeque<ReplayEvent>,
    delivered: usize,
    fail_after: Option<usize>,
}

impl ScriptedSource {
    pub fn new(header: MatchHeader, events: Vec<ReplayEvent>) -> Self {
        Self {
            header,
            events: events.into(),
            delivered: 0,
            fail_after: None,
        }
    }

    /// Deliver `count` events, then fail on the next read.
    pub fn failing_after(header: MatchHeader, events: Vec<ReplayEvent>, count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new(header, events)
        }
    }

    /// Events not yet delivered.
    pub fn pending(&self) -> impl Iterator<Item = &ReplayEvent> {
        self.events.iter()
    }
}

impl EventSource for ScriptedSource {
    type Error = ScriptedFailure;

    fn header(&self) -> &MatchHeader {
        &self.header
    }

    fn next_event(&mut self) -> Result<Option<ReplayEvent>, Self::Error> {
        if self.fail_after == Some(self.delivered) {
            return Err(ScriptedFailure {
                delivered: self.delivered,
            });
        }
        let event = self.events.pop_front();
        if event.is_some() {
            self.delivered += 1;
        }
        Ok(event)
    }
}

pub fn raw_unit(unit: Unit) -> RawId {
    categories::raw_id_of(Category::Unit(unit)).expect("every unit has a raw id")
}

pub fn raw_building(building: Building) -> RawId {
    categories::raw_id_of(Category::Building(building)).expect("every building has a raw id")
}

pub fn raw_technology(tech: Technology) -> RawId {
    categories::raw_id_of(Category::Technology(tech)).expect("every technology has a raw id")
}

/// Header for a 120-tile map. A `Some` position places a starting town
/// center for that player.
pub fn header_with_players(players: &[(u8, Option<Position>)]) -> MatchHeader {
    MatchHeader {
        map_size: 120,
        players: players
            .iter()
            .map(|(id, town_center)| PlayerInfo {
                id: PlayerId(*id),
                name: Some(format!("player{id}")),
                objects: town_center
                    .iter()
                    .map(|position| StartingObject {
                        object_id: raw_building(Building::TownCenter),
                        position: *position,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Fluent builder for a scripted match.
#[derive(Debug, Clone)]
pub struct ReplayScript {
    header: MatchHeader,
    events: Vec<ReplayEvent>,
}

impl ReplayScript {
    pub fn new(players: &[(u8, Option<Position>)]) -> Self {
        Self {
            header: header_with_players(players),
            events: Vec::new(),
        }
    }

    pub fn event(mut self, event: ReplayEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn queue(self, player: u8, unit: Unit) -> Self {
        self.event(ReplayEvent::UnitQueued {
            player: PlayerId(player),
            unit_id: raw_unit(unit),
        })
    }

    pub fn build(self, player: u8, building: Building, position: Position) -> Self {
        self.event(ReplayEvent::BuildingCompleted {
            player: PlayerId(player),
            building_id: raw_building(building),
            position,
        })
    }

    pub fn research(self, player: u8, tech: Technology) -> Self {
        self.event(ReplayEvent::TechnologyResearched {
            player: PlayerId(player),
            technology_id: raw_technology(tech),
        })
    }

    pub fn action(self, player: u8, action: ActionKind, position: Position) -> Self {
        self.event(ReplayEvent::PlayerAction {
            player: PlayerId(player),
            action,
            position,
        })
    }

    pub fn advance_ms(self, delta_ms: u64) -> Self {
        self.event(ReplayEvent::TimeAdvance { delta_ms })
    }

    pub fn advance_seconds(self, seconds: u64) -> Self {
        self.advance_ms(seconds * 1000)
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn into_source(self) -> ScriptedSource {
        ScriptedSource::new(self.header, self.events)
    }
}

/// Seeded RNG for deterministic randomized fixtures.
pub fn make_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

const RANDOM_ACTIONS: [ActionKind; 5] = [
    ActionKind::Move,
    ActionKind::Patrol,
    ActionKind::Formation,
    ActionKind::Order,
    ActionKind::AttackMove,
];

/// Two-player match `minutes` long with random production,
/// research, actions and untracked noise ids, advanced in 0.5 to 3 second
/// steps. The clock ends exactly on `minutes`.
pub fn random_match(rng: &mut impl Rng, minutes: u64) -> ScriptedSource {
    let mut script = ReplayScript::new(&[
        (1, Some(Position::new(20.0, 20.0))),
        (2, Some(Position::new(100.0, 100.0))),
    ]);
    let end_ms = minutes * 60_000;
    let mut elapsed_ms = 0;
    while elapsed_ms < end_ms {
        let player = rng.gen_range(1..=2);
        script = match rng.gen_range(0..6) {
            0 => script.event(ReplayEvent::UnitQueued {
                player: PlayerId(player),
                // Mix of tracked and untracked ids.
                unit_id: rng.gen_range(0..800),
            }),
            1 => script.event(ReplayEvent::BuildingCompleted {
                player: PlayerId(player),
                building_id: rng.gen_range(0..800),
                position: Position::new(rng.gen_range(0.0..120.0), rng.gen_range(0.0..120.0)),
            }),
            2 => script.event(ReplayEvent::TechnologyResearched {
                player: PlayerId(player),
                technology_id: rng.gen_range(0..700),
            }),
            3 | 4 => script.action(
                player,
                RANDOM_ACTIONS[rng.gen_range(0..RANDOM_ACTIONS.len())],
                Position::new(rng.gen_range(0.0..120.0), rng.gen_range(0.0..120.0)),
            ),
            _ => script.event(ReplayEvent::Chat {
                player: Some(PlayerId(player)),
                text: "wp".to_string(),
            }),
        };
        let step = rng.gen_range(500..3_000).min(end_ms - elapsed_ms);
        elapsed_ms += step;
        script = script.advance_ms(step);
    }
    script.into_source()
}
