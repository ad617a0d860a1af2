//! Type definitions for `replay_core`.
//!
//! Identifiers, map positions, the decoded event vocabulary and the match
//! header handed over by the replay decoder.

use serde::{Deserialize, Serialize};

use crate::RawId;

// ---------------------------------------------------------------------------
// Identifiers and geometry
// ---------------------------------------------------------------------------

/// Player slot number as recorded in the replay (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Absolute per-axis displacement from `from`.
    pub fn displacement_from(self, from: Position) -> (f64, f64) {
        (
            (f64::from(self.x) - f64::from(from.x)).abs(),
            (f64::from(self.y) - f64::from(from.y)).abs(),
        )
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Coordinate-bearing player commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Patrol,
    Formation,
    Order,
    AttackMove,
}

/// Coarse split of action kinds used by the trailing-window aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Repositioning without a target.
    Movement,
    /// Targeted orders and attack-moves.
    Directed,
}

impl ActionKind {
    pub fn class(self) -> ActionClass {
        match self {
            ActionKind::Move | ActionKind::Patrol | ActionKind::Formation => ActionClass::Movement,
            ActionKind::Order | ActionKind::AttackMove => ActionClass::Directed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub position: Position,
    pub kind: ActionKind,
    pub elapsed_seconds: f64,
}

// ---------------------------------------------------------------------------
// Decoded replay input
// ---------------------------------------------------------------------------

/// One decoded record from a match recording.
///
/// Kinds the tracker has no use for (chat, resignation, gather points) are
/// still modelled so the stream can be consumed to the end; anything the
/// decoder emits that this vocabulary does not know becomes `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    UnitQueued {
        player: PlayerId,
        unit_id: RawId,
    },
    BuildingCompleted {
        player: PlayerId,
        building_id: RawId,
        position: Position,
    },
    TechnologyResearched {
        player: PlayerId,
        technology_id: RawId,
    },
    PlayerAction {
        player: PlayerId,
        action: ActionKind,
        position: Position,
    },
    TimeAdvance {
        delta_ms: u64,
    },
    GatherPoint {
        player: PlayerId,
        position: Position,
    },
    Chat {
        #[serde(default)]
        player: Option<PlayerId>,
        #[serde(default)]
        text: String,
    },
    Resign {
        player: PlayerId,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingObject {
    pub object_id: RawId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub objects: Vec<StartingObject>,
}

/// Static metadata decoded once from the recording header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHeader {
    pub map_size: u32,
    #[serde(default)]
    pub players: Vec<PlayerInfo>,
}

/// Supplies the decoded recording: the header once, then events in order
/// until `Ok(None)` marks the end of input.
pub trait EventSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn header(&self) -> &MatchHeader;

    fn next_event(&mut self) -> Result<Option<ReplayEvent>, Self::Error>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    type Error = S::Error;

    fn header(&self) -> &MatchHeader {
        (**self).header()
    }

    fn next_event(&mut self) -> Result<Option<ReplayEvent>, Self::Error> {
        (**self).next_event()
    }
}
