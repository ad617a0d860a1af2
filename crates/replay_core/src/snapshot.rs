//! Point-in-time captures of one player's aggregate state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ActionClass, Domain};

/// Snapshots keyed by elapsed match time in whole seconds. Key `0` is always
/// present and all-zero.
pub type SnapshotSeries = BTreeMap<u32, Snapshot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainCounts {
    pub economic: u32,
    pub military: u32,
}

impl DomainCounts {
    pub fn get(&self, domain: Domain) -> u32 {
        match domain {
            Domain::Economic => self.economic,
            Domain::Military => self.military,
        }
    }
}

/// Building totals by domain. Walls are reported in their own slot and are
/// not part of `military`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingTotals {
    pub economic: u32,
    pub military: u32,
    pub walls: u32,
}

/// Mean absolute per-axis displacement of the actions in a trailing window.
///
/// `count == 0` means no action fell into the window; the means are then `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionDistance {
    pub mean_x: f64,
    pub mean_y: f64,
    pub count: u32,
}

impl ActionDistance {
    /// Euclidean length of the per-axis means.
    pub fn magnitude(&self) -> f64 {
        self.mean_x.hypot(self.mean_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub units: DomainCounts,
    pub buildings: BuildingTotals,
    pub movement: ActionDistance,
    pub directed: ActionDistance,
}

impl Snapshot {
    pub fn action(&self, class: ActionClass) -> &ActionDistance {
        match class {
            ActionClass::Movement => &self.movement,
            ActionClass::Directed => &self.directed,
        }
    }
}

/// Running sums used while scanning the action log.
#[derive(Debug, Default)]
pub(crate) struct DistanceAccumulator {
    sum_x: f64,
    sum_y: f64,
    count: u32,
}

impl DistanceAccumulator {
    pub(crate) fn add(&mut self, (dx, dy): (f64, f64)) {
        self.sum_x += dx;
        self.sum_y += dy;
        self.count += 1;
    }

    pub(crate) fn finish(self) -> ActionDistance {
        if self.count == 0 {
            return ActionDistance::default();
        }
        let count = f64::from(self.count);
        ActionDistance {
            mean_x: self.sum_x / count,
            mean_y: self.sum_y / count,
            count: self.count,
        }
    }
}
