//! Per-player state accumulated over one match.
//!
//! Counts are cumulative: the event stream only reports units queued and
//! buildings completed, never losses, so these figures are totals produced
//! and must not be read as the size of a living army.

use crate::snapshot::DistanceAccumulator;
use crate::{
    categories, ActionClass, ActionKind, ActionRecord, AnalysisError, Building, BuildingClass,
    BuildingCounts, BuildingTotals, Domain, DomainCounts, PlayerId, Position, RawId, Snapshot,
    SnapshotSeries, Technology, TechnologyTimes, Unit, UnitCounts,
};

#[derive(Debug, Clone)]
pub struct PlayerState {
    id: PlayerId,
    /// `None` until a town center is seen; displacements are then measured
    /// from the map origin.
    starting_position: Option<Position>,
    units: UnitCounts,
    buildings: BuildingCounts,
    technologies: TechnologyTimes,
    actions: Vec<ActionRecord>,
    eapm_count: u64,
    duration_minutes: Option<u32>,
    snapshots: SnapshotSeries,
}

impl PlayerState {
    pub fn new(id: PlayerId) -> Self {
        let mut snapshots = SnapshotSeries::new();
        snapshots.insert(0, Snapshot::default());
        Self {
            id,
            starting_position: None,
            units: UnitCounts::default(),
            buildings: BuildingCounts::default(),
            technologies: TechnologyTimes::default(),
            actions: Vec::new(),
            eapm_count: 0,
            duration_minutes: None,
            snapshots,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn starting_position(&self) -> Option<Position> {
        self.starting_position
    }

    pub fn units(&self) -> &UnitCounts {
        &self.units
    }

    pub fn buildings(&self) -> &BuildingCounts {
        &self.buildings
    }

    pub fn technologies(&self) -> &TechnologyTimes {
        &self.technologies
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn eapm_count(&self) -> u64 {
        self.eapm_count
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    pub fn snapshots(&self) -> &SnapshotSeries {
        &self.snapshots
    }

    /// Set the starting position unless one is already known.
    pub fn assign_starting_position(&mut self, position: Position) -> bool {
        if self.starting_position.is_some() {
            return false;
        }
        self.starting_position = Some(position);
        true
    }

    pub fn record_unit_queued(&mut self, raw_id: RawId) -> Option<Unit> {
        let Some(unit) = categories::resolve_unit(raw_id) else {
            tracing::trace!(player = %self.id, raw_id, "unit id not tracked");
            return None;
        };
        self.units.increment(unit);
        Some(unit)
    }

    /// Count a completed building. The first town center seen on a player
    /// without a known start fixes the starting position.
    pub fn record_building_completed(
        &mut self,
        raw_id: RawId,
        position: Position,
    ) -> Option<Building> {
        let Some(building) = categories::resolve_building(raw_id) else {
            tracing::trace!(player = %self.id, raw_id, "building id not tracked");
            return None;
        };
        self.buildings.increment(building);
        if building.is_town_center() && self.assign_starting_position(position) {
            tracing::debug!(
                player = %self.id,
                x = position.x,
                y = position.y,
                "starting position from town center"
            );
        }
        Some(building)
    }

    pub fn record_technology_researched(
        &mut self,
        raw_id: RawId,
        elapsed_seconds: f64,
    ) -> Option<Technology> {
        let Some(tech) = categories::resolve_technology(raw_id) else {
            tracing::trace!(player = %self.id, raw_id, "technology id not tracked");
            return None;
        };
        self.technologies.set(tech, elapsed_seconds);
        Some(tech)
    }

    /// Log a coordinate-bearing action. Every call counts toward eAPM,
    /// whatever the action kind.
    pub fn record_action(&mut self, position: Position, kind: ActionKind, elapsed_seconds: f64) {
        self.actions.push(ActionRecord {
            position,
            kind,
            elapsed_seconds,
        });
        self.eapm_count += 1;
    }

    /// Compute the snapshot for `elapsed_seconds` without storing it.
    ///
    /// Actions count toward the trailing aggregates when
    /// `elapsed - window < time < elapsed`.
    pub fn snapshot(&self, elapsed_seconds: u32, trailing_window_seconds: u32) -> Snapshot {
        let units = DomainCounts {
            economic: self.units.total_where(|unit| unit.domain() == Domain::Economic),
            military: self.units.total_where(|unit| unit.domain() == Domain::Military),
        };
        let buildings = BuildingTotals {
            economic: self
                .buildings
                .total_where(|b| b.class() == BuildingClass::Economic),
            military: self
                .buildings
                .total_where(|b| b.class() == BuildingClass::Military),
            walls: self.buildings.total_where(|b| b.class() == BuildingClass::Wall),
        };

        let upper = f64::from(elapsed_seconds);
        let lower = upper - f64::from(trailing_window_seconds);
        let origin = self.starting_position.unwrap_or(Position::ORIGIN);
        let mut movement = DistanceAccumulator::default();
        let mut directed = DistanceAccumulator::default();
        for action in self
            .actions
            .iter()
            .filter(|a| a.elapsed_seconds > lower && a.elapsed_seconds < upper)
        {
            let displacement = action.position.displacement_from(origin);
            match action.kind.class() {
                ActionClass::Movement => movement.add(displacement),
                ActionClass::Directed => directed.add(displacement),
            }
        }

        Snapshot {
            units,
            buildings,
            movement: movement.finish(),
            directed: directed.finish(),
        }
    }

    /// Compute and store the snapshot for `elapsed_seconds`. The zero origin
    /// of the series is never replaced.
    pub fn record_snapshot(&mut self, elapsed_seconds: u32, trailing_window_seconds: u32) {
        if elapsed_seconds == 0 {
            return;
        }
        let snapshot = self.snapshot(elapsed_seconds, trailing_window_seconds);
        self.snapshots.insert(elapsed_seconds, snapshot);
    }

    pub fn set_duration_minutes(&mut self, minutes: u32) {
        self.duration_minutes = Some(minutes);
    }

    /// Qualifying actions per minute of match duration.
    pub fn average_eapm(&self) -> Result<f64, AnalysisError> {
        match self.duration_minutes {
            None => Err(AnalysisError::DurationUnset { player: self.id }),
            Some(0) => Err(AnalysisError::ZeroDuration { player: self.id }),
            Some(minutes) => Ok(self.eapm_count as f64 / f64::from(minutes)),
        }
    }
}
