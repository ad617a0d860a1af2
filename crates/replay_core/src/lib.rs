//! `replay_core`: per-player match tracking and cross-match averaging.
//!
//! No IO. Events arrive through an `EventSource`; everything the tracker
//! derives is owned by the `MatchAnalysis` it returns.

mod aggregate;
mod analysis;
mod bracket;
pub mod categories;
mod error;
mod player;
mod sampler;
mod snapshot;
mod tables;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use aggregate::{
    aggregate_bracket, AggregateResult, AveragedDistance, AveragedSnapshot, BracketAccumulator,
};
pub use analysis::{analyze, format_clock, EventTally, MatchAnalysis, MatchAnalyzer};
pub use bracket::SkillBracket;
pub use categories::{
    Building, BuildingClass, Category, CategoryKind, Domain, RawId, Technology, Unit, UnitClass,
};
pub use error::AnalysisError;
pub use player::PlayerState;
pub use sampler::{PeriodicSampler, SamplingConfig};
pub use snapshot::{ActionDistance, BuildingTotals, DomainCounts, Snapshot, SnapshotSeries};
pub use tables::{
    BuildingCounts, CountTable, TechnologyTimes, TimeTable, TrackedCategory, UnitCounts,
};
pub use types::*;
