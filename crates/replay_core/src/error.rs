use thiserror::Error;

use crate::{PlayerId, SkillBracket};

/// Failures raised by the tracker and the aggregator.
///
/// Unresolvable category ids and unknown event kinds are not errors; they are
/// dropped where they are encountered.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("match duration for player {player} is not set; the match has not been finalized")]
    DurationUnset { player: PlayerId },

    #[error("match duration for player {player} is zero minutes; no rate can be computed")]
    ZeroDuration { player: PlayerId },

    #[error("bracket '{bracket}' has no matches to aggregate")]
    EmptyBracket { bracket: SkillBracket },

    #[error("sampling interval must be at least one minute (got {interval_minutes})")]
    InvalidSampling { interval_minutes: u64 },

    #[error("event source failed")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}
