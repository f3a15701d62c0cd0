//! Error types for the engines.

use cast_model::CharacterId;
use thiserror::Error;

use crate::gossip::RumorId;
use crate::lore::GoalId;

/// Errors from gossip operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GossipError {
    #[error("Unknown rumor: {0}")]
    UnknownRumor(RumorId),
}

/// A single character's off-screen step failed. The batch carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectorError {
    #[error("Goal {goal} of {character} is active with no steps left")]
    StalledGoal { character: CharacterId, goal: GoalId },
}

/// Errors from saving or loading a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected at most {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
