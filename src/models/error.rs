//! Errors returned by tournament operations, and bracket integrity faults.

use crate::models::bracket::{FeedKind, NodeId};
use crate::models::group::MatchId;
use crate::models::player::PlayerId;
use thiserror::Error;

/// Errors that can occur during tournament operations. All are recoverable:
/// the caller decides whether to prompt the user again.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error("Need at least {required} players (got {actual})")]
    InsufficientPlayers { required: usize, actual: usize },

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Neither side has reached the winning threshold")]
    IncompleteResult,

    #[error("Both sides have reached the winning threshold")]
    AmbiguousResult,

    #[error("Both players are seated; choose who receives the bye")]
    AmbiguousBye,

    #[error("Invalid state for this action: {0}")]
    InvalidState(String),

    #[error("Phase is not complete ({open_matches} match(es) still open)")]
    PhaseNotComplete { open_matches: usize },

    #[error("{group} has {available} player(s) but {needed} must qualify")]
    NotEnoughQualifiers {
        group: String,
        needed: usize,
        available: usize,
    },

    #[error("Unknown bracket node {0}")]
    UnknownNode(NodeId),

    #[error("Unknown match {match_id} in group {group}")]
    UnknownMatch { group: usize, match_id: MatchId },

    #[error("Player not found")]
    PlayerNotFound(PlayerId),

    #[error("Player is not seated in this match")]
    PlayerNotInMatch(PlayerId),

    #[error("A player with this name already exists")]
    DuplicatePlayerName,

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),
}

impl TournamentError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        TournamentError::InvalidState(reason.into())
    }
}

/// Structural faults in a bracket graph. These mean the graph is corrupted
/// (a programming error), not that a user did something wrong.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum IntegrityFault {
    #[error("{node} references missing node {feeder}")]
    DanglingFeed { node: NodeId, feeder: NodeId },

    #[error("{node} is fed by {feeder}, which is not in an earlier round")]
    RoundOrder { node: NodeId, feeder: NodeId },

    #[error("{node} is fed across brackets by {feeder} outside the grand-final wiring")]
    CrossBracketEdge { node: NodeId, feeder: NodeId },

    #[error("{feeder} feeds its {kind:?} into more than one slot")]
    DuplicateFeed { feeder: NodeId, kind: FeedKind },

    #[error("{node} records a winner or loser that is not seated in it")]
    ForeignResult { node: NodeId },

    #[error("dependency cycle through {node}")]
    Cycle { node: NodeId },
}
