//! Data structures for the dart tournament: players, groups, brackets, phases.

pub mod bracket;
mod error;
mod game;
mod group;
mod player;
mod rules;
mod tournament;

pub use bracket::{
    Advancement, Bracket, BracketNode, BracketSide, ByeOrigin, EliminationMode, Feed, FeedKind,
    GrandFinalWiring, KnockoutBracket, NodeId, Round, Seeding, Slot,
};
pub use error::{IntegrityFault, TournamentError};
pub use game::{MatchScore, MatchStatus, Side};
pub use group::{Group, GroupMatch, MatchId, Standing};
pub use player::{Player, PlayerId};
pub use rules::{FinishMode, GameRules, RoundOverride, RoundRules};
pub use tournament::{
    FinalsStage, GroupStage, KnockoutStage, PhaseKind, Tournament, TournamentEvent, TournamentId,
    TournamentPhase, TournamentState,
};
