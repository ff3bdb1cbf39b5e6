//! Dart tournament engine: group stage, round-robin finals and single or
//! double elimination brackets with byes.

pub mod config;
pub mod logic;
pub mod models;
pub mod roster;

pub use config::{ConfigError, KnockoutSettings, PostGroupMode, ServerConfig, TournamentSettings};
pub use logic::knockout::{give_bye, reset_match, start_match, submit_result, undo_bye};
pub use logic::{
    advance_phase, create_groups, generate_bracket, reset_current_phase_results,
    reset_to_group_phase, standings, start_tournament, submit_group_result,
};
pub use models::{
    BracketNode, EliminationMode, GameRules, KnockoutBracket, MatchScore, MatchStatus, NodeId,
    Player, PlayerId, Round, RoundRules, Seeding, Slot, Tournament, TournamentError,
    TournamentEvent, TournamentId, TournamentPhase, TournamentState,
};
pub use roster::{import_roster, read_roster};
