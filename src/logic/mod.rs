//! Tournament business logic: setup, group play, bracket generation, byes,
//! results, propagation and phase transitions.

pub mod bracket_gen;
pub mod byes;
pub mod group_play;
pub mod knockout;
pub mod phase;
pub mod propagation;
pub mod results;
mod setup;

pub use bracket_gen::{generate_bracket, seed_order};
pub use byes::check_and_resolve_byes;
pub use group_play::{generate_round_robin, standings, submit_group_result};
pub use phase::{
    advance, advance_phase, can_advance, qualifiers, reset_current_phase_results,
    reset_to_group_phase,
};
pub use results::validate_score;
pub use setup::{create_groups, group_name, start_tournament};
