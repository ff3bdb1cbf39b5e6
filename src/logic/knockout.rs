//! Knockout operations on a running tournament: each wraps the bracket-level
//! operation, emits the matching events and refreshes the tournament state.

use crate::logic::{byes, results};
use crate::models::{
    Advancement, MatchScore, NodeId, PlayerId, Tournament, TournamentError, TournamentEvent,
};

/// Record the result of a knockout match.
pub fn submit_result(
    tournament: &mut Tournament,
    node: NodeId,
    score: MatchScore,
) -> Result<(), TournamentError> {
    let bracket = tournament.knockout_mut()?;
    let advanced = results::submit_result(bracket, node, score)?;
    let winner = bracket.node(node).and_then(|n| n.winner);
    if let Some(winner) = winner {
        tournament.emit(TournamentEvent::ResultRecorded { node, winner });
    }
    finish(tournament, advanced);
    Ok(())
}

pub fn start_match(tournament: &mut Tournament, node: NodeId) -> Result<(), TournamentError> {
    results::start_match(tournament.knockout_mut()?, node)?;
    log::info!("{node}: match started");
    tournament.emit(TournamentEvent::MatchStarted { node });
    Ok(())
}

/// Give a bye on `node`; see [`byes::give_bye`] for the winner rules.
pub fn give_bye(
    tournament: &mut Tournament,
    node: NodeId,
    chosen_winner: Option<PlayerId>,
) -> Result<(), TournamentError> {
    let bracket = tournament.knockout_mut()?;
    let advanced = byes::give_bye(bracket, node, chosen_winner)?;
    let winner = bracket.node(node).and_then(|n| n.winner);
    tournament.emit(TournamentEvent::ByeGiven { node, winner });
    finish(tournament, advanced);
    Ok(())
}

pub fn undo_bye(tournament: &mut Tournament, node: NodeId) -> Result<(), TournamentError> {
    let advanced = byes::undo_bye(tournament.knockout_mut()?, node)?;
    tournament.emit(TournamentEvent::ByeUndone { node });
    finish(tournament, advanced);
    Ok(())
}

pub fn reset_match(tournament: &mut Tournament, node: NodeId) -> Result<(), TournamentError> {
    let advanced = results::reset_match(tournament.knockout_mut()?, node)?;
    tournament.emit(TournamentEvent::MatchReset { node });
    finish(tournament, advanced);
    Ok(())
}

fn finish(tournament: &mut Tournament, advanced: Vec<Advancement>) {
    for Advancement { node, side, slot } in advanced {
        tournament.emit(TournamentEvent::SlotFilled { node, side, slot });
    }
    tournament.refresh_state();
}
