//! Byes: automatic walkovers for matches that can never be contested, plus
//! byes given by the organizer and their undo.

use chrono::Utc;

use crate::logic::propagation;
use crate::models::{
    Advancement, ByeOrigin, FeedKind, KnockoutBracket, MatchStatus, NodeId, PlayerId, Slot,
    TournamentError,
};

/// Walk every node of both brackets and resolve the ones that can no longer
/// be contested. Resolutions propagate immediately, which may cascade.
pub fn check_and_resolve_byes(bracket: &mut KnockoutBracket) -> Vec<Advancement> {
    let mut advanced = Vec::new();
    for id in bracket.node_ids() {
        if resolve_node(bracket, id) {
            advanced.extend(propagation::propagate(bracket, id));
        }
    }
    advanced
}

/// Re-evaluate one node. Returns true when the node needs to propagate.
///
/// - open node with one player and one vacancy: automatic bye for that player;
/// - open node with two vacancies: empty bye, hands a vacancy on;
/// - manual bye still waiting for a winner: the first player seated takes it.
pub(crate) fn resolve_node(bracket: &mut KnockoutBracket, id: NodeId) -> bool {
    let Some(node) = bracket.node(id) else {
        return false;
    };
    let (status, slots, winner) = (node.status, node.slots, node.winner);
    match status {
        MatchStatus::NotStarted => {
            let winner = match slots {
                [Slot::Player(p), Slot::Vacant] | [Slot::Vacant, Slot::Player(p)] => Some(p),
                [Slot::Vacant, Slot::Vacant] => None,
                _ => return false,
            };
            if let Some(node) = bracket.node_mut(id) {
                node.status = MatchStatus::Bye;
                node.bye = Some(ByeOrigin::Automatic);
                node.winner = winner;
                node.loser = None;
            }
            log::debug!("{id}: automatic bye ({winner:?})");
            true
        }
        MatchStatus::Bye if winner.is_none() => {
            let seated: Vec<PlayerId> = slots.iter().filter_map(|s| s.player()).collect();
            match seated.as_slice() {
                [player] => {
                    if let Some(node) = bracket.node_mut(id) {
                        node.winner = Some(*player);
                    }
                    log::debug!("{id}: deferred bye goes to {player}");
                    true
                }
                [] if slots.iter().all(|s| s.is_vacant()) => has_pending_winner_feed(bracket, id),
                _ => false,
            }
        }
        _ => false,
    }
}

fn has_pending_winner_feed(bracket: &KnockoutBracket, id: NodeId) -> bool {
    bracket.dependents(id).into_iter().any(|(dependent, side)| {
        bracket.node(dependent).is_some_and(|node| {
            node.slot(side).is_pending()
                && node.source(side).is_some_and(|f| f.kind == FeedKind::Winner)
        })
    })
}

/// Award a bye on `id`.
///
/// With both players seated `chosen_winner` is required; with one seated it
/// must be that player or omitted; with nobody seated the bye is recorded
/// without a winner and the first player to arrive later advances.
pub fn give_bye(
    bracket: &mut KnockoutBracket,
    id: NodeId,
    chosen_winner: Option<PlayerId>,
) -> Result<Vec<Advancement>, TournamentError> {
    let node = bracket.require(id)?;
    if node.status != MatchStatus::NotStarted {
        return Err(TournamentError::invalid_state(format!(
            "{id} is {:?}; a bye needs a match that has not started",
            node.status
        )));
    }
    let winner = match (node.player_a(), node.player_b(), chosen_winner) {
        (Some(a), Some(b), Some(chosen)) => {
            if chosen != a && chosen != b {
                return Err(TournamentError::PlayerNotInMatch(chosen));
            }
            Some(chosen)
        }
        (Some(_), Some(_), None) => return Err(TournamentError::AmbiguousBye),
        (Some(only), None, chosen) | (None, Some(only), chosen) => {
            if let Some(chosen) = chosen.filter(|c| *c != only) {
                return Err(TournamentError::PlayerNotInMatch(chosen));
            }
            Some(only)
        }
        (None, None, Some(chosen)) => return Err(TournamentError::PlayerNotInMatch(chosen)),
        (None, None, None) => None,
    };

    let node = bracket.require_mut(id)?;
    node.status = MatchStatus::Bye;
    node.bye = Some(ByeOrigin::Manual);
    node.winner = winner;
    node.loser = None;
    node.score = None;
    node.finished_at = Some(Utc::now());
    log::info!("{id} ({}): bye given to {winner:?}", node.round);
    Ok(propagation::propagate(bracket, id))
}

/// Take back a bye (manual or automatic) and everything it propagated.
///
/// The node returns to `NotStarted` and is not re-checked itself, so an undone
/// automatic bye stays open until a bye is given by hand.
pub fn undo_bye(bracket: &mut KnockoutBracket, id: NodeId) -> Result<Vec<Advancement>, TournamentError> {
    let node = bracket.require(id)?;
    if node.status != MatchStatus::Bye {
        return Err(TournamentError::invalid_state(format!("{id} has no bye to undo")));
    }
    propagation::retract(bracket, id)?;
    bracket.require_mut(id)?.clear_result();
    log::info!("{id}: bye undone");
    Ok(recheck_dependents(bracket, id))
}

/// Re-check every node fed by `id` after its slots changed.
pub(crate) fn recheck_dependents(bracket: &mut KnockoutBracket, id: NodeId) -> Vec<Advancement> {
    let mut advanced = Vec::new();
    for (dependent, _) in bracket.dependents(id) {
        if resolve_node(bracket, dependent) {
            advanced.extend(propagation::propagate(bracket, dependent));
        }
    }
    advanced
}
