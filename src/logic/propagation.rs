//! Winner/loser propagation along the bracket graph, and its retraction.

use std::collections::VecDeque;

use crate::logic::byes;
use crate::models::{
    Advancement, ByeOrigin, FeedKind, KnockoutBracket, MatchStatus, NodeId, Side, Slot,
    TournamentError,
};

/// Seed every slot fed by `completed`, then keep going through dependents that
/// became decided because of it (byes created by the new slot contents).
///
/// Slots that already hold the value being propagated are left alone, so
/// running this again with no new completions changes nothing.
pub fn propagate(bracket: &mut KnockoutBracket, completed: NodeId) -> Vec<Advancement> {
    let mut advanced = Vec::new();
    let mut queue = VecDeque::from([completed]);
    while let Some(source) = queue.pop_front() {
        for (dependent, side) in bracket.dependents(source) {
            let Some(slot) = edge_outcome(bracket, source, dependent, side) else {
                continue;
            };
            if !assign_slot(bracket, dependent, side, slot) {
                continue;
            }
            log::debug!("{source} -> {dependent}/{side:?}: {slot:?}");
            advanced.push(Advancement {
                node: dependent,
                side,
                slot,
            });
            if byes::resolve_node(bracket, dependent) {
                queue.push_back(dependent);
            }
        }
    }
    advanced
}

/// Value that the edge `source -> dependent/side` carries, if the source is decided.
fn edge_outcome(
    bracket: &KnockoutBracket,
    source: NodeId,
    dependent: NodeId,
    side: Side,
) -> Option<Slot> {
    let feeder = bracket.node(source)?;
    if bracket.is_grand_final_edge(dependent, side, source) {
        // The loser-bracket champion is the one who advances, whatever the edge tag says.
        return feeder.winner_outcome();
    }
    let feed = bracket.node(dependent)?.source(side)?;
    feeder.outcome(feed.kind)
}

/// Write `slot` into a pending slot. Returns whether anything changed.
fn assign_slot(bracket: &mut KnockoutBracket, id: NodeId, side: Side, slot: Slot) -> bool {
    let Some(node) = bracket.node_mut(id) else {
        return false;
    };
    let current = node.slot(side);
    if current == slot {
        return false;
    }
    debug_assert!(
        current.is_pending(),
        "propagation into resolved slot {id}/{side:?}: holds {current:?}, got {slot:?}"
    );
    if !current.is_pending() {
        log::error!("Refusing to overwrite {id}/{side:?} ({current:?}) with {slot:?}");
        return false;
    }
    node.slots[side.index()] = slot;
    true
}

/// Undo everything `id` propagated: dependent slots go back to `Pending`,
/// automatic byes built on them are reverted, manual byes lose a winner that
/// came from a retracted slot (and reopen if the opponent is still seated). Fails without changing anything if a dependent
/// has already been started or played.
pub(crate) fn retract(bracket: &mut KnockoutBracket, id: NodeId) -> Result<(), TournamentError> {
    ensure_retractable(bracket, id, false)?;
    clear_dependents(bracket, id, false);
    Ok(())
}

fn retracted_edges(
    bracket: &KnockoutBracket,
    id: NodeId,
    winner_only: bool,
) -> Vec<(NodeId, Side)> {
    bracket
        .dependents(id)
        .into_iter()
        .filter(|(dependent, side)| {
            bracket.node(*dependent).is_some_and(|node| {
                !node.slot(*side).is_pending()
                    && !(winner_only
                        && node.source(*side).is_some_and(|f| f.kind == FeedKind::Loser))
            })
        })
        .collect()
}

fn ensure_retractable(
    bracket: &KnockoutBracket,
    id: NodeId,
    winner_only: bool,
) -> Result<(), TournamentError> {
    for (dependent, side) in retracted_edges(bracket, id, winner_only) {
        let node = bracket.require(dependent)?;
        match (node.status, node.bye) {
            (MatchStatus::NotStarted, _) => {}
            (MatchStatus::Bye, Some(ByeOrigin::Automatic)) => {
                ensure_retractable(bracket, dependent, false)?
            }
            (MatchStatus::Bye, _) => {
                if node.winner.is_some() && node.winner == node.player(side) {
                    let reopens = node.player(side.other()).is_some();
                    ensure_retractable(bracket, dependent, !reopens)?;
                }
            }
            (MatchStatus::InProgress | MatchStatus::Finished, _) => {
                return Err(TournamentError::invalid_state(format!(
                    "{dependent} has already been started or played; reset it first"
                )));
            }
        }
    }
    Ok(())
}

fn clear_dependents(bracket: &mut KnockoutBracket, id: NodeId, winner_only: bool) {
    for (dependent, side) in retracted_edges(bracket, id, winner_only) {
        let Some(node) = bracket.node(dependent) else {
            continue;
        };
        let (status, bye, winner, cleared) = (node.status, node.bye, node.winner, node.slot(side));
        let withdrawn = winner.is_some() && winner == cleared.player();
        let reopens = node.player(side.other()).is_some();
        match (status, bye) {
            (MatchStatus::Bye, Some(ByeOrigin::Automatic)) => {
                clear_dependents(bracket, dependent, false);
                if let Some(node) = bracket.node_mut(dependent) {
                    node.clear_result();
                }
            }
            // The opponent is still seated: the bye needs a new decision, so
            // the match opens again.
            (MatchStatus::Bye, _) if withdrawn && reopens => {
                clear_dependents(bracket, dependent, false);
                if let Some(node) = bracket.node_mut(dependent) {
                    node.clear_result();
                }
            }
            (MatchStatus::Bye, _) if withdrawn => {
                clear_dependents(bracket, dependent, true);
                if let Some(node) = bracket.node_mut(dependent) {
                    node.winner = None;
                }
            }
            _ => {}
        }
        if let Some(node) = bracket.node_mut(dependent) {
            node.slots[side.index()] = Slot::Pending;
        }
        log::debug!("Retracted {id} -> {dependent}/{side:?} ({cleared:?})");
    }
}
