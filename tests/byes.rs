//! Integration tests for automatic and manual byes.

mod common;

use common::{play, player, players, rules};
use dart_tournament::logic::bracket_gen::generate_bracket;
use dart_tournament::logic::byes::{give_bye, undo_bye};
use dart_tournament::logic::results;
use dart_tournament::models::{
    BracketSide, ByeOrigin, EliminationMode, KnockoutBracket, MatchStatus, NodeId, Seeding, Slot,
    TournamentError,
};
use pretty_assertions::assert_eq;

fn bracket(n: usize, mode: EliminationMode) -> KnockoutBracket {
    generate_bracket(&players(n), mode, Seeding::Seeded, rules()).unwrap()
}

#[test]
fn give_then_undo_restores_the_bracket() {
    let mut b = bracket(4, EliminationMode::Double);
    let before = b.clone();

    give_bye(&mut b, NodeId::winner(0), Some(player(4))).unwrap();
    let node = b.node(NodeId::winner(0)).unwrap();
    assert_eq!(node.status, MatchStatus::Bye);
    assert_eq!(node.bye, Some(ByeOrigin::Manual));
    assert_eq!(node.winner, Some(player(4)));
    assert_eq!(
        b.node(NodeId::winner(2)).unwrap().slots[0],
        Slot::Player(player(4))
    );
    assert_eq!(b.node(NodeId::loser(0)).unwrap().slots[0], Slot::Vacant);

    undo_bye(&mut b, NodeId::winner(0)).unwrap();
    assert_eq!(b, before);
}

#[test]
fn bye_between_two_seated_players_needs_a_winner() {
    let mut b = bracket(4, EliminationMode::Single);
    assert_eq!(
        give_bye(&mut b, NodeId::winner(0), None),
        Err(TournamentError::AmbiguousBye)
    );
    assert_eq!(
        give_bye(&mut b, NodeId::winner(0), Some(player(2))),
        Err(TournamentError::PlayerNotInMatch(player(2)))
    );
    assert_eq!(b.node(NodeId::winner(0)).unwrap().status, MatchStatus::NotStarted);
}

#[test]
fn bye_on_a_decided_match_is_rejected() {
    let mut b = bracket(4, EliminationMode::Single);
    play(&mut b, NodeId::winner(0));
    assert!(matches!(
        give_bye(&mut b, NodeId::winner(0), Some(player(1))),
        Err(TournamentError::InvalidState(_))
    ));
    assert!(matches!(
        undo_bye(&mut b, NodeId::winner(1)),
        Err(TournamentError::InvalidState(_))
    ));
}

#[test]
fn bye_on_a_started_match_is_rejected() {
    let mut b = bracket(4, EliminationMode::Single);
    results::start_match(&mut b, NodeId::winner(0)).unwrap();
    assert!(matches!(
        give_bye(&mut b, NodeId::winner(0), Some(player(1))),
        Err(TournamentError::InvalidState(_))
    ));
    let node = b.node(NodeId::winner(0)).unwrap();
    assert_eq!(node.status, MatchStatus::InProgress);
    assert_eq!(node.winner, None);
    assert_eq!(b.node(NodeId::winner(2)).unwrap().slots[0], Slot::Pending);
}

#[test]
fn resetting_the_chosen_winner_reopens_the_bye() {
    let mut b = bracket(4, EliminationMode::Single);
    let final_node = NodeId::winner(2);
    play(&mut b, NodeId::winner(0));
    play(&mut b, NodeId::winner(1));
    give_bye(&mut b, final_node, Some(player(1))).unwrap();
    assert_eq!(b.champion(), Some(player(1)));

    results::reset_match(&mut b, NodeId::winner(0)).unwrap();
    let node = b.node(final_node).unwrap();
    assert_eq!(node.status, MatchStatus::NotStarted);
    assert_eq!(node.bye, None);
    assert_eq!(node.winner, None);
    assert_eq!(node.slots, [Slot::Pending, Slot::Player(player(2))]);
    assert_eq!(b.champion(), None);

    // Replaying the feeder seats its winner in an open match again.
    play(&mut b, NodeId::winner(0));
    assert_eq!(
        b.node(final_node).unwrap().slots,
        [Slot::Player(player(1)), Slot::Player(player(2))]
    );
    assert_eq!(
        give_bye(&mut b, final_node, None),
        Err(TournamentError::AmbiguousBye)
    );
}

#[test]
fn reopened_bye_takes_back_its_vacant_loser() {
    let mut b = bracket(8, EliminationMode::Double);
    for node in 0..4 {
        play(&mut b, NodeId::winner(node));
    }
    // W4 = winners of W0 and W1 (1 v 4); its loser feeds the loser bracket.
    let w4 = NodeId::winner(4);
    give_bye(&mut b, w4, Some(player(4))).unwrap();
    let fed: Vec<_> = b
        .dependents(w4)
        .into_iter()
        .filter(|(node, _)| node.side == BracketSide::Loser)
        .collect();
    assert!(!fed.is_empty());
    for (node, side) in &fed {
        assert_eq!(b.node(*node).unwrap().slot(*side), Slot::Vacant);
    }

    results::reset_match(&mut b, NodeId::winner(1)).unwrap();
    assert_eq!(b.node(w4).unwrap().status, MatchStatus::NotStarted);
    for (node, side) in &fed {
        assert_eq!(b.node(*node).unwrap().slot(*side), Slot::Pending);
    }
    assert_eq!(b.check_integrity(), Ok(()));
}

#[test]
fn bye_with_nobody_seated_goes_to_the_first_arrival() {
    let mut b = bracket(4, EliminationMode::Single);
    let final_node = NodeId::winner(2);
    give_bye(&mut b, final_node, None).unwrap();
    assert_eq!(b.node(final_node).unwrap().winner, None);

    play(&mut b, NodeId::winner(1));
    let node = b.node(final_node).unwrap();
    assert_eq!(node.status, MatchStatus::Bye);
    assert_eq!(node.winner, Some(player(2)));

    play(&mut b, NodeId::winner(0));
    let node = b.node(final_node).unwrap();
    assert_eq!(node.slots, [Slot::Player(player(1)), Slot::Player(player(2))]);
    assert_eq!(node.winner, Some(player(2)));
    assert!(b.is_complete());
    assert_eq!(b.champion(), Some(player(2)));
}

#[test]
fn resetting_the_first_arrival_takes_back_a_deferred_bye() {
    let mut b = bracket(4, EliminationMode::Single);
    let final_node = NodeId::winner(2);
    give_bye(&mut b, final_node, None).unwrap();
    play(&mut b, NodeId::winner(0));
    assert_eq!(b.node(final_node).unwrap().winner, Some(player(1)));

    results::reset_match(&mut b, NodeId::winner(0)).unwrap();
    let node = b.node(final_node).unwrap();
    assert_eq!(node.status, MatchStatus::Bye);
    assert_eq!(node.winner, None);
    assert_eq!(node.slots, [Slot::Pending, Slot::Pending]);
}

#[test]
fn undoing_an_automatic_bye_leaves_the_match_open() {
    let mut b = bracket(3, EliminationMode::Single);
    let bye = NodeId::winner(0);
    assert_eq!(b.node(bye).unwrap().bye, Some(ByeOrigin::Automatic));

    undo_bye(&mut b, bye).unwrap();
    let node = b.node(bye).unwrap();
    assert_eq!(node.status, MatchStatus::NotStarted);
    assert_eq!(node.slots, [Slot::Player(player(1)), Slot::Vacant]);
    assert_eq!(b.node(NodeId::winner(2)).unwrap().slots[0], Slot::Pending);

    // The lone player can still be given the bye by hand.
    give_bye(&mut b, bye, None).unwrap();
    assert_eq!(b.node(bye).unwrap().winner, Some(player(1)));
    assert_eq!(
        b.node(NodeId::winner(2)).unwrap().slots[0],
        Slot::Player(player(1))
    );
}

#[test]
fn undo_is_refused_once_a_dependent_match_has_started() {
    let mut b = bracket(3, EliminationMode::Single);
    play(&mut b, NodeId::winner(1));
    results::start_match(&mut b, NodeId::winner(2)).unwrap();
    let before = b.clone();

    assert!(matches!(
        undo_bye(&mut b, NodeId::winner(0)),
        Err(TournamentError::InvalidState(_))
    ));
    assert_eq!(b, before);
}

#[test]
fn empty_first_round_pairs_hand_on_a_vacancy() {
    // 5 players double: losers of W2 and W3 (both byes) meet in L1, which is empty.
    let b = bracket(5, EliminationMode::Double);
    let l1 = b.node(NodeId::loser(1)).unwrap();
    assert_eq!(l1.slots, [Slot::Vacant, Slot::Vacant]);
    assert_eq!(l1.status, MatchStatus::Bye);
    assert_eq!(l1.winner, None);
    assert_eq!(b.node(NodeId::loser(3)).unwrap().slots[0], Slot::Vacant);
}
