//! Integration tests for winner/loser propagation and its retraction.

mod common;

use common::{play, play_out, player, players, rules};
use dart_tournament::logic::bracket_gen::generate_bracket;
use dart_tournament::logic::propagation::propagate;
use dart_tournament::logic::results;
use dart_tournament::models::{
    Advancement, ByeOrigin, EliminationMode, KnockoutBracket, MatchStatus, NodeId, Seeding, Side,
    Slot,
};
use pretty_assertions::assert_eq;

fn bracket(n: usize, mode: EliminationMode) -> KnockoutBracket {
    generate_bracket(&players(n), mode, Seeding::Seeded, rules()).unwrap()
}

#[test]
fn winner_and_loser_follow_their_edges() {
    // 4 players: W0 = 1 v 4, W1 = 2 v 3, W2 final, L0 = losers of W0/W1, W3 grand final.
    let mut b = bracket(4, EliminationMode::Double);
    let advanced = play(&mut b, NodeId::winner(0));
    assert_eq!(
        advanced,
        vec![
            Advancement {
                node: NodeId::winner(2),
                side: Side::A,
                slot: Slot::Player(player(1)),
            },
            Advancement {
                node: NodeId::loser(0),
                side: Side::A,
                slot: Slot::Player(player(4)),
            },
        ]
    );
    assert_eq!(b.node(NodeId::winner(0)).unwrap().loser, Some(player(4)));
}

#[test]
fn propagating_again_changes_nothing() {
    let mut b = bracket(8, EliminationMode::Double);
    play(&mut b, NodeId::winner(0));
    play(&mut b, NodeId::winner(1));
    play(&mut b, NodeId::winner(4));
    let before = b.clone();

    for id in [NodeId::winner(0), NodeId::winner(1), NodeId::winner(4)] {
        assert_eq!(propagate(&mut b, id), Vec::new());
    }
    assert_eq!(b, before);
}

#[test]
fn loser_bracket_champion_enters_grand_final_slot_b() {
    let mut b = bracket(5, EliminationMode::Double);
    let wiring = b.grand_final.unwrap();
    play_out(&mut b);
    let loser_champion = b.node(wiring.loser_final).unwrap().winner;
    let grand_final = b.node(wiring.node).unwrap();
    assert!(loser_champion.is_some());
    assert_eq!(grand_final.player_b(), loser_champion);
    assert_eq!(
        grand_final.player_a(),
        b.node(b.winner_final).unwrap().winner
    );
}

#[test]
fn byes_never_produce_a_loser() {
    // 3 players double: W0 is 1 v (vacant), so L0 gets a vacancy from it.
    let mut b = bracket(3, EliminationMode::Double);
    let l0 = b.node(NodeId::loser(0)).unwrap();
    assert_eq!(l0.slots, [Slot::Vacant, Slot::Pending]);

    // Once W1's loser drops in, L0 is an automatic bye and its winner reaches the grand final.
    play(&mut b, NodeId::winner(1));
    let l0 = b.node(NodeId::loser(0)).unwrap();
    assert_eq!(l0.status, MatchStatus::Bye);
    assert_eq!(l0.bye, Some(ByeOrigin::Automatic));
    assert_eq!(l0.winner, Some(player(3)));
    assert_eq!(l0.loser, None);
    let grand_final = b.grand_final.unwrap().node;
    assert_eq!(b.node(grand_final).unwrap().player_b(), Some(player(3)));
}

#[test]
fn reset_retracts_automatic_byes_built_on_the_result() {
    let mut b = bracket(3, EliminationMode::Double);
    let grand_final = b.grand_final.unwrap().node;
    play(&mut b, NodeId::winner(1));

    results::reset_match(&mut b, NodeId::winner(1)).unwrap();
    let l0 = b.node(NodeId::loser(0)).unwrap();
    assert_eq!(l0.status, MatchStatus::NotStarted);
    assert_eq!(l0.slots, [Slot::Vacant, Slot::Pending]);
    assert_eq!(b.node(grand_final).unwrap().slots[1], Slot::Pending);
    assert_eq!(
        b.node(NodeId::winner(2)).unwrap().slots,
        [Slot::Player(player(1)), Slot::Pending]
    );
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "propagation into resolved slot")]
fn overwriting_a_resolved_slot_is_a_fault() {
    let mut b = bracket(4, EliminationMode::Single);
    play(&mut b, NodeId::winner(0));
    // Corrupt the result behind the engine's back, then propagate it.
    if let Some(node) = b.node_mut(NodeId::winner(0)) {
        node.winner = Some(player(4));
        node.loser = Some(player(1));
    }
    propagate(&mut b, NodeId::winner(0));
}
