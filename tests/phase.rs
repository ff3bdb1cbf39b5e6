//! Integration tests for phase transitions and resets.

mod common;

use common::{open_group_results, player, players, tournament, win};
use dart_tournament::config::{KnockoutSettings, PostGroupMode};
use dart_tournament::logic::{knockout, phase};
use dart_tournament::models::{
    EliminationMode, NodeId, PhaseKind, Seeding, Side, Slot, Tournament, TournamentEvent,
    TournamentPhase, TournamentState,
};
use dart_tournament::{
    advance_phase, create_groups, reset_current_phase_results, reset_to_group_phase,
    start_tournament, submit_group_result, TournamentError, TournamentSettings,
};
use pretty_assertions::assert_eq;

/// 8 players in 2 groups, started. Groups (snake order): A = 1 4 5 8, B = 2 3 6 7.
fn running(settings: TournamentSettings) -> Tournament {
    let mut t = tournament(8, settings);
    create_groups(&mut t, 2).unwrap();
    start_tournament(&mut t).unwrap();
    t
}

/// Play the open group matches of the current phase, leaving `keep_open` unplayed.
fn play_groups(t: &mut Tournament, keep_open: usize) {
    let pending = open_group_results(t);
    let play = pending.len().saturating_sub(keep_open);
    for (group, match_id, score) in pending.into_iter().take(play) {
        submit_group_result(t, group, match_id, score).unwrap();
    }
}

#[test]
fn groups_are_dealt_in_snake_order() {
    let t = running(TournamentSettings::default());
    let groups = t.phase.groups();
    assert_eq!(groups[0].name, "Group A");
    assert_eq!(groups[1].name, "Group B");
    assert_eq!(
        groups[0].players,
        [1, 4, 5, 8].map(player).to_vec()
    );
    assert_eq!(
        groups[1].players,
        [2, 3, 6, 7].map(player).to_vec()
    );
    assert_eq!(t.phase.open_matches(), 12);
    assert_eq!(t.qualified_players(), players(8).as_slice());
}

#[test]
fn advancing_with_open_matches_is_refused() {
    let mut t = running(TournamentSettings::default());
    play_groups(&mut t, 2);
    assert!(!t.can_advance());
    assert_eq!(
        advance_phase(&mut t).map(|_| ()),
        Err(TournamentError::PhaseNotComplete { open_matches: 2 })
    );
    assert_eq!(t.phase.kind(), PhaseKind::GroupPhase);
}

#[test]
fn finished_groups_advance_to_a_knockout_of_the_qualifiers() {
    let mut t = running(TournamentSettings::default());
    play_groups(&mut t, 0);
    assert!(t.can_advance());
    t.take_events();

    advance_phase(&mut t).unwrap();
    assert_eq!(t.phase.kind(), PhaseKind::KnockoutPhase);
    // Group winners first, then runners-up.
    assert_eq!(
        t.qualified_players(),
        [1, 2, 4, 3].map(player).as_slice()
    );
    assert_eq!(t.qualified_players().len(), 2 * t.settings.qualifiers_per_group);
    assert_eq!(t.history.len(), 1);
    assert!(matches!(
        &t.history[0],
        TournamentPhase::GroupPhase(stage) if stage.completed
    ));
    assert_eq!(
        t.take_events(),
        vec![TournamentEvent::PhaseAdvanced {
            from: PhaseKind::GroupPhase,
            to: PhaseKind::KnockoutPhase
        }]
    );

    // Seeded: 1 v 3 and 2 v 4.
    let bracket = t.bracket().unwrap();
    assert_eq!(
        bracket.node(NodeId::winner(0)).unwrap().slots,
        [Slot::Player(player(1)), Slot::Player(player(3))]
    );
    assert!(matches!(
        advance_phase(&mut t),
        Err(TournamentError::InvalidState(_))
    ));
}

#[test]
fn knockout_play_completes_the_tournament() {
    let mut t = running(TournamentSettings::default());
    play_groups(&mut t, 0);
    advance_phase(&mut t).unwrap();

    for node in [NodeId::winner(0), NodeId::winner(1), NodeId::winner(2)] {
        assert_eq!(t.state, TournamentState::Running);
        knockout::submit_result(&mut t, node, win(Side::A)).unwrap();
    }
    assert_eq!(t.state, TournamentState::Completed);
    assert_eq!(t.champion(), Some(player(1)));
    assert!(t
        .take_events()
        .contains(&TournamentEvent::Completed {
            champion: Some(player(1))
        }));

    knockout::reset_match(&mut t, NodeId::winner(2)).unwrap();
    assert_eq!(t.state, TournamentState::Running);
    assert_eq!(t.champion(), None);
}

#[test]
fn round_robin_finals_follow_the_groups() {
    let settings = TournamentSettings {
        post_group_mode: PostGroupMode::RoundRobinFinals,
        ..TournamentSettings::default()
    };
    let mut t = running(settings);
    play_groups(&mut t, 0);
    advance_phase(&mut t).unwrap();

    assert_eq!(t.phase.kind(), PhaseKind::RoundRobinFinals);
    let finals = &t.phase.groups()[0];
    assert_eq!(finals.name, "Finals");
    assert_eq!(finals.matches.len(), 6);

    play_groups(&mut t, 0);
    assert_eq!(t.state, TournamentState::Completed);
    assert_eq!(t.champion(), Some(player(1)));
}

#[test]
fn too_few_group_members_to_qualify() {
    let settings = TournamentSettings {
        qualifiers_per_group: 5,
        ..TournamentSettings::default()
    };
    let mut t = running(settings);
    play_groups(&mut t, 0);
    assert_eq!(
        advance_phase(&mut t).map(|_| ()),
        Err(TournamentError::NotEnoughQualifiers {
            group: "Group A".to_string(),
            needed: 5,
            available: 4
        })
    );
    assert_eq!(t.phase.kind(), PhaseKind::GroupPhase);
}

#[test]
fn skipping_groups_seeds_the_whole_roster() {
    let settings = TournamentSettings {
        skip_group_phase: true,
        knockout: KnockoutSettings {
            elimination: EliminationMode::Double,
            seeding: Seeding::Seeded,
        },
        ..TournamentSettings::default()
    };
    let mut t = tournament(5, settings);
    start_tournament(&mut t).unwrap();
    assert!(t.can_advance());
    advance_phase(&mut t).unwrap();

    assert_eq!(t.qualified_players(), players(5).as_slice());
    let bracket = t.bracket().unwrap();
    assert_eq!(bracket.mode, EliminationMode::Double);
    assert_eq!(bracket.bracket_size, 8);
    assert_eq!(t.loser_bracket_nodes().len(), 5);
}

#[test]
fn reset_to_group_phase_drops_the_knockout() {
    let mut t = running(TournamentSettings::default());
    play_groups(&mut t, 0);
    advance_phase(&mut t).unwrap();
    knockout::submit_result(&mut t, NodeId::winner(0), win(Side::A)).unwrap();
    t.take_events();

    reset_to_group_phase(&mut t).unwrap();
    assert_eq!(t.phase.kind(), PhaseKind::GroupPhase);
    assert!(t.history.is_empty());
    assert!(t.bracket().is_none());
    assert_eq!(t.state, TournamentState::Running);
    assert!(matches!(&t.phase, TournamentPhase::GroupPhase(stage) if !stage.completed));
    // Group results survive.
    assert_eq!(t.phase.open_matches(), 0);
    assert_eq!(
        t.take_events(),
        vec![TournamentEvent::PhaseReset {
            phase: PhaseKind::GroupPhase
        }]
    );

    // And the knockout can be rebuilt.
    advance_phase(&mut t).unwrap();
    assert_eq!(t.bracket().unwrap().open_nodes(), 3);
}

#[test]
fn reset_current_results_keeps_the_structure() {
    let mut t = running(TournamentSettings::default());
    play_groups(&mut t, 0);
    advance_phase(&mut t).unwrap();
    let fresh = t.bracket().unwrap().clone();
    knockout::submit_result(&mut t, NodeId::winner(0), win(Side::A)).unwrap();
    knockout::submit_result(&mut t, NodeId::winner(1), win(Side::B)).unwrap();

    reset_current_phase_results(&mut t).unwrap();
    assert_eq!(t.bracket().unwrap(), &fresh);

    reset_to_group_phase(&mut t).unwrap();
    reset_current_phase_results(&mut t).unwrap();
    assert_eq!(t.phase.open_matches(), 12);
    assert!(!phase::can_advance(&t.phase));
}

#[test]
fn resetting_results_reapplies_automatic_byes() {
    let settings = TournamentSettings {
        skip_group_phase: true,
        ..TournamentSettings::default()
    };
    let mut t = tournament(3, settings);
    start_tournament(&mut t).unwrap();
    advance_phase(&mut t).unwrap();
    let fresh = t.bracket().unwrap().clone();
    knockout::submit_result(&mut t, NodeId::winner(1), win(Side::A)).unwrap();

    reset_current_phase_results(&mut t).unwrap();
    let bracket = t.bracket().unwrap();
    assert_eq!(bracket, &fresh);
    assert_eq!(
        bracket.node(NodeId::winner(2)).unwrap().slots,
        [Slot::Player(player(1)), Slot::Pending]
    );
}
