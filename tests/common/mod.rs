//! Shared helpers for the integration tests.
#![allow(dead_code)]

use dart_tournament::logic::results;
use dart_tournament::models::{
    Advancement, GameRules, KnockoutBracket, MatchScore, NodeId, Player, PlayerId, RoundRules,
    Side,
};
use dart_tournament::{Tournament, TournamentSettings};
use uuid::Uuid;

/// Stable player ids 1..=n; the id doubles as seed rank.
pub fn players(n: usize) -> Vec<PlayerId> {
    (1..=n as u128).map(Uuid::from_u128).collect()
}

pub fn player(rank: u128) -> PlayerId {
    Uuid::from_u128(rank)
}

/// First to three legs everywhere.
pub fn rules() -> RoundRules {
    RoundRules::new(GameRules::legs(3))
}

/// Score that makes `side` win under [`rules`].
pub fn win(side: Side) -> MatchScore {
    match side {
        Side::A => MatchScore::legs(3, 1),
        Side::B => MatchScore::legs(1, 3),
    }
}

/// Submit a result where the player in slot A wins.
pub fn play(bracket: &mut KnockoutBracket, id: NodeId) -> Vec<Advancement> {
    results::submit_result(bracket, id, win(Side::A)).unwrap()
}

/// Play every ready match (slot A always wins) until nothing is left to play.
pub fn play_out(bracket: &mut KnockoutBracket) {
    loop {
        let next = bracket
            .nodes()
            .find(|n| !n.is_decided() && n.is_ready())
            .map(|n| n.id);
        let Some(id) = next else { break };
        play(bracket, id);
    }
}

/// Tournament in setup with players "P1".."Pn" whose ids are `player(1)..player(n)`.
pub fn tournament(n: usize, settings: TournamentSettings) -> Tournament {
    let roster = (1..=n as u128)
        .map(|i| Player::with_id(Uuid::from_u128(i), format!("P{i}")))
        .collect();
    Tournament::with_players("Test Cup", roster, settings)
}

/// Score for a group match in which the player listed first in the group wins.
pub fn favourite_wins(group_players: &[PlayerId], a: PlayerId, b: PlayerId) -> MatchScore {
    let rank = |p: PlayerId| group_players.iter().position(|x| *x == p);
    if rank(a) < rank(b) {
        MatchScore::legs(3, 0)
    } else {
        MatchScore::legs(0, 3)
    }
}

/// Every open group match of the current phase, as (group index, match id, score)
/// with the earlier-listed player winning.
pub fn open_group_results(t: &Tournament) -> Vec<(usize, u32, MatchScore)> {
    t.phase
        .groups()
        .iter()
        .enumerate()
        .flat_map(|(g, group)| {
            group
                .matches
                .iter()
                .filter(|m| !m.status.is_decided())
                .map(move |m| (g, m.id, favourite_wins(&group.players, m.player_a, m.player_b)))
        })
        .collect()
}
