//! Round-robin play: match generation, result recording and standings.

use chrono::Utc;

use crate::logic::results::validate_score;
use crate::models::{
    Group, GroupMatch, MatchScore, MatchStatus, PlayerId, Side, Standing, Tournament,
    TournamentError, TournamentEvent, TournamentState,
};

/// Generate every pairing of `players` once, scheduled in rounds (circle method).
///
/// With an odd count one player sits out each round. Match ids count up from 1.
pub fn generate_round_robin(players: &[PlayerId]) -> Vec<GroupMatch> {
    if players.len() < 2 {
        return Vec::new();
    }
    let mut ring: Vec<Option<PlayerId>> = players.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let n = ring.len();
    let mut matches = Vec::with_capacity(players.len() * (players.len() - 1) / 2);
    for round in 1..n as u32 {
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[n - 1 - i]) {
                let id = matches.len() as u32 + 1;
                matches.push(GroupMatch::new(id, round, a, b));
            }
        }
        // First player stays fixed, everyone else rotates one place.
        ring[1..].rotate_right(1);
    }
    matches
}

/// Fill `group.matches` with a fresh round robin.
pub fn schedule_group(group: &mut Group) {
    group.matches = generate_round_robin(&group.players);
}

/// Record a result for a group (or finals) match of the current phase.
///
/// `group` indexes the current phase's groups; the round-robin finals phase
/// has a single group at index 0. A finished match may be corrected as long
/// as the phase has not been advanced.
pub fn submit_group_result(
    tournament: &mut Tournament,
    group: usize,
    match_id: u32,
    score: MatchScore,
) -> Result<(), TournamentError> {
    if tournament.state == TournamentState::Setup {
        return Err(TournamentError::invalid_state("tournament has not started"));
    }
    let rules = tournament.settings.rules.base.clone();
    let group_match = tournament
        .phase
        .groups_mut()
        .get_mut(group)
        .and_then(|g| g.get_match_mut(match_id))
        .ok_or(TournamentError::UnknownMatch { group, match_id })?;
    let winner = match validate_score(&rules, &score)? {
        Side::A => group_match.player_a,
        Side::B => group_match.player_b,
    };
    group_match.status = MatchStatus::Finished;
    group_match.score = Some(score);
    group_match.winner = Some(winner);
    group_match.finished_at = Some(Utc::now());
    log::info!(
        "Group {group} match {match_id}: {}:{} legs, winner {winner}",
        score.legs_a,
        score.legs_b
    );

    tournament.emit(TournamentEvent::GroupResultRecorded {
        group,
        match_id,
        winner,
    });
    tournament.refresh_state();
    Ok(())
}

/// Group table, best first: wins, then set difference, leg difference, legs
/// won, then the group's own player order.
pub fn standings(group: &Group) -> Vec<Standing> {
    let mut table: Vec<Standing> = group.players.iter().map(|p| Standing::new(*p)).collect();
    for m in group.matches.iter().filter(|m| m.status == MatchStatus::Finished) {
        let (Some(score), Some(winner)) = (m.score, m.winner) else {
            continue;
        };
        for (player, side) in [(m.player_a, Side::A), (m.player_b, Side::B)] {
            let Some(row) = table.iter_mut().find(|s| s.player == player) else {
                continue;
            };
            row.played += 1;
            if winner == player {
                row.wins += 1;
            } else {
                row.losses += 1;
            }
            row.sets_won += score.sets_for(side);
            row.sets_lost += score.sets_for(side.other());
            row.legs_won += score.legs_for(side);
            row.legs_lost += score.legs_for(side.other());
        }
    }
    table.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.set_difference().cmp(&a.set_difference()))
            .then_with(|| b.leg_difference().cmp(&a.leg_difference()))
            .then_with(|| b.legs_won.cmp(&a.legs_won))
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn odd_group_sits_one_player_out_per_round() {
        let players: Vec<PlayerId> = (1..=5).map(Uuid::from_u128).collect();
        let matches = generate_round_robin(&players);
        assert_eq!(matches.len(), 10);
        for round in 1..=5 {
            assert_eq!(matches.iter().filter(|m| m.round == round).count(), 2);
        }
    }
}
