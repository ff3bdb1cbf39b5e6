//! Match results: score validation against the effective rules, result
//! recording and match reset.

use chrono::Utc;

use crate::logic::{byes, propagation};
use crate::models::{
    Advancement, GameRules, KnockoutBracket, MatchScore, MatchStatus, NodeId, Side,
    TournamentError,
};

/// Check `score` against `rules` and return the winning side.
///
/// Shape violations are `InvalidScore`; a consistent score where both or
/// neither side reached the threshold is `AmbiguousResult` / `IncompleteResult`.
pub fn validate_score(rules: &GameRules, score: &MatchScore) -> Result<Side, TournamentError> {
    match rules.sets_to_win {
        None => validate_legs(rules, score),
        Some(sets_to_win) => validate_sets(rules, sets_to_win, score),
    }
}

fn validate_legs(rules: &GameRules, score: &MatchScore) -> Result<Side, TournamentError> {
    if score.sets_a != 0 || score.sets_b != 0 {
        return Err(TournamentError::InvalidScore(
            "sets recorded for a leg-only format".to_string(),
        ));
    }
    let target = rules.legs_to_win;
    if score.legs_a > target || score.legs_b > target {
        return Err(TournamentError::InvalidScore(format!(
            "legs {}:{} exceed the {target} needed to win",
            score.legs_a, score.legs_b
        )));
    }
    decide(score.legs_a, score.legs_b, target)
}

fn validate_sets(
    rules: &GameRules,
    sets_to_win: u32,
    score: &MatchScore,
) -> Result<Side, TournamentError> {
    if score.sets_a > sets_to_win || score.sets_b > sets_to_win {
        return Err(TournamentError::InvalidScore(format!(
            "sets {}:{} exceed the {sets_to_win} needed to win",
            score.sets_a, score.sets_b
        )));
    }
    let played = score.sets_a + score.sets_b;
    let per_set = rules.legs_to_win;
    for side in Side::BOTH {
        let won = score.sets_for(side);
        let lost = played - won;
        let legs = score.legs_for(side);
        let fewest = won * per_set;
        let most = won * per_set + lost * per_set.saturating_sub(1);
        if legs < fewest {
            return Err(TournamentError::InvalidScore(format!(
                "side {side:?} won {won} set(s) but only {legs} leg(s); each set takes {per_set}"
            )));
        }
        if legs > most {
            return Err(TournamentError::InvalidScore(format!(
                "side {side:?} has {legs} leg(s), at most {most} fit {won} set(s) won and {lost} lost"
            )));
        }
    }
    let max_legs = rules.max_legs_per_set() * played;
    if score.legs_a + score.legs_b > max_legs {
        return Err(TournamentError::InvalidScore(format!(
            "{} legs in {played} set(s) of at most {} legs",
            score.legs_a + score.legs_b,
            rules.max_legs_per_set()
        )));
    }
    decide(score.sets_a, score.sets_b, sets_to_win)
}

fn decide(a: u32, b: u32, target: u32) -> Result<Side, TournamentError> {
    match (a == target, b == target) {
        (true, true) => Err(TournamentError::AmbiguousResult),
        (true, false) => Ok(Side::A),
        (false, true) => Ok(Side::B),
        (false, false) => Err(TournamentError::IncompleteResult),
    }
}

/// Mark a ready match as being played.
pub fn start_match(bracket: &mut KnockoutBracket, id: NodeId) -> Result<(), TournamentError> {
    let node = bracket.require_mut(id)?;
    if node.status != MatchStatus::NotStarted {
        return Err(TournamentError::invalid_state(format!(
            "{id} cannot start from {:?}",
            node.status
        )));
    }
    if !node.is_ready() {
        return Err(TournamentError::invalid_state(format!("{id} is waiting for players")));
    }
    node.status = MatchStatus::InProgress;
    Ok(())
}

/// Record the result of `id` and propagate winner and loser.
pub fn submit_result(
    bracket: &mut KnockoutBracket,
    id: NodeId,
    score: MatchScore,
) -> Result<Vec<Advancement>, TournamentError> {
    let node = bracket.require(id)?;
    if node.is_decided() {
        return Err(TournamentError::invalid_state(format!("{id} is already decided")));
    }
    let (Some(a), Some(b)) = (node.player_a(), node.player_b()) else {
        return Err(TournamentError::invalid_state(format!("{id} is waiting for players")));
    };
    let rules = bracket.rules.effective_rules(node.round);
    let (winner, loser) = match validate_score(rules, &score)? {
        Side::A => (a, b),
        Side::B => (b, a),
    };

    let node = bracket.require_mut(id)?;
    node.status = MatchStatus::Finished;
    node.score = Some(score);
    node.winner = Some(winner);
    node.loser = Some(loser);
    node.finished_at = Some(Utc::now());
    log::info!(
        "{id} ({}) finished {}:{} legs, {}:{} sets",
        node.round,
        score.legs_a,
        score.legs_b,
        score.sets_a,
        score.sets_b
    );
    Ok(propagation::propagate(bracket, id))
}

/// Reopen a finished match, taking back what its result propagated.
pub fn reset_match(bracket: &mut KnockoutBracket, id: NodeId) -> Result<Vec<Advancement>, TournamentError> {
    let node = bracket.require(id)?;
    match node.status {
        MatchStatus::Finished => {}
        MatchStatus::Bye => {
            return Err(TournamentError::invalid_state(format!(
                "{id} was decided by a bye; undo the bye instead"
            )))
        }
        _ => return Err(TournamentError::invalid_state(format!("{id} has no result"))),
    }
    propagation::retract(bracket, id)?;
    bracket.require_mut(id)?.clear_result();
    log::info!("{id}: result reset");
    Ok(byes::recheck_dependents(bracket, id))
}
