//! Bracket generation: winner tree, loser tree and the grand-final wiring.

use crate::logic::byes;
use crate::models::{
    Bracket, BracketSide, EliminationMode, Feed, GrandFinalWiring, KnockoutBracket, NodeId,
    PlayerId, Round, RoundRules, Seeding, Slot, TournamentError,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Build a knockout bracket for `players` and resolve the byes its padding creates.
pub fn generate_bracket(
    players: &[PlayerId],
    mode: EliminationMode,
    seeding: Seeding,
    rules: RoundRules,
) -> Result<KnockoutBracket, TournamentError> {
    let mut bracket = generate(players, mode, seeding, rules)?;
    let advanced = byes::check_and_resolve_byes(&mut bracket);
    log::info!(
        "Generated {:?} elimination bracket: {} players, {} slots, {} winner / {} loser nodes, {} slot(s) filled by byes",
        bracket.mode,
        players.len(),
        bracket.bracket_size,
        bracket.winner.len(),
        bracket.loser.as_ref().map_or(0, Bracket::len),
        advanced.len()
    );
    Ok(bracket)
}

/// Build the bracket graph without resolving byes.
///
/// The player count is padded to the next power of two; padded slots are
/// [`Slot::Vacant`]. Deterministic for a given input and seeding.
pub fn generate(
    players: &[PlayerId],
    mode: EliminationMode,
    seeding: Seeding,
    rules: RoundRules,
) -> Result<KnockoutBracket, TournamentError> {
    if players.len() < 2 {
        return Err(TournamentError::InsufficientPlayers {
            required: 2,
            actual: players.len(),
        });
    }
    let size = players.len().next_power_of_two();
    let rounds = size.trailing_zeros();
    let placement = place_players(players, size, seeding);

    let mut winner = Bracket::new(BracketSide::Winner);
    let mut previous: Vec<NodeId> = Vec::with_capacity(size / 2);
    for (position, pair) in placement.chunks_exact(2).enumerate() {
        let id = winner.push(Round::for_winner_round(size, 1), 1, position);
        if let Some(node) = winner.get_mut(id) {
            node.slots = [pair[0], pair[1]];
        }
        previous.push(id);
    }
    let mut winner_rounds = vec![previous.clone()];
    for round_index in 2..=rounds {
        let round = Round::for_winner_round(size, round_index);
        let current: Vec<NodeId> = previous
            .chunks_exact(2)
            .enumerate()
            .map(|(position, pair)| {
                let id = winner.push(round, round_index, position);
                if let Some(node) = winner.get_mut(id) {
                    node.sources = [Some(Feed::winner_of(pair[0])), Some(Feed::winner_of(pair[1]))];
                }
                id
            })
            .collect();
        winner_rounds.push(current.clone());
        previous = current;
    }
    let winner_final = previous[0];

    let mode = if mode == EliminationMode::Double && rounds < 2 {
        log::warn!("Double elimination needs at least 3 players; playing single elimination");
        EliminationMode::Single
    } else {
        mode
    };

    let (loser, grand_final) = match mode {
        EliminationMode::Single => (None, None),
        EliminationMode::Double => {
            let (loser, loser_final) = build_loser_bracket(&winner_rounds);
            let node = winner.push(Round::GrandFinal, rounds + 1, 0);
            if let Some(gf) = winner.get_mut(node) {
                gf.sources = [
                    Some(Feed::winner_of(winner_final)),
                    Some(Feed::winner_of(loser_final)),
                ];
            }
            let wiring = GrandFinalWiring {
                node,
                winner_final,
                loser_final,
            };
            (Some(loser), Some(wiring))
        }
    };

    let bracket = KnockoutBracket {
        mode,
        seeding,
        bracket_size: size,
        rules,
        winner,
        loser,
        winner_final,
        grand_final,
    };
    debug_assert_eq!(bracket.check_integrity(), Ok(()));
    Ok(bracket)
}

/// Loser tree fed by the losers of every winner round except the final.
///
/// Round 1 pairs the first-round losers. Then, for each later winner round,
/// the loser-bracket survivors meet that round's losers (drop-in round) and
/// the winners of those matches pair off (halving round). Returns the tree and
/// its final node.
fn build_loser_bracket(winner_rounds: &[Vec<NodeId>]) -> (Bracket, NodeId) {
    let mut loser = Bracket::new(BracketSide::Loser);
    let mut round_index = 1;
    let mut survivors: Vec<NodeId> = winner_rounds[0]
        .chunks_exact(2)
        .enumerate()
        .map(|(position, pair)| {
            let id = loser.push(Round::LoserRound(round_index), round_index, position);
            if let Some(node) = loser.get_mut(id) {
                node.sources = [Some(Feed::loser_of(pair[0])), Some(Feed::loser_of(pair[1]))];
            }
            id
        })
        .collect();

    let last_feeding_round = winner_rounds.len() - 1;
    for (j, dropping) in winner_rounds.iter().enumerate().take(last_feeding_round).skip(1) {
        round_index += 1;
        // Alternate the drop-in order so players do not meet their previous opponent at once.
        let drop_order: Vec<NodeId> = if j % 2 == 1 {
            dropping.iter().rev().copied().collect()
        } else {
            dropping.clone()
        };
        survivors = survivors
            .iter()
            .zip(drop_order)
            .enumerate()
            .map(|(position, (survivor, dropped))| {
                let id = loser.push(Round::LoserRound(round_index), round_index, position);
                if let Some(node) = loser.get_mut(id) {
                    node.sources = [Some(Feed::winner_of(*survivor)), Some(Feed::loser_of(dropped))];
                }
                id
            })
            .collect();

        round_index += 1;
        survivors = survivors
            .chunks_exact(2)
            .enumerate()
            .map(|(position, pair)| {
                let id = loser.push(Round::LoserRound(round_index), round_index, position);
                if let Some(node) = loser.get_mut(id) {
                    node.sources = [Some(Feed::winner_of(pair[0])), Some(Feed::winner_of(pair[1]))];
                }
                id
            })
            .collect();
    }

    let loser_final = survivors[0];
    if let Some(node) = loser.get_mut(loser_final) {
        node.round = Round::LoserFinal;
    }
    (loser, loser_final)
}

/// First-round slot contents, two per node, `size` in total.
fn place_players(players: &[PlayerId], size: usize, seeding: Seeding) -> Vec<Slot> {
    match seeding {
        Seeding::Seeded => seed_order(size)
            .into_iter()
            .map(|seed| {
                players
                    .get(seed - 1)
                    .map_or(Slot::Vacant, |p| Slot::Player(*p))
            })
            .collect(),
        Seeding::InputOrder => input_order_placement(players, size),
        Seeding::Random { seed } => {
            let mut shuffled = players.to_vec();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
            input_order_placement(&shuffled, size)
        }
    }
}

/// Adjacent players meet; the last `size - players.len()` nodes get one player and a vacancy.
fn input_order_placement(players: &[PlayerId], size: usize) -> Vec<Slot> {
    let contested = players.len() - size / 2;
    let mut remaining = players.iter().copied();
    let mut slots = Vec::with_capacity(size);
    for node in 0..size / 2 {
        slots.push(remaining.next().map_or(Slot::Vacant, Slot::Player));
        if node < contested {
            slots.push(remaining.next().map_or(Slot::Vacant, Slot::Player));
        } else {
            slots.push(Slot::Vacant);
        }
    }
    slots
}

/// Standard bracket order of 1-based seeds: 1 meets `size`, and seeds 1 and 2
/// can only meet in the final. For 8: `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let doubled = order.len() * 2;
        order = order
            .iter()
            .flat_map(|&seed| [seed, doubled + 1 - seed])
            .collect();
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_order_pairs_top_against_bottom() {
        assert_eq!(seed_order(2), vec![1, 2]);
        assert_eq!(seed_order(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn input_order_spreads_byes_over_last_nodes() {
        let ids: Vec<PlayerId> = (1..=5).map(uuid::Uuid::from_u128).collect();
        let slots = input_order_placement(&ids, 8);
        assert_eq!(
            slots,
            vec![
                Slot::Player(ids[0]),
                Slot::Player(ids[1]),
                Slot::Player(ids[2]),
                Slot::Vacant,
                Slot::Player(ids[3]),
                Slot::Vacant,
                Slot::Player(ids[4]),
                Slot::Vacant,
            ]
        );
    }
}
