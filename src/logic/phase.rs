//! Phase state machine: GroupPhase -> (RoundRobinFinals | KnockoutPhase).
//!
//! This module is the only place that replaces the current phase.

use crate::config::{PostGroupMode, TournamentSettings};
use crate::logic::bracket_gen::generate_bracket;
use crate::logic::byes;
use crate::logic::group_play::{schedule_group, standings};
use crate::models::{
    FinalsStage, Group, KnockoutStage, PlayerId, Tournament, TournamentError, TournamentEvent,
    TournamentPhase, TournamentState,
};

/// True when every match or node of `phase` is `Finished` or `Bye`.
pub fn can_advance(phase: &TournamentPhase) -> bool {
    phase.open_matches() == 0
}

/// Build the phase that follows `phase`. Only the group phase has a successor.
pub fn advance(
    phase: &TournamentPhase,
    roster: &[PlayerId],
    settings: &TournamentSettings,
) -> Result<TournamentPhase, TournamentError> {
    let TournamentPhase::GroupPhase(stage) = phase else {
        return Err(TournamentError::invalid_state(format!(
            "no phase follows the {}",
            phase.kind()
        )));
    };
    let open_matches = phase.open_matches();
    if open_matches > 0 {
        return Err(TournamentError::PhaseNotComplete { open_matches });
    }

    if settings.skip_group_phase {
        return knockout_phase(roster.to_vec(), settings);
    }
    let qualified = qualifiers(&stage.groups, settings.qualifiers_per_group)?;
    match settings.post_group_mode {
        PostGroupMode::Knockout => knockout_phase(qualified, settings),
        PostGroupMode::RoundRobinFinals => {
            if qualified.len() < 2 {
                return Err(TournamentError::InsufficientPlayers {
                    required: 2,
                    actual: qualified.len(),
                });
            }
            let mut group = Group::new("Finals", qualified.clone());
            schedule_group(&mut group);
            Ok(TournamentPhase::RoundRobinFinals(FinalsStage { qualified, group }))
        }
    }
}

fn knockout_phase(
    qualified: Vec<PlayerId>,
    settings: &TournamentSettings,
) -> Result<TournamentPhase, TournamentError> {
    let bracket = generate_bracket(
        &qualified,
        settings.knockout.elimination,
        settings.knockout.seeding,
        settings.rules.clone(),
    )?;
    Ok(TournamentPhase::KnockoutPhase(KnockoutStage { qualified, bracket }))
}

/// Top `per_group` finishers of each group, rank-major: every group winner
/// (in group order), then every runner-up, and so on.
pub fn qualifiers(groups: &[Group], per_group: usize) -> Result<Vec<PlayerId>, TournamentError> {
    let tables = groups
        .iter()
        .map(|group| {
            if group.players.len() < per_group {
                return Err(TournamentError::NotEnoughQualifiers {
                    group: group.name.clone(),
                    needed: per_group,
                    available: group.players.len(),
                });
            }
            Ok(standings(group)
                .into_iter()
                .take(per_group)
                .map(|s| s.player)
                .collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((0..per_group)
        .flat_map(|rank| tables.iter().map(move |table| table[rank]))
        .collect())
}

/// Advance the tournament to its next phase; the previous phase goes to history.
pub fn advance_phase(tournament: &mut Tournament) -> Result<&TournamentPhase, TournamentError> {
    if tournament.state != TournamentState::Running {
        return Err(TournamentError::invalid_state("tournament is not running"));
    }
    let roster = tournament.player_ids();
    let next = advance(&tournament.phase, &roster, &tournament.settings)?;
    let (from, to) = (tournament.phase.kind(), next.kind());

    let mut previous = std::mem::replace(&mut tournament.phase, next);
    if let TournamentPhase::GroupPhase(stage) = &mut previous {
        stage.completed = true;
    }
    tournament.history.push(previous);
    log::info!(
        "Tournament {} advanced from {from} to {to} with {} players",
        tournament.id,
        tournament.phase.qualified_players().len()
    );
    tournament.emit(TournamentEvent::PhaseAdvanced { from, to });
    tournament.refresh_state();
    Ok(&tournament.phase)
}

/// Drop every phase after the group phase (structure and results) and make the
/// group phase current again, marked incomplete. Groups and their results stay.
pub fn reset_to_group_phase(tournament: &mut Tournament) -> Result<(), TournamentError> {
    if !matches!(tournament.phase, TournamentPhase::GroupPhase(_)) {
        let position = tournament
            .history
            .iter()
            .position(|p| matches!(p, TournamentPhase::GroupPhase(_)))
            .ok_or_else(|| TournamentError::invalid_state("no group phase to return to"))?;
        tournament.phase = tournament.history.remove(position);
    }
    tournament.history.clear();
    if let TournamentPhase::GroupPhase(stage) = &mut tournament.phase {
        stage.completed = false;
    }
    if tournament.state == TournamentState::Completed {
        tournament.state = TournamentState::Running;
    }
    log::info!("Tournament {} reset to the group phase", tournament.id);
    let phase = tournament.phase.kind();
    tournament.emit(TournamentEvent::PhaseReset { phase });
    Ok(())
}

/// Clear every result of the current phase but keep its shape (groups,
/// schedules, bracket graph). Automatic byes are resolved again.
pub fn reset_current_phase_results(tournament: &mut Tournament) -> Result<(), TournamentError> {
    if tournament.state == TournamentState::Setup {
        return Err(TournamentError::invalid_state("tournament has not started"));
    }
    match &mut tournament.phase {
        TournamentPhase::GroupPhase(stage) => {
            for group in &mut stage.groups {
                group.clear_results();
            }
            stage.completed = false;
        }
        TournamentPhase::RoundRobinFinals(stage) => stage.group.clear_results(),
        TournamentPhase::KnockoutPhase(stage) => {
            stage.bracket.clear_results();
            byes::check_and_resolve_byes(&mut stage.bracket);
        }
    }
    let phase = tournament.phase.kind();
    log::info!("Tournament {}: results of the {phase} cleared", tournament.id);
    tournament.emit(TournamentEvent::PhaseReset { phase });
    tournament.refresh_state();
    Ok(())
}
