//! Setup phase: grouping the roster and starting the tournament.

use crate::logic::group_play::schedule_group;
use crate::models::{
    Group, GroupStage, PhaseKind, PlayerId, Tournament, TournamentError, TournamentEvent,
    TournamentPhase, TournamentState,
};

/// Split the roster into `group_count` groups (Setup only).
///
/// Players are dealt in snake order (A B C C B A ...) so that, with the roster
/// ordered by strength, the groups come out balanced.
pub fn create_groups(tournament: &mut Tournament, group_count: usize) -> Result<(), TournamentError> {
    if tournament.state != TournamentState::Setup {
        return Err(TournamentError::invalid_state("groups can only be created during setup"));
    }
    if group_count == 0 {
        return Err(TournamentError::invalid_state("at least one group is required"));
    }
    let required = group_count * 2;
    if tournament.players.len() < required {
        return Err(TournamentError::InsufficientPlayers {
            required,
            actual: tournament.players.len(),
        });
    }

    let mut members: Vec<Vec<PlayerId>> = vec![Vec::new(); group_count];
    for (i, player) in tournament.players.iter().enumerate() {
        let lap = i / group_count;
        let offset = i % group_count;
        let index = if lap % 2 == 0 { offset } else { group_count - 1 - offset };
        members[index].push(player.id);
    }
    let groups = members
        .into_iter()
        .enumerate()
        .map(|(i, players)| Group::new(group_name(i), players))
        .collect();
    tournament.phase = TournamentPhase::GroupPhase(GroupStage {
        qualified: Vec::new(),
        groups,
        completed: false,
    });
    Ok(())
}

/// "Group A" .. "Group Z", then numbered.
pub fn group_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("Group {}", char::from(b'A' + i)),
        _ => format!("Group {}", index + 1),
    }
}

/// Start the tournament: Setup -> Running.
///
/// With groups, every player must sit in exactly one group of at least two
/// players; round-robin matches are generated. With `skip_group_phase` no
/// groups are needed and the caller advances straight to the knockout.
pub fn start_tournament(tournament: &mut Tournament) -> Result<(), TournamentError> {
    if tournament.state != TournamentState::Setup {
        return Err(TournamentError::invalid_state("tournament already started"));
    }
    if tournament.players.len() < 2 {
        return Err(TournamentError::InsufficientPlayers {
            required: 2,
            actual: tournament.players.len(),
        });
    }
    let roster = tournament.player_ids();
    let skip_groups = tournament.settings.skip_group_phase;
    let TournamentPhase::GroupPhase(stage) = &mut tournament.phase else {
        return Err(TournamentError::invalid_state("setup must hold a group phase"));
    };

    if skip_groups {
        stage.groups.clear();
    } else {
        if stage.groups.is_empty() {
            return Err(TournamentError::invalid_state("create groups before starting"));
        }
        if let Some(small) = stage.groups.iter().find(|g| g.players.len() < 2) {
            return Err(TournamentError::invalid_state(format!(
                "{} needs at least two players",
                small.name
            )));
        }
        for player in &roster {
            let seats = stage
                .groups
                .iter()
                .filter(|g| g.players.contains(player))
                .count();
            if seats != 1 {
                return Err(TournamentError::invalid_state(format!(
                    "player {player} sits in {seats} groups"
                )));
            }
        }
        for group in &mut stage.groups {
            schedule_group(group);
        }
    }
    stage.qualified = roster;
    stage.completed = false;

    tournament.state = TournamentState::Running;
    log::info!(
        "Tournament {} started with {} players",
        tournament.id,
        tournament.players.len()
    );
    tournament.emit(TournamentEvent::Started {
        phase: PhaseKind::GroupPhase,
    });
    Ok(())
}
