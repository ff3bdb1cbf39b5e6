//! Tournament, its phases and the events it emits.

use crate::config::TournamentSettings;
use crate::models::bracket::{BracketNode, KnockoutBracket, NodeId, Slot};
use crate::models::error::TournamentError;
use crate::models::game::Side;
use crate::models::group::{Group, MatchId};
use crate::models::player::{Player, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Overall lifecycle of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Adding players and building groups; not started.
    #[default]
    Setup,
    /// Matches are being played in the current phase.
    Running,
    /// The final phase has no open match left.
    Completed,
}

/// Tag of a [`TournamentPhase`], for logging and events.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    GroupPhase,
    RoundRobinFinals,
    KnockoutPhase,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::GroupPhase => write!(f, "group phase"),
            PhaseKind::RoundRobinFinals => write!(f, "round-robin finals"),
            PhaseKind::KnockoutPhase => write!(f, "knockout phase"),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupStage {
    /// Players entering the tournament.
    pub qualified: Vec<PlayerId>,
    pub groups: Vec<Group>,
    /// Set once the tournament has advanced past this phase.
    pub completed: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinalsStage {
    pub qualified: Vec<PlayerId>,
    pub group: Group,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutStage {
    pub qualified: Vec<PlayerId>,
    pub bracket: KnockoutBracket,
}

/// One phase of the tournament. Only the phase manager replaces the current phase.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    GroupPhase(GroupStage),
    RoundRobinFinals(FinalsStage),
    KnockoutPhase(KnockoutStage),
}

impl Default for TournamentPhase {
    fn default() -> Self {
        TournamentPhase::GroupPhase(GroupStage::default())
    }
}

impl TournamentPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            TournamentPhase::GroupPhase(_) => PhaseKind::GroupPhase,
            TournamentPhase::RoundRobinFinals(_) => PhaseKind::RoundRobinFinals,
            TournamentPhase::KnockoutPhase(_) => PhaseKind::KnockoutPhase,
        }
    }

    /// Players that entered this phase.
    pub fn qualified_players(&self) -> &[PlayerId] {
        match self {
            TournamentPhase::GroupPhase(stage) => &stage.qualified,
            TournamentPhase::RoundRobinFinals(stage) => &stage.qualified,
            TournamentPhase::KnockoutPhase(stage) => &stage.qualified,
        }
    }

    pub fn bracket(&self) -> Option<&KnockoutBracket> {
        match self {
            TournamentPhase::KnockoutPhase(stage) => Some(&stage.bracket),
            _ => None,
        }
    }

    /// Groups of this phase: the group stage's groups, or the single finals group.
    pub fn groups(&self) -> &[Group] {
        match self {
            TournamentPhase::GroupPhase(stage) => &stage.groups,
            TournamentPhase::RoundRobinFinals(stage) => std::slice::from_ref(&stage.group),
            TournamentPhase::KnockoutPhase(_) => &[],
        }
    }

    pub fn groups_mut(&mut self) -> &mut [Group] {
        match self {
            TournamentPhase::GroupPhase(stage) => &mut stage.groups,
            TournamentPhase::RoundRobinFinals(stage) => std::slice::from_mut(&mut stage.group),
            TournamentPhase::KnockoutPhase(_) => &mut [],
        }
    }

    /// Matches or nodes not yet `Finished` or `Bye`.
    pub fn open_matches(&self) -> usize {
        match self {
            TournamentPhase::KnockoutPhase(stage) => stage.bracket.open_nodes(),
            _ => self.groups().iter().map(Group::open_matches).sum(),
        }
    }
}

/// Outgoing notification emitted after a successful mutation, for redraws,
/// persistence or network pushes done by collaborators.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum TournamentEvent {
    Started { phase: PhaseKind },
    GroupResultRecorded { group: usize, match_id: MatchId, winner: PlayerId },
    MatchStarted { node: NodeId },
    ResultRecorded { node: NodeId, winner: PlayerId },
    ByeGiven { node: NodeId, winner: Option<PlayerId> },
    ByeUndone { node: NodeId },
    MatchReset { node: NodeId },
    SlotFilled { node: NodeId, side: Side, slot: Slot },
    PhaseAdvanced { from: PhaseKind, to: PhaseKind },
    PhaseReset { phase: PhaseKind },
    Completed { champion: Option<PlayerId> },
}

/// Full tournament state: roster, settings, current phase and phase history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub players: Vec<Player>,
    pub settings: TournamentSettings,
    pub state: TournamentState,
    pub phase: TournamentPhase,
    /// Phases already left behind, oldest first.
    pub history: Vec<TournamentPhase>,
    #[serde(skip)]
    events: Vec<TournamentEvent>,
}

impl Tournament {
    /// Create a new tournament in Setup state with no players.
    pub fn new(name: impl Into<String>, settings: TournamentSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            players: Vec::new(),
            settings,
            state: TournamentState::Setup,
            phase: TournamentPhase::default(),
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Create a tournament with initial players. Still in Setup until started.
    pub fn with_players(
        name: impl Into<String>,
        players: Vec<Player>,
        settings: TournamentSettings,
    ) -> Self {
        Self {
            players,
            ..Self::new(name, settings)
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Add a player (Setup only). Names must be unique (case-insensitive).
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, TournamentError> {
        if self.state != TournamentState::Setup {
            return Err(TournamentError::invalid_state("players can only be added during setup"));
        }
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::invalid_state("player name is empty"));
        }
        let is_duplicate = self
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicatePlayerName);
        }
        let player = Player::new(name_trimmed);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player by id (Setup only). The player also leaves any group.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<(), TournamentError> {
        if self.state != TournamentState::Setup {
            return Err(TournamentError::invalid_state("players can only be removed during setup"));
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        self.players.remove(idx);
        for group in self.phase.groups_mut() {
            group.players.retain(|p| *p != player_id);
        }
        Ok(())
    }

    pub fn current_phase(&self) -> &TournamentPhase {
        &self.phase
    }

    pub fn qualified_players(&self) -> &[PlayerId] {
        self.phase.qualified_players()
    }

    pub fn can_advance(&self) -> bool {
        self.state == TournamentState::Running && crate::logic::phase::can_advance(&self.phase)
    }

    pub fn bracket(&self) -> Option<&KnockoutBracket> {
        self.phase.bracket()
    }

    /// Knockout bracket of the current phase, for mutation.
    pub fn knockout_mut(&mut self) -> Result<&mut KnockoutBracket, TournamentError> {
        if self.state == TournamentState::Setup {
            return Err(TournamentError::invalid_state("tournament has not started"));
        }
        match &mut self.phase {
            TournamentPhase::KnockoutPhase(stage) => Ok(&mut stage.bracket),
            _ => Err(TournamentError::invalid_state("current phase is not a knockout phase")),
        }
    }

    pub fn winner_bracket_nodes(&self) -> &[BracketNode] {
        self.bracket()
            .map(KnockoutBracket::winner_bracket_nodes)
            .unwrap_or(&[])
    }

    pub fn loser_bracket_nodes(&self) -> &[BracketNode] {
        self.bracket()
            .map(KnockoutBracket::loser_bracket_nodes)
            .unwrap_or(&[])
    }

    /// Tournament winner once the final phase is complete.
    pub fn champion(&self) -> Option<PlayerId> {
        if self.state != TournamentState::Completed {
            return None;
        }
        match &self.phase {
            TournamentPhase::KnockoutPhase(stage) => stage.bracket.champion(),
            TournamentPhase::RoundRobinFinals(stage) => crate::logic::group_play::standings(&stage.group)
                .first()
                .map(|s| s.player),
            TournamentPhase::GroupPhase(_) => None,
        }
    }

    pub(crate) fn emit(&mut self, event: TournamentEvent) {
        self.events.push(event);
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<TournamentEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move to Completed once a final phase has no open match, or back to
    /// Running when results were cleared.
    pub(crate) fn refresh_state(&mut self) {
        let final_phase = !matches!(self.phase, TournamentPhase::GroupPhase(_));
        let complete = final_phase && self.phase.open_matches() == 0;
        match self.state {
            TournamentState::Running if complete => {
                self.state = TournamentState::Completed;
                let champion = self.champion();
                log::info!("Tournament {} completed, champion {:?}", self.id, champion);
                self.emit(TournamentEvent::Completed { champion });
            }
            TournamentState::Completed if !complete => {
                self.state = TournamentState::Running;
            }
            _ => {}
        }
    }
}
