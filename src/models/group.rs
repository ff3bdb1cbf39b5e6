//! Round-robin groups and their matches.

use crate::models::game::{MatchScore, MatchStatus};
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a match within its group.
pub type MatchId = u32;

/// A single round-robin match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupMatch {
    pub id: MatchId,
    /// Round-robin round this match is scheduled in (1-based).
    pub round: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub status: MatchStatus,
    pub score: Option<MatchScore>,
    pub winner: Option<PlayerId>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl GroupMatch {
    pub fn new(id: MatchId, round: u32, player_a: PlayerId, player_b: PlayerId) -> Self {
        Self {
            id,
            round,
            player_a,
            player_b,
            status: MatchStatus::NotStarted,
            score: None,
            winner: None,
            finished_at: None,
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_a == player || self.player_b == player
    }

    pub(crate) fn clear_result(&mut self) {
        self.status = MatchStatus::NotStarted;
        self.score = None;
        self.winner = None;
        self.finished_at = None;
    }
}

/// Ordered players plus the round-robin matches generated for them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub players: Vec<PlayerId>,
    #[serde(default)]
    pub matches: Vec<GroupMatch>,
}

impl Group {
    /// A group with no matches yet.
    pub fn new(name: impl Into<String>, players: Vec<PlayerId>) -> Self {
        Self {
            name: name.into(),
            players,
            matches: Vec::new(),
        }
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GroupMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut GroupMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    pub fn open_matches(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| !m.status.is_decided())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.open_matches() == 0
    }

    pub(crate) fn clear_results(&mut self) {
        for m in &mut self.matches {
            m.clear_result();
        }
    }
}

/// One row of a group table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub legs_won: u32,
    pub legs_lost: u32,
}

impl Standing {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }

    pub fn set_difference(&self) -> i64 {
        i64::from(self.sets_won) - i64::from(self.sets_lost)
    }

    pub fn leg_difference(&self) -> i64 {
        i64::from(self.legs_won) - i64::from(self.legs_lost)
    }
}
