//! Vocabulary shared by group matches and bracket nodes: sides, status, score.

use serde::{Deserialize, Serialize};

/// One of the two player positions of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// Array index of this side in a `[_; 2]` slot pair.
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Lifecycle of a single match.
///
/// `NotStarted -> InProgress -> Finished` is the played path; `NotStarted -> Bye`
/// skips the contest. `Finished` and `Bye` are terminal until explicitly reset.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    NotStarted,
    InProgress,
    Finished,
    Bye,
}

impl MatchStatus {
    pub fn is_decided(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Bye)
    }
}

/// Sets and legs won by each side. Sets stay at zero for leg-only formats.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    #[serde(default)]
    pub sets_a: u32,
    #[serde(default)]
    pub sets_b: u32,
    pub legs_a: u32,
    pub legs_b: u32,
}

impl MatchScore {
    /// Score for a leg-only format.
    pub fn legs(legs_a: u32, legs_b: u32) -> Self {
        Self {
            sets_a: 0,
            sets_b: 0,
            legs_a,
            legs_b,
        }
    }

    /// Score for a set format; legs are totals over the whole match.
    pub fn sets(sets_a: u32, sets_b: u32, legs_a: u32, legs_b: u32) -> Self {
        Self {
            sets_a,
            sets_b,
            legs_a,
            legs_b,
        }
    }

    pub fn sets_for(&self, side: Side) -> u32 {
        match side {
            Side::A => self.sets_a,
            Side::B => self.sets_b,
        }
    }

    pub fn legs_for(&self, side: Side) -> u32 {
        match side {
            Side::A => self.legs_a,
            Side::B => self.legs_b,
        }
    }
}
