//! Match format (legs/sets needed to win) with per-round overrides.

use crate::models::bracket::Round;
use serde::{Deserialize, Serialize};

/// How a leg must be finished. Informational for scorers; does not affect validation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishMode {
    Single,
    #[default]
    Double,
}

/// Format of a single match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    #[serde(default = "default_start_score")]
    pub start_score: u32,
    /// Legs needed to win the match, or to win one set when sets are played.
    #[serde(default = "default_legs_to_win")]
    pub legs_to_win: u32,
    /// Sets needed to win the match; `None` for leg-only formats.
    #[serde(default)]
    pub sets_to_win: Option<u32>,
    /// Longest a set may run. Defaults to best-of (`2 * legs_to_win - 1`).
    #[serde(default)]
    pub legs_per_set: Option<u32>,
    #[serde(default)]
    pub finish: FinishMode,
}

fn default_start_score() -> u32 {
    501
}

fn default_legs_to_win() -> u32 {
    3
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            start_score: default_start_score(),
            legs_to_win: default_legs_to_win(),
            sets_to_win: None,
            legs_per_set: None,
            finish: FinishMode::default(),
        }
    }
}

impl GameRules {
    /// First to `legs_to_win` legs.
    pub fn legs(legs_to_win: u32) -> Self {
        Self {
            legs_to_win,
            ..Self::default()
        }
    }

    /// First to `sets_to_win` sets, each set first to `legs_to_win` legs.
    pub fn sets(sets_to_win: u32, legs_to_win: u32) -> Self {
        Self {
            legs_to_win,
            sets_to_win: Some(sets_to_win),
            ..Self::default()
        }
    }

    pub fn uses_sets(&self) -> bool {
        self.sets_to_win.is_some()
    }

    pub fn max_legs_per_set(&self) -> u32 {
        self.legs_per_set
            .unwrap_or_else(|| (2 * self.legs_to_win).saturating_sub(1))
    }
}

/// Rules that apply to one specific round instead of the base rules.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundOverride {
    pub round: Round,
    pub rules: GameRules,
}

/// Base rules plus an override table keyed by round.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRules {
    #[serde(default)]
    pub base: GameRules,
    #[serde(default)]
    pub overrides: Vec<RoundOverride>,
}

impl RoundRules {
    pub fn new(base: GameRules) -> Self {
        Self {
            base,
            overrides: Vec::new(),
        }
    }

    /// Builder form of [`RoundRules::set_override`].
    pub fn with_override(mut self, round: Round, rules: GameRules) -> Self {
        self.set_override(round, rules);
        self
    }

    /// Set the rules for `round`, replacing any existing override for it.
    pub fn set_override(&mut self, round: Round, rules: GameRules) {
        match self.overrides.iter_mut().find(|o| o.round == round) {
            Some(existing) => existing.rules = rules,
            None => self.overrides.push(RoundOverride { round, rules }),
        }
    }

    pub fn clear_override(&mut self, round: Round) {
        self.overrides.retain(|o| o.round != round);
    }

    /// Rules in force for `round`: its override if configured, else the base rules.
    pub fn effective_rules(&self, round: Round) -> &GameRules {
        self.overrides
            .iter()
            .find(|o| o.round == round)
            .map(|o| &o.rules)
            .unwrap_or(&self.base)
    }

    /// Base rules followed by every override (for validation).
    pub fn all(&self) -> impl Iterator<Item = &GameRules> + '_ {
        std::iter::once(&self.base).chain(self.overrides.iter().map(|o| &o.rules))
    }
}
