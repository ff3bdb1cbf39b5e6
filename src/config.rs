//! Tournament settings (JSON) and server configuration (environment).

use crate::models::{EliminationMode, GameRules, RoundRules, Seeding};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// What follows the group phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostGroupMode {
    #[default]
    Knockout,
    RoundRobinFinals,
}

/// Shape of the knockout bracket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutSettings {
    #[serde(default)]
    pub elimination: EliminationMode,
    #[serde(default)]
    pub seeding: Seeding,
}

/// Settings chosen by the organizer before the tournament starts.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    /// Build the knockout bracket straight from the roster; no groups are played.
    #[serde(default)]
    pub skip_group_phase: bool,

    /// Top finishers of each group that advance.
    #[serde(default = "default_qualifiers_per_group")]
    pub qualifiers_per_group: usize,

    #[serde(default)]
    pub post_group_mode: PostGroupMode,

    #[serde(default)]
    pub knockout: KnockoutSettings,

    /// Group and finals matches use `rules.base`; knockout rounds may override it.
    #[serde(default)]
    pub rules: RoundRules,
}

fn default_qualifiers_per_group() -> usize {
    2
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            skip_group_phase: false,
            qualifiers_per_group: default_qualifiers_per_group(),
            post_group_mode: PostGroupMode::default(),
            knockout: KnockoutSettings::default(),
            rules: RoundRules::default(),
        }
    }
}

impl TournamentSettings {
    /// Parse and validate settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qualifiers_per_group == 0 {
            return Err(ConfigError::ValidationError(
                "qualifiers_per_group must be at least 1".to_string(),
            ));
        }
        self.rules.all().try_for_each(validate_rules)
    }
}

fn validate_rules(rules: &GameRules) -> Result<(), ConfigError> {
    if rules.legs_to_win == 0 {
        return Err(ConfigError::ValidationError(
            "legs_to_win must be at least 1".to_string(),
        ));
    }
    if rules.sets_to_win == Some(0) {
        return Err(ConfigError::ValidationError(
            "sets_to_win must be at least 1 when sets are played".to_string(),
        ));
    }
    if let Some(legs_per_set) = rules.legs_per_set {
        if legs_per_set < rules.legs_to_win {
            return Err(ConfigError::ValidationError(format!(
                "legs_per_set ({legs_per_set}) is below legs_to_win ({})",
                rules.legs_to_win
            )));
        }
    }
    Ok(())
}

/// Where the web server listens. Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(default_port);
        Self { host, port }
    }
}
