//! Turn rules configuration.
//!
//! Loaded from a TOML file whose keys mirror [`TurnConfig`]'s fields. Every
//! key is optional; missing keys keep their defaults.
//!
//! ```toml
//! min_players = 2
//! max_players = 2
//! turns_per_player = 1
//! rack_enabled = true
//! end_turn_delay = 3.0
//!
//! [[transitions]]
//! from = "start"
//! to = "rack"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::graph::TransitionConfig;
use super::phases::PoolPhase;

/// Seconds spent in the end-of-turn phase unless configured otherwise.
pub const DEFAULT_END_TURN_DELAY: f32 = 3.0;

/// Config loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid turn config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Rules governing who plays and how long a turn lingers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Players required before the first turn starts
    pub min_players: usize,
    pub max_players: usize,
    /// Consecutive shots granted before the turn passes
    pub turns_per_player: u32,
    pub rack_enabled: bool,
    /// Seconds spent in the end-of-turn phase
    pub end_turn_delay: f32,
    /// Phase graph override. Empty means the standard pool graph.
    pub transitions: Vec<TransitionConfig<PoolPhase>>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 2,
            turns_per_player: 1,
            rack_enabled: false,
            end_turn_delay: DEFAULT_END_TURN_DELAY,
            transitions: Vec::new(),
        }
    }
}

impl TurnConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: TurnConfig = toml::from_str(contents)?;
        if !config.end_turn_delay.is_finite() || config.end_turn_delay < 0.0 {
            tracing::warn!(
                end_turn_delay = config.end_turn_delay,
                default = DEFAULT_END_TURN_DELAY,
                "end-of-turn delay must be a non-negative number of seconds, using the default"
            );
            config.end_turn_delay = DEFAULT_END_TURN_DELAY;
        }
        if config.min_players > config.max_players {
            tracing::warn!(
                min_players = config.min_players,
                max_players = config.max_players,
                "minimum player count exceeds roster capacity, the game can never start"
            );
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("loaded turn config from {}", path.display());
        Ok(config)
    }

    /// Configured transitions, or the standard pool graph when none are set.
    pub fn resolved_transitions(&self) -> Vec<TransitionConfig<PoolPhase>> {
        if self.transitions.is_empty() {
            super::phases::default_transitions(self.rack_enabled)
        } else {
            self.transitions.clone()
        }
    }
}
