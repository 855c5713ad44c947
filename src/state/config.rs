//! Dice state configuration.
//!
//! Loaded from JSON, from the process environment, or built in code.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::collection::DEFAULT_CAPACITY;
use super::die::is_valid_faces;

/// Message shown before any operation has run.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to Dice Roller!";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse dice config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("{count} starter dice exceed capacity {capacity}")]
    TooManyStarterDice { count: usize, capacity: usize },

    #[error("starter die has invalid face count {0}")]
    InvalidStarterDie(u32),
}

/// Settings for a [`DiceState`](super::DiceState).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Maximum dice held at once
    pub capacity: usize,

    /// Face counts added when the state is created
    pub starter_dice: Vec<u32>,

    /// Initial last-action message
    pub welcome_message: String,

    /// Whether clearing the set restarts ids at 1
    pub reset_ids_on_clear: bool,

    /// Fixed RNG seed; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            starter_dice: vec![6, 20],
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            reset_ids_on_clear: true,
            seed: None,
        }
    }
}

impl DiceConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `DICE_CAPACITY` - Maximum dice (default: 6, floored to 1)
    /// - `DICE_SEED` - RNG seed (default: OS entropy)
    /// - `DICE_RESET_IDS_ON_CLEAR` - Restart ids after clear (default: true)
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(capacity) = parse::<usize>(lookup("DICE_CAPACITY")) {
            config.capacity = capacity.max(1);
        }
        if let Some(seed) = parse::<u64>(lookup("DICE_SEED")) {
            config.seed = Some(seed);
        }
        if let Some(reset) = parse_bool(lookup("DICE_RESET_IDS_ON_CLEAR")) {
            config.reset_ids_on_clear = reset;
        }

        // Keep the starter set within a shrunken capacity
        config.starter_dice.truncate(config.capacity);
        config
    }

    /// Check the configuration can build a consistent state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        if self.starter_dice.len() > self.capacity {
            return Err(ConfigError::TooManyStarterDice {
                count: self.starter_dice.len(),
                capacity: self.capacity,
            });
        }

        if let Some(faces) = self.starter_dice.iter().find(|f| !is_valid_faces(**f)) {
            return Err(ConfigError::InvalidStarterDie(*faces));
        }

        Ok(())
    }
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value?.trim().parse().ok()
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
