//! Match configuration with documented constants
//!
//! Every pacing delay and tunable the turn cycle reads is collected here.
//! Values are in milliseconds unless stated otherwise.

use crate::battle::outcome::DEFAULT_MAX_DAMAGE;
use crate::core::error::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tower health never exceeds this
pub const MAX_HEALTH: u32 = 100;

/// Configuration for one match
///
/// Loaded from TOML; missing keys fall back to [`GameConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === TOWERS ===
    /// Health each tower starts with
    pub starting_health: u32,

    /// Ceiling for any oracle-reported damage amount, at most 10
    pub max_damage: u32,

    // === RESPONSE WINDOW ===
    /// How long the player has to answer an attack in normal play
    ///
    /// 4 s makes for a frantic match; 10 s leaves room to think.
    pub response_window_ms: u64,

    /// How long the player has to answer during the tutorial
    pub tutorial_response_window_ms: u64,

    /// Interval between countdown ticks sent to the display
    pub tick_interval_ms: u64,

    /// Damage dealt to the defender when the window expires unanswered
    ///
    /// Not produced by the oracle, so the match always progresses even when
    /// the oracle is unreachable.
    pub timeout_penalty: u32,

    // === PACING ===
    /// Delay between a timeout and the next AI attack
    pub timeout_pacing_ms: u64,

    /// Delay between a resolved turn and the next AI attack
    pub turn_pacing_ms: u64,

    /// Delay between an AI attack and the tutorial hint appearing
    pub hint_delay_ms: u64,

    /// Length of the fixed approach animation once the player commits
    pub approach_ms: u64,

    /// Buffer before the lesson banner, lets the explanation land first
    pub lesson_delay_ms: u64,

    /// Delay before the next scripted attack after a lesson is acknowledged
    pub tutorial_advance_ms: u64,

    /// Delay before the first free-play attack after the tutorial ends
    pub tutorial_exit_ms: u64,

    // === ORACLE ===
    /// Upper bound on a single resolution call
    ///
    /// `None` waits forever, which stalls the match if the oracle hangs.
    pub oracle_timeout_ms: Option<u64>,

    /// Player input is truncated to this many characters
    pub max_concept_chars: usize,

    // === TUTORIAL ===
    /// Start directly in free play
    pub skip_tutorial: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_health: 100,
            max_damage: 10,

            response_window_ms: 10_000,
            tutorial_response_window_ms: 20_000,
            tick_interval_ms: 100,
            timeout_penalty: 5,

            timeout_pacing_ms: 1_500,
            turn_pacing_ms: 3_000,
            hint_delay_ms: 800,
            approach_ms: 2_000,
            lesson_delay_ms: 500,
            tutorial_advance_ms: 500,
            tutorial_exit_ms: 1_000,

            oracle_timeout_ms: Some(30_000),
            max_concept_chars: 100,

            skip_tutorial: false,
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate().map_err(GameError::Config)?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.starting_health == 0 || self.starting_health > MAX_HEALTH {
            return Err(format!(
                "starting_health ({}) must be in 1..={MAX_HEALTH}",
                self.starting_health
            ));
        }

        if self.max_damage == 0 || self.max_damage > DEFAULT_MAX_DAMAGE {
            return Err(format!(
                "max_damage ({}) must be in 1..={DEFAULT_MAX_DAMAGE}",
                self.max_damage
            ));
        }

        if self.response_window_ms == 0 || self.tutorial_response_window_ms == 0 {
            return Err("response windows must be positive".into());
        }

        // A window shorter than one tick would expire before the first display update
        if self.tick_interval_ms == 0 || self.tick_interval_ms > self.response_window_ms {
            return Err(format!(
                "tick_interval_ms ({}) must be in 1..={}",
                self.tick_interval_ms, self.response_window_ms
            ));
        }

        if self.timeout_penalty > self.starting_health {
            return Err(format!(
                "timeout_penalty ({}) exceeds starting_health ({})",
                self.timeout_penalty, self.starting_health
            ));
        }

        if self.oracle_timeout_ms == Some(0) {
            return Err("oracle_timeout_ms must be positive when set".into());
        }

        if self.max_concept_chars == 0 {
            return Err("max_concept_chars must be positive".into());
        }

        Ok(())
    }

    /// Response window for the current mode
    pub fn response_window(&self, tutorial: bool) -> Duration {
        if tutorial {
            Duration::from_millis(self.tutorial_response_window_ms)
        } else {
            Duration::from_millis(self.response_window_ms)
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn timeout_pacing(&self) -> Duration {
        Duration::from_millis(self.timeout_pacing_ms)
    }

    pub fn turn_pacing(&self) -> Duration {
        Duration::from_millis(self.turn_pacing_ms)
    }

    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.hint_delay_ms)
    }

    pub fn approach(&self) -> Duration {
        Duration::from_millis(self.approach_ms)
    }

    pub fn lesson_delay(&self) -> Duration {
        Duration::from_millis(self.lesson_delay_ms)
    }

    pub fn tutorial_advance(&self) -> Duration {
        Duration::from_millis(self.tutorial_advance_ms)
    }

    pub fn tutorial_exit(&self) -> Duration {
        Duration::from_millis(self.tutorial_exit_ms)
    }

    pub fn oracle_timeout(&self) -> Option<Duration> {
        self.oracle_timeout_ms.map(Duration::from_millis)
    }
}
