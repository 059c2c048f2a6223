//! Battle state - the single mutable record of one match
//!
//! Owned by the orchestrator. Presentation code only ever sees `&BattleState`.

use crate::battle::outcome::OutcomeKind;
use crate::battle::timer::{WindowHandle, WindowId};
use crate::core::types::{Side, TurnId, VisualRef};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Defense label recorded when the window expires unanswered
pub const NO_DEFENSE: &str = "No Defense";

/// The AI's committed concept for the current turn
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAttack {
    pub concept: String,
    pub side: Side,
    pub visual: VisualRef,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnResult {
    Resolved(OutcomeKind),
    /// Window expired; fixed penalty applied instead of an oracle outcome
    Undefended,
}

impl TurnResult {
    pub fn label(self) -> &'static str {
        match self {
            Self::Resolved(kind) => kind.label(),
            Self::Undefended => "Direct Tower Hit",
        }
    }
}

/// One entry of the match history. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: TurnId,
    pub attacking: String,
    pub defending: String,
    pub result: TurnResult,
    pub damage: u32,
    pub explanation: String,
    /// Outcome came from the fallback path, not the oracle
    pub degraded: bool,
    pub recorded_at: SystemTime,
}

#[derive(Debug)]
pub struct BattleState {
    pub(crate) attacker_health: u32,
    pub(crate) defender_health: u32,
    /// Player committed; held until the outcome is fully applied
    pub(crate) is_processing: bool,
    /// AI attack initiated and not yet resolved or timed out
    pub(crate) is_ai_attacking: bool,
    pub(crate) active_attack: Option<ActiveAttack>,
    /// At most one live window
    pub(crate) response_timer: Option<WindowHandle>,
    pub(crate) response_remaining_ms: u64,
    history: Vec<TurnRecord>,
    battle_count: u64,
    winner: Option<Side>,
}

impl BattleState {
    pub fn new(starting_health: u32) -> Self {
        Self {
            attacker_health: starting_health,
            defender_health: starting_health,
            is_processing: false,
            is_ai_attacking: false,
            active_attack: None,
            response_timer: None,
            response_remaining_ms: 0,
            history: Vec::new(),
            battle_count: 0,
            winner: None,
        }
    }

    pub fn attacker_health(&self) -> u32 {
        self.attacker_health
    }

    pub fn defender_health(&self) -> u32 {
        self.defender_health
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn is_ai_attacking(&self) -> bool {
        self.is_ai_attacking
    }

    pub fn active_attack(&self) -> Option<&ActiveAttack> {
        self.active_attack.as_ref()
    }

    pub fn response_window(&self) -> Option<WindowId> {
        self.response_timer.as_ref().map(WindowHandle::id)
    }

    /// Last remaining time reported by the window's ticker
    pub fn response_remaining_ms(&self) -> u64 {
        self.response_remaining_ms
    }

    /// Exact time left on the live window, read from its countdown
    pub fn response_time_left(&self) -> Option<Duration> {
        self.response_timer.as_ref().map(WindowHandle::remaining)
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn battle_count(&self) -> u64 {
        self.battle_count
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Both towers standing and no winner declared
    pub fn can_continue(&self) -> bool {
        !self.is_over() && self.attacker_health > 0 && self.defender_health > 0
    }

    /// Subtract damage, clamping at zero. Returns the remaining health.
    pub(crate) fn apply_damage(&mut self, side: Side, amount: u32) -> u32 {
        let health = match side {
            Side::Attacker => &mut self.attacker_health,
            Side::Defender => &mut self.defender_health,
        };
        *health = health.saturating_sub(amount);
        *health
    }

    pub(crate) fn record(&mut self, record: TurnRecord) {
        self.history.push(record);
        self.battle_count += 1;
    }

    /// Declare a winner if a tower has fallen. The player's tower is checked first.
    pub(crate) fn settle_winner(&mut self) -> Option<Side> {
        if self.winner.is_none() {
            if self.defender_health == 0 {
                self.winner = Some(Side::Attacker);
            } else if self.attacker_health == 0 {
                self.winner = Some(Side::Defender);
            }
        }
        self.winner
    }

    /// Return every per-turn field to its idle value.
    ///
    /// Idempotent. Dropping the window handle cancels it.
    pub(crate) fn reset_turn(&mut self) {
        self.active_attack = None;
        self.is_processing = false;
        self.is_ai_attacking = false;
        self.response_timer = None;
        self.response_remaining_ms = 0;
    }

    /// `active_attack` is present exactly while the AI is attacking, and
    /// processing only happens inside an attack.
    pub fn is_consistent(&self) -> bool {
        self.active_attack.is_some() == self.is_ai_attacking
            && (!self.is_processing || self.is_ai_attacking)
    }
}
