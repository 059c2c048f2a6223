//! Outcome of one attack/defense pairing
//!
//! Five outcome kinds, each mapped to the tower(s) it damages by a fixed table.
//! The oracle's payload is normalised field by field rather than rejected:
//! damage is clamped, unknown kinds become Neutral, and the damaged-side flags
//! always come from the table, never from the payload.

use crate::core::types::Side;
use serde::{Deserialize, Serialize};

/// Damage ceiling used when no configuration is at hand
pub const DEFAULT_MAX_DAMAGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Defense neutralises the attack and carries on into the AI's tower
    DirectWin,
    /// Defense fails; the attack reaches the player's tower
    DirectLoss,
    /// Defense amplifies the attack and it detonates at the player's tower
    BackfireWin,
    /// No meaningful interaction
    #[serde(rename = "neutral_no_damage", alias = "neutral")]
    Neutral,
    /// Symmetric forces; both towers take the same damage
    MutualDestruction,
}

/// Which towers an outcome damages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamagedSides {
    pub attacker: bool,
    pub defender: bool,
}

impl DamagedSides {
    pub fn contains(self, side: Side) -> bool {
        match side {
            Side::Attacker => self.attacker,
            Side::Defender => self.defender,
        }
    }

    pub fn any(self) -> bool {
        self.attacker || self.defender
    }
}

impl OutcomeKind {
    pub const ALL: [Self; 5] = [
        Self::DirectWin,
        Self::DirectLoss,
        Self::BackfireWin,
        Self::Neutral,
        Self::MutualDestruction,
    ];

    /// The fixed kind-to-side table.
    ///
    /// BackfireWin damages the defender: the player's own choice fed the attack.
    pub const fn damaged_sides(self) -> DamagedSides {
        match self {
            Self::DirectWin => DamagedSides {
                attacker: true,
                defender: false,
            },
            Self::DirectLoss | Self::BackfireWin => DamagedSides {
                attacker: false,
                defender: true,
            },
            Self::Neutral => DamagedSides {
                attacker: false,
                defender: false,
            },
            Self::MutualDestruction => DamagedSides {
                attacker: true,
                defender: true,
            },
        }
    }

    /// Accepts `direct_win`, `DIRECT_WIN`, `Direct Win`, `neutral`, ...
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "direct_win" => Some(Self::DirectWin),
            "direct_loss" => Some(Self::DirectLoss),
            "backfire_win" | "backfire" => Some(Self::BackfireWin),
            "neutral_no_damage" | "neutral" | "no_damage" => Some(Self::Neutral),
            "mutual_destruction" => Some(Self::MutualDestruction),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DirectWin => "Direct Win",
            Self::DirectLoss => "Direct Loss",
            Self::BackfireWin => "Backfire",
            Self::Neutral => "Ineffective Attack",
            Self::MutualDestruction => "Mutual Destruction",
        }
    }
}

/// Resolved result of one pairing. Produced once, consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub attacker_damaged: bool,
    pub defender_damaged: bool,
    /// In `0..=max_damage`; zero whenever no tower is damaged
    pub damage_amount: u32,
    /// Display text only
    pub explanation: String,
    /// True when this outcome replaced a failed oracle call
    #[serde(default)]
    pub degraded: bool,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, damage_amount: u32, explanation: impl Into<String>) -> Self {
        let sides = kind.damaged_sides();
        Self {
            kind,
            attacker_damaged: sides.attacker,
            defender_damaged: sides.defender,
            damage_amount: if sides.any() {
                damage_amount.min(DEFAULT_MAX_DAMAGE)
            } else {
                0
            },
            explanation: explanation.into(),
            degraded: false,
        }
    }

    /// Safe default substituted when the oracle fails
    pub fn neutral_fallback() -> Self {
        Self {
            degraded: true,
            ..Self::new(
                OutcomeKind::Neutral,
                0,
                "Unable to reach the oracle. No damage to either tower.",
            )
        }
    }

    /// Re-derive the side flags from the table and clamp damage to `max_damage`.
    ///
    /// Applied to everything an oracle returns, so a collaborator that builds an
    /// `Outcome` by hand cannot bypass the table. The ceiling itself never
    /// exceeds [`DEFAULT_MAX_DAMAGE`].
    pub fn normalized(mut self, max_damage: u32) -> Self {
        let max_damage = max_damage.min(DEFAULT_MAX_DAMAGE);
        let sides = self.kind.damaged_sides();
        self.attacker_damaged = sides.attacker;
        self.defender_damaged = sides.defender;
        self.damage_amount = if sides.any() {
            self.damage_amount.min(max_damage)
        } else {
            0
        };
        self
    }

    pub fn damaged_sides(&self) -> DamagedSides {
        DamagedSides {
            attacker: self.attacker_damaged,
            defender: self.defender_damaged,
        }
    }

    /// Damage this outcome deals to `side`
    pub fn damage_to(&self, side: Side) -> u32 {
        if self.damaged_sides().contains(side) {
            self.damage_amount
        } else {
            0
        }
    }
}

/// Oracle payload as received. Every field is optional; see [`OutcomePayload::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomePayload {
    #[serde(default, alias = "kind")]
    pub outcome_type: Option<String>,
    #[serde(default)]
    pub damage_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub brief_explanation: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl OutcomePayload {
    /// Build an outcome, defaulting or clamping each field independently
    pub fn normalize(self, max_damage: u32) -> Outcome {
        let kind = match self.outcome_type.as_deref() {
            Some(raw) => OutcomeKind::parse_lenient(raw).unwrap_or_else(|| {
                tracing::warn!(outcome_type = raw, "unknown outcome kind, defaulting to neutral");
                OutcomeKind::Neutral
            }),
            None => {
                tracing::warn!("outcome kind missing, defaulting to neutral");
                OutcomeKind::Neutral
            }
        };

        let damage = self
            .damage_amount
            .as_ref()
            .map(coerce_damage)
            .unwrap_or(0);

        let explanation = self
            .brief_explanation
            .or(self.explanation)
            .filter(|text| !text.trim().is_empty())
            .or_else(|| self.reasoning.map(|text| first_sentence(&text)))
            .unwrap_or_else(|| kind.label().to_string());

        Outcome {
            kind,
            attacker_damaged: false,
            defender_damaged: false,
            damage_amount: damage,
            explanation,
            degraded: false,
        }
        .normalized(max_damage)
    }
}

/// Numbers, numeric strings and floats all count; anything else is zero.
fn coerce_damage(value: &serde_json::Value) -> u32 {
    let raw = match value {
        serde_json::Value::Number(number) => number.as_f64().unwrap_or(0.0),
        serde_json::Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if raw.is_finite() && raw > 0.0 {
        raw.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn first_sentence(text: &str) -> String {
    match text.find('.') {
        Some(end) => text[..=end].trim().to_string(),
        None => text.trim().to_string(),
    }
}
