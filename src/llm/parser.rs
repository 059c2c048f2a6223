//! Turn a judge's reply into an [`Outcome`]
//!
//! Replies are expected to be a JSON object, but models wrap it in code
//! fences, prefix it with prose, or skip JSON entirely. In order:
//! 1. Extract the outermost `{...}` and normalise it field by field
//! 2. Failing that, infer the outcome from keywords in the text

use crate::battle::outcome::{Outcome, OutcomeKind, OutcomePayload};
use crate::core::error::{GameError, Result};

/// How much of a free-text reply is kept as the explanation
const TEXT_EXPLANATION_CHARS: usize = 150;

/// Parse a judge reply. Never fails on content; only an empty reply is an error.
pub fn parse_outcome(response: &str, max_damage: u32) -> Result<Outcome> {
    if response.trim().is_empty() {
        return Err(GameError::Malformed("empty judge reply".into()));
    }

    match extract_json(response).and_then(|json| Ok(serde_json::from_str::<OutcomePayload>(json)?)) {
        Ok(payload) => Ok(payload.normalize(max_damage)),
        Err(e) => {
            tracing::warn!(error = %e, "judge reply is not JSON, inferring from text");
            Ok(infer_from_text(response).normalized(max_damage))
        }
    }
}

/// Extract the JSON object from a reply (handles fences and surrounding text)
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| GameError::Malformed("no JSON object in reply".into()))?;
    let end = response
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| GameError::Malformed("no closing brace in reply".into()))?;
    Ok(&response[start..=end])
}

/// Keyword inference over a free-text reply
pub fn infer_from_text(response: &str) -> Outcome {
    let text = response.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    let (kind, damage) = if has("backfire") || has("explodes on") || has("amplifies") {
        (OutcomeKind::BackfireWin, 8)
    } else if has("no effect") || has("no damage") || has("doesn't interact") {
        (OutcomeKind::Neutral, 0)
    } else if has("both") && (has("damage") || has("destroy")) {
        (OutcomeKind::MutualDestruction, 5)
    } else if has("player wins") || has("defender wins") || has("blue tower safe") {
        (OutcomeKind::DirectWin, 8)
    } else if has("ai wins")
        || has("attacker wins")
        || has("defense fails")
        || has("blue tower damaged")
    {
        if has("amplif") || has("fuel") {
            (OutcomeKind::BackfireWin, 8)
        } else {
            (OutcomeKind::DirectLoss, 8)
        }
    } else {
        (OutcomeKind::Neutral, 0)
    };

    let explanation: String = response.trim().chars().take(TEXT_EXPLANATION_CHARS).collect();
    Outcome::new(kind, damage, explanation)
}
