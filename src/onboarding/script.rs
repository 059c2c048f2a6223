//! The scripted tutorial battles, one per lesson

use crate::battle::outcome::OutcomeKind;

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedBattle {
    pub ai_concept: &'static str,
    pub emoji: &'static str,
    pub hint_title: &'static str,
    pub hint_text: &'static str,
    pub suggested_answer: &'static str,
    pub lesson_focus: &'static str,
    /// Shown when no lesson message can be composed
    pub lesson_after: &'static str,
    /// Outcome substituted when the player follows the suggestion
    pub outcome: OutcomeKind,
    pub damage: u32,
}

pub static TUTORIAL_BATTLES: [ScriptedBattle; 6] = [
    ScriptedBattle {
        ai_concept: "Fire",
        emoji: "🔥",
        hint_title: "AI ATTACKED WITH: FIRE",
        hint_text: "Fire burns and destroys. Answer with something that puts flames out.\n\nTry typing: WATER",
        suggested_answer: "Water",
        lesson_focus: "DIRECT WIN - the defense neutralises the attack and carries on into the opponent's tower",
        lesson_after: "YOU LEARNED: DIRECT WIN\n\nWater puts the fire out, then keeps going with nothing left to stop it and hits the AI's tower.",
        outcome: OutcomeKind::DirectWin,
        damage: 8,
    },
    ScriptedBattle {
        ai_concept: "Sodium",
        emoji: "⚗️",
        hint_title: "AI ATTACKED WITH: SODIUM",
        hint_text: "Sodium is a highly reactive metal. What happens when it meets a liquid?\n\nTry typing: WATER",
        suggested_answer: "Water",
        lesson_focus: "BACKFIRE - the defense fuels the attack and it explodes at your own tower",
        lesson_after: "YOU LEARNED: BACKFIRE\n\nWater reacts violently with sodium. Your defense amplified the attack and the blast landed on your tower.",
        outcome: OutcomeKind::BackfireWin,
        damage: 9,
    },
    ScriptedBattle {
        ai_concept: "Nuclear Weapon",
        emoji: "☢️",
        hint_title: "AI ATTACKED WITH: NUCLEAR WEAPON",
        hint_text: "Physical weapons destroy physical targets. What has no single point of failure?\n\nTry typing: YOUTUBE",
        suggested_answer: "YouTube",
        lesson_focus: "INEFFECTIVE ATTACK - the attack lands but the domains never meet, so nobody is hurt",
        lesson_after: "YOU LEARNED: INEFFECTIVE ATTACK\n\nYouTube lives on servers all over the world. Destroying one place does not destroy the concept. Both towers are safe.",
        outcome: OutcomeKind::Neutral,
        damage: 0,
    },
    ScriptedBattle {
        ai_concept: "Lightning",
        emoji: "⚡",
        hint_title: "AI ATTACKED WITH: LIGHTNING",
        hint_text: "A bolt of lightning. What would meet it with exactly equal force?\n\nTry typing: LIGHTNING",
        suggested_answer: "Lightning",
        lesson_focus: "MUTUAL DESTRUCTION - symmetric forces collide and both towers take equal damage",
        lesson_after: "YOU LEARNED: MUTUAL DESTRUCTION\n\nTwo identical forces cancel each other out and both towers take the same damage.",
        outcome: OutcomeKind::MutualDestruction,
        damage: 6,
    },
    ScriptedBattle {
        ai_concept: "Laser Pointer",
        emoji: "🔴",
        hint_title: "AI ATTACKED WITH: LASER POINTER",
        hint_text: "A harmless red dot. Which creature cannot resist chasing it?\n\nTry typing: CAT",
        suggested_answer: "Cat",
        lesson_focus: "DIRECT WIN with AMPLIFICATION - some defenses turn the attack into extra power",
        lesson_after: "YOU LEARNED: AMPLIFICATION\n\nThe laser pointer drives the cat's hunting instinct to the maximum. Another direct win.",
        outcome: OutcomeKind::DirectWin,
        damage: 8,
    },
    ScriptedBattle {
        ai_concept: "Echo Chamber",
        emoji: "🔊",
        hint_title: "AI ATTACKED WITH: ECHO CHAMBER",
        hint_text: "An echo chamber repeats sound in a feedback loop. What makes a loud, repetitive noise?\n\nTry typing: DUCK",
        suggested_answer: "Duck",
        lesson_focus: "DIRECT WIN with ENVIRONMENTAL AMPLIFICATION - a weak concept becomes strong in the right setting",
        lesson_after: "YOU LEARNED: ENVIRONMENTAL AMPLIFICATION\n\nThe chamber amplifies the quack until it collapses. Tutorial complete: from here on every battle is judged live.",
        outcome: OutcomeKind::DirectWin,
        damage: 8,
    },
];

impl ScriptedBattle {
    /// Case-insensitive, whitespace-trimmed comparison with the suggestion
    pub fn matches_suggestion(&self, concept: &str) -> bool {
        concept.trim().to_lowercase() == self.suggested_answer.trim().to_lowercase()
    }

    /// Explanation for the precomputed outcome
    pub fn explain(&self, attacking: &str, defending: &str) -> String {
        match self.outcome {
            OutcomeKind::DirectWin => {
                format!("{defending} defeats {attacking} and carries on to damage the AI's tower!")
            }
            OutcomeKind::DirectLoss => format!("{attacking} breaks through {defending} and hits your tower!"),
            OutcomeKind::BackfireWin => {
                format!("{defending} reacts with {attacking}, causing an explosion at your tower!")
            }
            OutcomeKind::Neutral => {
                format!("{attacking} cannot meaningfully affect {defending} - both towers remain safe!")
            }
            OutcomeKind::MutualDestruction => {
                format!("{defending} and {attacking} collide with equal force - both towers damaged!")
            }
        }
    }
}
