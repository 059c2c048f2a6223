//! Prompt context for the judging oracle
//!
//! The system prompt carries the rules of the five outcomes; the user prompt
//! carries the concept pair. When the player went off-script in the tutorial,
//! the system prompt also says what was suggested and what the step teaches,
//! so the judge can acknowledge the choice without forcing the lesson.

use crate::battle::collaborators::{LessonRequest, ResolutionRequest, TutorialContext};
use crate::onboarding::TUTORIAL_BATTLES;

/// Everything one judgement prompt needs
#[derive(Debug, Clone)]
pub struct BattleContext {
    pub attacking: String,
    pub defending: String,
    pub tutorial: Option<TutorialContext>,
}

impl From<&ResolutionRequest> for BattleContext {
    fn from(request: &ResolutionRequest) -> Self {
        Self {
            attacking: request.attacking.clone(),
            defending: request.defending.clone(),
            tutorial: request.tutorial.clone(),
        }
    }
}

impl BattleContext {
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(JUDGE_SYSTEM_PROMPT);
        if let Some(tutorial) = &self.tutorial {
            prompt.push_str(&format!(
                "\n\nTUTORIAL STEP {} OF {}\n\
                 This step teaches: {}\n\
                 The suggested defense was \"{}\"; the player chose \"{}\" instead.\n\
                 Judge their choice honestly on its own merits. Do not force the outcome \
                 the step was meant to teach.",
                tutorial.step + 1,
                TUTORIAL_BATTLES.len(),
                tutorial.lesson_focus,
                tutorial.suggested_answer,
                self.defending,
            ));
        }
        prompt.push_str(JUDGE_RESPONSE_FORMAT);
        prompt
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "The AI (red tower) attacks with: \"{}\"\n\
             The player (blue tower) defends with: \"{}\"\n\n\
             Picture the two actually meeting. What are they made of, how big are they, \
             what happens on contact, and does anything keep moving afterwards? \
             Then answer in JSON.",
            self.attacking, self.defending
        )
    }
}

/// Prompt for the short lesson shown after a tutorial battle
pub fn lesson_prompts(request: &LessonRequest) -> (String, String) {
    let system = String::from(LESSON_SYSTEM_PROMPT);
    let followed = if request.followed_hint {
        "The player followed the suggestion."
    } else {
        "The player ignored the suggestion and chose their own defense."
    };
    let user = format!(
        "Tutorial step {} of {} teaches: {}\n\
         Attack: \"{}\"  Defense: \"{}\"\n\
         {}\n\
         Outcome: {} ({} damage). Expected outcome for this step: {}.\n\
         Judge's explanation: {}\n\n\
         Write the lesson.",
        request.step + 1,
        TUTORIAL_BATTLES.len(),
        request.lesson_focus,
        request.attacking,
        request.defending,
        followed,
        request.outcome.kind.label(),
        request.outcome.damage_amount,
        request.expected.label(),
        request.outcome.explanation,
    );
    (system, user)
}

const JUDGE_SYSTEM_PROMPT: &str = r#"You judge battles between concepts in a tower-defense game.
The AI attacks with one concept, the player defends with another. Decide what would really
happen if the two met, using physics, chemistry and plain logic rather than word association.

Treat ambiguous concepts as physical objects unless they are clearly abstract ("echo chamber"
is a room, "mirror" is glass). Ignore size adjectives: a big duck is still a duck.

OUTCOMES
- direct_win: the defense stops the attack and keeps going into the AI's red tower.
  Water vs Fire: the fire is put out and the water flows on.
- direct_loss: the defense simply fails and the attack reaches the player's blue tower.
  Fire vs Tree: the tree burns.
- backfire_win: the defense amplifies, fuels or conducts the attack, which lands on the
  player's blue tower. Needs free reactants and comparable scale: sodium vs a bucket of water
  is a backfire, sodium vs the ocean is a direct_win.
- neutral_no_damage: the two cannot meaningfully affect each other (different realms, no single
  point of failure). Rare. Nuclear Weapon vs YouTube. If the defense could carry on forward,
  it is a direct_win instead.
- mutual_destruction: symmetric forces that destroy each other. Fire vs Fire.

DAMAGE
- direct_win, direct_loss: 5-10
- backfire_win: 6-10
- mutual_destruction: 4-8, dealt to both towers
- neutral_no_damage: 0"#;

const JUDGE_RESPONSE_FORMAT: &str = r#"

RESPONSE FORMAT
Reply with a single JSON object and nothing else:
{
  "reasoning": "step-by-step analysis, under 250 words",
  "brief_explanation": "25-35 words for the player: what happened, why, which tower was hit",
  "outcome_type": "direct_win" | "direct_loss" | "backfire_win" | "neutral_no_damage" | "mutual_destruction",
  "damage_amount": 0-10
}"#;

const LESSON_SYSTEM_PROMPT: &str = r#"You write the short lesson shown after each tutorial battle
of a concept tower-defense game. Two or three sentences, under 60 words, addressed to the player.
Start with the outcome name in capitals (DIRECT WIN, DIRECT LOSS, BACKFIRE, INEFFECTIVE ATTACK or
MUTUAL DESTRUCTION), explain why it happened, and tie it back to what the step teaches. If the
player went off-script, acknowledge their choice. Plain text only."#;
