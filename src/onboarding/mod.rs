//! Onboarding - the scripted tutorial that overlays the turn cycle
//!
//! Phases run Hint → Battle → Lesson → Hint(next) … → Complete.
//!
//! A hint is *pending* between the AI attack starting and the hint banner
//! appearing (phase `Hint`, not paused). Once shown, Hint and Lesson both pause
//! the game: the response window freezes and animation is told to stop.

pub mod script;

pub use script::{ScriptedBattle, TUTORIAL_BATTLES};

use crate::battle::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingPhase {
    Hint,
    Battle,
    Lesson,
    Complete,
}

/// What an acknowledgment did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledged {
    /// Hint dismissed; the battle resumes
    Resumed,
    /// Lesson dismissed; the next scripted battle is up
    Advanced { step: usize },
    /// Last lesson dismissed; free play from here
    Completed,
    /// Nothing was waiting for acknowledgment
    Ignored,
}

#[derive(Debug, Clone)]
pub struct OnboardingState {
    active: bool,
    current_step: usize,
    phase: OnboardingPhase,
    is_paused: bool,
}

impl OnboardingState {
    pub fn new(enabled: bool) -> Self {
        Self {
            active: enabled,
            current_step: 0,
            phase: if enabled {
                OnboardingPhase::Hint
            } else {
                OnboardingPhase::Complete
            },
            is_paused: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        TUTORIAL_BATTLES.len()
    }

    pub fn phase(&self) -> OnboardingPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= TUTORIAL_BATTLES.len()
    }

    /// Scripted battle for the current step, while the tutorial runs
    pub fn current_battle(&self) -> Option<&'static ScriptedBattle> {
        if !self.active {
            return None;
        }
        TUTORIAL_BATTLES.get(self.current_step)
    }

    /// Precomputed outcome if `defending` follows the current suggestion
    pub fn scripted_outcome(&self, attacking: &str, defending: &str) -> Option<Outcome> {
        let battle = self.current_battle()?;
        if !battle.matches_suggestion(defending) {
            return None;
        }
        Some(Outcome::new(
            battle.outcome,
            battle.damage,
            battle.explain(attacking, defending),
        ))
    }

    /// Hint banner appears; pauses the game. Re-entered after a tutorial timeout.
    pub fn show_hint(&mut self) -> bool {
        if !self.active || !matches!(self.phase, OnboardingPhase::Hint | OnboardingPhase::Battle) {
            return false;
        }
        self.phase = OnboardingPhase::Hint;
        self.is_paused = true;
        true
    }

    /// A tutorial turn finished; pauses for the lesson
    pub fn begin_lesson(&mut self) -> bool {
        if !self.active || !matches!(self.phase, OnboardingPhase::Hint | OnboardingPhase::Battle) {
            return false;
        }
        self.phase = OnboardingPhase::Lesson;
        self.is_paused = true;
        true
    }

    pub fn acknowledge(&mut self) -> Acknowledged {
        if !self.active || !self.is_paused {
            return Acknowledged::Ignored;
        }
        match self.phase {
            OnboardingPhase::Hint => {
                self.phase = OnboardingPhase::Battle;
                self.is_paused = false;
                Acknowledged::Resumed
            }
            OnboardingPhase::Lesson if self.is_last_step() => {
                self.finish();
                Acknowledged::Completed
            }
            OnboardingPhase::Lesson => {
                self.current_step += 1;
                self.phase = OnboardingPhase::Hint;
                self.is_paused = false;
                Acknowledged::Advanced {
                    step: self.current_step,
                }
            }
            OnboardingPhase::Battle | OnboardingPhase::Complete => Acknowledged::Ignored,
        }
    }

    /// Leave the tutorial for good. Returns false if it was already over.
    pub fn skip(&mut self) -> bool {
        let was_active = self.active;
        self.finish();
        was_active
    }

    fn finish(&mut self) {
        self.active = false;
        self.phase = OnboardingPhase::Complete;
        self.is_paused = false;
    }
}
