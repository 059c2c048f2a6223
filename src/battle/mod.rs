//! Battle system - one AI attack, one player defense, one judged outcome per turn
//!
//! Not a reflex game: the player has a full response window to type a concept,
//! and an external oracle decides what happens when the two concepts meet.
//!
//! Key properties:
//! - Oracle latency is hidden behind the approach and standoff animations
//! - The response window is cancelled before the oracle is ever called
//! - Every turn ends in the same unconditional reset, whatever went wrong
//! - Oracle failure degrades to a Neutral outcome; the match never stalls

pub mod collaborators;
pub mod concepts;
pub mod orchestrator;
pub mod outcome;
pub mod resolution;
pub mod state;
pub mod timer;

// Re-exports for convenient access
pub use collaborators::{
    Animator, LessonRequest, NullPresenter, OfflineOracle, Presenter, ResolutionOracle,
    ResolutionRequest, SilentAnimator, StandoffStop, TutorialContext,
};
pub use concepts::{ConceptCorpus, ConceptInput, StaticCorpus, FALLBACK_CONCEPTS};
pub use orchestrator::{GameEvent, Orchestrator, UNDEFENDED_EXPLANATION};
pub use outcome::{DamagedSides, Outcome, OutcomeKind, OutcomePayload, DEFAULT_MAX_DAMAGE};
pub use resolution::{RaceCoordinator, Resolution, ResolutionSource};
pub use state::{ActiveAttack, BattleState, TurnRecord, TurnResult, NO_DEFENSE};
pub use timer::{Countdown, CountdownPoll, CountdownStatus, ResponseWindow, WindowHandle, WindowId};
