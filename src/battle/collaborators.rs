//! Contracts of everything the turn cycle depends on but does not implement
//!
//! - [`ResolutionOracle`]: judges an attack/defense pair (slow, may fail)
//! - [`Animator`]: decorative sequences; only completion matters
//! - [`Presenter`]: read-only display of state changes
//!
//! Futures returned by collaborators are spawned and joined, so a panic inside
//! one surfaces as a `JoinError`. Synchronous collaborator methods go through
//! [`shielded`] instead.

use crate::battle::outcome::{Outcome, OutcomeKind};
use crate::battle::state::{ActiveAttack, BattleState, TurnRecord, TurnResult};
use crate::core::error::{GameError, Result};
use crate::core::types::{BoxFuture, Side, VisualRef};
use crate::onboarding::ScriptedBattle;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Extra context sent when the player goes off-script during the tutorial
#[derive(Debug, Clone, PartialEq)]
pub struct TutorialContext {
    pub step: usize,
    pub suggested_answer: String,
    pub lesson_focus: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    pub attacking: String,
    pub defending: String,
    pub tutorial: Option<TutorialContext>,
}

/// Input for a tutorial lesson message
#[derive(Debug, Clone, PartialEq)]
pub struct LessonRequest {
    pub step: usize,
    pub attacking: String,
    pub defending: String,
    pub outcome: Outcome,
    pub followed_hint: bool,
    pub expected: OutcomeKind,
    pub lesson_focus: String,
}

pub trait ResolutionOracle: Send + Sync {
    /// Judge one pairing. Typically 1-5 s; may never return.
    fn resolve(&self, request: ResolutionRequest) -> BoxFuture<'static, Result<Outcome>>;

    /// Write the lesson shown after a tutorial battle
    fn compose_lesson(&self, _request: LessonRequest) -> BoxFuture<'static, Result<String>> {
        Box::pin(async { Err(GameError::Unsupported("lesson composition")) })
    }
}

/// Run a synchronous collaborator call; a panic is logged and replaced by `fallback`
pub(crate) fn shielded<T>(
    call: &'static str,
    f: impl FnOnce() -> T,
    fallback: impl FnOnce() -> T,
) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!(call, "collaborator panicked");
            fallback()
        }
    }
}

/// Stops a standoff loop. Dropping it without calling [`StandoffStop::stop`] stops it too.
pub struct StandoffStop {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl StandoffStop {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    pub fn noop() -> Self {
        Self { stop: None }
    }

    pub fn stop(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(stop) = self.stop.take() {
            shielded("standoff stop", stop, || ());
        }
    }
}

impl Drop for StandoffStop {
    fn drop(&mut self) {
        self.fire();
    }
}

impl std::fmt::Debug for StandoffStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandoffStop")
            .field("armed", &self.stop.is_some())
            .finish()
    }
}

pub trait Animator: Send + Sync {
    /// Spawn the attacker's visual and start its walk to the center
    fn present_attack(&self, concept: &str) -> VisualRef;

    /// Fixed-length approach once the player commits
    fn play_approach(&self, duration: Duration) -> BoxFuture<'static, Result<()>>;

    /// Indefinite stall loop; runs until the returned handle is stopped
    fn start_standoff(&self) -> StandoffStop;

    fn play_outcome(&self, result: TurnResult) -> BoxFuture<'static, Result<()>>;

    /// Freeze or unfreeze any elapsed-time driven animation
    fn set_paused(&self, _paused: bool) {}
}

/// Display hooks. Every method is optional.
pub trait Presenter: Send {
    fn attack_started(&mut self, _attack: &ActiveAttack, _window: Duration) {}
    fn timer(&mut self, _remaining: Duration) {}
    fn defending(&mut self, _concept: &str) {}
    fn turn_resolved(&mut self, _record: &TurnRecord, _state: &BattleState) {}
    fn message(&mut self, _text: &str) {}
    fn hint(&mut self, _step: usize, _total: usize, _battle: &ScriptedBattle) {}
    fn lesson(&mut self, _step: usize, _total: usize, _text: &str, _is_last: bool) {}
    fn paused(&mut self, _paused: bool) {}
    fn match_over(&mut self, _winner: Side, _state: &BattleState) {}
}

pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Animator with no visuals: the approach still takes its full duration.
#[derive(Default)]
pub struct SilentAnimator {
    next_visual: AtomicU64,
}

impl SilentAnimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Animator for SilentAnimator {
    fn present_attack(&self, _concept: &str) -> VisualRef {
        VisualRef(self.next_visual.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn play_approach(&self, duration: Duration) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }

    fn start_standoff(&self) -> StandoffStop {
        StandoffStop::noop()
    }

    fn play_outcome(&self, _result: TurnResult) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Oracle that is never reachable; every turn degrades to Neutral
pub struct OfflineOracle;

impl ResolutionOracle for OfflineOracle {
    fn resolve(&self, _request: ResolutionRequest) -> BoxFuture<'static, Result<Outcome>> {
        Box::pin(async { Err(GameError::Oracle("no oracle configured".into())) })
    }
}
