//! Shared doubles and a step-by-step driver for orchestrator tests
//!
//! All tests run on tokio's paused clock: awaiting the event queue advances
//! virtual time straight to the next timer, so a 10 s window costs nothing.

#![allow(dead_code)]

use concept_arena::battle::{
    ActiveAttack, Animator, BattleState, GameEvent, LessonRequest, Orchestrator, Outcome,
    OutcomeKind, Presenter, ResolutionOracle, ResolutionRequest, StandoffStop, StaticCorpus,
    TurnRecord, TurnResult,
};
use concept_arena::core::error::{GameError, Result};
use concept_arena::core::types::{BoxFuture, Side, VisualRef};
use concept_arena::core::GameConfig;
use concept_arena::onboarding::ScriptedBattle;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

// ============================================================================
// ORACLE
// ============================================================================

#[derive(Debug, Clone)]
pub enum Reply {
    Judge(OutcomeKind, u32),
    Fail,
    Hang,
}

/// Oracle with fixed latency and a fixed reply; records every request
#[derive(Clone)]
pub struct ScriptedOracle {
    reply: Reply,
    latency: Duration,
    lesson: Option<String>,
    pub requests: Arc<Mutex<Vec<ResolutionRequest>>>,
    pub lessons: Arc<AtomicUsize>,
}

impl ScriptedOracle {
    pub fn new(reply: Reply, latency_ms: u64) -> Self {
        Self {
            reply,
            latency: Duration::from_millis(latency_ms),
            lesson: None,
            requests: Arc::default(),
            lessons: Arc::default(),
        }
    }

    pub fn with_lesson(mut self, text: &str) -> Self {
        self.lesson = Some(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ResolutionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl ResolutionOracle for ScriptedOracle {
    fn resolve(&self, request: ResolutionRequest) -> BoxFuture<'static, Result<Outcome>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.reply.clone();
        let latency = self.latency;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            match reply {
                Reply::Judge(kind, damage) => Ok(Outcome::new(
                    kind,
                    damage,
                    format!("{} meets {}", request.defending, request.attacking),
                )),
                Reply::Fail => Err(GameError::Oracle("service unavailable".into())),
                Reply::Hang => std::future::pending().await,
            }
        })
    }

    fn compose_lesson(&self, _request: LessonRequest) -> BoxFuture<'static, Result<String>> {
        self.lessons.fetch_add(1, Ordering::SeqCst);
        let lesson = self.lesson.clone();
        Box::pin(async move { lesson.ok_or(GameError::Unsupported("lesson composition")) })
    }
}

// ============================================================================
// ANIMATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomeAnimation {
    #[default]
    Succeed,
    Fail,
    Panic,
}

/// Synchronous animator hook that panics before returning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPanic {
    PresentAttack,
    StartStandoff,
    PlayOutcome,
}

#[derive(Default)]
pub struct AnimatorCounters {
    pub presented: AtomicUsize,
    pub approaches: AtomicUsize,
    pub standoffs_started: AtomicUsize,
    pub standoffs_stopped: AtomicUsize,
    pub outcomes: AtomicUsize,
    pub paused: AtomicBool,
}

#[derive(Default)]
pub struct CountingAnimator {
    pub counters: Arc<AnimatorCounters>,
    pub outcome_animation: OutcomeAnimation,
    pub sync_panic: Option<SyncPanic>,
}

impl CountingAnimator {
    pub fn new(outcome_animation: OutcomeAnimation) -> Self {
        Self {
            outcome_animation,
            ..Self::default()
        }
    }

    pub fn panicking_in(hook: SyncPanic) -> Self {
        Self {
            sync_panic: Some(hook),
            ..Self::default()
        }
    }

    fn maybe_panic(&self, hook: SyncPanic) {
        if self.sync_panic == Some(hook) {
            panic!("{hook:?} exploded");
        }
    }
}

impl Animator for CountingAnimator {
    fn present_attack(&self, _concept: &str) -> VisualRef {
        self.counters.presented.fetch_add(1, Ordering::SeqCst);
        self.maybe_panic(SyncPanic::PresentAttack);
        VisualRef(1)
    }

    fn play_approach(&self, duration: Duration) -> BoxFuture<'static, Result<()>> {
        self.counters.approaches.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }

    fn start_standoff(&self) -> StandoffStop {
        self.counters.standoffs_started.fetch_add(1, Ordering::SeqCst);
        self.maybe_panic(SyncPanic::StartStandoff);
        let counters = Arc::clone(&self.counters);
        StandoffStop::new(move || {
            counters.standoffs_stopped.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn play_outcome(&self, _result: TurnResult) -> BoxFuture<'static, Result<()>> {
        self.counters.outcomes.fetch_add(1, Ordering::SeqCst);
        self.maybe_panic(SyncPanic::PlayOutcome);
        let mode = self.outcome_animation;
        Box::pin(async move {
            match mode {
                OutcomeAnimation::Succeed => Ok(()),
                OutcomeAnimation::Fail => Err(GameError::Animation("sprite sheet missing".into())),
                OutcomeAnimation::Panic => panic!("outcome animation exploded"),
            }
        })
    }

    fn set_paused(&self, paused: bool) {
        self.counters.paused.store(paused, Ordering::SeqCst);
    }
}

// ============================================================================
// PRESENTER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Attack(String),
    Defending(String),
    Resolved(TurnResult, u32),
    Message(String),
    Hint(usize),
    Lesson(usize, String, bool),
    Paused(bool),
    MatchOver(Side),
}

#[derive(Default, Clone)]
pub struct RecordingPresenter {
    pub shown: Arc<Mutex<Vec<Shown>>>,
    pub timer_updates: Arc<Mutex<Vec<Duration>>>,
}

impl Presenter for RecordingPresenter {
    fn attack_started(&mut self, attack: &ActiveAttack, _window: Duration) {
        self.push(Shown::Attack(attack.concept.clone()));
    }

    fn timer(&mut self, remaining: Duration) {
        self.timer_updates.lock().unwrap().push(remaining);
    }

    fn defending(&mut self, concept: &str) {
        self.push(Shown::Defending(concept.to_string()));
    }

    fn turn_resolved(&mut self, record: &TurnRecord, state: &BattleState) {
        assert!(!state.is_processing(), "presenter saw a turn mid-flight");
        self.push(Shown::Resolved(record.result, record.damage));
    }

    fn message(&mut self, text: &str) {
        self.push(Shown::Message(text.to_string()));
    }

    fn hint(&mut self, step: usize, _total: usize, _battle: &ScriptedBattle) {
        self.push(Shown::Hint(step));
    }

    fn lesson(&mut self, step: usize, _total: usize, text: &str, is_last: bool) {
        self.push(Shown::Lesson(step, text.to_string(), is_last));
    }

    fn paused(&mut self, paused: bool) {
        self.push(Shown::Paused(paused));
    }

    fn match_over(&mut self, winner: Side, _state: &BattleState) {
        self.push(Shown::MatchOver(winner));
    }
}

impl RecordingPresenter {
    fn push(&self, shown: Shown) {
        self.shown.lock().unwrap().push(shown);
    }

    pub fn all(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    pub fn lessons(&self) -> Vec<(usize, String, bool)> {
        self.all()
            .into_iter()
            .filter_map(|shown| match shown {
                Shown::Lesson(step, text, last) => Some((step, text, last)),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// DRIVER
// ============================================================================

pub struct Harness {
    pub orch: Orchestrator,
    pub events: UnboundedReceiver<GameEvent>,
    pub oracle: ScriptedOracle,
    pub presenter: RecordingPresenter,
    pub animator: Arc<AnimatorCounters>,
}

impl Harness {
    pub fn new(config: GameConfig, oracle: ScriptedOracle, concepts: &[&str]) -> Self {
        Self::with_animator(config, oracle, concepts, CountingAnimator::default())
    }

    pub fn with_animator(
        config: GameConfig,
        oracle: ScriptedOracle,
        concepts: &[&str],
        animator: CountingAnimator,
    ) -> Self {
        let presenter = RecordingPresenter::default();
        let counters = Arc::clone(&animator.counters);
        let corpus = StaticCorpus::new(concepts.iter().map(|c| c.to_string()).collect(), 7);
        let (orch, events) = Orchestrator::new(
            config,
            Arc::new(oracle.clone()),
            Box::new(corpus),
            Arc::new(animator),
            Box::new(presenter.clone()),
        );
        Self {
            orch,
            events,
            oracle,
            presenter,
            animator: counters,
        }
    }

    pub async fn send(&mut self, event: GameEvent) {
        self.orch.handle(event).await;
    }

    /// Take the next queued event (advancing virtual time) and handle it
    pub async fn step(&mut self) -> GameEvent {
        let event = self
            .events
            .recv()
            .await
            .expect("orchestrator holds a sender");
        self.orch.handle(event.clone()).await;
        event
    }

    /// Handle events until `done` holds. Panics if it never does.
    pub async fn run_until(&mut self, done: impl Fn(&Orchestrator) -> bool) {
        for _ in 0..10_000 {
            if done(&self.orch) {
                return;
            }
            self.step().await;
        }
        panic!("condition not reached after 10000 events");
    }

    /// Handle whatever is already queued without advancing time
    pub async fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.orch.handle(event).await;
        }
    }

    pub fn battle(&self) -> &BattleState {
        self.orch.battle()
    }

    pub fn assert_idle(&self) {
        let battle = self.battle();
        assert!(!battle.is_processing(), "is_processing stuck");
        assert!(!battle.is_ai_attacking(), "is_ai_attacking stuck");
        assert!(battle.active_attack().is_none(), "active attack left behind");
        assert!(battle.response_window().is_none(), "window left armed");
        assert!(battle.is_consistent());
    }
}

pub fn free_play() -> GameConfig {
    GameConfig {
        skip_tutorial: true,
        ..GameConfig::default()
    }
}

pub fn tutorial() -> GameConfig {
    GameConfig::default()
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Virtual-clock durations land on the expected value to within a few ms
#[track_caller]
pub fn assert_elapsed(actual: Duration, expected: Duration) {
    let slack = ms(5);
    assert!(
        actual + slack >= expected && actual <= expected + slack,
        "elapsed {actual:?}, expected {expected:?}"
    );
}
