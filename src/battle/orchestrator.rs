//! Turn orchestrator - one match, driven by a single event queue
//!
//! Everything that mutates [`BattleState`] or [`OnboardingState`] runs inside
//! [`Orchestrator::handle`], one event at a time. Timers, pacing delays and the
//! response window feed back into the same queue, so the whole cycle is
//! cooperative and single-threaded even on a multi-threaded runtime.
//!
//! A turn that reaches the resolution race holds the queue until its outcome
//! is applied: `is_processing` is the critical section, and nothing queued in
//! the meantime can observe a half-applied turn.
//!
//! Cycle:
//! ```text
//! BeginAttack -> initiate -> [ShowHint] -> Defend -> race -> apply -> BeginAttack
//!                         \-> ResponseExpired -> timeout penalty -> BeginAttack
//! ```

use crate::battle::collaborators::{
    shielded, Animator, LessonRequest, Presenter, ResolutionOracle, ResolutionRequest,
    TutorialContext,
};
use crate::battle::concepts::{fallback_concept, ConceptCorpus, ConceptInput};
use crate::battle::outcome::Outcome;
use crate::battle::resolution::{RaceCoordinator, Resolution};
use crate::battle::state::{ActiveAttack, BattleState, TurnRecord, TurnResult, NO_DEFENSE};
use crate::battle::timer::{ResponseWindow, WindowId};
use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::{BoxFuture, Side, TurnId, VisualRef};
use crate::onboarding::{Acknowledged, OnboardingState};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time;

/// Explanation recorded for an unanswered attack
pub const UNDEFENDED_EXPLANATION: &str = "The attack reached the tower unopposed.";

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Begin the first attack of the match
    Start,
    /// Player committed a defending concept
    Defend(String),
    /// Dismiss the tutorial hint or lesson banner
    Acknowledge,
    SkipTutorial,
    /// Fresh towers, fresh history, tutorial from the top
    Restart,
    Shutdown,

    // Internal: scheduled by the orchestrator itself
    BeginAttack { generation: u64 },
    ShowHint { generation: u64, step: usize },
    ResponseTick { window: WindowId, remaining: Duration },
    ResponseExpired { window: WindowId },
}

pub struct Orchestrator {
    config: GameConfig,
    battle: BattleState,
    onboarding: OnboardingState,
    windows: ResponseWindow,
    race: RaceCoordinator,
    oracle: Arc<dyn ResolutionOracle>,
    animator: Arc<dyn Animator>,
    corpus: Box<dyn ConceptCorpus>,
    presenter: Box<dyn Presenter>,
    events: UnboundedSender<GameEvent>,
    /// Bumped on restart; scheduled events from an older match are dropped
    generation: u64,
}

impl Orchestrator {
    pub fn new(
        config: GameConfig,
        oracle: Arc<dyn ResolutionOracle>,
        corpus: Box<dyn ConceptCorpus>,
        animator: Arc<dyn Animator>,
        presenter: Box<dyn Presenter>,
    ) -> (Self, UnboundedReceiver<GameEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let orchestrator = Self {
            battle: BattleState::new(config.starting_health),
            onboarding: OnboardingState::new(!config.skip_tutorial),
            windows: ResponseWindow::new(config.tick_interval()),
            race: RaceCoordinator::new(Arc::clone(&oracle), Arc::clone(&animator), &config),
            config,
            oracle,
            animator,
            corpus,
            presenter,
            events,
            generation: 0,
        };
        (orchestrator, receiver)
    }

    /// Queue handle for front-ends
    pub fn sender(&self) -> UnboundedSender<GameEvent> {
        self.events.clone()
    }

    pub fn battle(&self) -> &BattleState {
        &self.battle
    }

    pub fn onboarding(&self) -> &OnboardingState {
        &self.onboarding
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drain the queue until `Shutdown`
    pub async fn run(mut self, mut events: UnboundedReceiver<GameEvent>) -> Self {
        tracing::info!("orchestrator running");
        while let Some(event) = events.recv().await {
            if event == GameEvent::Shutdown {
                break;
            }
            self.handle(event).await;
        }
        self.battle.reset_turn();
        tracing::info!(battles = self.battle.battle_count(), "orchestrator stopped");
        self
    }

    pub async fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Start => self.initiate(),
            GameEvent::Defend(raw) => self.defend(&raw).await,
            GameEvent::Acknowledge => self.acknowledge(),
            GameEvent::SkipTutorial => self.skip_tutorial(),
            GameEvent::Restart => self.restart(),
            GameEvent::Shutdown => tracing::debug!("shutdown is handled by run"),
            GameEvent::BeginAttack { generation } => {
                if generation == self.generation {
                    self.initiate();
                } else {
                    tracing::debug!(generation, current = self.generation, "dropping stale attack");
                }
            }
            GameEvent::ShowHint { generation, step } => self.show_hint(generation, step),
            GameEvent::ResponseTick { window, remaining } => self.tick(window, remaining),
            GameEvent::ResponseExpired { window } => self.expire(window),
        }
    }

    // ========================================================================
    // AI ATTACK INITIATOR
    // ========================================================================

    /// Start an AI attack. No-op while a turn is in flight, the match is over,
    /// or a tutorial banner is up.
    pub fn initiate(&mut self) {
        if self.battle.is_processing || self.battle.is_ai_attacking {
            tracing::warn!(
                processing = self.battle.is_processing,
                attacking = self.battle.is_ai_attacking,
                "attack already in flight, ignoring initiate"
            );
            return;
        }
        if !self.battle.can_continue() {
            tracing::debug!("match over, not initiating");
            return;
        }
        if self.onboarding.is_paused() {
            tracing::warn!("tutorial banner showing, not initiating");
            return;
        }

        let concept = self.pick_concept();
        let visual = shielded(
            "present attack",
            || self.animator.present_attack(&concept),
            VisualRef::default,
        );
        self.battle.is_ai_attacking = true;
        self.battle.active_attack = Some(ActiveAttack {
            concept,
            side: Side::Attacker,
            visual,
        });

        let tutorial = self.onboarding.is_active();
        let duration = self.config.response_window(tutorial);
        let ticks = self.events.clone();
        let expiry = self.events.clone();
        let handle = self.windows.arm(
            duration,
            move |window, remaining| {
                let _ = ticks.send(GameEvent::ResponseTick { window, remaining });
            },
            move |window| {
                let _ = expiry.send(GameEvent::ResponseExpired { window });
            },
        );
        self.battle.response_remaining_ms = duration.as_millis() as u64;
        self.battle.response_timer = Some(handle);

        if let Some(attack) = self.battle.active_attack.as_ref() {
            tracing::info!(
                concept = %attack.concept,
                window_ms = duration.as_millis() as u64,
                tutorial,
                "AI attack started"
            );
            self.presenter.attack_started(attack, duration);
        }

        if tutorial {
            self.schedule(
                self.config.hint_delay(),
                GameEvent::ShowHint {
                    generation: self.generation,
                    step: self.onboarding.current_step(),
                },
            );
        }
    }

    fn pick_concept(&mut self) -> String {
        if let Some(scripted) = self.onboarding.current_battle() {
            return scripted.ai_concept.to_string();
        }
        let picked = shielded("pick concept", || self.corpus.pick_random(), || None);
        match picked.filter(|c| !c.trim().is_empty()) {
            Some(concept) => concept,
            None => {
                tracing::warn!("concept corpus unavailable, using built-in list");
                fallback_concept(&mut rand::thread_rng())
            }
        }
    }

    // ========================================================================
    // RESPONSE WINDOW SIGNALS
    // ========================================================================

    fn tick(&mut self, window: WindowId, remaining: Duration) {
        if self.battle.response_window() != Some(window) {
            return;
        }
        let remaining_ms = remaining.as_millis() as u64;
        self.battle.response_remaining_ms = self.battle.response_remaining_ms.min(remaining_ms);
        self.presenter.timer(remaining);
    }

    /// Timeout path: fixed penalty to the defender, then the next attack
    fn expire(&mut self, window: WindowId) {
        if self.battle.response_window() != Some(window) {
            tracing::warn!(window = window.0, "stale window expiry ignored");
            return;
        }
        if self.battle.is_processing {
            tracing::warn!(window = window.0, "expiry after defense committed, ignored");
            return;
        }
        let Some(attack) = self.battle.active_attack.clone() else {
            tracing::warn!(window = window.0, "expiry without an active attack, ignored");
            self.battle.reset_turn();
            return;
        };

        let penalty = self.config.timeout_penalty;
        let remaining = self.battle.apply_damage(Side::Defender, penalty);
        tracing::info!(concept = %attack.concept, penalty, remaining, "response window expired");

        self.spawn_outcome_animation(TurnResult::Undefended);
        let record = TurnRecord {
            id: TurnId::new(),
            attacking: attack.concept,
            defending: NO_DEFENSE.to_string(),
            result: TurnResult::Undefended,
            damage: penalty,
            explanation: UNDEFENDED_EXPLANATION.to_string(),
            degraded: false,
            recorded_at: SystemTime::now(),
        };
        self.battle.record(record.clone());
        self.battle.reset_turn();
        self.presenter.turn_resolved(&record, &self.battle);

        if self.settle_match() {
            return;
        }
        // In the tutorial the same step is replayed
        self.schedule_attack(self.config.timeout_pacing());
    }

    // ========================================================================
    // DEFENSE & RESOLUTION
    // ========================================================================

    async fn defend(&mut self, raw: &str) {
        let defending = match ConceptInput::parse(raw, self.config.max_concept_chars) {
            Ok(input) => input.into_inner(),
            Err(e) => {
                tracing::debug!(error = %e, "defense rejected");
                self.presenter.message("Type a concept to defend with.");
                return;
            }
        };
        if self.battle.is_processing {
            tracing::warn!(%defending, "defense while processing, ignored");
            return;
        }
        let Some(attacking) = self
            .battle
            .active_attack
            .as_ref()
            .filter(|_| self.battle.is_ai_attacking)
            .map(|attack| attack.concept.clone())
        else {
            tracing::warn!(%defending, "no attack to defend against");
            self.presenter.message("Wait for the AI to attack.");
            return;
        };
        if self.onboarding.is_paused() {
            self.presenter.message("Read the tutorial banner first (/next to continue).");
            return;
        }

        // Cancel strictly before the oracle is called; a timeout must never
        // race a slow resolution into resolving the turn twice.
        if let Some(window) = self.battle.response_timer.take() {
            window.cancel();
        }
        self.battle.is_processing = true;
        self.presenter.defending(&defending);

        let resolution = match self.onboarding.scripted_outcome(&attacking, &defending) {
            Some(outcome) => {
                tracing::info!(%attacking, %defending, "scripted tutorial outcome");
                Resolution::scripted(outcome.normalized(self.config.max_damage))
            }
            None => {
                let request = ResolutionRequest {
                    tutorial: self.tutorial_context(),
                    attacking: attacking.clone(),
                    defending: defending.clone(),
                };
                self.race.race(request).await
            }
        };

        self.apply(resolution.outcome, &attacking, &defending).await;
    }

    fn tutorial_context(&self) -> Option<TutorialContext> {
        self.onboarding.current_battle().map(|scripted| TutorialContext {
            step: self.onboarding.current_step(),
            suggested_answer: scripted.suggested_answer.to_string(),
            lesson_focus: scripted.lesson_focus.to_string(),
        })
    }

    // ========================================================================
    // OUTCOME APPLIER
    // ========================================================================

    /// Animate, apply damage, record, reset. The reset runs on every path.
    pub async fn apply(&mut self, outcome: Outcome, attacking: &str, defending: &str) {
        let result = TurnResult::Resolved(outcome.kind);
        Self::join_animation(self.outcome_animation(result)).await;

        for side in [Side::Attacker, Side::Defender] {
            let damage = outcome.damage_to(side);
            if damage > 0 {
                let remaining = self.battle.apply_damage(side, damage);
                tracing::debug!(?side, damage, remaining, "tower damaged");
            }
        }

        let record = TurnRecord {
            id: TurnId::new(),
            attacking: attacking.to_string(),
            defending: defending.to_string(),
            result,
            damage: outcome.damage_amount,
            explanation: outcome.explanation.clone(),
            degraded: outcome.degraded,
            recorded_at: SystemTime::now(),
        };
        tracing::info!(
            %attacking,
            %defending,
            kind = ?outcome.kind,
            damage = outcome.damage_amount,
            ai_health = self.battle.attacker_health,
            player_health = self.battle.defender_health,
            "turn resolved"
        );
        self.battle.record(record.clone());
        self.battle.reset_turn();
        self.presenter.turn_resolved(&record, &self.battle);

        if self.settle_match() {
            return;
        }
        if self.onboarding.is_active() {
            self.surface_lesson(&outcome, attacking, defending).await;
        } else {
            self.schedule_attack(self.config.turn_pacing());
        }
    }

    /// Joined through a task so a failing or panicking animation cannot skip the reset
    async fn join_animation(animation: BoxFuture<'static, Result<()>>) {
        match tokio::spawn(animation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "outcome animation failed"),
            Err(e) => tracing::error!(error = %e, "outcome animation panicked"),
        }
    }

    fn outcome_animation(&self, result: TurnResult) -> BoxFuture<'static, Result<()>> {
        shielded(
            "play outcome",
            || self.animator.play_outcome(result),
            || -> BoxFuture<'static, Result<()>> {
                Box::pin(async { Err(GameError::Animation("outcome animation panicked".into())) })
            },
        )
    }

    fn spawn_outcome_animation(&self, result: TurnResult) {
        tokio::spawn(Self::join_animation(self.outcome_animation(result)));
    }

    /// Declare and announce a winner once a tower falls
    fn settle_match(&mut self) -> bool {
        match self.battle.settle_winner() {
            Some(winner) => {
                tracing::info!(winner = winner.label(), "match over");
                self.presenter.match_over(winner, &self.battle);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // TUTORIAL OVERLAY
    // ========================================================================

    fn show_hint(&mut self, generation: u64, step: usize) {
        if generation != self.generation
            || step != self.onboarding.current_step()
            || !self.battle.is_ai_attacking
            || self.battle.is_processing
            || self.onboarding.is_paused()
        {
            tracing::debug!(step, "hint no longer relevant");
            return;
        }
        let Some(scripted) = self.onboarding.current_battle() else {
            return;
        };
        if self.onboarding.show_hint() {
            self.pause_game();
            self.presenter
                .hint(step, self.onboarding.total_steps(), scripted);
        }
    }

    async fn surface_lesson(&mut self, outcome: &Outcome, attacking: &str, defending: &str) {
        let Some(scripted) = self.onboarding.current_battle() else {
            return;
        };
        time::sleep(self.config.lesson_delay()).await;

        let step = self.onboarding.current_step();
        let followed_hint = scripted.matches_suggestion(defending);
        let text = if followed_hint {
            scripted.lesson_after.to_string()
        } else {
            let request = LessonRequest {
                step,
                attacking: attacking.to_string(),
                defending: defending.to_string(),
                outcome: outcome.clone(),
                followed_hint,
                expected: scripted.outcome,
                lesson_focus: scripted.lesson_focus.to_string(),
            };
            let call = shielded(
                "compose lesson",
                || self.oracle.compose_lesson(request),
                || -> BoxFuture<'static, Result<String>> {
                    Box::pin(async { Err(GameError::Oracle("lesson composer panicked".into())) })
                },
            );
            let mut call = tokio::spawn(call);
            let joined = match self.config.oracle_timeout() {
                Some(limit) => match time::timeout(limit, &mut call).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        call.abort();
                        Ok(Err(GameError::OracleTimeout(limit)))
                    }
                },
                None => call.await,
            };
            let composed = joined.unwrap_or_else(|e| Err(GameError::Oracle(e.to_string())));
            match composed {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => scripted.lesson_after.to_string(),
                Err(e) => {
                    tracing::debug!(error = %e, step, "lesson composition unavailable, using script");
                    scripted.lesson_after.to_string()
                }
            }
        };

        if self.onboarding.begin_lesson() {
            self.pause_game();
            let is_last = self.onboarding.is_last_step();
            self.presenter
                .lesson(step, self.onboarding.total_steps(), &text, is_last);
        }
    }

    fn acknowledge(&mut self) {
        match self.onboarding.acknowledge() {
            Acknowledged::Resumed => self.resume_game(),
            Acknowledged::Advanced { step } => {
                tracing::info!(step, "tutorial advanced");
                self.resume_game();
                self.schedule_attack(self.config.tutorial_advance());
            }
            Acknowledged::Completed => {
                tracing::info!("tutorial complete");
                self.resume_game();
                self.presenter
                    .message("Tutorial complete. Every battle is judged live from here.");
                self.schedule_attack(self.config.tutorial_exit());
            }
            Acknowledged::Ignored => tracing::debug!("nothing to acknowledge"),
        }
    }

    fn skip_tutorial(&mut self) {
        let was_paused = self.onboarding.is_paused();
        if !self.onboarding.skip() {
            tracing::debug!("tutorial already finished");
            return;
        }
        tracing::info!(step = self.onboarding.current_step(), "tutorial skipped");
        if was_paused {
            self.resume_game();
        }
        self.presenter.message("Tutorial skipped.");
        if !self.battle.is_ai_attacking && !self.battle.is_processing {
            self.schedule_attack(self.config.tutorial_exit());
        }
    }

    /// Freeze the response window and any time-driven animation
    fn pause_game(&mut self) {
        if let Some(window) = self.battle.response_timer.as_ref() {
            window.pause();
        }
        shielded("set paused", || self.animator.set_paused(true), || ());
        self.presenter.paused(true);
    }

    /// Unfreeze; the window keeps exactly the time it had when paused
    fn resume_game(&mut self) {
        if let Some(window) = self.battle.response_timer.as_ref() {
            window.resume();
            self.battle.response_remaining_ms = window.remaining().as_millis() as u64;
        }
        shielded("set paused", || self.animator.set_paused(false), || ());
        self.presenter.paused(false);
    }

    // ========================================================================
    // MATCH CONTROL
    // ========================================================================

    fn restart(&mut self) {
        self.generation += 1;
        // Dropping the old state cancels its window
        self.battle = BattleState::new(self.config.starting_health);
        self.onboarding = OnboardingState::new(!self.config.skip_tutorial);
        shielded("set paused", || self.animator.set_paused(false), || ());
        self.presenter.paused(false);
        tracing::info!(generation = self.generation, "match restarted");
        self.presenter.message("New match.");
        self.initiate();
    }

    fn schedule_attack(&self, delay: Duration) {
        self.schedule(
            delay,
            GameEvent::BeginAttack {
                generation: self.generation,
            },
        );
    }

    fn schedule(&self, delay: Duration, event: GameEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = events.send(event);
        });
    }
}
