//! Integration tests for the free-play turn cycle
//!
//! Attack, defense or timeout, resolution, damage, and the next attack.

mod common;

use common::{
    assert_elapsed, free_play, ms, CountingAnimator, Harness, OutcomeAnimation, Reply,
    ScriptedOracle, Shown, SyncPanic,
};
use concept_arena::battle::{
    GameEvent, OutcomeKind, TurnResult, WindowId, NO_DEFENSE, UNDEFENDED_EXPLANATION,
};
use concept_arena::core::types::Side;
use concept_arena::core::GameConfig;
use std::sync::atomic::Ordering;
use tokio::time::{self, Instant};

#[tokio::test(start_paused = true)]
async fn test_fire_water_direct_win() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 1_500);
    let mut h = Harness::new(free_play(), oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    assert_eq!(h.battle().active_attack().unwrap().concept, "Fire");

    h.send(GameEvent::Defend("Water".into())).await;

    let battle = h.battle();
    assert_eq!(battle.attacker_health(), 92);
    assert_eq!(battle.defender_health(), 100);
    assert_eq!(battle.history().len(), 1);
    let record = &battle.history()[0];
    assert_eq!(record.attacking, "Fire");
    assert_eq!(record.defending, "Water");
    assert_eq!(record.result, TurnResult::Resolved(OutcomeKind::DirectWin));
    assert_eq!(record.damage, 8);
    assert!(!record.degraded);
    h.assert_idle();
    assert_eq!(h.oracle.calls(), 1);

    // Next attack after the pacing delay
    let resolved_at = Instant::now();
    h.run_until(|o| o.battle().is_ai_attacking()).await;
    let waited = resolved_at.elapsed();
    assert!(waited >= ms(3_000) && waited < ms(3_100), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_oracle_latency_hidden_behind_approach() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectLoss, 6), 1_500);
    let mut h = Harness::new(free_play(), oracle, &["Lava"]);

    h.send(GameEvent::Start).await;
    let committed = Instant::now();
    h.send(GameEvent::Defend("Rock".into())).await;

    // 2 s approach covers the 1.5 s call
    assert_elapsed(committed.elapsed(), ms(2_000));
    assert_eq!(h.battle().defender_health(), 94);
    assert_eq!(h.animator.approaches.load(Ordering::SeqCst), 1);
    assert_eq!(h.animator.standoffs_started.load(Ordering::SeqCst), 1);
    assert_eq!(h.animator.standoffs_stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_oracle_waits_in_standoff() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::MutualDestruction, 6), 4_500);
    let mut h = Harness::new(free_play(), oracle, &["Nuke"]);

    h.send(GameEvent::Start).await;
    let committed = Instant::now();
    h.send(GameEvent::Defend("Nuke".into())).await;

    assert_elapsed(committed.elapsed(), ms(4_500));
    assert_eq!(h.battle().attacker_health(), 94);
    assert_eq!(h.battle().defender_health(), 94);
    assert_eq!(h.animator.standoffs_stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_applies_fixed_penalty() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 100);
    let mut h = Harness::new(free_play(), oracle, &["Wolf"]);

    let started = Instant::now();
    h.send(GameEvent::Start).await;
    h.run_until(|o| o.battle().battle_count() == 1).await;

    let expired_after = started.elapsed();
    assert!(expired_after >= ms(10_000) && expired_after < ms(10_200), "expired after {expired_after:?}");

    let battle = h.battle();
    assert_eq!(battle.defender_health(), 95);
    assert_eq!(battle.attacker_health(), 100);
    let record = &battle.history()[0];
    assert_eq!(record.defending, NO_DEFENSE);
    assert_eq!(record.result, TurnResult::Undefended);
    assert_eq!(record.damage, 5);
    assert_eq!(record.explanation, UNDEFENDED_EXPLANATION);
    h.assert_idle();
    assert_eq!(h.oracle.calls(), 0);

    let timed_out = Instant::now();
    h.run_until(|o| o.battle().is_ai_attacking()).await;
    let waited = timed_out.elapsed();
    assert!(waited >= ms(1_500) && waited < ms(1_600), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_timer_updates_never_increase() {
    let oracle = ScriptedOracle::new(Reply::Fail, 0);
    let mut h = Harness::new(free_play(), oracle, &["Wolf"]);

    h.send(GameEvent::Start).await;
    h.run_until(|o| o.battle().battle_count() == 1).await;

    let updates = h.presenter.timer_updates.lock().unwrap().clone();
    assert!(updates.len() >= 90, "only {} updates", updates.len());
    assert!(updates.windows(2).all(|pair| pair[1] <= pair[0]));
}

#[tokio::test(start_paused = true)]
async fn test_oracle_rejection_degrades_to_neutral() {
    let oracle = ScriptedOracle::new(Reply::Fail, 800);
    let mut h = Harness::new(free_play(), oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("Water".into())).await;

    let battle = h.battle();
    assert_eq!(battle.attacker_health(), 100);
    assert_eq!(battle.defender_health(), 100);
    let record = &battle.history()[0];
    assert_eq!(record.result, TurnResult::Resolved(OutcomeKind::Neutral));
    assert_eq!(record.damage, 0);
    assert!(record.degraded);
    h.assert_idle();

    // The match carries on
    h.run_until(|o| o.battle().is_ai_attacking()).await;
}

#[tokio::test(start_paused = true)]
async fn test_hung_oracle_times_out_to_neutral() {
    let config = GameConfig {
        oracle_timeout_ms: Some(5_000),
        ..free_play()
    };
    let oracle = ScriptedOracle::new(Reply::Hang, 0);
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    let committed = Instant::now();
    h.send(GameEvent::Defend("Water".into())).await;

    assert_elapsed(committed.elapsed(), ms(5_000));
    assert!(h.battle().history()[0].degraded);
    h.assert_idle();
}

#[tokio::test(start_paused = true)]
async fn test_flags_reset_on_every_exit_path() {
    let cases = [
        (Reply::Judge(OutcomeKind::DirectWin, 8), OutcomeAnimation::Succeed),
        (Reply::Fail, OutcomeAnimation::Succeed),
        (Reply::Judge(OutcomeKind::BackfireWin, 9), OutcomeAnimation::Fail),
        (Reply::Judge(OutcomeKind::DirectLoss, 7), OutcomeAnimation::Panic),
    ];
    for (reply, animation) in cases {
        let oracle = ScriptedOracle::new(reply.clone(), 300);
        let animator = common::CountingAnimator::new(animation);
        let mut h = Harness::with_animator(free_play(), oracle, &["Fire"], animator);

        h.send(GameEvent::Start).await;
        h.send(GameEvent::Defend("Water".into())).await;

        h.assert_idle();
        assert_eq!(h.battle().battle_count(), 1, "{reply:?} / {animation:?}");
        assert_eq!(h.animator.outcomes.load(Ordering::SeqCst), 1);
    }

    for hook in [SyncPanic::PresentAttack, SyncPanic::StartStandoff, SyncPanic::PlayOutcome] {
        let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 300);
        let animator = CountingAnimator::panicking_in(hook);
        let mut h = Harness::with_animator(free_play(), oracle, &["Fire"], animator);

        h.send(GameEvent::Start).await;
        assert!(h.battle().is_ai_attacking(), "{hook:?}");
        h.send(GameEvent::Defend("Water".into())).await;

        h.assert_idle();
        assert_eq!(h.battle().battle_count(), 1, "{hook:?}");
        assert_eq!(h.battle().attacker_health(), 92, "{hook:?}");
        if hook == SyncPanic::StartStandoff {
            assert_eq!(h.animator.standoffs_stopped.load(Ordering::SeqCst), 0);
        }

        h.run_until(|o| o.battle().is_ai_attacking()).await;
        assert_eq!(h.animator.presented.load(Ordering::SeqCst), 2, "{hook:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_survives_panicking_standoff() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 500);
    let animator = CountingAnimator::panicking_in(SyncPanic::StartStandoff);
    let h = Harness::with_animator(free_play(), oracle, &["Fire"], animator);
    let sender = h.orch.sender();

    let running = tokio::spawn(h.orch.run(h.events));
    sender.send(GameEvent::Start).unwrap();
    time::sleep(ms(1_000)).await;
    sender.send(GameEvent::Defend("Water".into())).unwrap();
    time::sleep(ms(4_000)).await;
    sender.send(GameEvent::Shutdown).unwrap();

    let finished = running.await.expect("orchestrator task survived");
    assert_eq!(finished.battle().battle_count(), 1);
    assert_eq!(finished.battle().attacker_health(), 92);
    assert!(!finished.battle().is_processing());
}

#[tokio::test(start_paused = true)]
async fn test_defense_just_before_expiry_outlasts_window() {
    let config = GameConfig {
        turn_pacing_ms: 60_000,
        ..free_play()
    };
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 5_000);
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    time::sleep(ms(9_900)).await;
    h.drain().await;
    assert!(h.battle().is_ai_attacking());

    // The resolution runs well past the original 10 s deadline
    h.send(GameEvent::Defend("Water".into())).await;
    time::sleep(ms(20_000)).await;
    h.drain().await;

    let battle = h.battle();
    assert_eq!(battle.battle_count(), 1);
    assert_eq!(battle.history()[0].result, TurnResult::Resolved(OutcomeKind::DirectWin));
    assert_eq!(battle.defender_health(), 100);
    assert_eq!(battle.attacker_health(), 92);
    h.assert_idle();
}

#[tokio::test(start_paused = true)]
async fn test_failed_animation_still_applies_damage() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::BackfireWin, 9), 300);
    let animator = common::CountingAnimator::new(OutcomeAnimation::Panic);
    let mut h = Harness::with_animator(free_play(), oracle, &["Sodium"], animator);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("Water".into())).await;

    assert_eq!(h.battle().defender_health(), 91);
    assert_eq!(h.battle().attacker_health(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_stale_expiry_is_ignored() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 300);
    let mut h = Harness::new(free_play(), oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    let window = h.battle().response_window().unwrap();

    h.send(GameEvent::ResponseExpired { window: WindowId(window.0 + 100) }).await;
    assert_eq!(h.battle().battle_count(), 0);
    assert!(h.battle().is_ai_attacking());

    h.send(GameEvent::Defend("Water".into())).await;
    assert_eq!(h.battle().battle_count(), 1);

    // A late expiry for the answered window changes nothing
    h.send(GameEvent::ResponseExpired { window }).await;
    assert_eq!(h.battle().battle_count(), 1);
    assert_eq!(h.battle().defender_health(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_answered_window_never_fires() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::Neutral, 0), 100);
    let config = GameConfig {
        turn_pacing_ms: 60_000,
        ..free_play()
    };
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("Water".into())).await;

    // Well past the 10 s window, short of the next attack
    time::sleep(ms(20_000)).await;
    h.drain().await;
    assert_eq!(h.battle().battle_count(), 1);
    assert_eq!(h.battle().defender_health(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_double_initiate_is_noop() {
    let oracle = ScriptedOracle::new(Reply::Fail, 0);
    let mut h = Harness::new(free_play(), oracle, &["Fire", "Ice", "Wind"]);

    h.send(GameEvent::Start).await;
    let window = h.battle().response_window();
    let concept = h.battle().active_attack().unwrap().concept.clone();

    h.send(GameEvent::Start).await;
    h.send(GameEvent::BeginAttack { generation: 0 }).await;

    assert_eq!(h.battle().response_window(), window);
    assert_eq!(h.battle().active_attack().unwrap().concept, concept);
    let attacks = h
        .presenter
        .all()
        .into_iter()
        .filter(|shown| matches!(shown, Shown::Attack(_)))
        .count();
    assert_eq!(attacks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_defense_input_validation() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 100);
    let config = GameConfig {
        max_concept_chars: 10,
        ..free_play()
    };
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("   ".into())).await;
    assert!(h.battle().is_ai_attacking());
    assert_eq!(h.oracle.calls(), 0);

    h.send(GameEvent::Defend("  Fire extinguisher  ".into())).await;
    assert_eq!(h.oracle.last_request().unwrap().defending, "Fire extin");
    assert_eq!(h.battle().history()[0].defending, "Fire extin");
}

#[tokio::test(start_paused = true)]
async fn test_empty_corpus_uses_builtin_concepts() {
    let oracle = ScriptedOracle::new(Reply::Fail, 0);
    let mut h = Harness::new(free_play(), oracle, &[]);

    h.send(GameEvent::Start).await;
    let concept = h.battle().active_attack().unwrap().concept.clone();
    assert!(concept_arena::battle::FALLBACK_CONCEPTS.contains(&concept.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_match_over_stops_rearming() {
    let config = GameConfig {
        starting_health: 8,
        ..free_play()
    };
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 100);
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("Water".into())).await;

    let battle = h.battle();
    assert_eq!(battle.attacker_health(), 0);
    assert_eq!(battle.winner(), Some(Side::Defender));
    assert!(h.presenter.all().contains(&Shown::MatchOver(Side::Defender)));
    h.assert_idle();

    time::sleep(ms(30_000)).await;
    h.drain().await;
    h.send(GameEvent::Start).await;
    assert!(!h.battle().is_ai_attacking());
    assert_eq!(h.battle().battle_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_can_end_match() {
    let config = GameConfig {
        starting_health: 5,
        ..free_play()
    };
    let oracle = ScriptedOracle::new(Reply::Fail, 0);
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.run_until(|o| o.battle().is_over()).await;

    assert_eq!(h.battle().defender_health(), 0);
    assert_eq!(h.battle().winner(), Some(Side::Attacker));

    time::sleep(ms(10_000)).await;
    h.drain().await;
    assert!(!h.battle().is_ai_attacking());
}

#[tokio::test(start_paused = true)]
async fn test_restart_gives_fresh_match() {
    let config = GameConfig {
        starting_health: 8,
        ..free_play()
    };
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 100);
    let mut h = Harness::new(config, oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    h.send(GameEvent::Defend("Water".into())).await;
    assert!(h.battle().is_over());

    h.send(GameEvent::Restart).await;

    let battle = h.battle();
    assert!(!battle.is_over());
    assert_eq!(battle.attacker_health(), 8);
    assert!(battle.history().is_empty());
    assert!(battle.is_ai_attacking());
    assert_eq!(h.orch.generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_mid_attack_discards_old_window() {
    let oracle = ScriptedOracle::new(Reply::Fail, 0);
    let mut h = Harness::new(free_play(), oracle, &["Fire"]);

    h.send(GameEvent::Start).await;
    let old_window = h.battle().response_window().unwrap();
    time::sleep(ms(4_000)).await;

    h.send(GameEvent::Restart).await;
    let new_window = h.battle().response_window().unwrap();
    assert_ne!(old_window, new_window);

    // Only the new window's full 10 s counts
    let restarted = Instant::now();
    h.run_until(|o| o.battle().battle_count() == 1).await;
    let waited = restarted.elapsed();
    assert!(waited >= ms(10_000) && waited < ms(10_200), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_until_shutdown() {
    let oracle = ScriptedOracle::new(Reply::Judge(OutcomeKind::DirectWin, 8), 500);
    let h = Harness::new(free_play(), oracle, &["Fire"]);
    let sender = h.orch.sender();

    let running = tokio::spawn(h.orch.run(h.events));
    sender.send(GameEvent::Start).unwrap();
    time::sleep(ms(1_000)).await;
    sender.send(GameEvent::Defend("Water".into())).unwrap();
    time::sleep(ms(4_000)).await;
    sender.send(GameEvent::Shutdown).unwrap();

    let finished = running.await.unwrap();
    assert_eq!(finished.battle().battle_count(), 1);
    assert_eq!(finished.battle().attacker_health(), 92);
    assert!(!finished.battle().is_processing());
}
