//! Resolution race - hide oracle latency behind the approach and standoff
//!
//! The oracle call is spawned *before* any animation so its 1-5 s round trip
//! overlaps the fixed approach. If it is still out when the approach ends, an
//! open-ended standoff loop runs until the call is joined. Failures never
//! propagate: a rejected, panicked or timed-out call becomes a degraded
//! Neutral outcome.

use crate::battle::collaborators::{
    shielded, Animator, ResolutionOracle, ResolutionRequest, StandoffStop,
};
use crate::battle::outcome::Outcome;
use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Oracle,
    /// Tutorial short-circuit; the oracle was never called
    Scripted,
    /// Oracle failed or timed out
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn scripted(outcome: Outcome) -> Self {
        Self {
            outcome,
            source: ResolutionSource::Scripted,
        }
    }

    fn fallback() -> Self {
        Self {
            outcome: Outcome::neutral_fallback(),
            source: ResolutionSource::Fallback,
        }
    }
}

pub struct RaceCoordinator {
    oracle: Arc<dyn ResolutionOracle>,
    animator: Arc<dyn Animator>,
    approach: Duration,
    oracle_timeout: Option<Duration>,
    max_damage: u32,
}

impl RaceCoordinator {
    pub fn new(
        oracle: Arc<dyn ResolutionOracle>,
        animator: Arc<dyn Animator>,
        config: &GameConfig,
    ) -> Self {
        Self {
            oracle,
            animator,
            approach: config.approach(),
            oracle_timeout: config.oracle_timeout(),
            max_damage: config.max_damage,
        }
    }

    /// Fire the oracle, animate, join. Always returns an outcome.
    pub async fn race(&self, request: ResolutionRequest) -> Resolution {
        tracing::info!(
            attacking = %request.attacking,
            defending = %request.defending,
            tutorial = request.tutorial.is_some(),
            "resolution call started"
        );
        let fired_at = Instant::now();
        let call = shielded(
            "oracle resolve",
            || self.oracle.resolve(request),
            || -> BoxFuture<'static, Result<Outcome>> {
                Box::pin(async { Err(GameError::Oracle("oracle panicked".into())) })
            },
        );
        let mut call = tokio::spawn(call);

        // Joined through a task so a panicking animation cannot take the turn down
        let approach = shielded(
            "play approach",
            || self.animator.play_approach(self.approach),
            || -> BoxFuture<'static, Result<()>> {
                Box::pin(async { Err(GameError::Animation("approach panicked".into())) })
            },
        );
        match tokio::spawn(approach).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "approach animation failed"),
            Err(e) => tracing::error!(error = %e, "approach animation panicked"),
        }

        let standoff = shielded(
            "start standoff",
            || self.animator.start_standoff(),
            StandoffStop::noop,
        );
        tracing::debug!(waited_ms = fired_at.elapsed().as_millis() as u64, "standoff started");

        let joined = match self.oracle_timeout {
            Some(limit) => match time::timeout_at(fired_at + limit, &mut call).await {
                Ok(joined) => joined,
                Err(_) => {
                    call.abort();
                    standoff.stop();
                    tracing::warn!(?limit, "oracle timed out, falling back to neutral");
                    return Resolution::fallback();
                }
            },
            None => (&mut call).await,
        };

        standoff.stop();
        let elapsed_ms = fired_at.elapsed().as_millis() as u64;

        match joined {
            Ok(Ok(outcome)) => {
                tracing::info!(kind = ?outcome.kind, elapsed_ms, "oracle resolved");
                Resolution {
                    outcome: outcome.normalized(self.max_damage),
                    source: ResolutionSource::Oracle,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, elapsed_ms, "oracle failed, falling back to neutral");
                Resolution::fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, elapsed_ms, "oracle task died, falling back to neutral");
                Resolution::fallback()
            }
        }
    }
}
