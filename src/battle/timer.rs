//! Response window - the cancelable, pausable countdown the player answers against
//!
//! Split in two layers:
//! - [`Countdown`] is a pure state machine over monotonic instants. All the
//!   arithmetic (remaining time, pause/resume shifting, one-shot expiry) lives
//!   here and is tested without a runtime.
//! - [`ResponseWindow`] arms a countdown by spawning a ticker task that polls
//!   it every tick and forwards ticks/expiry to callbacks. The returned
//!   [`WindowHandle`] cancels, pauses and resumes it.
//!
//! Expiry is one-shot by construction: the expire callback is `FnOnce`, and
//! `Countdown::poll` reports `Expired` only on the transition out of `Running`.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Identifier of one armed window, unique per [`ResponseWindow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    Running,
    Paused,
    Expired,
    Cancelled,
}

/// What a single poll of the countdown observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPoll {
    /// Still running with this much time left
    Tick(Duration),
    /// Frozen; nothing to report
    Paused,
    /// Reached zero on this poll. Returned exactly once.
    Expired,
    /// Already expired or cancelled earlier
    Finished,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    /// Effective start. Shifted forward by every pause so paused time never counts.
    started_at: Instant,
    paused_at: Option<Instant>,
    status: CountdownStatus,
}

impl Countdown {
    pub fn start(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            started_at: now,
            paused_at: None,
            status: CountdownStatus::Running,
        }
    }

    pub fn status(&self) -> CountdownStatus {
        self.status
    }

    /// Running or paused; can still expire
    pub fn is_live(&self) -> bool {
        matches!(self.status, CountdownStatus::Running | CountdownStatus::Paused)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        if !self.is_live() {
            return Duration::ZERO;
        }
        let reference = self.paused_at.unwrap_or(now);
        let elapsed = reference.saturating_duration_since(self.started_at);
        self.duration.saturating_sub(elapsed)
    }

    /// Freeze the countdown. Returns false unless it was running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.status != CountdownStatus::Running {
            return false;
        }
        self.paused_at = Some(now);
        self.status = CountdownStatus::Paused;
        true
    }

    /// Unfreeze, moving the effective start forward by the paused span.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.status != CountdownStatus::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.started_at += now.saturating_duration_since(paused_at);
        }
        self.status = CountdownStatus::Running;
        true
    }

    /// Suppress any future expiry. Returns false if already expired or cancelled.
    pub fn cancel(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.paused_at = None;
        self.status = CountdownStatus::Cancelled;
        true
    }

    pub fn poll(&mut self, now: Instant) -> CountdownPoll {
        match self.status {
            CountdownStatus::Paused => CountdownPoll::Paused,
            CountdownStatus::Expired | CountdownStatus::Cancelled => CountdownPoll::Finished,
            CountdownStatus::Running => {
                let remaining = self.remaining(now);
                if remaining.is_zero() {
                    self.status = CountdownStatus::Expired;
                    CountdownPoll::Expired
                } else {
                    CountdownPoll::Tick(remaining)
                }
            }
        }
    }
}

fn lock(countdown: &Mutex<Countdown>) -> MutexGuard<'_, Countdown> {
    countdown.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Arms response windows. Owns the id sequence so ids never repeat within a match.
#[derive(Debug)]
pub struct ResponseWindow {
    tick: Duration,
    next_id: u64,
}

impl ResponseWindow {
    pub fn new(tick: Duration) -> Self {
        Self { tick, next_id: 1 }
    }

    /// Start a countdown of `duration`.
    ///
    /// `on_tick` receives the remaining time every tick while running (the first
    /// tick fires immediately). `on_expire` runs once when the remaining time
    /// reaches zero, unless the handle was cancelled or dropped first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<T, E>(&mut self, duration: Duration, mut on_tick: T, on_expire: E) -> WindowHandle
    where
        T: FnMut(WindowId, Duration) + Send + 'static,
        E: FnOnce(WindowId) + Send + 'static,
    {
        let id = WindowId(self.next_id);
        self.next_id += 1;

        let countdown = Arc::new(Mutex::new(Countdown::start(duration, Instant::now())));
        let shared = Arc::clone(&countdown);
        let tick = self.tick;

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut on_expire = Some(on_expire);

            loop {
                ticker.tick().await;
                let poll = lock(&shared).poll(Instant::now());
                match poll {
                    CountdownPoll::Tick(remaining) => on_tick(id, remaining),
                    CountdownPoll::Paused => continue,
                    CountdownPoll::Expired => {
                        if let Some(expire) = on_expire.take() {
                            expire(id);
                        }
                        break;
                    }
                    CountdownPoll::Finished => break,
                }
            }
            tracing::debug!(window = id.0, "response window task finished");
        });

        tracing::debug!(window = id.0, ?duration, "response window armed");
        WindowHandle {
            id,
            countdown,
            task,
        }
    }
}

/// Live handle to an armed window. Dropping it cancels the window.
#[derive(Debug)]
pub struct WindowHandle {
    id: WindowId,
    countdown: Arc<Mutex<Countdown>>,
    task: JoinHandle<()>,
}

impl WindowHandle {
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Suppress future firing. Safe to call repeatedly and after expiry.
    pub fn cancel(&self) -> bool {
        let cancelled = lock(&self.countdown).cancel();
        self.task.abort();
        if cancelled {
            tracing::debug!(window = self.id.0, "response window cancelled");
        }
        cancelled
    }

    pub fn pause(&self) -> bool {
        lock(&self.countdown).pause(Instant::now())
    }

    pub fn resume(&self) -> bool {
        lock(&self.countdown).resume(Instant::now())
    }

    pub fn remaining(&self) -> Duration {
        lock(&self.countdown).remaining(Instant::now())
    }

    pub fn status(&self) -> CountdownStatus {
        lock(&self.countdown).status()
    }

    pub fn is_live(&self) -> bool {
        lock(&self.countdown).is_live()
    }
}

impl Drop for WindowHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
