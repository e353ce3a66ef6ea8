//! Single-instance, one-second countdown.
//!
//! Like the rest of the crate's timers this is a tick-driven state machine
//! with no internal thread: the session driver calls [`Countdown::tick`] once
//! per second and reacts to the returned [`CountdownEvent`].
//!
//! ```text
//! start(3) -> Tick(3)
//! tick()   -> Tick(2)
//! tick()   -> Tick(1)
//! tick()   -> Completed
//! tick()   -> None
//! ```
//!
//! Only one countdown is ever live. `start` cancels whatever was running,
//! and every start gets a fresh [`CountdownId`] so a completion can always be
//! attributed to the countdown that produced it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountdownId(u64);

/// What a countdown is gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPurpose {
    /// Review time after a correct answer.
    Review,
    /// Lockout after the last attempt was used up.
    Cooldown,
    /// Error display before auto-unblocking after fetch exhaustion.
    ErrorTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountdownEvent {
    Tick {
        id: CountdownId,
        purpose: CountdownPurpose,
        remaining_secs: u64,
    },
    Completed {
        id: CountdownId,
        purpose: CountdownPurpose,
    },
}

#[derive(Debug, Clone, Copy)]
struct ActiveCountdown {
    id: CountdownId,
    purpose: CountdownPurpose,
    remaining_secs: u64,
}

#[derive(Debug, Default)]
pub struct Countdown {
    active: Option<ActiveCountdown>,
    next_id: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.active.map(|a| a.remaining_secs)
    }

    pub fn purpose(&self) -> Option<CountdownPurpose> {
        self.active.map(|a| a.purpose)
    }

    pub fn current_id(&self) -> Option<CountdownId> {
        self.active.map(|a| a.id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a countdown, cancelling any live one first.
    ///
    /// Returns the first event: `Tick` with the full duration, or `Completed`
    /// straight away for a zero duration.
    pub fn start(&mut self, duration_secs: u64, purpose: CountdownPurpose) -> CountdownEvent {
        if let Some(previous) = self.active.take() {
            tracing::debug!(
                previous = ?previous.purpose,
                next = ?purpose,
                "replacing live countdown"
            );
        }
        self.next_id += 1;
        let id = CountdownId(self.next_id);

        if duration_secs == 0 {
            return CountdownEvent::Completed { id, purpose };
        }
        self.active = Some(ActiveCountdown {
            id,
            purpose,
            remaining_secs: duration_secs,
        });
        CountdownEvent::Tick {
            id,
            purpose,
            remaining_secs: duration_secs,
        }
    }

    /// Advance by one second. `None` when nothing is running.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        let active = self.active.as_mut()?;
        active.remaining_secs = active.remaining_secs.saturating_sub(1);
        let (id, purpose, remaining_secs) = (active.id, active.purpose, active.remaining_secs);
        if remaining_secs == 0 {
            self.active = None;
            return Some(CountdownEvent::Completed { id, purpose });
        }
        tracing::trace!(?purpose, remaining_secs, "countdown tick");
        Some(CountdownEvent::Tick {
            id,
            purpose,
            remaining_secs,
        })
    }

    /// Stop the live countdown. Safe to call when nothing is running.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}
