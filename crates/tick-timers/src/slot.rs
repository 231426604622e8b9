//! Timer slot model.
//!
//! A slot is one element of the fixed timer table. Its index is the only
//! handle callers ever see ([`TimerId`]). Slots are never allocated or
//! dropped individually; registration and free only rewrite their fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use tick_common::state::{ExpiryAction, TimerMode, TimerStatus};
use tick_common::time::Ticks;

/// Handle to a registered timer (its slot index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(usize);

impl TimerId {
    /// Wrap a raw slot index. Range is checked by the service, not here.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for TimerId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl From<TimerId> for usize {
    fn from(id: TimerId) -> Self {
        id.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Callback run when a timer expires.
///
/// Runs synchronously inside the scanner that detected the expiry, which
/// for interrupt-mode timers is the tick interrupt. It must return quickly
/// and must not block.
///
/// Handlers are stored inline in their slot, so the table's handler type is
/// fixed per service (see [`TimerService`](crate::TimerService)). Plain
/// `fn` pointers and non-capturing closures fit the default; capturing
/// closures and stateful structs need a service typed on them.
///
/// # Re-entrancy
///
/// A handler runs while the scan holds the service. When the service sits
/// behind [`SharedTimers`](crate::SharedTimers), that means the handle's
/// lock is held: a handler must never call back into the same handle, not
/// even for a read such as `current_tick()`, or the tick thread blocks
/// forever. Everything a handler needs is its [`TimerId`] plus state it
/// owns.
pub trait ExpiryHandler: Send {
    /// Handle expiry of `id` and decide whether to rearm it.
    fn on_expiry(&mut self, id: TimerId) -> ExpiryAction;
}

impl<F> ExpiryHandler for F
where
    F: FnMut(TimerId) -> ExpiryAction + Send,
{
    fn on_expiry(&mut self, id: TimerId) -> ExpiryAction {
        self(id)
    }
}

/// Handler type of [`TimerService`](crate::TimerService) when none is named.
pub type FnHandler = fn(TimerId) -> ExpiryAction;

/// One entry of the timer table.
pub(crate) struct TimerSlot<H> {
    pub(crate) status: TimerStatus,
    /// Tick recorded at the most recent start or rearm.
    pub(crate) start_time: Ticks,
    pub(crate) period: Ticks,
    pub(crate) mode: TimerMode,
    pub(crate) handler: Option<H>,
}

impl<H> TimerSlot<H> {
    pub(crate) const fn empty() -> Self {
        Self {
            status: TimerStatus::Unused,
            start_time: 0,
            period: 0,
            mode: TimerMode::Poll,
            handler: None,
        }
    }

    pub(crate) fn set_status(&mut self, target: TimerStatus) {
        debug_assert!(
            self.status.can_transition_to(target),
            "invalid timer transition {} -> {}",
            self.status,
            target
        );
        self.status = target;
    }

    /// Arm at `now`; a zero period parks the slot in STOPPED.
    pub(crate) fn arm(&mut self, now: Ticks) {
        self.start_time = now;
        if self.period > 0 {
            self.set_status(TimerStatus::Running);
        } else {
            self.set_status(TimerStatus::Stopped);
        }
    }

    pub(crate) fn release(&mut self) {
        self.start_time = 0;
        self.period = 0;
        self.handler = None;
        self.set_status(TimerStatus::Unused);
    }

    /// Absolute deadline tick; wraps like the counter.
    pub(crate) fn deadline(&self) -> Ticks {
        self.start_time.wrapping_add(self.period)
    }

    pub(crate) fn snapshot(&self, index: usize) -> SlotSnapshot {
        SlotSnapshot {
            id: TimerId(index),
            status: self.status,
            mode: self.mode,
            start_time: self.start_time,
            period: self.period,
            has_handler: self.handler.is_some(),
        }
    }
}

impl<H> fmt::Debug for TimerSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSlot")
            .field("status", &self.status)
            .field("start_time", &self.start_time)
            .field("period", &self.period)
            .field("mode", &self.mode)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Read-only copy of a slot for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Slot index.
    pub id: TimerId,
    /// Current status.
    pub status: TimerStatus,
    /// Scanner that owns the slot.
    pub mode: TimerMode,
    /// Tick of the last start or rearm.
    pub start_time: Ticks,
    /// Countdown period in ticks.
    pub period: Ticks,
    /// Whether an expiry handler is attached.
    pub has_handler: bool,
}
