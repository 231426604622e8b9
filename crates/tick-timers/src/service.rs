//! Timer table and registration API.
//!
//! [`TimerService`] owns the tick counter and a fixed array of `N` slots.
//! It is an explicit context object: every operation takes it by reference,
//! and independent services never share state.
//!
//! Slot allocation is a linear scan for the lowest-index unused slot. With a
//! small compile-time capacity this is bounded and deterministic, so no free
//! list is kept.
//!
//! Handlers live inline in the slot array, typed by the service's `H`
//! parameter. Nothing in the table touches the heap: not construction,
//! registration, nor either scanner.

use crate::slot::{ExpiryHandler, FnHandler, SlotSnapshot, TimerId, TimerSlot};
use std::fmt;
use tick_common::error::{TimerError, TimerResult};
use tick_common::metrics::ScanMetrics;
use tick_common::state::{TimerMode, TimerStatus};
use tick_common::time::Ticks;
use tracing::debug;

/// Default table capacity.
pub const DEFAULT_CAPACITY: usize = 5;

/// Timer service with the default capacity.
pub type DefaultTimerService = TimerService<DEFAULT_CAPACITY>;

/// Fixed-capacity software timer service.
///
/// The table never grows or shrinks; `N` is fixed at compile time. `H` is
/// the expiry handler type shared by every slot, a plain `fn` pointer
/// unless named otherwise.
pub struct TimerService<const N: usize, H = FnHandler> {
    /// Tick counter, advanced only by [`TimerService::on_tick`].
    pub(crate) tick: Ticks,
    /// Tick seen by the previous poll scan.
    pub(crate) last_poll_tick: Ticks,
    pub(crate) slots: [TimerSlot<H>; N],
    pub(crate) metrics: ScanMetrics,
}

impl<const N: usize, H> fmt::Debug for TimerService<N, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerService")
            .field("tick", &self.tick)
            .field("last_poll_tick", &self.last_poll_tick)
            .field("slots", &self.slots)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl<const N: usize, H: ExpiryHandler> Default for TimerService<N, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, H: ExpiryHandler> TimerService<N, H> {
    /// Create a service with every slot unused and the tick at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            last_poll_tick: 0,
            slots: std::array::from_fn(|_| TimerSlot::empty()),
            metrics: ScanMetrics::new(),
        }
    }

    /// Table capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current tick counter value.
    #[must_use]
    pub fn current_tick(&self) -> Ticks {
        self.tick
    }

    /// Register a poll-mode timer without a handler and start it.
    ///
    /// Claims the lowest-index unused slot.
    ///
    /// # Errors
    ///
    /// [`TimerError::NoFreeSlot`] when every slot is claimed.
    pub fn register(&mut self, period: Ticks) -> TimerResult<TimerId> {
        let now = self.tick;
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.status == TimerStatus::Unused)
            .ok_or(TimerError::NoFreeSlot { capacity: N })?;

        slot.period = period;
        slot.mode = TimerMode::Poll;
        slot.handler = None;
        slot.arm(now);

        debug!(id = index, period, tick = now, status = %slot.status, "Timer registered");
        Ok(TimerId::new(index))
    }

    /// Register a timer with a scanner mode and expiry handler, then start it.
    ///
    /// # Errors
    ///
    /// [`TimerError::NoFreeSlot`] when every slot is claimed.
    pub fn register_with_callback(
        &mut self,
        period: Ticks,
        mode: TimerMode,
        handler: H,
    ) -> TimerResult<TimerId> {
        let id = self.register(period)?;
        let slot = &mut self.slots[id.index()];
        slot.mode = mode;
        slot.handler = Some(handler);

        debug!(%id, %mode, "Expiry handler attached");
        Ok(id)
    }

    /// Release a registered timer so its slot can be reused.
    ///
    /// Drops the handler and zeroes `start_time` and `period`.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`, [`TimerError::Unregistered`]
    /// if the slot is already unused.
    pub fn free(&mut self, id: TimerId) -> TimerResult<()> {
        let slot = self.registered_slot_mut(id)?;
        slot.release();

        debug!(%id, "Timer freed");
        Ok(())
    }

    /// (Re)arm a timer at the current tick.
    ///
    /// Moves the slot to RUNNING, or STOPPED when its period is zero,
    /// whatever its previous status. This is the only way out of EXPIRED
    /// or STOPPED other than a handler restart.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn start(&mut self, id: TimerId) -> TimerResult<()> {
        let now = self.tick;
        let slot = self.slot_mut(id)?;
        slot.arm(now);

        debug!(%id, tick = now, status = %slot.status, "Timer started");
        Ok(())
    }

    /// Change the period of a registered timer.
    ///
    /// Neither the start tick nor the status change, so a running timer
    /// already past its new period expires on the next scan.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`, [`TimerError::Unregistered`]
    /// if the slot is unused.
    pub fn set_period(&mut self, id: TimerId, period: Ticks) -> TimerResult<()> {
        let slot = self.registered_slot_mut(id)?;
        slot.period = period;

        debug!(%id, period, "Timer period updated");
        Ok(())
    }

    /// Whether the timer has expired and was not restarted.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn is_expired(&self, id: TimerId) -> TimerResult<bool> {
        Ok(self.slot(id)?.status == TimerStatus::Expired)
    }

    /// Whether the timer is counting down.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn is_running(&self, id: TimerId) -> TimerResult<bool> {
        Ok(self.slot(id)?.status == TimerStatus::Running)
    }

    /// Ticks until the timer's deadline, `(start + period) - now`.
    ///
    /// Uses wrapping arithmetic: once the deadline has passed the result
    /// wraps to a value close to `Ticks::MAX` rather than going negative.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn time_remaining(&self, id: TimerId) -> TimerResult<Ticks> {
        Ok(self.slot(id)?.deadline().wrapping_sub(self.tick))
    }

    /// Current status of a slot.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn status(&self, id: TimerId) -> TimerResult<TimerStatus> {
        Ok(self.slot(id)?.status)
    }

    /// Scanner mode of a slot.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn mode(&self, id: TimerId) -> TimerResult<TimerMode> {
        Ok(self.slot(id)?.mode)
    }

    /// Period of a slot in ticks.
    ///
    /// # Errors
    ///
    /// [`TimerError::OutOfRange`] for `id >= N`.
    pub fn period(&self, id: TimerId) -> TimerResult<Ticks> {
        Ok(self.slot(id)?.period)
    }

    /// Number of claimed slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status.is_registered())
            .count()
    }

    /// Cumulative scan counters.
    #[must_use]
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Read-only view of every slot, in index order.
    pub fn snapshots(&self) -> impl Iterator<Item = SlotSnapshot> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.snapshot(index))
    }

    fn slot(&self, id: TimerId) -> TimerResult<&TimerSlot<H>> {
        self.slots.get(id.index()).ok_or(TimerError::OutOfRange {
            id: id.index(),
            capacity: N,
        })
    }

    fn slot_mut(&mut self, id: TimerId) -> TimerResult<&mut TimerSlot<H>> {
        self.slots.get_mut(id.index()).ok_or(TimerError::OutOfRange {
            id: id.index(),
            capacity: N,
        })
    }

    fn registered_slot_mut(&mut self, id: TimerId) -> TimerResult<&mut TimerSlot<H>> {
        let slot = self.slot_mut(id)?;
        if slot.status == TimerStatus::Unused {
            return Err(TimerError::Unregistered { id: id.index() });
        }
        Ok(slot)
    }
}
