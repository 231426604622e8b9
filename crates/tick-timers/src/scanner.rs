//! Expiry scanners.
//!
//! Two entry points share one scan routine:
//!
//! - [`TimerService::on_tick`] runs in the tick interrupt. It advances the
//!   counter by exactly one and scans interrupt-mode slots.
//! - [`TimerService::poll`] runs once per main-loop iteration. It scans
//!   poll-mode slots, but only when the counter moved since the last poll.
//!
//! A slot expires at most once per scan. When its handler asks for a
//! restart, the start tick advances by exactly one period rather than being
//! reset to the current tick, so a periodic timer keeps its cadence
//! regardless of scan latency. If several periods were missed the timer is
//! left overdue and fires again on the next scan; missed periods are not
//! replayed within a single scan.

use crate::service::TimerService;
use crate::slot::{ExpiryHandler, TimerId, TimerSlot};
use tick_common::metrics::ScanSummary;
use tick_common::state::{ExpiryAction, TimerMode, TimerStatus};
use tick_common::time::{has_elapsed, Ticks};
use tracing::trace;

impl<const N: usize, H: ExpiryHandler> TimerService<N, H> {
    /// Advance the tick counter and scan interrupt-mode timers.
    ///
    /// Must not be re-entered: the caller guarantees this runs to completion
    /// before the next tick is delivered.
    pub fn on_tick(&mut self) -> ScanSummary {
        self.tick = self.tick.wrapping_add(1);
        let summary = scan_slots(&mut self.slots, TimerMode::Interrupt, self.tick);
        self.metrics.record_interrupt_scan(&summary);
        summary
    }

    /// Scan poll-mode timers if the tick changed since the previous poll.
    ///
    /// Returns `None` without touching any slot when called again within
    /// the same tick.
    pub fn poll(&mut self) -> Option<ScanSummary> {
        let now = self.tick;
        if now == self.last_poll_tick {
            self.metrics.record_poll_skipped();
            return None;
        }
        self.last_poll_tick = now;

        let summary = scan_slots(&mut self.slots, TimerMode::Poll, now);
        self.metrics.record_poll_scan(&summary);
        Some(summary)
    }
}

fn scan_slots<H: ExpiryHandler>(
    slots: &mut [TimerSlot<H>],
    mode: TimerMode,
    now: Ticks,
) -> ScanSummary {
    let mut summary = ScanSummary {
        tick: now,
        ..ScanSummary::default()
    };

    for (index, slot) in slots.iter_mut().enumerate() {
        if slot.status != TimerStatus::Running || slot.mode != mode {
            continue;
        }
        if !has_elapsed(now, slot.start_time, slot.period) {
            continue;
        }

        slot.set_status(TimerStatus::Expired);
        summary.expired += 1;
        trace!(id = index, tick = now, %mode, "Timer expired");

        let Some(handler) = slot.handler.as_mut() else {
            continue;
        };
        if handler.on_expiry(TimerId::new(index)) == ExpiryAction::Restart {
            slot.start_time = slot.start_time.wrapping_add(slot.period);
            slot.set_status(TimerStatus::Running);
            summary.restarted += 1;
            trace!(id = index, next_deadline = slot.deadline(), "Timer restarted");
        }
    }

    summary
}
