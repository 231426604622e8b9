//! Shared handle for driving one service from two contexts.
//!
//! On a microcontroller the main loop masks the tick interrupt around calls
//! that touch interrupt-mode slots. Hosted builds model that with a mutex:
//! [`SharedTimers::critical_section`] is the masked region, and the tick
//! source thread only ever calls [`TimerService::on_tick`] from inside it.
//! Scans therefore never interleave, and a scan is never re-entered.

use crate::service::TimerService;
use crate::slot::{ExpiryHandler, FnHandler};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use tick_common::metrics::{ScanMetrics, ScanSummary};
use tick_common::time::Ticks;

/// Cloneable handle to a timer service shared between the tick source and
/// the main loop.
///
/// Expiry handlers run inside the critical section of whichever call
/// scanned them. A handler must not use this handle (or a clone of it):
/// [`critical_section`](Self::critical_section) would wait on the lock its
/// own scan holds. [`try_critical_section`](Self::try_critical_section)
/// returns `None` in that situation instead of blocking.
pub struct SharedTimers<const N: usize, H = FnHandler> {
    inner: Arc<Mutex<TimerService<N, H>>>,
}

impl<const N: usize, H> Clone for SharedTimers<N, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const N: usize, H> fmt::Debug for SharedTimers<N, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTimers")
            .field("capacity", &N)
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<const N: usize, H: ExpiryHandler> Default for SharedTimers<N, H> {
    fn default() -> Self {
        Self::new(TimerService::new())
    }
}

impl<const N: usize, H: ExpiryHandler> SharedTimers<N, H> {
    /// Wrap an existing service.
    #[must_use]
    pub fn new(service: TimerService<N, H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Run `f` with exclusive access to the service.
    ///
    /// A handler that panicked inside an earlier scan poisons the lock;
    /// the table itself is still consistent, so the guard is recovered.
    ///
    /// Blocks while another context holds the section. Never call this
    /// from an expiry handler.
    pub fn critical_section<R>(&self, f: impl FnOnce(&mut TimerService<N, H>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Like [`critical_section`](Self::critical_section), but returns
    /// `None` instead of waiting when the section is already held,
    /// including by a scan running on the calling thread.
    pub fn try_critical_section<R>(
        &self,
        f: impl FnOnce(&mut TimerService<N, H>) -> R,
    ) -> Option<R> {
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(f(&mut *guard))
    }

    /// Tick interrupt entry point.
    pub fn on_tick(&self) -> ScanSummary {
        self.critical_section(|svc| svc.on_tick())
    }

    /// Main-loop poll entry point.
    pub fn poll(&self) -> Option<ScanSummary> {
        self.critical_section(|svc| svc.poll())
    }

    /// Current tick counter value.
    #[must_use]
    pub fn current_tick(&self) -> Ticks {
        self.critical_section(|svc| svc.current_tick())
    }

    /// Copy of the scan counters.
    #[must_use]
    pub fn metrics(&self) -> ScanMetrics {
        self.critical_section(|svc| *svc.metrics())
    }
}
