//! Software tick source.
//!
//! Stands in for the hardware timer interrupt on hosted targets: a
//! dedicated thread calls [`SharedTimers::on_tick`] once per tick period.
//!
//! Deadlines are absolute (`next += period`), so sleep jitter does not
//! accumulate into drift. A late thread delivers the missed ticks
//! back-to-back; if it falls more than [`MAX_CATCH_UP_TICKS`] behind it
//! resynchronises to the current time and logs the gap instead.

use crate::shared::SharedTimers;
use crate::slot::ExpiryHandler;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tick_common::error::{TimerError, TimerResult};
use tracing::{debug, info, warn};

/// Largest backlog delivered as catch-up ticks before resynchronising.
pub const MAX_CATCH_UP_TICKS: u32 = 100;

/// Thread-backed periodic tick generator.
#[derive(Debug)]
pub struct SoftwareTickSource {
    /// Shared state between the owner and the tick thread.
    state: Arc<TickState>,
    /// Handle to the tick thread.
    handle: Option<JoinHandle<()>>,
    /// Interval between ticks.
    period: Duration,
}

/// Shared state for tick thread synchronization.
#[derive(Debug, Default)]
struct TickState {
    /// Ticks delivered since the source was created.
    delivered: AtomicU64,
    /// Ticks dropped by resynchronisation.
    dropped: AtomicU64,
    /// Flag to signal the tick thread to stop.
    stop_requested: AtomicBool,
    /// Whether the tick thread is alive.
    running: AtomicBool,
}

impl SoftwareTickSource {
    /// Create a stopped tick source with the given period.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            state: Arc::new(TickState::default()),
            handle: None,
            period,
        }
    }

    /// Start delivering ticks to `timers`.
    ///
    /// # Errors
    ///
    /// Fails if the source is already running, the period is zero, or the
    /// thread cannot be spawned.
    pub fn start<const N: usize, H>(&mut self, timers: SharedTimers<N, H>) -> TimerResult<()>
    where
        H: ExpiryHandler + 'static,
    {
        if self.state.running.load(Ordering::Acquire) {
            return Err(TimerError::TickSource("tick source already running".into()));
        }
        if self.period.is_zero() {
            return Err(TimerError::TickSource("tick period must be non-zero".into()));
        }

        info!(period_us = self.period.as_micros(), "Starting tick source");

        self.state.stop_requested.store(false, Ordering::Release);
        // Set running BEFORE spawn so is_running() returns true immediately
        self.state.running.store(true, Ordering::Release);

        let state = Arc::clone(&self.state);
        let period = self.period;

        let handle = thread::Builder::new()
            .name("timer-tick".into())
            .spawn(move || run_ticks(&state, &timers, period))
            .map_err(|e| {
                self.state.running.store(false, Ordering::Release);
                TimerError::TickSource(format!("failed to spawn tick thread: {e}"))
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the tick thread and wait for it to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        info!(delivered = self.ticks_delivered(), "Stopping tick source");
        self.state.stop_requested.store(true, Ordering::Release);
        if let Err(e) = handle.join() {
            warn!("Tick thread panicked: {:?}", e);
            self.state.running.store(false, Ordering::Release);
        }
    }

    /// Check if the tick thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Ticks delivered so far.
    #[must_use]
    pub fn ticks_delivered(&self) -> u64 {
        self.state.delivered.load(Ordering::Acquire)
    }

    /// Ticks skipped because the thread fell too far behind.
    #[must_use]
    pub fn ticks_dropped(&self) -> u64 {
        self.state.dropped.load(Ordering::Acquire)
    }

    /// Configured tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for SoftwareTickSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_ticks<const N: usize, H: ExpiryHandler>(
    state: &TickState,
    timers: &SharedTimers<N, H>,
    period: Duration,
) {
    debug!("Tick thread started");
    let max_lag = period.saturating_mul(MAX_CATCH_UP_TICKS);
    let mut next = Instant::now() + period;

    while !state.stop_requested.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next {
            thread::sleep(next - now);
            continue;
        }

        let lag = now - next;
        if lag > max_lag {
            let skipped = (lag.as_nanos() / period.as_nanos()) as u64;
            warn!(
                lag_us = lag.as_micros(),
                skipped, "Tick source fell behind, resynchronising"
            );
            state.dropped.fetch_add(skipped, Ordering::AcqRel);
            next = now;
        }

        timers.on_tick();
        state.delivered.fetch_add(1, Ordering::AcqRel);
        next += period;
    }

    state.running.store(false, Ordering::Release);
    debug!("Tick thread stopped");
}
