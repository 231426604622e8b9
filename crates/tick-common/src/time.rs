//! Tick arithmetic.
//!
//! The tick counter is a `u32` that wraps at 2^32. All elapsed-time
//! comparisons use modular subtraction, which stays correct across the wrap
//! as long as the measured interval is shorter than half the counter range.

use std::time::Duration;

/// Tick count (one unit per tick source pulse, nominally 1 ms).
pub type Ticks = u32;

/// Largest interval that compares correctly across a counter wrap.
pub const MAX_SAFE_INTERVAL: Ticks = Ticks::MAX / 2;

/// Ticks elapsed from `since` to `now`, wraparound-safe.
#[inline]
#[must_use]
pub fn elapsed(now: Ticks, since: Ticks) -> Ticks {
    now.wrapping_sub(since)
}

/// True once `period` ticks have passed since `start`.
#[inline]
#[must_use]
pub fn has_elapsed(now: Ticks, start: Ticks, period: Ticks) -> bool {
    elapsed(now, start) >= period
}

/// Convert a duration to ticks of `tick_period`, rounding up.
///
/// Saturates at [`Ticks::MAX`]. A zero `tick_period` yields zero.
#[must_use]
pub fn ticks_from_duration(duration: Duration, tick_period: Duration) -> Ticks {
    let tick_ns = tick_period.as_nanos();
    if tick_ns == 0 {
        return 0;
    }
    let ticks = duration.as_nanos().div_ceil(tick_ns);
    Ticks::try_from(ticks).unwrap_or(Ticks::MAX)
}

/// Convert a tick count back to wall-clock time at `tick_period`.
#[must_use]
pub fn duration_from_ticks(ticks: Ticks, tick_period: Duration) -> Duration {
    tick_period.saturating_mul(ticks)
}
