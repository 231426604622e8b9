//! Timer slot state machine.
//!
//! Slot lifecycle:
//! UNUSED → RUNNING ⇄ EXPIRED, with STOPPED for zero-period timers.
//!
//! `start` may be applied from any state, so RUNNING and STOPPED are
//! reachable from everywhere. Only a running timer can expire, and only a
//! registered timer can be freed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerStatus {
    /// Slot is free for registration.
    #[default]
    Unused,
    /// Counting down towards its period.
    Running,
    /// Period elapsed and the timer was not restarted.
    Expired,
    /// Armed with a zero period; never expires via countdown.
    Stopped,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unused => write!(f, "UNUSED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl TimerStatus {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: TimerStatus) -> bool {
        use TimerStatus::{Expired, Running, Stopped, Unused};

        matches!(
            (self, target),
            // start / restart
            (_, Running | Stopped)
                // countdown reached its period
                | (Running, Expired)
                // free
                | (Running | Expired | Stopped, Unused)
        )
    }

    /// Returns true if the slot is claimed by a registration.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !matches!(self, Self::Unused)
    }
}

/// Which scanner processes a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Checked by the main-loop poll scanner.
    #[default]
    Poll,
    /// Checked inside the tick interrupt.
    Interrupt,
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => write!(f, "poll"),
            Self::Interrupt => write!(f, "interrupt"),
        }
    }
}

/// Value returned by an expiry handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExpiryAction {
    /// Leave the timer expired.
    #[default]
    Continue,
    /// Rearm the timer one period after its previous start.
    Restart,
}
