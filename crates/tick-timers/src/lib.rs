//! Fixed-capacity cooperative software timers.
//!
//! This crate provides a bounded table of countdown timers driven by a
//! wrapping tick counter:
//!
//! - **Table & lifecycle** ([`service`]): register, free, start, set period, queries
//! - **Scanners** ([`scanner`]): interrupt-context `on_tick` and main-loop `poll`
//! - **Shared handle** ([`shared`]): critical-section access from two contexts
//! - **Tick source** ([`tick_source`]): thread-backed stand-in for a hardware tick interrupt
//!
//! # Example
//!
//! ```
//! use tick_timers::{DefaultTimerService, ExpiryAction, TimerId, TimerMode};
//!
//! let mut timers = DefaultTimerService::new();
//!
//! // Periodic interrupt-mode timer, rearmed on every expiry
//! let blink = timers
//!     .register_with_callback(100, TimerMode::Interrupt, |_: TimerId| ExpiryAction::Restart)
//!     .unwrap();
//!
//! // One-shot poll-mode timeout
//! let timeout = timers.register(250).unwrap();
//!
//! for _ in 0..250 {
//!     timers.on_tick(); // from the tick interrupt
//!     timers.poll(); // from the main loop
//! }
//!
//! assert!(timers.is_running(blink).unwrap());
//! assert!(timers.is_expired(timeout).unwrap());
//! assert_eq!(timers.time_remaining(blink).unwrap(), 50);
//! ```

pub mod scanner;
pub mod service;
pub mod shared;
pub mod slot;
pub mod tick_source;

// Re-export main types for convenience
pub use service::{DefaultTimerService, TimerService, DEFAULT_CAPACITY};
pub use shared::SharedTimers;
pub use slot::{ExpiryHandler, FnHandler, SlotSnapshot, TimerId};
pub use tick_common::error::{TimerError, TimerResult};
pub use tick_common::metrics::{ScanMetrics, ScanSummary};
pub use tick_common::state::{ExpiryAction, TimerMode, TimerStatus};
pub use tick_common::time::Ticks;
pub use tick_source::SoftwareTickSource;
