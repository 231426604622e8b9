//! Signal handling for graceful shutdown.
//!
//! SIGTERM and SIGINT set an atomic flag that the main loop checks once per
//! iteration. The handlers themselves only touch atomics, which keeps them
//! async-signal-safe.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

static SIGNAL_FLAG: AtomicBool = AtomicBool::new(false);
static SIGNAL_COUNT: AtomicU32 = AtomicU32::new(0);

/// Shared shutdown state.
#[derive(Debug, Default)]
pub struct ShutdownState {
    /// Set when shutdown was requested from inside the process.
    requested: AtomicBool,
}

/// Handle for signal management.
#[derive(Debug, Clone)]
pub struct SignalHandler {
    state: Arc<ShutdownState>,
}

impl SignalHandler {
    /// Create a new signal handler and register SIGTERM/SIGINT handlers.
    ///
    /// On non-Unix platforms only manual shutdown is available.
    pub fn new() -> std::io::Result<Self> {
        let handler = Self {
            state: Arc::new(ShutdownState::default()),
        };

        #[cfg(unix)]
        handler.register_unix_handlers()?;

        Ok(handler)
    }

    #[cfg(unix)]
    fn register_unix_handlers(&self) -> std::io::Result<()> {
        use std::os::raw::c_int;

        extern "C" fn on_signal(_: c_int) {
            SIGNAL_FLAG.store(true, Ordering::Relaxed);
            SIGNAL_COUNT.fetch_add(1, Ordering::Relaxed);
        }

        // SAFETY: the handler only stores to atomics.
        let results = unsafe {
            [
                libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t),
                libc::signal(libc::SIGINT, on_signal as libc::sighandler_t),
            ]
        };
        if results.contains(&libc::SIG_ERR) {
            return Err(std::io::Error::last_os_error());
        }

        debug!("Unix signal handlers registered");
        Ok(())
    }

    /// Check if shutdown has been requested by a signal or manually.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        SIGNAL_FLAG.load(Ordering::Relaxed) || self.state.requested.load(Ordering::Relaxed)
    }

    /// Manually request shutdown.
    pub fn request_shutdown(&self) {
        info!("Manual shutdown requested");
        self.state.requested.store(true, Ordering::Relaxed);
    }

    /// Number of signals received.
    pub fn signal_count(&self) -> u32 {
        SIGNAL_COUNT.load(Ordering::Relaxed)
    }
}
