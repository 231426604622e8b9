use thiserror::Error;

/// Timer service error types covering slot allocation, index validation, and tick delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Registration attempted while every slot in the table is claimed.
    #[error("no free timer slot (capacity {capacity})")]
    NoFreeSlot {
        /// Table capacity.
        capacity: usize,
    },

    /// Slot index beyond the table capacity.
    #[error("timer id {id} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested slot index.
        id: usize,
        /// Table capacity.
        capacity: usize,
    },

    /// Operation on a slot that is currently unused.
    #[error("timer id {id} is not registered")]
    Unregistered {
        /// Requested slot index.
        id: usize,
    },

    /// Tick source could not be started or is in the wrong state.
    #[error("tick source error: {0}")]
    TickSource(String),
}

/// Convenience type alias for timer operations.
pub type TimerResult<T> = Result<T, TimerError>;
