//! Registration and lifecycle acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Registrations claim the lowest free index until the table is full
//! - Freed indices are reused, lowest first
//! - Invalid indices and unregistered slots report distinct errors
//! - Failed operations never change the table

use tick_timers::{
    DefaultTimerService, ExpiryAction, TimerError, TimerId, TimerMode, TimerService, TimerStatus,
    DEFAULT_CAPACITY,
};

use super::common::{FiringLog, RecordingService};

#[test]
fn test_default_capacity_is_five() {
    let svc = DefaultTimerService::new();
    assert_eq!(DEFAULT_CAPACITY, 5);
    assert_eq!(svc.capacity(), 5);
    assert_eq!(svc.active_count(), 0);
}

#[test]
fn test_fill_table_then_overflow() {
    let mut svc = RecordingService::new();
    let ids: Vec<_> = (0..DEFAULT_CAPACITY)
        .map(|_| svc.register(10).unwrap())
        .collect();
    assert_eq!(
        ids.iter().map(|id| id.index()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );

    assert_eq!(
        svc.register(10),
        Err(TimerError::NoFreeSlot {
            capacity: DEFAULT_CAPACITY
        })
    );
    let log = FiringLog::new();
    assert!(matches!(
        svc.register_with_callback(10, TimerMode::Interrupt, log.handler(ExpiryAction::Continue)),
        Err(TimerError::NoFreeSlot { .. })
    ));
}

#[test]
fn test_reuse_is_lowest_free_first() {
    let mut svc = DefaultTimerService::new();
    for _ in 0..DEFAULT_CAPACITY {
        svc.register(10).unwrap();
    }

    svc.free(TimerId::new(3)).unwrap();
    svc.free(TimerId::new(1)).unwrap();

    assert_eq!(svc.register(5).unwrap(), TimerId::new(1));
    assert_eq!(svc.register(5).unwrap(), TimerId::new(3));
    assert!(svc.register(5).is_err());
}

#[test]
fn test_free_register_same_index_immediately() {
    let mut svc = DefaultTimerService::new();
    let id = svc.register(10).unwrap();
    svc.free(id).unwrap();
    assert_eq!(svc.register(20).unwrap(), id);
    assert_eq!(svc.period(id).unwrap(), 20);
}

#[test]
fn test_error_taxonomy() {
    let mut svc = TimerService::<3>::new();

    // Never registered
    assert_eq!(
        svc.free(TimerId::new(0)),
        Err(TimerError::Unregistered { id: 0 })
    );
    assert_eq!(
        svc.set_period(TimerId::new(2), 1),
        Err(TimerError::Unregistered { id: 2 })
    );

    // Beyond capacity
    let out = TimerId::new(3);
    let range = TimerError::OutOfRange { id: 3, capacity: 3 };
    assert_eq!(svc.free(out), Err(range.clone()));
    assert_eq!(svc.start(out), Err(range.clone()));
    assert_eq!(svc.set_period(out, 1), Err(range.clone()));
    assert_eq!(svc.is_expired(out), Err(range.clone()));
    assert_eq!(svc.is_running(out), Err(range.clone()));
    assert_eq!(svc.time_remaining(out), Err(range));

    // Queries on an unused in-range slot are plain reads
    assert_eq!(svc.is_expired(TimerId::new(1)), Ok(false));
    assert_eq!(svc.is_running(TimerId::new(1)), Ok(false));
    assert_eq!(svc.status(TimerId::new(1)), Ok(TimerStatus::Unused));
}

#[test]
fn test_failed_operations_leave_state_unchanged() {
    let mut svc = TimerService::<2>::new();
    svc.register(4).unwrap();
    svc.register(0).unwrap();
    svc.on_tick();
    let before: Vec<_> = svc.snapshots().collect();

    let _ = svc.register(1);
    let _ = svc.free(TimerId::new(7));
    let _ = svc.start(TimerId::new(2));
    let _ = svc.set_period(TimerId::new(9), 3);

    let after: Vec<_> = svc.snapshots().collect();
    assert_eq!(before, after);
}

#[test]
fn test_independent_services_do_not_interfere() {
    let mut a = DefaultTimerService::new();
    let mut b = DefaultTimerService::new();

    let ta = a.register(3).unwrap();
    let tb = b.register(3).unwrap();
    for _ in 0..3 {
        a.on_tick();
    }
    a.poll();
    b.poll();

    assert!(a.is_expired(ta).unwrap());
    assert!(b.is_running(tb).unwrap());
    assert_eq!(b.current_tick(), 0);
}

#[test]
fn test_status_dump_json() {
    let mut svc = DefaultTimerService::new();
    svc.register(10).unwrap();
    svc.register_with_callback(4, TimerMode::Interrupt, |_: TimerId| ExpiryAction::Continue)
        .unwrap();
    for _ in 0..4 {
        svc.on_tick();
    }

    let snapshots: Vec<_> = svc.snapshots().collect();
    let json = serde_json::to_value(&snapshots).unwrap();
    let slots = json.as_array().unwrap();
    assert_eq!(slots.len(), DEFAULT_CAPACITY);

    assert_eq!(slots[0]["status"], "RUNNING");
    assert_eq!(slots[0]["mode"], "poll");
    assert_eq!(slots[1]["id"], 1);
    assert_eq!(slots[1]["status"], "EXPIRED");
    assert_eq!(slots[1]["has_handler"], true);
    assert_eq!(slots[4]["status"], "UNUSED");
}
