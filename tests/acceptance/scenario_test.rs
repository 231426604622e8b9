//! End-to-end timer scenarios driven tick by tick.
//!
//! # Acceptance Criteria
//!
//! - A timer of period P is running at tick P-1 and expired at tick P
//! - A restarting handler fires exactly once per period, with no drift
//! - The poll scanner does nothing twice within one tick
//! - Interrupt and poll timers are only ever seen by their own scanner

use tick_timers::{DefaultTimerService, ExpiryAction, TimerId, TimerMode, TimerStatus};

use super::common::{run_interrupt_only, run_lockstep, FiringLog, RecordingService};

// ============================================================================
// Mixed table
// ============================================================================

#[test]
fn test_blink_and_timeout_in_one_table() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();

    let blink = svc
        .register_with_callback(100, TimerMode::Interrupt, log.handler(ExpiryAction::Restart))
        .unwrap();
    let timeout = svc.register(250).unwrap();
    let watchdog = svc
        .register_with_callback(40, TimerMode::Poll, log.handler(ExpiryAction::Continue))
        .unwrap();

    run_lockstep(&mut svc, 99);
    assert_eq!(log.count_for(blink), 0);
    assert!(svc.is_expired(watchdog).unwrap());
    assert_eq!(log.count_for(watchdog), 1);

    run_lockstep(&mut svc, 1);
    assert_eq!(log.count_for(blink), 1);
    assert!(svc.is_running(blink).unwrap());
    assert_eq!(svc.time_remaining(blink).unwrap(), 100);

    run_lockstep(&mut svc, 150);
    assert_eq!(svc.current_tick(), 250);
    assert_eq!(log.count_for(blink), 2);
    assert!(svc.is_expired(timeout).unwrap());

    // One-shot watchdog never fires again
    assert_eq!(log.count_for(watchdog), 1);
    assert_eq!(log.len(), 3);
}

#[test]
fn test_restart_cadence_has_no_drift() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();
    let id = svc
        .register_with_callback(7, TimerMode::Interrupt, log.handler(ExpiryAction::Restart))
        .unwrap();

    run_interrupt_only(&mut svc, 7 * 20);
    assert_eq!(log.count_for(id), 20);
    assert_eq!(svc.time_remaining(id).unwrap(), 7);

    let metrics = svc.metrics();
    assert_eq!(metrics.interrupt_scans, 140);
    assert_eq!(metrics.expirations, 20);
    assert_eq!(metrics.restarts, 20);
}

#[test]
fn test_handler_sees_its_own_id_in_order() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();

    let ids: Vec<_> = [3, 1, 2]
        .into_iter()
        .map(|period| {
            svc.register_with_callback(
                period,
                TimerMode::Interrupt,
                log.handler(ExpiryAction::Continue),
            )
            .unwrap()
        })
        .collect();

    run_interrupt_only(&mut svc, 3);

    let order: Vec<_> = log.entries().into_iter().map(|f| f.id).collect();
    assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
}

// ============================================================================
// Poll scanner
// ============================================================================

#[test]
fn test_poll_runs_at_most_once_per_tick() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();
    let id = svc
        .register_with_callback(1, TimerMode::Poll, log.handler(ExpiryAction::Restart))
        .unwrap();

    svc.on_tick();
    assert!(svc.poll().is_some());
    for _ in 0..10 {
        assert!(svc.poll().is_none());
    }
    assert_eq!(log.count_for(id), 1);

    assert_eq!(svc.metrics().poll_scans, 1);
    assert_eq!(svc.metrics().polls_skipped, 10);
}

#[test]
fn test_slow_main_loop_fires_overdue_timer_once() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();
    let id = svc
        .register_with_callback(5, TimerMode::Poll, log.handler(ExpiryAction::Restart))
        .unwrap();

    // Main loop stalls for four periods
    run_interrupt_only(&mut svc, 20);
    let summary = svc.poll().unwrap();
    assert_eq!(summary.tick, 20);
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.restarted, 1);
    assert_eq!(log.count_for(id), 1);

    // Restart advanced the deadline by one period only; still overdue
    svc.on_tick();
    svc.poll();
    assert_eq!(log.count_for(id), 2);
}

#[test]
fn test_scanners_ignore_other_mode() {
    let mut svc = DefaultTimerService::new();
    let irq = svc
        .register_with_callback(2, TimerMode::Interrupt, |_: TimerId| ExpiryAction::Continue)
        .unwrap();
    let polled = svc.register(2).unwrap();

    run_interrupt_only(&mut svc, 5);
    assert_eq!(svc.status(irq).unwrap(), TimerStatus::Expired);
    assert_eq!(svc.status(polled).unwrap(), TimerStatus::Running);

    svc.poll();
    assert_eq!(svc.status(polled).unwrap(), TimerStatus::Expired);
}

// ============================================================================
// Reconfiguration
// ============================================================================

#[test]
fn test_set_period_then_start_rearms() {
    let mut svc = DefaultTimerService::new();
    let id = svc.register(10).unwrap();

    run_lockstep(&mut svc, 10);
    assert!(svc.is_expired(id).unwrap());

    svc.set_period(id, 25).unwrap();
    assert_eq!(svc.period(id).unwrap(), 25);
    assert!(svc.is_expired(id).unwrap());

    svc.start(id).unwrap();
    assert_eq!(svc.time_remaining(id).unwrap(), 25);

    run_lockstep(&mut svc, 24);
    assert!(svc.is_running(id).unwrap());
    run_lockstep(&mut svc, 1);
    assert!(svc.is_expired(id).unwrap());
}

#[test]
fn test_free_drops_handler() {
    let mut svc = RecordingService::new();
    let log = FiringLog::new();
    let id = svc
        .register_with_callback(3, TimerMode::Interrupt, log.handler(ExpiryAction::Restart))
        .unwrap();

    run_interrupt_only(&mut svc, 3);
    svc.free(id).unwrap();

    // Re-registering the same slot without a handler must not call the old one
    let again = svc.register(3).unwrap();
    assert_eq!(again, id);
    run_lockstep(&mut svc, 6);
    assert_eq!(log.len(), 1);
    assert!(svc.is_expired(again).unwrap());
}

// ============================================================================
// Configuration-driven table
// ============================================================================

#[test]
fn test_table_from_config() {
    use std::time::Duration;
    use tick_common::config::TimerConfig;

    let config = TimerConfig::from_toml(
        r#"
        tick_period = "2ms"

        [[timers]]
        name = "heartbeat"
        period = "20ms"
        mode = "interrupt"
        restart = true

        [[timers]]
        name = "debounce"
        period = "5ms"
    "#,
    )
    .unwrap();
    config.validate(tick_timers::DEFAULT_CAPACITY).unwrap();
    assert_eq!(config.tick_period, Duration::from_millis(2));

    let mut svc = RecordingService::new();
    let log = FiringLog::new();
    let ids: Vec<_> = config
        .timers
        .iter()
        .map(|spec| {
            let action = if spec.restart {
                ExpiryAction::Restart
            } else {
                ExpiryAction::Continue
            };
            svc.register_with_callback(
                spec.period_ticks(config.tick_period),
                spec.mode,
                log.handler(action),
            )
            .unwrap()
        })
        .collect();

    // 5ms at 2ms per tick rounds up to 3 ticks
    assert_eq!(svc.period(ids[1]).unwrap(), 3);
    assert_eq!(svc.period(ids[0]).unwrap(), 10);

    run_lockstep(&mut svc, 30);
    assert_eq!(log.count_for(ids[0]), 3);
    assert_eq!(log.count_for(ids[1]), 1);
}
