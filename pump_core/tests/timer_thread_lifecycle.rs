//! Real-thread scheduler lifecycle driven through the estimator.
//!
//! Verifies that:
//! - Ticks arrive on the pulse cadence with a real clock
//! - Removing the last observer stops and joins the timer thread
//! - Repeated start/stop cycles don't accumulate threads

use chrono::Utc;
use pump_core::mocks::RecordingObserver;
use pump_core::{DoseEntry, DoseProgressEstimator, DoseType, PulseProfile, ThreadScheduler};
use pump_traits::SystemClock;
use std::sync::Arc;
use std::time::Duration;

/// 0.05 U pulses at 36 U/h → one pulse every 5 ms.
fn fast_basal() -> DoseEntry {
    DoseEntry::rate(DoseType::TempBasal, Utc::now(), 36.0, Duration::from_secs(60))
}

#[test]
fn ticks_arrive_and_stop_with_last_observer() {
    let sched = Arc::new(ThreadScheduler::new());
    let est = DoseProgressEstimator::new(
        fast_basal(),
        PulseProfile::default(),
        SystemClock::new(),
        sched.clone(),
    )
    .unwrap();
    assert!(est.time_between_pulses().abs_diff(Duration::from_millis(5)) < Duration::from_micros(1));

    let obs = Arc::new(RecordingObserver::new());
    let t = est.add_shared_observer(obs.clone());
    std::thread::sleep(Duration::from_millis(100));
    est.remove_observer(t);
    assert_eq!(sched.active(), 0);

    let count = obs.count();
    assert!(count >= 2, "expected several ticks, got {count}");
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(obs.count(), count, "no ticks after stop");
}

#[test]
fn repeated_start_stop_does_not_leak_threads() {
    let sched = Arc::new(ThreadScheduler::new());
    let est = DoseProgressEstimator::new(
        fast_basal(),
        PulseProfile::default(),
        SystemClock::new(),
        sched.clone(),
    )
    .unwrap();

    for _ in 0..10 {
        let obs = Arc::new(RecordingObserver::new());
        let t = est.add_shared_observer(obs);
        std::thread::sleep(Duration::from_millis(10));
        est.remove_observer(t);
        assert_eq!(sched.active(), 0);
    }
}

#[test]
fn stop_is_prompt() {
    let sched = Arc::new(ThreadScheduler::new());
    // 1 U/h → 180 s between pulses; the thread spends its life asleep
    let dose = DoseEntry::rate(DoseType::Basal, Utc::now(), 1.0, Duration::from_secs(3_600));
    let est = DoseProgressEstimator::new(dose, PulseProfile::default(), SystemClock::new(), sched.clone())
        .unwrap();
    let t = est.add_shared_observer(Arc::new(RecordingObserver::new()));
    std::thread::sleep(Duration::from_millis(20));

    let start = std::time::Instant::now();
    est.remove_observer(t);
    let shutdown_time = start.elapsed();
    assert!(
        shutdown_time < Duration::from_millis(200),
        "stop took {:?}, expected < 200ms",
        shutdown_time
    );
}

#[test]
fn dropping_scheduler_joins_outstanding_timers() {
    let sched = ThreadScheduler::new();
    let est = DoseProgressEstimator::new(fast_basal(), PulseProfile::default(), SystemClock::new(), sched)
        .unwrap();
    let _t = est.add_shared_observer(Arc::new(RecordingObserver::new()));
    std::thread::sleep(Duration::from_millis(20));
    // Estimator owns the scheduler; dropping it cancels then joins.
    drop(est);
}
