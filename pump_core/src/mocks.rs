//! Test and simulation helpers for pump_core.

use pump_traits::clock::test_clock::TestClock;
use pump_traits::{Scheduler, Tick, TimerId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::dose::DoseProgress;
use crate::estimator::DoseProgressObserver;
use crate::timer::MIN_INTERVAL;

struct ManualTimer {
    /// Clock offset at which the next tick is due.
    next_fire: Duration,
    interval: Duration,
    /// Taken out while the tick runs.
    tick: Option<Tick>,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    timers: BTreeMap<TimerId, ManualTimer>,
}

/// Scheduler driven by a simulated clock.
///
/// Nothing fires until `advance` is called; due ticks then run in time
/// order with the clock set to their fire time.
pub struct ManualScheduler {
    clock: TestClock,
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            state: Mutex::new(ManualState::default()),
        }
    }

    pub fn clock(&self) -> &TestClock {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live schedules.
    pub fn scheduled(&self) -> usize {
        self.lock().timers.len()
    }

    /// Time until the earliest pending tick.
    pub fn next_fire_in(&self) -> Option<Duration> {
        let now = self.clock.offset();
        self.lock()
            .timers
            .values()
            .map(|t| t.next_fire.saturating_sub(now))
            .min()
    }

    /// Move the clock forward by `d`, firing every tick that falls due.
    /// Returns how many ticks fired.
    pub fn advance(&self, d: Duration) -> usize {
        let target = self.clock.offset().saturating_add(d);
        let mut fired = 0;
        loop {
            let due = {
                let mut state = self.lock();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, t)| t.tick.is_some() && t.next_fire <= target)
                    .min_by_key(|(id, t)| (t.next_fire, **id))
                    .map(|(id, t)| (*id, t.next_fire));
                next.and_then(|(id, at)| {
                    let timer = state.timers.get_mut(&id)?;
                    timer.tick.take().map(|tick| (id, at, tick))
                })
            };
            let Some((id, at, mut tick)) = due else {
                break;
            };
            self.clock.set_offset(at);
            // Run without the lock so the tick may cancel or schedule.
            tick();
            fired += 1;
            if let Some(timer) = self.lock().timers.get_mut(&id) {
                timer.next_fire = at + timer.interval;
                timer.tick = Some(tick);
            }
        }
        self.clock.set_offset(target);
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, first_delay: Duration, interval: Duration, tick: Tick) -> TimerId {
        let now = self.clock.offset();
        let mut state = self.lock();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        state.timers.insert(
            id,
            ManualTimer {
                next_fire: now.saturating_add(first_delay),
                interval: interval.max(MIN_INTERVAL),
                tick: Some(tick),
            },
        );
        id
    }

    fn cancel(&self, id: TimerId) {
        let removed = self.lock().timers.remove(&id);
        // Drop the tick (and anything it captured) outside the lock.
        drop(removed);
    }
}

/// Observer that records every estimate it receives.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<DoseProgress>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<DoseProgress> {
        self.seen
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().map(|g| g.len()).unwrap_or(0)
    }
}

impl DoseProgressObserver for RecordingObserver {
    fn dose_progress(&self, progress: DoseProgress) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(progress);
        }
    }
}
