//! Thread-backed repeating timers.
//!
//! Each schedule owns one thread that sleeps on a cancel channel, so
//! cancellation wakes it immediately instead of waiting out the interval.
//!
//! Safety: every timer thread is joined on `cancel` or when the
//! `ThreadScheduler` is dropped, preventing thread leaks. A schedule
//! cancelled from inside its own tick is detached instead (joining would
//! self-deadlock); it exits as soon as the tick returns.
use crossbeam_channel as xch;
use pump_traits::{Scheduler, Tick, TimerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Shortest interval honoured; guards against a zero-period busy loop.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct TimerThread {
    /// Dropping the sender disconnects the channel and wakes the thread.
    cancel: xch::Sender<()>,
    join_handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub struct ThreadScheduler {
    next_id: AtomicU64,
    timers: Mutex<HashMap<TimerId, TimerThread>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of schedules not yet cancelled.
    pub fn active(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TimerId, TimerThread>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(id: TimerId, mut timer: TimerThread) {
        drop(timer.cancel);
        let Some(handle) = timer.join_handle.take() else {
            return;
        };
        if handle.thread().id() == std::thread::current().id() {
            tracing::trace!(timer = id.0, "timer cancelled from its own tick; detaching");
            return;
        }
        match handle.join() {
            Ok(()) => {
                tracing::trace!(timer = id.0, "timer thread joined successfully");
            }
            Err(e) => {
                // Tick panicked; log but don't propagate
                tracing::warn!(timer = id.0, ?e, "timer thread panicked");
            }
        }
    }
}

fn run_timer(rx: xch::Receiver<()>, first_delay: Duration, interval: Duration, mut tick: Tick) {
    let mut deadline = Instant::now() + first_delay;
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Err(xch::RecvTimeoutError::Timeout) => {}
            // Cancelled (sender dropped) or an explicit stop message
            Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => break,
        }
        tick();

        // Skip boundaries missed while the tick ran, keeping the original phase.
        deadline += interval;
        let now = Instant::now();
        while deadline <= now {
            deadline += interval;
        }
    }
    tracing::trace!("timer thread exiting cleanly");
}

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, first_delay: Duration, interval: Duration, tick: Tick) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let interval = interval.max(MIN_INTERVAL);
        let (tx, rx) = xch::bounded::<()>(1);
        // Register before the thread can tick, so a tick that cancels its
        // own schedule finds the entry.
        let mut timers = self.lock();
        let spawned = std::thread::Builder::new()
            .name(format!("pump-timer-{}", id.0))
            .spawn(move || run_timer(rx, first_delay, interval, tick));
        match spawned {
            Ok(handle) => {
                timers.insert(
                    id,
                    TimerThread {
                        cancel: tx,
                        join_handle: Some(handle),
                    },
                );
            }
            Err(e) => {
                tracing::error!(timer = id.0, error = %e, "failed to spawn timer thread");
            }
        }
        id
    }

    fn cancel(&self, id: TimerId) {
        // Release the registry before joining so other schedules stay usable.
        let timer = self.lock().remove(&id);
        if let Some(timer) = timer {
            Self::stop(id, timer);
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        let timers: Vec<_> = self.lock().drain().collect();
        for (id, timer) in timers {
            Self::stop(id, timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn ticks_repeat_until_cancelled() {
        let sched = ThreadScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = sched.schedule_repeating(
            Duration::from_millis(5),
            Duration::from_millis(10),
            Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        std::thread::sleep(Duration::from_millis(120));
        sched.cancel(id);
        let after_cancel = hits.load(Ordering::SeqCst);
        assert!(after_cancel >= 2, "expected several ticks, got {after_cancel}");
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), after_cancel);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn cancel_unknown_id_is_noop() {
        let sched = ThreadScheduler::new();
        sched.cancel(TimerId(42));
        assert_eq!(sched.active(), 0);
    }
}
