//! Repeating-timer port.
//!
//! The host supplies the timer machinery (a run loop, a thread, a simulated
//! clock); consumers only ask for a repeating callback and cancel it later.

use std::sync::Arc;
use std::time::Duration;

/// Identifies one repeating schedule within a `Scheduler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Callback fired on every tick of a repeating schedule.
pub type Tick = Box<dyn FnMut() + Send + 'static>;

pub trait Scheduler {
    /// Fire `tick` after `first_delay`, then every `interval` until cancelled.
    fn schedule_repeating(&self, first_delay: Duration, interval: Duration, tick: Tick) -> TimerId;

    /// Stop a schedule. Unknown or already-cancelled ids are ignored.
    fn cancel(&self, id: TimerId);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule_repeating(&self, first_delay: Duration, interval: Duration, tick: Tick) -> TimerId {
        (**self).schedule_repeating(first_delay, interval, tick)
    }

    fn cancel(&self, id: TimerId) {
        (**self).cancel(id)
    }
}
