use chrono::{DateTime, Utc};

/// Wall-clock abstraction used for dose progress.
///
/// - now(): current UTC time
/// - secs_since(): signed seconds elapsed since an epoch
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Seconds elapsed since `epoch`. Negative when `epoch` lies in the future.
    fn secs_since(&self, epoch: DateTime<Utc>) -> f64 {
        let d = self.now().signed_duration_since(epoch);
        // Microsecond precision is plenty for pulse cadences of >= 1s.
        d.num_microseconds()
            .map_or(d.num_milliseconds() as f64 / 1_000.0, |us| {
                us as f64 / 1_000_000.0
            })
    }
}

/// Default, real-time clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Deterministic clock whose time can be advanced manually.
    ///
    /// now() = origin + offset
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: DateTime<Utc>,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self::starting_at(Utc::now())
        }

        /// Clock pinned to `origin` until advanced.
        pub fn starting_at(origin: DateTime<Utc>) -> Self {
            Self {
                origin,
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Set the absolute offset relative to origin.
        pub fn set_offset(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = d;
            }
        }

        pub fn offset(&self) -> Duration {
            self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
        }

        pub fn origin(&self) -> DateTime<Utc> {
            self.origin
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            let off = chrono::Duration::from_std(self.offset()).unwrap_or(chrono::Duration::MAX);
            self.origin.checked_add_signed(off).unwrap_or(DateTime::<Utc>::MAX_UTC)
        }
    }

}
