pub mod clock;
pub mod scheduler;

pub use clock::{Clock, SystemClock};
pub use scheduler::{Scheduler, Tick, TimerId};

/// Capability profile of a pump model, queried by the history decoder and
/// the progress estimator. Values are fixed for the lifetime of a decode or
/// an estimate.
pub trait DeviceCapabilities {
    /// Larger-memory models (x23 and later) use the 13-byte bolus layout.
    fn is_larger_memory_model(&self) -> bool;
    /// Fixed-point scale of raw insulin fields (raw / strokes = units).
    fn strokes_per_unit(&self) -> u32;
    /// Units delivered by one physical pulse.
    fn pulse_size(&self) -> f64;
    /// Bolus delivery rate in units per second.
    fn bolus_delivery_rate(&self) -> f64;
}

impl<T: DeviceCapabilities + ?Sized> DeviceCapabilities for &T {
    fn is_larger_memory_model(&self) -> bool {
        (**self).is_larger_memory_model()
    }
    fn strokes_per_unit(&self) -> u32 {
        (**self).strokes_per_unit()
    }
    fn pulse_size(&self) -> f64 {
        (**self).pulse_size()
    }
    fn bolus_delivery_rate(&self) -> f64 {
        (**self).bolus_delivery_rate()
    }
}
