//! Concrete device capability profiles and pulse arithmetic.

use pump_config::{DEFAULT_DELIVERY_UNITS_PER_MINUTE, LARGER_STROKES_PER_UNIT, STANDARD_STROKES_PER_UNIT};
use pump_traits::DeviceCapabilities;

use crate::util::SECS_PER_MINUTE;

/// Capability profile for one pump model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub larger_memory: bool,
    pub strokes_per_unit: u32,
    pub pulse: PulseProfile,
}

impl DeviceProfile {
    /// x23 and later: 13-byte bolus records, 1/40 U resolution.
    pub fn larger_memory() -> Self {
        Self {
            larger_memory: true,
            strokes_per_unit: LARGER_STROKES_PER_UNIT,
            pulse: PulseProfile {
                pulse_size: 0.025,
                ..PulseProfile::default()
            },
        }
    }

    /// Pre-x23 pumps: 9-byte bolus records, 1/10 U resolution.
    pub fn standard_memory() -> Self {
        Self {
            larger_memory: false,
            strokes_per_unit: STANDARD_STROKES_PER_UNIT,
            pulse: PulseProfile {
                pulse_size: 0.1,
                ..PulseProfile::default()
            },
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::larger_memory()
    }
}

impl DeviceCapabilities for DeviceProfile {
    fn is_larger_memory_model(&self) -> bool {
        self.larger_memory
    }
    fn strokes_per_unit(&self) -> u32 {
        self.strokes_per_unit
    }
    fn pulse_size(&self) -> f64 {
        self.pulse.pulse_size
    }
    fn bolus_delivery_rate(&self) -> f64 {
        self.pulse.bolus_delivery_rate
    }
}

/// Pulse parameters driving progress estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseProfile {
    /// Units per pulse; also the minimum delivery increment.
    pub pulse_size: f64,
    /// Bolus speed in units per second.
    pub bolus_delivery_rate: f64,
}

impl Default for PulseProfile {
    /// Pod-sized pulses delivered at 1.5 U/min.
    fn default() -> Self {
        Self {
            pulse_size: 0.05,
            bolus_delivery_rate: DEFAULT_DELIVERY_UNITS_PER_MINUTE / SECS_PER_MINUTE,
        }
    }
}

impl PulseProfile {
    pub fn from_capabilities<D: DeviceCapabilities + ?Sized>(caps: &D) -> Self {
        Self {
            pulse_size: caps.pulse_size(),
            bolus_delivery_rate: caps.bolus_delivery_rate(),
        }
    }

    /// Round `units` to the nearest whole pulse.
    /// Non-finite input maps to 0.
    pub fn round_to_delivery_increment(&self, units: f64) -> f64 {
        if !units.is_finite() {
            return 0.0;
        }
        (units / self.pulse_size).round() * self.pulse_size
    }

    /// Round down to a whole pulse.
    pub fn floor_to_delivery_increment(&self, units: f64) -> f64 {
        if !units.is_finite() {
            return 0.0;
        }
        // Small epsilon absorbs representation error (0.15 / 0.05 = 2.9999…).
        ((units / self.pulse_size) + 1e-9).floor() * self.pulse_size
    }
}
