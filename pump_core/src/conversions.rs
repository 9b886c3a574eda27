//! `From` implementations bridging `pump_config` types to `pump_core` types.

use crate::profile::{DeviceProfile, PulseProfile};

// ── PulseCfg ─────────────────────────────────────────────────────────────────

impl From<&pump_config::PulseCfg> for PulseProfile {
    fn from(c: &pump_config::PulseCfg) -> Self {
        Self {
            pulse_size: c.pulse_size,
            bolus_delivery_rate: c.bolus_delivery_rate,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

impl From<&pump_config::Config> for DeviceProfile {
    fn from(c: &pump_config::Config) -> Self {
        Self {
            larger_memory: c.device.larger_memory,
            strokes_per_unit: c.device.strokes_per_unit,
            pulse: (&c.pulse).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pump_traits::DeviceCapabilities;

    #[test]
    fn config_maps_onto_profile() {
        let cfg = pump_config::load_toml(
            "[device]\nlarger_memory = false\nstrokes_per_unit = 10\n[pulse]\npulse_size = 0.1\n",
        )
        .unwrap();
        let p = DeviceProfile::from(&cfg);
        assert!(!p.is_larger_memory_model());
        assert_eq!(p.strokes_per_unit(), 10);
        assert!((p.pulse_size() - 0.1).abs() < 1e-12);
        assert!((p.bolus_delivery_rate() - 0.025).abs() < 1e-12);
    }
}
