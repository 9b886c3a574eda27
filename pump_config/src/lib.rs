#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the pump tooling.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; missing sections fall back to the
//!   larger-memory device with pod-sized pulses.
use serde::Deserialize;
use std::path::Path;

/// Fixed-point scale used by larger-memory (x23+) pumps.
pub const LARGER_STROKES_PER_UNIT: u32 = 40;
/// Fixed-point scale used by older, standard-memory pumps.
pub const STANDARD_STROKES_PER_UNIT: u32 = 10;
/// Observed delivery speed of an immediate bolus (units per minute).
pub const DEFAULT_DELIVERY_UNITS_PER_MINUTE: f64 = 1.5;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    /// Use the 13-byte larger-memory record layout
    pub larger_memory: bool,
    /// Raw insulin counts per unit
    pub strokes_per_unit: u32,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            larger_memory: true,
            strokes_per_unit: LARGER_STROKES_PER_UNIT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PulseCfg {
    /// Units delivered per physical pulse
    pub pulse_size: f64,
    /// Bolus delivery rate in units per second
    pub bolus_delivery_rate: f64,
}

impl Default for PulseCfg {
    fn default() -> Self {
        Self {
            pulse_size: 0.05,
            bolus_delivery_rate: DEFAULT_DELIVERY_UNITS_PER_MINUTE / 60.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BolusCfg {
    /// Rate used to estimate how long an immediate bolus takes to deliver
    pub delivery_units_per_minute: f64,
}

impl Default for BolusCfg {
    fn default() -> Self {
        Self {
            delivery_units_per_minute: DEFAULT_DELIVERY_UNITS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceCfg,
    #[serde(default)]
    pub pulse: PulseCfg,
    #[serde(default)]
    pub bolus: BolusCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.strokes_per_unit == 0 {
            eyre::bail!("device.strokes_per_unit must be > 0");
        }

        // Pulse
        if !positive_finite(self.pulse.pulse_size) {
            eyre::bail!("pulse.pulse_size must be > 0");
        }
        if self.pulse.pulse_size > 1.0 {
            eyre::bail!("pulse.pulse_size is unreasonably large (>1 U)");
        }
        if !positive_finite(self.pulse.bolus_delivery_rate) {
            eyre::bail!("pulse.bolus_delivery_rate must be > 0");
        }

        // Bolus
        if !positive_finite(self.bolus.delivery_units_per_minute) {
            eyre::bail!("bolus.delivery_units_per_minute must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
