//! Dose entries and progress snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::util::SECS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoseType {
    Bolus,
    Basal,
    TempBasal,
    Suspend,
    Resume,
}

/// A dose as the host application records it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseEntry {
    pub dose_type: DoseType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Total units programmed.
    pub units: f64,
    /// Programmed rate; meaningful for basal and temp basal doses.
    pub units_per_hour: f64,
}

impl DoseEntry {
    /// Bolus of `units` delivered at `rate` units per second from `start`.
    pub fn bolus(start: DateTime<Utc>, units: f64, rate: f64) -> Self {
        let secs = if rate > 0.0 { units / rate } else { 0.0 };
        let end = start + to_chrono(crate::util::secs_to_duration(secs));
        Self {
            dose_type: DoseType::Bolus,
            start_date: start,
            end_date: end,
            units,
            units_per_hour: rate * SECS_PER_HOUR,
        }
    }

    /// Basal or temp-basal rate running for `duration` from `start`.
    pub fn rate(dose_type: DoseType, start: DateTime<Utc>, units_per_hour: f64, duration: Duration) -> Self {
        Self {
            dose_type,
            start_date: start,
            end_date: start + to_chrono(duration),
            units: units_per_hour * duration.as_secs_f64() / SECS_PER_HOUR,
            units_per_hour,
        }
    }

    /// Scheduled length in seconds; negative if the end precedes the start.
    pub fn duration_secs(&self) -> f64 {
        let d = self.end_date.signed_duration_since(self.start_date);
        d.num_microseconds()
            .map_or(d.num_milliseconds() as f64 / 1_000.0, |us| {
                us as f64 / 1_000_000.0
            })
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Instantaneous delivery estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoseProgress {
    /// Units delivered so far, rounded to the pump's delivery increment.
    pub delivered_units: f64,
    /// Fraction of the dose elapsed, in `[0, 1]`.
    pub percent_complete: f64,
}

impl DoseProgress {
    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 1.0
    }
}
