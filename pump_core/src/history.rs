//! Normal/square bolus history records.
//!
//! Two fixed layouts exist, selected by the model's memory size:
//!
//! | field      | larger (13 B)  | standard (9 B) |
//! |------------|----------------|----------------|
//! | opcode     | 0              | 0              |
//! | programmed | 1..3           | 1..2           |
//! | amount     | 3..5           | 2..3           |
//! | unabsorbed | 5..7           | -              |
//! | duration   | 7              | 3              |
//! | timestamp  | 8..13          | 4..9           |
//!
//! Insulin fields are big-endian stroke counts; duration counts half hours.

use pump_traits::DeviceCapabilities;
use serde::Serialize;
use std::time::Duration;

use crate::error::DecodeError;
use crate::fixed_point::insulin_from_be;
use crate::timestamp::{DeviceTimestamp, TIMESTAMP_LEN};
use crate::util::minutes;

/// Record length on larger-memory pumps.
pub const LARGER_RECORD_LEN: usize = 13;
/// Record length on standard-memory pumps.
pub const STANDARD_RECORD_LEN: usize = 9;
/// Observed speed of an immediate bolus; roughly 40 s per unit.
pub const DEFAULT_DELIVERY_UNITS_PER_MINUTE: f64 = pump_config::DEFAULT_DELIVERY_UNITS_PER_MINUTE;

const HALF_HOUR_MINUTES: f64 = 30.0;

/// Byte length of a bolus record for the given memory model.
#[inline]
pub const fn record_length(is_larger: bool) -> usize {
    if is_larger {
        LARGER_RECORD_LEN
    } else {
        STANDARD_RECORD_LEN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BolusType {
    Normal,
    Square,
}

impl BolusType {
    /// Square iff the bolus was programmed over a non-zero duration.
    #[inline]
    pub fn from_duration(duration: Duration) -> Self {
        if duration.is_zero() {
            BolusType::Normal
        } else {
            BolusType::Square
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BolusType::Normal => "Normal",
            BolusType::Square => "Square",
        }
    }
}

/// Unabsorbed-insulin record decoded by a separate pass and attached to the
/// bolus that follows it. Kept opaque here.
#[derive(Debug, Clone, PartialEq)]
pub struct UnabsorbedInsulinRecord {
    pub raw_data: Vec<u8>,
    pub summary: serde_json::Value,
}

/// A decoded bolus record.
#[derive(Debug, Clone, PartialEq)]
pub struct BolusNormalEvent {
    pub length: usize,
    pub raw_data: Vec<u8>,
    pub timestamp: DeviceTimestamp,
    pub unabsorbed_insulin_record: Option<UnabsorbedInsulinRecord>,
    /// Units actually delivered.
    pub amount: f64,
    /// Units requested.
    pub programmed: f64,
    /// Insulin on board when the bolus started; 0 on standard-memory pumps.
    pub unabsorbed_insulin_total: f64,
    pub bolus_type: BolusType,
    pub duration: Duration,
}

impl BolusNormalEvent {
    /// Decode one record from the front of `available`.
    ///
    /// Only the first `record_length` bytes are read; trailing bytes are ignored.
    pub fn decode<D>(available: &[u8], caps: &D) -> Result<Self, DecodeError>
    where
        D: DeviceCapabilities + ?Sized,
    {
        let larger = caps.is_larger_memory_model();
        let length = record_length(larger);
        let raw = available.get(..length).ok_or(DecodeError::InsufficientData {
            needed: length,
            available: available.len(),
        })?;
        let strokes = caps.strokes_per_unit();

        let fields = if larger {
            Fields {
                programmed: insulin_from_be(&raw[1..3], strokes),
                amount: insulin_from_be(&raw[3..5], strokes),
                unabsorbed: insulin_from_be(&raw[5..7], strokes),
                half_hours: raw[7],
                timestamp_at: 8,
            }
        } else {
            Fields {
                programmed: insulin_from_be(&raw[1..2], strokes),
                amount: insulin_from_be(&raw[2..3], strokes),
                unabsorbed: 0.0,
                half_hours: raw[3],
                timestamp_at: 4,
            }
        };

        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&raw[fields.timestamp_at..fields.timestamp_at + TIMESTAMP_LEN]);
        let duration = minutes(HALF_HOUR_MINUTES * f64::from(fields.half_hours));

        let event = Self {
            length,
            raw_data: raw.to_vec(),
            timestamp: DeviceTimestamp::from_bytes(&ts),
            unabsorbed_insulin_record: None,
            amount: fields.amount,
            programmed: fields.programmed,
            unabsorbed_insulin_total: fields.unabsorbed,
            bolus_type: BolusType::from_duration(duration),
            duration,
        };
        tracing::trace!(
            length,
            programmed = event.programmed,
            amount = event.amount,
            duration_s = event.duration.as_secs(),
            "decoded bolus record"
        );
        Ok(event)
    }

    /// Attach the unabsorbed-insulin record that preceded this bolus.
    pub fn attach_unabsorbed(&mut self, record: UnabsorbedInsulinRecord) {
        self.unabsorbed_insulin_record = Some(record);
    }

    /// Expected time to deliver, using the default immediate-bolus speed.
    pub fn delivery_time(&self) -> Duration {
        self.delivery_time_at(DEFAULT_DELIVERY_UNITS_PER_MINUTE)
    }

    /// Expected time to deliver: the programmed duration for square boluses,
    /// otherwise `programmed / units_per_minute`.
    pub fn delivery_time_at(&self, units_per_minute: f64) -> Duration {
        if !self.duration.is_zero() {
            self.duration
        } else {
            minutes(self.programmed / units_per_minute)
        }
    }

    /// Key/value summary for diagnostics and host interchange.
    pub fn summary(&self) -> BolusNormalSummary<'_> {
        BolusNormalSummary {
            kind: "BolusNormal",
            amount: self.amount,
            programmed: self.programmed,
            bolus_type: self.bolus_type,
            appended: self.unabsorbed_insulin_record.as_ref().map(|r| &r.summary),
            unabsorbed: (self.unabsorbed_insulin_total > 0.0).then_some(self.unabsorbed_insulin_total),
            duration: (!self.duration.is_zero()).then(|| self.duration.as_secs_f64()),
        }
    }

    /// The summary as a JSON object.
    pub fn dictionary_representation(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self.summary()) {
            Ok(serde_json::Value::Object(map)) => map,
            // A struct of numbers and strings always serializes to an object.
            _ => serde_json::Map::new(),
        }
    }
}

struct Fields {
    programmed: f64,
    amount: f64,
    unabsorbed: f64,
    half_hours: u8,
    timestamp_at: usize,
}

/// Serialized form of a [`BolusNormalEvent`]. Optional keys are omitted
/// rather than written as null.
#[derive(Debug, Serialize)]
pub struct BolusNormalSummary<'a> {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub amount: f64,
    pub programmed: f64,
    #[serde(rename = "type")]
    pub bolus_type: BolusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appended: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unabsorbed: Option<f64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Decode back-to-back bolus records.
///
/// Returns the events and the number of trailing bytes too short to hold
/// another record.
pub fn decode_stream<D>(buf: &[u8], caps: &D) -> (Vec<BolusNormalEvent>, usize)
where
    D: DeviceCapabilities + ?Sized,
{
    let step = record_length(caps.is_larger_memory_model());
    let mut events = Vec::with_capacity(buf.len() / step);
    let mut rest = buf;
    while let Ok(ev) = BolusNormalEvent::decode(rest, caps) {
        rest = &rest[ev.length..];
        events.push(ev);
    }
    if !rest.is_empty() {
        tracing::debug!(remaining = rest.len(), "trailing bytes shorter than a record");
    }
    (events, rest.len())
}
