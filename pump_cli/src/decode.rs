//! `decode` subcommand: hex in, one summary line per bolus record out.

use crate::cli::Layout;
use eyre::Result;
use pump_core::{DecodeError, DeviceProfile, decode_stream, record_length};

/// Parse hex digits, ignoring whitespace, `:` separators and a leading `0x`.
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<char> = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if digits.len() % 2 != 0 {
        eyre::bail!("invalid hex: odd number of digits ({})", digits.len());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = pair[0]
                .to_digit(16)
                .ok_or_else(|| eyre::eyre!("invalid hex digit '{}'", pair[0]))?;
            let lo = pair[1]
                .to_digit(16)
                .ok_or_else(|| eyre::eyre!("invalid hex digit '{}'", pair[1]))?;
            Ok(((hi << 4) | lo) as u8)
        })
        .collect()
}

pub fn run_decode(
    cfg: &pump_config::Config,
    hex: &str,
    layout: Option<Layout>,
    json: bool,
) -> Result<usize> {
    let bytes = parse_hex(hex)?;
    let mut profile = DeviceProfile::from(cfg);
    match layout {
        Some(Layout::Larger) => {
            profile.larger_memory = true;
            profile.strokes_per_unit = pump_config::LARGER_STROKES_PER_UNIT;
        }
        Some(Layout::Standard) => {
            profile.larger_memory = false;
            profile.strokes_per_unit = pump_config::STANDARD_STROKES_PER_UNIT;
        }
        None => {}
    }

    let (events, remainder) = decode_stream(&bytes, &profile);
    if events.is_empty() {
        return Err(eyre::Report::new(DecodeError::InsufficientData {
            needed: record_length(profile.larger_memory),
            available: bytes.len(),
        }));
    }
    tracing::info!(records = events.len(), remainder, "decoded history bytes");

    for ev in &events {
        if json {
            let mut dict = ev.dictionary_representation();
            dict.insert("timestamp".into(), ev.timestamp.to_string().into());
            println!("{}", serde_json::Value::Object(dict));
        } else {
            let mut line = format!(
                "BolusNormal {} programmed={:.3}U amount={:.3}U type={}",
                ev.timestamp,
                ev.programmed,
                ev.amount,
                ev.bolus_type.as_str()
            );
            if !ev.duration.is_zero() {
                line.push_str(&format!(" duration={}min", ev.duration.as_secs() / 60));
            }
            if ev.unabsorbed_insulin_total > 0.0 {
                line.push_str(&format!(" unabsorbed={:.3}U", ev.unabsorbed_insulin_total));
            }
            let eta = ev.delivery_time_at(cfg.bolus.delivery_units_per_minute);
            line.push_str(&format!(" delivery={:.0}s", eta.as_secs_f64()));
            println!("{line}");
        }
    }
    if remainder > 0 {
        tracing::warn!(remainder, "ignored trailing bytes shorter than a record");
    }
    Ok(events.len())
}
