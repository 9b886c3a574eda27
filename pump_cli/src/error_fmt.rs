//! Human-readable error descriptions and structured JSON error formatting.

use pump_core::{DecodeError, EstimatorError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(de) = err.downcast_ref::<DecodeError>() {
        return match de {
            DecodeError::InsufficientData { needed, available } => format!(
                "What happened: Not enough bytes for a bolus record ({available} of {needed}).\nLikely causes: Truncated history page, or the wrong record layout for this pump model.\nHow to fix: Pass the complete record, or switch --layout between larger and standard."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EstimatorError>() {
        return match ee {
            EstimatorError::InvalidDoseKind(kind) => format!(
                "What happened: {kind:?} doses have no pulse cadence.\nLikely causes: Progress was requested for a suspend or resume entry.\nHow to fix: Only follow bolus, basal or temp-basal doses."
            ),
            EstimatorError::InvalidRate(msg) => format!(
                "What happened: Invalid delivery parameters ({msg}).\nLikely causes: Zero or negative rate, units, or pulse size.\nHow to fix: Check --rate/--units and the [pulse] section of the config."
            ),
        };
    }

    // String-based heuristics for errors coming from input or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid hex") {
        return format!(
            "What happened: {msg}.\nHow to fix: Pass record bytes as pairs of hex digits, e.g. --hex 0100280028."
        );
    }

    if lower.contains("config") {
        return format!(
            "What happened: Configuration is invalid or unreadable ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: decode failures 3, estimator contract errors 4, others 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<DecodeError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<EstimatorError>().is_some() {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(de) = err.downcast_ref::<DecodeError>() {
        return match de {
            DecodeError::InsufficientData { .. } => "InsufficientData",
        };
    }
    if let Some(ee) = err.downcast_ref::<EstimatorError>() {
        return match ee {
            EstimatorError::InvalidDoseKind(_) => "InvalidDoseKind",
            EstimatorError::InvalidRate(_) => "InvalidRate",
        };
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let details = match err.downcast_ref::<DecodeError>() {
        Some(DecodeError::InsufficientData { needed, available }) => {
            Some(json!({ "needed": needed, "available": available }))
        }
        None => None,
    };
    let obj = if let Some(d) = details {
        json!({ "reason": reason_name(err), "details": d, "message": humanize(err) })
    } else {
        json!({ "reason": reason_name(err), "message": humanize(err) })
    };
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pump_core::DoseType;

    #[test]
    fn decode_errors_map_to_exit_code_3() {
        let err = eyre::Report::new(DecodeError::InsufficientData {
            needed: 13,
            available: 4,
        });
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("4 of 13"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "InsufficientData");
        assert_eq!(v["details"]["needed"], 13);
    }

    #[test]
    fn estimator_errors_map_to_exit_code_4() {
        let err = eyre::Report::new(EstimatorError::InvalidDoseKind(DoseType::Suspend));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("Suspend"));
    }

    #[test]
    fn other_errors_fall_back() {
        let err = eyre::eyre!("invalid hex digit 'z'");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("pairs of hex digits"));
    }
}
