//! `progress` subcommand: follow a dose on the pulse cadence until it completes.

use chrono::Utc;
use eyre::{Result, WrapErr};
use pump_core::{DeviceProfile, DoseEntry, DoseProgress, DoseProgressEstimator, DoseType, PulseProfile, ThreadScheduler};
use pump_traits::SystemClock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const POLL: Duration = Duration::from_millis(20);

pub struct ProgressArgs {
    pub kind: DoseType,
    pub units: Option<f64>,
    pub rate: Option<f64>,
    pub duration_ms: Option<u64>,
    pub started_ago_ms: u64,
}

fn build_dose(args: &ProgressArgs, pulse: &PulseProfile) -> Result<DoseEntry> {
    let started_ago = chrono::Duration::milliseconds(i64::try_from(args.started_ago_ms).unwrap_or(i64::MAX));
    let start = Utc::now()
        .checked_sub_signed(started_ago)
        .ok_or_else(|| eyre::eyre!("--started-ago-ms is out of range"))?;
    match args.kind {
        DoseType::Bolus => {
            let units = args
                .units
                .ok_or_else(|| eyre::eyre!("--units is required for a bolus"))?;
            Ok(DoseEntry::bolus(start, units, pulse.bolus_delivery_rate))
        }
        kind => {
            let rate = args
                .rate
                .ok_or_else(|| eyre::eyre!("--rate is required for {kind:?} doses"))?;
            let duration_ms = args
                .duration_ms
                .ok_or_else(|| eyre::eyre!("--duration-ms is required for {kind:?} doses"))?;
            Ok(DoseEntry::rate(kind, start, rate, Duration::from_millis(duration_ms)))
        }
    }
}

fn print_progress(p: &DoseProgress, json: bool) {
    if json {
        match serde_json::to_string(p) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize progress"),
        }
    } else {
        println!(
            "delivered={:.3}U complete={:.1}%",
            p.delivered_units,
            p.percent_complete * 100.0
        );
    }
}

pub fn run_progress(cfg: &pump_config::Config, args: ProgressArgs, json: bool) -> Result<DoseProgress> {
    let device = DeviceProfile::from(cfg);
    let pulse = PulseProfile::from_capabilities(&device);
    let dose = build_dose(&args, &pulse)?;
    let estimator = DoseProgressEstimator::new(dose, pulse, SystemClock::new(), ThreadScheduler::new())
        .map_err(eyre::Report::new)?;
    tracing::info!(
        dose_type = ?estimator.dose().dose_type,
        units = estimator.dose().units,
        interval_ms = estimator.time_between_pulses().as_millis() as u64,
        "following dose"
    );

    let initial = estimator.progress();
    print_progress(&initial, json);
    if initial.is_complete() {
        return Ok(initial);
    }

    let done = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let s = shutdown.clone();
        ctrlc::set_handler(move || {
            s.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let d = done.clone();
    let token = estimator.add_observer(move |p: DoseProgress| {
        print_progress(&p, json);
        if p.is_complete() {
            d.store(true, Ordering::Release);
        }
    });

    while !done.load(Ordering::Acquire) {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!("interrupted; stopping progress updates");
            break;
        }
        std::thread::sleep(POLL);
    }
    estimator.remove_observer(token);

    Ok(estimator.progress())
}
