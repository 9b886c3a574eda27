#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Pump history decoding and live dose progress (transport-agnostic).
//!
//! ## Architecture
//!
//! - **History**: byte-exact bolus record decoder (`history` module)
//! - **Timestamps**: packed five-byte device clock values (`timestamp` module)
//! - **Fixed point**: stroke counts to insulin units (`fixed_point` module)
//! - **Profiles**: device capabilities and pulse arithmetic (`profile` module)
//! - **Estimator**: pulse-aligned progress with observers (`estimator` module)
//! - **Timers**: thread-backed scheduler port implementation (`timer` module)
//!
//! The decoder is a pure function of its input bytes. The estimator reads
//! time through `pump_traits::Clock` and schedules through
//! `pump_traits::Scheduler`, so tests drive it with a simulated clock.

pub mod conversions;
pub mod dose;
pub mod error;
pub mod estimator;
pub mod fixed_point;
pub mod history;
pub mod mocks;
pub mod profile;
pub mod timer;
pub mod timestamp;
pub mod util;

pub use dose::{DoseEntry, DoseProgress, DoseType};
pub use error::{DecodeError, EstimatorError};
pub use estimator::{DoseProgressEstimator, DoseProgressObserver, ObserverToken};
pub use history::{BolusNormalEvent, BolusType, UnabsorbedInsulinRecord, decode_stream, record_length};
pub use profile::{DeviceProfile, PulseProfile};
pub use timer::ThreadScheduler;
pub use timestamp::DeviceTimestamp;
