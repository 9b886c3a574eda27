//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pump_core::DoseType;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pumpctl", version, about = "Pump history decoder and dose progress monitor")]
pub struct Cli {
    /// Path to config TOML; built-in larger-memory defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Record layout override.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Layout {
    /// 13-byte records (x23 and later)
    Larger,
    /// 9-byte records
    Standard,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Kind {
    Bolus,
    Basal,
    TempBasal,
    Suspend,
    Resume,
}

impl From<Kind> for DoseType {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Bolus => DoseType::Bolus,
            Kind::Basal => DoseType::Basal,
            Kind::TempBasal => DoseType::TempBasal,
            Kind::Suspend => DoseType::Suspend,
            Kind::Resume => DoseType::Resume,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode back-to-back bolus history records from hex
    Decode {
        /// Record bytes as hex (whitespace and a leading 0x are ignored)
        #[arg(long)]
        hex: String,
        /// Override the record layout from the config
        #[arg(long, value_enum, value_name = "LAYOUT")]
        layout: Option<Layout>,
    },
    /// Follow delivery progress of a dose on the pulse cadence
    Progress {
        /// Dose kind
        #[arg(long, value_enum, default_value = "bolus")]
        kind: Kind,
        /// Bolus size in units
        #[arg(long, value_name = "UNITS")]
        units: Option<f64>,
        /// Basal rate in units per hour
        #[arg(long, value_name = "U_PER_H")]
        rate: Option<f64>,
        /// Basal duration in milliseconds
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// How long ago the dose started, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 0)]
        started_ago_ms: u64,
    },
}
