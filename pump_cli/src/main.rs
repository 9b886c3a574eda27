use clap::Parser;
use eyre::{Result, WrapErr};

mod cli;
mod decode;
mod error_fmt;
mod logging;
mod progress;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    // Install color-eyre for richer reports on unexpected errors.
    let _ = color_eyre::install();

    if let Err(e) = run(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = match &cli.config {
        Some(path) => pump_config::load_file(path).wrap_err("load config")?,
        None => pump_config::Config::default(),
    };
    // Dropped when `run` returns, before any `process::exit`.
    let _log_guard = logging::init(&cli.log_level, cli.json, &cfg.logging);
    tracing::debug!(config = ?cli.config, "starting pumpctl");

    match cli.cmd {
        Commands::Decode { hex, layout } => {
            decode::run_decode(&cfg, &hex, layout, cli.json)?;
        }
        Commands::Progress {
            kind,
            units,
            rate,
            duration_ms,
            started_ago_ms,
        } => {
            let last = progress::run_progress(
                &cfg,
                progress::ProgressArgs {
                    kind: kind.into(),
                    units,
                    rate,
                    duration_ms,
                    started_ago_ms,
                },
                cli.json,
            )?;
            tracing::info!(
                delivered = last.delivered_units,
                percent = last.percent_complete,
                "progress finished"
            );
        }
    }
    Ok(())
}
