//! Tracing setup: console layer plus an optional JSON-lines file sink.

use pump_config::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Initialize tracing. `RUST_LOG` overrides `level` for the console.
///
/// Console output goes to stderr so stdout stays machine-readable. The file
/// sink filters on `[logging].level` independently of the console. Keep the
/// returned guard alive until exit so buffered file lines are flushed.
pub fn init(level: &str, json: bool, file_cfg: &Logging) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console: Box<dyn Layer<Registry> + Send + Sync> = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().compact().with_writer(std::io::stderr).boxed()
    };

    let mut guard = None;
    let file_layer = file_cfg.file.as_deref().map(|path| {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "pumpctl.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match file_cfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let file_filter = EnvFilter::new(file_cfg.level.as_deref().unwrap_or("info"));
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(file_filter)
    });

    let _ = tracing_subscriber::registry()
        .with(console.with_filter(console_filter))
        .with(file_layer)
        .try_init();
    guard
}
