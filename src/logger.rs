use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber: stderr output filtered by
/// `log_level` (overridable via `RUST_LOG`), plus a daily-rolling file in
/// `log_dir` when one is given.
///
/// The returned guard must stay alive for the file writer to flush.
pub fn init_tracing(log_level: &str, log_dir: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = rolling::daily(dir, "chatlink.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}
