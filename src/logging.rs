//! Logging initialisation for laneboard.
//!
//! Stderr output is always on, filtered by `RUST_LOG` (default `warn`). With
//! `LANEBOARD_LOG=1` a second, plain-text layer also writes to
//! `laneboard.log` in the OS log directory, and the default filter becomes
//! `info` so deferral decisions and fetch failures are recorded.
//!
//! Returns a guard that must be kept alive for the duration of the process
//! so that buffered log lines are flushed on exit.

use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "laneboard.log";

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialise the global tracing subscriber.
///
/// Call once from `main`, store the returned `LogGuard` in a local variable
/// for the duration of the process.
pub fn init() -> LogGuard {
    let file_guard = if file_logging_enabled(std::env::var("LANEBOARD_LOG").ok().as_deref()) {
        let dir = log_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        let _ = std::fs::create_dir_all(&dir);
        let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file_layer)
            .init();

        tracing::info!(target: "board", dir = %dir.display(), "file logging enabled");
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();

        None
    };

    LogGuard { _file_guard: file_guard }
}

fn file_logging_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// `$XDG_DATA_HOME/laneboard`, else the platform's per-user log location.
pub fn log_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("laneboard");
        return Some(p);
    }
    let home = std::env::var("HOME").ok()?;
    let mut p = PathBuf::from(home);
    #[cfg(target_os = "macos")]
    {
        p.push("Library");
        p.push("Logs");
    }
    #[cfg(not(target_os = "macos"))]
    {
        p.push(".local");
        p.push("share");
    }
    p.push("laneboard");
    Some(p)
}
