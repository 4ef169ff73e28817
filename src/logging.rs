//! Diagnostic tracing for event-horizon.
//!
//! Stderr output is always on and filtered by `RUST_LOG` (default `warn`).
//! Setting `EVENT_HORIZON_LOG=1` adds a plain-text file sink at
//! `<log dir>/event-horizon.log` and raises the default level to `info`.
//!
//! The activity feed the user reads is separate, see [`crate::activity_log`];
//! each of its entries is mirrored here under the `activity` target.

use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::paths::AppPaths;

pub const LOG_ENV_VAR: &str = "EVENT_HORIZON_LOG";
const LOG_FILE_NAME: &str = "event-horizon.log";
const FALLBACK_LOG_DIR: &str = "/tmp/event-horizon";

/// Keeps the file writer's worker thread alive; drop it last in `main`.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Where diagnostic output goes for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSinks {
    Stderr,
    StderrAndFile(PathBuf),
}

impl LogSinks {
    /// Decide the sinks from the value of [`LOG_ENV_VAR`]. `log_dir` is only
    /// consulted when the file sink is on.
    pub fn from_env_value(value: Option<&str>, log_dir: impl FnOnce() -> PathBuf) -> Self {
        if value == Some("1") {
            LogSinks::StderrAndFile(log_dir())
        } else {
            LogSinks::Stderr
        }
    }

    /// Level used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> &'static str {
        match self {
            LogSinks::Stderr => "warn",
            LogSinks::StderrAndFile(_) => "info",
        }
    }

    fn file_writer(&self) -> Option<(NonBlocking, WorkerGuard)> {
        let LogSinks::StderrAndFile(dir) = self else {
            return None;
        };
        let _ = std::fs::create_dir_all(dir);
        let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
        Some(tracing_appender::non_blocking(appender))
    }
}

fn app_log_dir() -> PathBuf {
    match AppPaths::resolve() {
        Some(paths) if paths.ensure().is_ok() => paths.logs,
        _ => PathBuf::from(FALLBACK_LOG_DIR),
    }
}

/// Install the global subscriber. Call once from `main`.
pub fn init() -> LogGuard {
    let flag = std::env::var(LOG_ENV_VAR).ok();
    let sinks = LogSinks::from_env_value(flag.as_deref(), app_log_dir);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(sinks.default_directive()));

    let (file_layer, file_guard) = match sinks.file_writer() {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    LogGuard {
        _file_guard: file_guard,
    }
}
