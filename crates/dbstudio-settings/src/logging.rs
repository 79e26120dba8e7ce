//! Logging and tracing initialisation
//!
//! - pretty console output for interactive use
//! - optional JSON file output with daily rotation
//! - `RUST_LOG` takes precedence over the configured filter

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info,dbstudio_core=info,dbstudio_schema=info,dbstudio_services=info,dbstudio_driver_mssql=info";

/// Logging configuration, the `[logging]` table of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub filter: String,

    /// Pretty console output on stderr
    pub console: bool,

    /// JSON output to a daily rolling file in `log_dir`
    pub json: bool,

    /// Directory for JSON logs; defaults to the data directory
    pub log_dir: Option<PathBuf>,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close (for timing)
    pub spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            console: true,
            json: false,
            log_dir: None,
            include_location: cfg!(debug_assertions),
            spans: false,
        }
    }
}

impl LoggingConfig {
    /// Console only, verbose, for tests and debugging
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            include_location: true,
            spans: true,
            ..Self::default()
        }
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| crate::settings_file::logs_dir().ok())
            .unwrap_or_else(|| PathBuf::from("logs"))
    }
}

/// Install the global subscriber.
///
/// Returns the guard of the JSON file writer, which must be kept alive for
/// buffered lines to be flushed. Fails if a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    // NEW fires once per span; ENTER would fire on every re-poll of a future.
    let span_events = if config.spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut guard = None;

    if config.console {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_ansi(true)
            .pretty()
            .with_filter(env_filter.clone())
            .boxed();
        layers.push(console_layer);
    }

    if config.json {
        let log_dir = config.resolved_log_dir();
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, "dbstudio.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Logging is already initialised")?;

    tracing::debug!(
        console = config.console,
        json = config.json,
        "logging initialised"
    );
    Ok(guard)
}
