//! Tracing setup: console output plus rolling log files.
//!
//! Files written under the log directory, rotated daily:
//! - `app.log`: everything at INFO and above, last 10 days kept
//! - `error.log`: ERROR only, last 5 days kept
//! - `cleanup.log`: events with target `cleanup`, last 5 days kept

use std::path::Path;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target used by the disk cleanup service.
pub const CLEANUP_TARGET: &str = "cleanup";

/// Default console directive when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,tower_http=warn";

const APP_LOG_FILES: usize = 10;
const ERROR_LOG_FILES: usize = 5;
const CLEANUP_LOG_FILES: usize = 5;

/// Keeps the non-blocking file writers flushing. Hold for the process lifetime.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Daily appender writing `{name}.YYYY-MM-DD`, pruned to `max_files` files.
fn rolling_file(
    log_dir: &Path,
    name: &str,
    max_files: usize,
) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(name)
        .max_log_files(max_files)
        .build(log_dir)
        .with_context(|| format!("creating {} appender in {}", name, log_dir.display()))
}

/// Install the global subscriber.
///
/// `json` switches console output to one JSON object per line.
pub fn init_logging(log_dir: &Path, json: bool) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let (app_writer, app_guard) =
        tracing_appender::non_blocking(rolling_file(log_dir, "app.log", APP_LOG_FILES)?);
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(rolling_file(log_dir, "error.log", ERROR_LOG_FILES)?);
    let (cleanup_writer, cleanup_guard) = tracing_appender::non_blocking(rolling_file(
        log_dir,
        "cleanup.log",
        CLEANUP_LOG_FILES,
    )?);

    let json_console = json.then(|| fmt::layer().json().with_filter(console_filter()));
    let pretty_console = (!json).then(|| {
        fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(console_filter())
    });

    tracing_subscriber::registry()
        .with(json_console)
        .with(pretty_console)
        .with(
            fmt::layer()
                .with_writer(app_writer)
                .with_ansi(false)
                .with_filter(LevelFilter::INFO),
        )
        .with(
            fmt::layer()
                .with_writer(error_writer)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR),
        )
        .with(
            fmt::layer()
                .with_writer(cleanup_writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(Targets::new().with_target(CLEANUP_TARGET, Level::INFO)),
        )
        .try_init()
        .context("installing global tracing subscriber")?;

    Ok(LogGuards {
        _guards: vec![app_guard, error_guard, cleanup_guard],
    })
}
