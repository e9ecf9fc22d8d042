use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, bail};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "selector.log";
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Held by `main` for the process lifetime. Dropping it flushes the
/// non-blocking file writer.
pub struct LoggingGuard {
    _flush_on_drop: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Outcome of deleting rotated log files older than the retention window.
#[derive(Debug, Default)]
struct RetentionSweep {
    removed: usize,
    failures: Vec<String>,
}

pub fn init_tracing(config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = parse_filter(&config.filter)?;
    let log_dir = resolve_log_dir(&config.dir)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("unable to create log directory {}", log_dir.display()))?;

    let sweep = sweep_expired(
        &log_dir,
        LOG_FILE_PREFIX,
        retention_cutoff(SystemTime::now(), config.retention_days),
    );

    let appender = match config.rotation {
        LoggingRotation::Daily => rolling::daily(&log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(&log_dir, LOG_FILE_PREFIX),
    };
    let (file_writer, flush_guard) = tracing_appender::non_blocking(appender);

    let json_file = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(filter);
    let warn_stderr = config
        .stderr_warn_enabled
        .then(|| fmt::layer().with_writer(io::stderr).with_filter(LevelFilter::WARN));

    tracing_subscriber::registry()
        .with(json_file)
        .with(warn_stderr)
        .with(ErrorLayer::default())
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        log_dir = %log_dir.display(),
        filter = %config.filter,
        rotation = ?config.rotation,
        retention_days = config.retention_days,
        removed_files = sweep.removed,
        "logging_initialized"
    );
    for failure in &sweep.failures {
        tracing::warn!(target: "logging", failure = %failure, "log_retention_failed");
    }

    Ok(LoggingGuard {
        _flush_on_drop: flush_guard,
        run_id,
    })
}

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    if directives.trim().is_empty() {
        bail!("logging.filter is empty");
    }
    EnvFilter::try_new(directives)
        .with_context(|| format!("logging.filter '{directives}' is not a valid filter"))
}

fn resolve_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        bail!("logging.dir is empty");
    }
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("unable to resolve relative logging.dir")?;
    Ok(cwd.join(dir))
}

fn retention_cutoff(now: SystemTime, retention_days: usize) -> SystemTime {
    let window = DAY.saturating_mul(u32::try_from(retention_days).unwrap_or(u32::MAX));
    now.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Deletes regular files named `prefix*` whose mtime is at or before
/// `cutoff`. Unreadable entries are left alone.
fn sweep_expired(log_dir: &Path, prefix: &str, cutoff: SystemTime) -> RetentionSweep {
    let mut sweep = RetentionSweep::default();
    let Ok(entries) = fs::read_dir(log_dir) else {
        return sweep;
    };

    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let expired = entry.metadata().is_ok_and(|metadata| {
            metadata.is_file() && metadata.modified().is_ok_and(|modified| modified <= cutoff)
        });
        if !expired {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => sweep.removed += 1,
            Err(err) => sweep
                .failures
                .push(format!("{}: {err}", path.display())),
        }
    }

    sweep
}
