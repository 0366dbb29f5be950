use std::{
    env, fs, panic,
    path::{Path, PathBuf},
    thread,
    time::{Duration, SystemTime},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::env::env_or;

const DEFAULT_LOG_DIR: &str = "/var/log/beacon";

/// Keeps the non-blocking file writer flushing until dropped at the end of `main`.
pub struct TracingGuards {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_tracing(service_name: &str) -> TracingGuards {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
    let log_root = PathBuf::from(log_dir).join(service_name);

    let (file_layer, file_guard) = match rolling_writer(&log_root, service_name) {
        Some((writer, guard)) => (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        ),
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    if file_guard.is_some() {
        let retention_days = env_or("LOG_RETENTION_DAYS", 14u64);
        let cleanup_interval = env_or("LOG_CLEANUP_INTERVAL_MINUTES", 360u64);
        spawn_log_cleanup(log_root, retention_days, cleanup_interval);
    } else {
        tracing::warn!(path = %log_root.display(), "file logging disabled");
    }

    TracingGuards {
        _file_guard: file_guard,
    }
}

fn rolling_writer(log_root: &Path, service_name: &str) -> Option<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(log_root).ok()?;
    // The daily appender panics when the directory turns out to be unwritable.
    let appender = panic::catch_unwind(|| {
        tracing_appender::rolling::daily(log_root, format!("{service_name}.log"))
    })
    .ok()?;
    Some(tracing_appender::non_blocking(appender))
}

fn spawn_log_cleanup(log_root: PathBuf, retention_days: u64, cleanup_interval_minutes: u64) {
    if retention_days == 0 || cleanup_interval_minutes == 0 {
        return;
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let interval = Duration::from_secs(cleanup_interval_minutes * 60);

    thread::spawn(move || loop {
        if let Some(cutoff) = SystemTime::now().checked_sub(retention) {
            let removed = cleanup_old_logs(&log_root, cutoff);
            if removed > 0 {
                tracing::debug!(removed, "pruned old log files");
            }
        }
        thread::sleep(interval);
    });
}

fn cleanup_old_logs(root: &Path, cutoff: SystemTime) -> usize {
    let Ok(entries) = fs::read_dir(root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            removed += cleanup_old_logs(&path, cutoff);
            continue;
        }
        let modified = fs::metadata(&path).and_then(|metadata| metadata.modified());
        match modified {
            Ok(modified) if modified < cutoff => {
                if fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            }
            _ => {}
        }
    }
    removed
}
