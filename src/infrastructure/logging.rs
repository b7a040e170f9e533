//! Logging system configuration and initialization
//!
//! This module provides the logging setup for the sync core:
//! - File logging with rotation of the previous run's file
//! - Configuration file based log level control
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - Log files stored relative to executable location

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Rename an existing log file with its modification timestamp
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<String>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path).context("Failed to get log file metadata")?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let datetime: chrono::DateTime<Local> = file_time.into();

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_name = format!("{}.{}.log", file_stem, datetime.format("%Y%m%dT%H%M%S"));
    let timestamped_path = log_dir.join(&timestamped_name);

    std::fs::rename(&log_file_path, &timestamped_path).with_context(|| {
        format!(
            "Failed to rotate log file {} to {}",
            log_file_path.display(),
            timestamped_path.display()
        )
    })?;

    Ok(Some(timestamped_name))
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    // Dependency noise stays down unless TRACE is requested
    if !config.level.to_lowercase().contains("trace") {
        for (module, level) in &config.module_filters {
            let directive = format!("{}={}", module, level)
                .parse()
                .with_context(|| format!("Invalid module filter {}={}", module, level))?;
            filter = filter.add_directive(directive);
        }
        filter = filter.add_directive(
            format!("pokedex_sync_lib={}", config.level)
                .parse()
                .context("Invalid application log directive")?,
        );
    }

    Ok(filter)
}

fn keep_guard(guard: tracing_appender::non_blocking::WorkerGuard) {
    match LOG_GUARDS.lock() {
        Ok(mut guards) => guards.push(guard),
        Err(poisoned) => poisoned.into_inner().push(guard),
    }
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` overrides the configured filter entirely:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" pokedex-sync page 3
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let log_dir = get_log_directory();

    let rotated = if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
        let rotated = rotate_existing_log_file(&log_dir, &config.file_name)?;
        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config.max_files)?;
        }
        rotated
    } else {
        None
    };

    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, console) => {
            let file_appender = rolling::never(&log_dir, &config.file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);
            keep_guard(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stdout)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });
                registry.with(file_layer).with(console_layer).try_init()?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stdout)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });
                registry.with(file_layer).with(console_layer).try_init()?;
            }
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(LocalTimeFormatter)
                .with_target(false);
            registry.with(console_layer).try_init()?;
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    info!("File output: {}", config.file_output);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(&config.file_name));
    }
    if let Some(name) = rotated {
        info!("Rotated previous log file to: {}", name);
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Pokedex Sync System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    info!("Log directory: {:?}", get_log_directory());
    info!("=======================================");
}

/// Keep only the newest `max_files` log files in `log_dir`
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".log"));
        if !path.is_file() || !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files as usize) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(config.file_output);
        assert!(config.module_filters.contains_key("reqwest"));
    }

    #[test]
    fn test_log_directory_location() {
        assert!(get_log_directory().to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn rotation_renames_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.log"), "previous run").unwrap();

        let rotated = rotate_existing_log_file(dir.path(), "app.log").unwrap().unwrap();
        assert!(rotated.starts_with("app."));
        assert!(!dir.path().join("app.log").exists());
        assert!(dir.path().join(rotated).exists());

        assert!(rotate_existing_log_file(dir.path(), "app.log").unwrap().is_none());
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            std::fs::write(dir.path().join(format!("run{}.log", i)), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "kept").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), 2).unwrap(), 2);
        let remaining_logs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "log"))
            .count();
        assert_eq!(remaining_logs, 2);
        assert!(dir.path().join("notes.txt").exists());
    }
}
