//! File logger for burrow.
//!
//! The terminal belongs to the UI, so log lines only ever go to a file. Logging is off
//! unless `BW_LOG` holds a level (`error`, `warn`, `info`, `debug`, `trace`).

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use thiserror::Error;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

pub const LOG_LEVEL_ENV: &str = "BW_LOG";
pub const LOG_FILE_ENV: &str = "BW_LOG_FILE";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot install logger: {0}")]
    SetLogger(SetLoggerError),
}

enum LogTarget {
    File(Mutex<File>),
}

pub struct Logger {
    level: Level,
    target: LogTarget,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let msg = format!(
                "{} {} [{}] {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            );

            match &self.target {
                LogTarget::File(file) => {
                    if let Ok(mut file) = file.lock() {
                        let _ = writeln!(file, "{msg}");
                    }
                }
            }
        }
    }

    fn flush(&self) {
        match &self.target {
            LogTarget::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.flush();
                }
            }
        }
    }
}

/// Parses a `BW_LOG` value. `off` and garbage both disable logging.
pub fn parse_level(value: &str) -> Option<Level> {
    value
        .trim()
        .parse::<LevelFilter>()
        .ok()
        .and_then(|filter| filter.to_level())
}

fn get_level_from_env() -> Option<Level> {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|s| parse_level(&s))
}

/// `BW_LOG_FILE`, else `<cache dir>/burrow/bw.log`.
pub fn default_log_path() -> PathBuf {
    if let Some(path) = std::env::var_os(LOG_FILE_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("burrow")
        .join("bw.log")
}

/// Installs the file logger when `BW_LOG` asks for it. Returns whether it was installed.
pub fn init() -> Result<bool, LoggingError> {
    match get_level_from_env() {
        Some(level) => {
            _init(level, &default_log_path())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn _init(level: Level, path: &Path) -> Result<(), LoggingError> {
    static LOGGER: OnceLock<Logger> = OnceLock::new();

    if LOGGER.get().is_some() {
        return Ok(());
    }

    let file = open_log_file(path)?;
    let logger = LOGGER.get_or_init(|| Logger {
        level,
        target: LogTarget::File(Mutex::new(file)),
    });

    log::set_logger(logger).map_err(LoggingError::SetLogger)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open = || {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };
    open().map_err(|source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    })
}
