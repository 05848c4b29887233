//! Logging module
//!
//! Module-tagged log macros writing to stderr and, once [`init`] has run,
//! to a timestamped file in the cache directory.

use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::config;
use crate::utils::get_cache_dir;

/// Debug output is only emitted when enabled
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Open the session log file. Safe to call more than once.
pub fn init() {
    let log_dir = get_cache_dir(config::app::NAME).join(config::logging::LOG_DIR);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
        return;
    }

    let path = log_file_path(log_dir);
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            if let Ok(mut guard) = LOG_FILE.lock() {
                *guard = Some(file);
            }
        }
        Err(e) => eprintln!("Failed to open log file {}: {}", path.display(), e),
    }
}

fn log_file_path(log_dir: PathBuf) -> PathBuf {
    log_dir.join(format!(
        "installer-{}.log",
        Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Enable or disable debug output
pub fn set_log_level(debug: bool) {
    DEBUG_ENABLED.store(debug, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[doc(hidden)]
pub fn write(level: Level, module: &str, message: &str) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }

    let line = format!(
        "[{}] [{}] [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level.as_str(),
        module,
        message
    );

    eprintln!("{}", line);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Debug, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Info, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Warn, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Error, $module, &format!($($arg)*))
    };
}
