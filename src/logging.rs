/// File logging beside the config file; the screen is redrawn every second
use std::env;
use std::fs::OpenOptions;

use log::LevelFilter;
use simplelog::{Config as LogConfig, WriteLogger};

use crate::config::ConfigStore;

/// `off`, `error`, `warn`, `info`, `debug` or `trace`. Unset means `warn`,
/// so an ordinary run leaves no trace of its sessions.
pub const LOG_ENV: &str = "POMODORO_LOG";

const LOG_FILE: &str = "pomodoro.log";

pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Appends to `pomodoro.log` next to the config file. Any failure leaves
/// logging off.
pub fn init(store: &ConfigStore) {
    let level = level_from(env::var(LOG_ENV).ok().as_deref());
    if level == LevelFilter::Off || store.ensure_dir().is_err() {
        return;
    }

    let path = store.path().with_file_name(LOG_FILE);
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = WriteLogger::init(level, LogConfig::default(), file);
    }
}
