use std::{fmt::Display, str::FromStr};

use backtrace::Backtrace;
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};

/// Installs the global fmt subscriber.
///
/// Fails when `level_filter` is not a valid level name. Installing a second
/// subscriber (tests, embedded use) is silently ignored.
pub fn init(display_level: &bool, level_filter: &str) -> Result<(), String> {
    let level_filter = LevelFilter::from_str(level_filter)
        .map_err(|err| format!("Invalid log level filter '{level_filter}': {err}"))?;

    let _ = tracing_subscriber::fmt()
        .with_level(*display_level)
        .with_max_level(level_filter)
        .try_init();

    Ok(())
}

pub fn trace<T: Display>(prefix: Option<&str>, msg: T) {
    match prefix {
        Some(prefix) => trace!("{prefix} {msg}"),
        None => trace!("🔎 {msg}"),
    }
}

pub fn debug<T: Display>(prefix: Option<&str>, msg: T) {
    match prefix {
        Some(prefix) => debug!("{prefix} {msg}"),
        None => debug!("🐞 {msg}"),
    }
}

pub fn info<T: Display>(prefix: Option<&str>, msg: T) {
    match prefix {
        Some(prefix) => info!("{prefix} {msg}"),
        None => info!("📢 {msg}"),
    }
}

pub fn warn<T: Display>(prefix: Option<&str>, msg: T) {
    match prefix {
        Some(prefix) => warn!("{prefix} {msg}"),
        None => warn!("⚠️ {msg}"),
    }
}

pub fn error<T: Display>(prefix: Option<&str>, msg: T) {
    let prefix = prefix.unwrap_or("🚨");
    if backtrace_enabled() {
        error!("{prefix} {msg}\n{:?}", Backtrace::new());
    } else {
        error!("{prefix} {msg}");
    }
}

fn backtrace_enabled() -> bool {
    std::env::var("RUST_BACKTRACE").is_ok_and(|var| var == "1" || var == "full")
}
