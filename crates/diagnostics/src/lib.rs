// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging facade shared by the pulse crates.
//!
//! Output is controlled by the PULSE_LOG environment variable:
//! - `off` (default) - no logs
//! - `error`, `warn`, `info` - progressively more operational detail
//! - `debug` - per-file and per-table internals

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable that selects the log level.
pub const LOG_ENV: &str = "PULSE_LOG";

static INIT: Once = Once::new();

/// Map a PULSE_LOG value to a minimum level. `None` means logging is off.
/// Unknown values fall back to info.
pub fn parse_level(value: &str) -> Option<emit::Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" | "" => None,
        "error" => Some(emit::Level::Error),
        "warn" => Some(emit::Level::Warn),
        "debug" => Some(emit::Level::Debug),
        _ => Some(emit::Level::Info),
    }
}

/// Initialize diagnostics from PULSE_LOG.
///
/// Safe to call more than once; only the first call installs a runtime.
pub fn init_diagnostics() {
    let level = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
    init_with_level(&level);
}

/// Initialize diagnostics with an explicit level string instead of PULSE_LOG.
pub fn init_with_level(level: &str) {
    let Some(min) = parse_level(level) else {
        return;
    };

    INIT.call_once(|| {
        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        // The runtime lives for the whole process.
        std::mem::forget(rt);
    });
}

/// Operational messages: tables committed, categories started.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Per-file and per-batch detail.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable problems: skipped files, preserved tables.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures that abort a category or a command.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_with_level("off");
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_level() {
        assert!(parse_level("off").is_none());
        assert!(parse_level("").is_none());
        assert!(matches!(parse_level("debug"), Some(emit::Level::Debug)));
        assert!(matches!(parse_level("WARN"), Some(emit::Level::Warn)));
        assert!(matches!(parse_level("error"), Some(emit::Level::Error)));
        assert!(matches!(parse_level("verbose"), Some(emit::Level::Info)));
    }

    #[test]
    fn test_macros_compile() {
        let rows = 42usize;
        info!("Committed {rows} rows", rows);
        debug!("Debug message with {value}", value: 7);
        warn!("Warning message");
        error!("Error message");
    }
}
