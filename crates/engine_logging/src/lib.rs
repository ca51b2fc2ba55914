#![deny(missing_docs)]
//! Shared logging utilities for the exams workspace.
//!
//! This crate provides the `engine_*` logging macros used by the core, the
//! engine and the binary, plus a minimal initializer for tests. All macros log
//! under the `exams` target unless the caller names a target explicitly.

/// Log target used by the `engine_*` macros.
pub const LOG_TARGET: &str = "exams";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    (target: $target:expr, $($arg:tt)*) => {{
        log::trace!(target: $target, $($arg)*);
    }};
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    (target: $target:expr, $($arg:tt)*) => {{
        log::info!(target: $target, $($arg)*);
    }};
    ($($arg:tt)*) => {{
        log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    (target: $target:expr, $($arg:tt)*) => {{
        log::debug!(target: $target, $($arg)*);
    }};
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    (target: $target:expr, $($arg:tt)*) => {{
        log::warn!(target: $target, $($arg)*);
    }};
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    (target: $target:expr, $($arg:tt)*) => {{
        log::error!(target: $target, $($arg)*);
    }};
    ($($arg:tt)*) => {{
        log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Parses a user supplied level name (`off`, `error`, `warn`, `info`,
/// `debug`, `trace`), case-insensitively.
pub fn parse_level(name: &str) -> Option<log::LevelFilter> {
    name.trim().parse::<log::LevelFilter>().ok()
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // reqwest and hyper are chatty at debug level.
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
