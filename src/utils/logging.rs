//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Each module that uses them defines the flag first:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info, log_skip};
//!
//! log_info!("rescaled {} keywords", 5);
//! log_skip!("geo", &chunk, "fewer than two usable samples");
//! ```

/// Info logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Debug logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Records a (keyword, chunk) pair dropped from the output at debug level.
///
/// Skips are expected data conditions, never errors.
#[macro_export]
macro_rules! log_skip {
    ($keyword:expr, $chunk:expr, $reason:expr) => {
        if ENABLE_LOGS {
            let chunk: &$crate::models::Chunk = $chunk;
            log::debug!(
                "skipping '{}' for {} -> {}: {}",
                $keyword,
                chunk.start.date_naive(),
                chunk.end.date_naive(),
                $reason
            );
        }
    };
}
