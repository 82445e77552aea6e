//! FILENAME: core/pivot-table/src/logging.rs
// PURPOSE: Category-tagged logging on top of the `log` facade.
// CONTEXT: The crate never installs a logger; the host picks the backend.
//          Categories become the log target so hosts can filter per area.

// ============================================================================
// CATEGORIES
// ============================================================================

pub const CAT_PIVOT: &str = "PIVOT";
pub const CAT_HEADER: &str = "PIVOT_HEADER";
pub const CAT_GROUP: &str = "PIVOT_GROUP";
pub const CAT_CONFIG: &str = "PIVOT_CONFIG";

/// Write an ENTER line for function entry
pub fn write_log_enter(level: log::Level, category: &str, func_name: &str, params: &str) {
    if params.is_empty() {
        log::log!(target: category, level, "ENTER {}", func_name);
    } else {
        log::log!(target: category, level, "ENTER {} {}", func_name, params);
    }
}

/// Write an EXIT line for function exit
pub fn write_log_exit(level: log::Level, category: &str, func_name: &str, result: &str) {
    if result.is_empty() {
        log::log!(target: category, level, "EXIT {}", func_name);
    } else {
        log::log!(target: category, level, "EXIT {} {}", func_name, result);
    }
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_trace {
    ($cat:expr, $($arg:tt)*) => {
        ::log::log!(target: $cat, ::log::Level::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::log!(target: $cat, ::log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::log!(target: $cat, ::log::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::log!(target: $cat, ::log::Level::Warn, $($arg)*)
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter(::log::Level::Debug, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter(::log::Level::Debug, $cat, $func, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit(::log::Level::Debug, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit(::log::Level::Debug, $cat, $func, &format!($($arg)*))
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_debug;`
pub use log_trace;
pub use log_debug;
pub use log_info;
pub use log_warn;
pub use log_enter;
pub use log_exit;
