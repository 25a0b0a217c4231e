// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console output macros.
//!
//! Output is coloured with `colored`. When JSON output is requested the
//! human-readable lines move to stderr so stdout stays machine-readable.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global verbosity flag.
static VERBOSE: AtomicBool = AtomicBool::new(true);

/// Set when stdout is reserved for JSON.
static JSON_STDOUT: AtomicBool = AtomicBool::new(false);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Reserve stdout for JSON output.
pub fn set_json_stdout(json: bool) {
    JSON_STDOUT.store(json, Ordering::Relaxed);
}

/// Check if stdout is reserved for JSON output.
pub fn is_json_stdout() -> bool {
    JSON_STDOUT.load(Ordering::Relaxed)
}

/// Print a line to stdout, or to stderr when stdout carries JSON.
#[doc(hidden)]
pub fn emit(line: &str) {
    if is_json_stdout() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

/// Macro for standard info messages.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit(&format!($($arg)*));
    }
}

/// Macro for warning messages.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "WARNING ⚠️".yellow().bold(), format!($($arg)*));
    }}
}

/// Macro for error messages.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), format!($($arg)*));
    }}
}

/// Macro for success messages.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        $crate::cli::logging::emit(&format!("{} {}", "✅".green(), format!($($arg)*)));
    }}
}

/// Macro for verbose messages.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::cli::logging::is_verbose() {
            $crate::cli::logging::emit(&format!($($arg)*));
        }
    }
}

/// Macro for section headers.
#[macro_export]
macro_rules! section {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        if $crate::cli::logging::is_verbose() {
            $crate::cli::logging::emit("");
            $crate::cli::logging::emit(&format!($($arg)*).cyan().bold().to_string());
        }
    }}
}
