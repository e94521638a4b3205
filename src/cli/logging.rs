// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console output macros for the live pose overlay.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global verbosity flag. Per-frame lines are only printed when set.
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Macro for standard status messages.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        println!("{}", format!($($arg)*));
    }};
}

/// Macro for warning messages.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "WARNING ⚠️".yellow().bold(), format!($($arg)*));
    }};
}

/// Macro for error messages.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), format!($($arg)*));
    }};
}

/// Macro for per-frame messages, printed only in verbose mode.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {{
        if $crate::cli::logging::is_verbose() {
            println!("{}", format!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_toggle() {
        set_verbose(true);
        assert!(is_verbose());

        set_verbose(false);
        assert!(!is_verbose());
    }
}
