// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for live pose detection.
//!
//! This module contains the command-line interface logic: argument parsing,
//! console output and the live camera command.

// Modules
/// CLI arguments.
pub mod args;

/// Live camera pose detection.
pub mod live;

/// Console output macros.
pub mod logging;
