// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for parsing network outputs.
//!
//! This module contains the command-line interface logic, including argument parsing
//! and the `parse` and `topology` command implementations.

// Modules
/// CLI arguments.
pub mod args;

/// Console output macros.
pub mod logging;

/// Parsing logic.
pub mod parse;

/// Topology inspection.
pub mod topology;
