//! Command-line interface for the tablesync binary.
//!
//! Argument parsing lives in [`args`]; each command is implemented in its
//! own module under [`commands`].

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
