//! Operator commands behind the `guardctl` binary
//!
//! The binary is a thin clap front end; everything it prints is produced by
//! the functions in [`commands`] so they can be exercised without a process.

pub mod commands;

pub use commands::*;
