//! Command runners with cliclack output
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod commands;

#[cfg(feature = "tui")]
pub use commands::{list, new_package, register, remove, unregister, NewArgs, UnregisterArgs, Workspace};
