//! Utility functions and helpers module
//!
//! Command output and log formatting shared by the external tool gateway.

pub mod command;

pub use command::{CommandOutput, format_command};
