//! Example commands and automations over the capability traits.
//!
//! Hosts can register these as-is or use them as templates for their own.

pub mod automations;
pub mod commands;

pub use automations::register_builtin_automations;
pub use commands::register_builtin_commands;
