//! Command definitions, argument declarations and the command registry
//!
//! A command is a named, typed, host-invokable operation. The registry
//! validates arguments against the declaration and dispatches to the
//! command's handler; it does not enforce the `rbac` allow-list (see
//! `CommandRegistry` for why).

pub mod arg;
pub mod definition;
pub mod registry;

pub use arg::{ArgType, ArgValidator, CommandArg};
pub use definition::{CommandDefinition, CommandHandler};
pub use registry::CommandRegistry;
