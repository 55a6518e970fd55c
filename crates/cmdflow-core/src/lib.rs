//! CmdFlow Core - command and automation kernel
//!
//! This crate provides the host-independent building blocks of CmdFlow:
//! - `Value`, the tagged payload passed between commands, automations and hosts
//! - Typed command definitions and a registry that validates and dispatches them
//! - Declarative and code automations with their registry and run records
//! - A small condition language for guarding declarative steps
//! - The `Context` capability bundle a host hands to every command
//! - Error, logging and configuration facilities shared with the engine
//!
//! Running automations lives in `cmdflow-engine`.

pub mod automation;
pub mod command;
pub mod condition;
pub mod config;
pub mod context;
pub mod errors;
pub mod job;
pub mod logging_facility;
pub mod value;

pub use cmdflow_core_types as types;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

// Re-export commonly used types
pub use automation::{
    AutomationDefinition, AutomationKind, AutomationRegistry, AutomationRun, AutomationStep,
    LogLevel, RunStatus,
};
pub use command::{ArgType, CommandArg, CommandDefinition, CommandRegistry};
pub use condition::{Condition, Scope};
pub use config::{EngineConfig, LoggingConfig, RunnerConfig};
pub use context::Context;
pub use errors::{CmdFlowError, ExError, ExErrorKind, Result};
pub use value::{Args, EntityRef, RefKind, Value};
