//! CmdFlow Engine - Orchestration layer
//!
//! Runs automations over the core registries and provides the host-side
//! pieces around them:
//! - `AutomationRunner`: interprets code and declarative automations into run records
//! - `AuthorizedDispatcher`: role checks in front of `CommandRegistry::execute`
//! - `RunnerLink`: the `automations` capability, backed by a runner
//! - `host`: in-memory implementations of every context capability
//! - `builtin`: example commands and automations

pub mod builtin;
pub mod dispatch;
pub mod host;
pub mod link;
pub mod runner;

pub use dispatch::{authorize, AuthorizedDispatcher};
pub use host::{ContextBuilder, InMemoryHost, StaticAuth};
pub use link::RunnerLink;
pub use runner::AutomationRunner;
