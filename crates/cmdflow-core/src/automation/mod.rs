//! Automation definitions, their registry, and the per-invocation run record

pub mod definition;
pub mod registry;
pub mod run;

pub use definition::{AutomationDefinition, AutomationKind, AutomationStep, CodeAutomation};
pub use registry::AutomationRegistry;
pub use run::{AutomationLog, AutomationRun, LogLevel, RunResults, RunStatus, StepOutcome, StepStatus};
