//! `automations` capability backed by a live runner.
//!
//! The runner owns the `Context`, and the context owns this link, so the
//! link holds the runner weakly and is attached after construction.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use async_trait::async_trait;
use cmdflow_core::context::AutomationOps;
use cmdflow_core::errors::{CmdFlowError, Result};
use cmdflow_core::AutomationRun;

use crate::runner::AutomationRunner;

/// Lets code automations start other automations, and keeps the host's run
/// history for runs started through it
///
/// History grows until the host drains it with `take_runs`.
#[derive(Default)]
pub struct RunnerLink {
    runner: OnceLock<Weak<AutomationRunner>>,
    history: Mutex<Vec<AutomationRun>>,
}

impl RunnerLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the runner; returns false if one was already attached
    ///
    /// Binding is permanent. A link never switches runners, so a second
    /// call leaves the first binding in place.
    #[must_use]
    pub fn attach(&self, runner: &Arc<AutomationRunner>) -> bool {
        self.runner.set(Arc::downgrade(runner)).is_ok()
    }

    pub fn is_attached(&self) -> bool {
        self.runner.get().is_some_and(|w| w.strong_count() > 0)
    }

    /// Store a run the host executed directly on the runner
    pub fn record(&self, run: AutomationRun) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(run);
    }

    /// Remove and return every recorded run, oldest first
    pub fn take_runs(&self) -> Vec<AutomationRun> {
        std::mem::take(
            &mut *self
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

#[async_trait]
impl AutomationOps for RunnerLink {
    async fn run_automation(&self, automation_id: &str) -> Result<AutomationRun> {
        let runner = self
            .runner
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| CmdFlowError::host("automations", "no runner attached"))?;
        let run = runner.run(automation_id).await?;
        self.record(run.clone());
        Ok(run)
    }

    fn runs(&self) -> Vec<AutomationRun> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
