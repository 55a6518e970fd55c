//! Automation runner: interprets one automation into a terminal run record.
//!
//! ## Run pipeline (in order):
//! 1. Resolve the definition (`AutomationNotFound` is the only error `run` returns)
//! 2. Open a `Running` record and log `Starting automation: <name>`
//! 3. Code: await the body; its value becomes the results
//! 4. Declarative: walk steps in order. A guarded step whose condition is
//!    false (or fails to parse/evaluate) is recorded as skipped. A failing
//!    command aborts every remaining step.
//! 5. Close the record as `Completed` or `Failed`
//!
//! Every run log line is mirrored to the host sink and to `tracing`.

use std::sync::Arc;
use std::time::Instant;

use cmdflow_core::automation::run::{steps_scope, StepOutcome, StepStatus};
use cmdflow_core::automation::{AutomationKind, AutomationStep, RunResults};
use cmdflow_core::condition::{self, Scope};
use cmdflow_core::context::WorkspaceOps;
use cmdflow_core::errors::{CmdFlowError, Result};
use cmdflow_core::types::schema::EVENT_RUN_LOG;
use cmdflow_core::{
    log_op_end, log_op_error, log_op_start, AutomationRegistry, AutomationRun, CommandRegistry,
    Context, LogLevel, RunnerConfig, Value,
};

const SKIPPED_RESULT: &str = "Condition not met";

/// Executes automations against one shared host context
///
/// The runner keeps no history and no cross-run state, so concurrent `run`
/// calls never interfere at this level. They do share `context`, and any
/// consistency between runs mutating the same host state is the host's
/// concern.
pub struct AutomationRunner {
    commands: Arc<CommandRegistry>,
    automations: Arc<AutomationRegistry>,
    context: Context,
    config: RunnerConfig,
}

impl AutomationRunner {
    pub fn new(
        commands: Arc<CommandRegistry>,
        automations: Arc<AutomationRegistry>,
        context: Context,
    ) -> Self {
        Self {
            commands,
            automations,
            context,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn automations(&self) -> &Arc<AutomationRegistry> {
        &self.automations
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Run `automation_id` to a terminal state
    ///
    /// Failures inside the run never surface as `Err`: they end the run as
    /// `Failed` with an error log. Inspect `AutomationRun::status`.
    ///
    /// # Errors
    ///
    /// `AutomationNotFound` if no definition is registered under the id.
    pub async fn run(&self, automation_id: &str) -> Result<AutomationRun> {
        log_op_start!("automation_run", automation_id = automation_id);
        let start = Instant::now();

        let Some(def) = self.automations.get_automation(automation_id) else {
            let err = CmdFlowError::AutomationNotFound {
                automation_id: automation_id.to_string(),
            };
            log_op_error!(
                "automation_run",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                automation_id = automation_id
            );
            return Err(err);
        };

        let mut recorder = RunRecorder::new(
            AutomationRun::start(def.id.as_str()),
            self.context.workspace.clone(),
            self.config,
        );
        recorder.log(LogLevel::Info, format!("Starting automation: {}", def.name));

        let outcome = match &def.kind {
            AutomationKind::Code(body) => {
                let run_id = recorder.run.id.clone();
                body.execute(self.context.clone(), run_id)
                    .await
                    .map(|value| recorder.run.results = Some(RunResults::Value(value)))
            }
            AutomationKind::Declarative(steps) => {
                let mut outcomes = Vec::with_capacity(steps.len());
                let result = self.run_steps(steps, &mut outcomes, &mut recorder).await;
                // partial outcomes survive a failing step
                recorder.run.results = Some(RunResults::Steps(outcomes));
                result
            }
        };

        match outcome {
            Ok(()) => {
                recorder.log(LogLevel::Info, "Automation completed successfully");
                recorder.run.complete();
            }
            Err(e) => {
                recorder.log(LogLevel::Error, format!("Automation failed: {}", e.message()));
                recorder.run.fail();
            }
        }

        let run = recorder.finish();
        log_op_end!(
            "automation_run",
            duration_ms = start.elapsed().as_millis() as u64,
            automation_id = automation_id,
            run_id = run.id.as_str(),
            status = ?run.status
        );
        Ok(run)
    }

    async fn run_steps(
        &self,
        steps: &[AutomationStep],
        outcomes: &mut Vec<StepOutcome>,
        recorder: &mut RunRecorder,
    ) -> Result<()> {
        for step in steps {
            if !self.should_run(step, outcomes, recorder) {
                recorder.log(
                    LogLevel::Info,
                    format!(
                        "Skipping step {} ({}): {SKIPPED_RESULT}",
                        step.id, step.command_id
                    ),
                );
                outcomes.push(StepOutcome {
                    step_id: step.id.clone(),
                    command_id: step.command_id.clone(),
                    status: StepStatus::Skipped,
                    result: Value::from(SKIPPED_RESULT),
                });
                continue;
            }

            recorder.log(
                LogLevel::Info,
                format!("Executing step: {}", step.command_id),
            );
            // the definition's args stay untouched; defaults land in the copy
            let mut args = step.args.clone();
            match self
                .commands
                .execute(&step.command_id, &mut args, &self.context)
                .await
            {
                Ok(result) => outcomes.push(StepOutcome {
                    step_id: step.id.clone(),
                    command_id: step.command_id.clone(),
                    status: StepStatus::Completed,
                    result,
                }),
                Err(e) => {
                    recorder.log(
                        LogLevel::Error,
                        format!(
                            "Step {} ({}) failed: {}",
                            step.id,
                            step.command_id,
                            e.message()
                        ),
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Evaluate the step's guard against prior outcomes and a fresh context
    /// snapshot. Parse and evaluation errors degrade to `false`.
    fn should_run(
        &self,
        step: &AutomationStep,
        outcomes: &[StepOutcome],
        recorder: &mut RunRecorder,
    ) -> bool {
        let Some(expr) = step.condition.as_deref() else {
            return true;
        };
        let scope = Scope::new(steps_scope(outcomes), self.context.to_value());
        match condition::evaluate(expr, &scope) {
            Ok(pass) => pass,
            Err(e) => {
                recorder.log(
                    LogLevel::Warn,
                    format!(
                        "Condition for step {} could not be evaluated, treating as false: {}",
                        step.id,
                        e.message()
                    ),
                );
                false
            }
        }
    }
}

/// Owns the in-flight run record and fans every log line out to the host
struct RunRecorder {
    run: AutomationRun,
    sink: Arc<dyn WorkspaceOps>,
    config: RunnerConfig,
}

impl RunRecorder {
    fn new(run: AutomationRun, sink: Arc<dyn WorkspaceOps>, config: RunnerConfig) -> Self {
        Self { run, sink, config }
    }

    fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        let automation_id = self.run.automation_id.as_str();
        let run_id = self.run.id.as_str();
        match level {
            LogLevel::Info => tracing::info!(
                event = EVENT_RUN_LOG,
                automation_id,
                run_id,
                message = message.as_str()
            ),
            LogLevel::Warn => tracing::warn!(
                event = EVENT_RUN_LOG,
                automation_id,
                run_id,
                message = message.as_str()
            ),
            LogLevel::Error => tracing::error!(
                event = EVENT_RUN_LOG,
                automation_id,
                run_id,
                message = message.as_str()
            ),
        }

        if self.config.forward_to_host_log {
            if self.config.host_log_prefix {
                self.sink
                    .add_log(&format!("[Auto:{automation_id}] {message}"));
            } else {
                self.sink.add_log(&message);
            }
        }

        self.run.log(level, message);
    }

    fn finish(self) -> AutomationRun {
        self.run
    }
}
