//! Job records shared with the external job queue
//!
//! A builder produces `JobDefinition`s and the host's queue executes them.
//! Nothing in this crate schedules or runs a job; the types only fix the
//! shape that commands, automations and the queue exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::automation::definition::AutomationStep;
use crate::value::Args;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    #[default]
    Serial,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStep {
    pub id: String,
    pub command_id: String,
    #[serde(default)]
    pub args: Args,
    #[serde(default)]
    pub status: JobStepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: JobMode,
    pub steps: Vec<JobStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mode: JobMode) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            mode,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a pending step and bump `updated_at`
    pub fn push_step(&mut self, step: JobStep) {
        self.steps.push(step);
        self.updated_at = Utc::now();
    }

    /// Build a job whose steps mirror a declarative automation's steps
    pub fn from_steps(
        id: impl Into<String>,
        name: impl Into<String>,
        mode: JobMode,
        steps: &[AutomationStep],
    ) -> Self {
        let mut job = Self::new(id, name, mode);
        job.steps = steps.iter().map(JobStep::from).collect();
        job
    }
}

impl From<&AutomationStep> for JobStep {
    fn from(step: &AutomationStep) -> Self {
        Self {
            id: step.id.clone(),
            command_id: step.command_id.clone(),
            args: step.args.clone(),
            status: JobStepStatus::Pending,
            condition: step.condition.clone(),
        }
    }
}
