//! Run record produced by one automation invocation
//!
//! Status is `Running` from creation until exactly one terminal transition.
//! `end_time` is set iff the status is terminal, and a terminal run ignores
//! any further transition.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cmdflow_core_types::RunId;
use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationLog {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
        }
    }
}

/// Outcome of one declarative step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step_id: String,
    pub command_id: String,
    pub status: StepStatus,
    pub result: Value,
}

impl StepOutcome {
    /// Shape seen by condition expressions (`steps['id'].result`, ...)
    pub fn to_value(&self) -> Value {
        Value::object()
            .field("stepId", self.step_id.as_str())
            .field("commandId", self.command_id.as_str())
            .field("status", self.status.as_str())
            .field("result", self.result.clone())
            .build()
    }
}

/// `steps` binding for conditions: prior outcomes keyed by step id
pub fn steps_scope(outcomes: &[StepOutcome]) -> Value {
    let map: BTreeMap<String, Value> = outcomes
        .iter()
        .map(|o| (o.step_id.clone(), o.to_value()))
        .collect();
    Value::Object(map)
}

/// What a run produced: a code automation's return value, or the
/// declarative step outcomes (truncated at a failing step)
///
/// Serialized as `{"kind": "steps"|"value", "value": ...}`; a code result
/// may itself be an array, so the shape alone cannot tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RunResults {
    Steps(Vec<StepOutcome>),
    Value(Value),
}

impl RunResults {
    pub fn steps(&self) -> Option<&[StepOutcome]> {
        match self {
            RunResults::Steps(steps) => Some(steps),
            RunResults::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            RunResults::Value(v) => Some(v),
            RunResults::Steps(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRun {
    pub id: RunId,
    pub automation_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub logs: Vec<AutomationLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<RunResults>,
}

impl AutomationRun {
    /// A fresh run in the `Running` state
    pub fn start(automation_id: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            automation_id: automation_id.into(),
            start_time: Utc::now(),
            end_time: None,
            status: RunStatus::Running,
            logs: Vec::new(),
            results: None,
        }
    }

    /// Append a log line and return it
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) -> &AutomationLog {
        self.logs.push(AutomationLog {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
        &self.logs[self.logs.len() - 1]
    }

    /// Move to `Completed`; returns false if the run was already terminal
    pub fn complete(&mut self) -> bool {
        self.finish(RunStatus::Completed)
    }

    /// Move to `Failed`; returns false if the run was already terminal
    pub fn fail(&mut self) -> bool {
        self.finish(RunStatus::Failed)
    }

    fn finish(&mut self, status: RunStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_time = Some(Utc::now());
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn step_outcomes(&self) -> Option<&[StepOutcome]> {
        self.results.as_ref().and_then(RunResults::steps)
    }

    /// True if any log line contains `needle`
    pub fn logs_contain(&self, needle: &str) -> bool {
        self.logs.iter().any(|l| l.message.contains(needle))
    }
}
