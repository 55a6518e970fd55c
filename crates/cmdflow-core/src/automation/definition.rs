use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cmdflow_core_types::RunId;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::errors::Result;
use crate::value::{Args, Value};

/// One unit of a declarative automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStep {
    /// Unique within its automation; conditions refer to prior steps by it
    pub id: String,
    pub command_id: String,
    #[serde(default)]
    pub args: Args,
    /// Guard expression over `steps` and `context`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl AutomationStep {
    pub fn new(id: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command_id: command_id.into(),
            args: Args::new(),
            condition: None,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Body of a code automation
///
/// The returned value becomes the run's results; an error fails the run.
#[async_trait]
pub trait CodeAutomation: Send + Sync {
    async fn execute(&self, ctx: Context, run_id: RunId) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> CodeAutomation for F
where
    F: Fn(Context, RunId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, ctx: Context, run_id: RunId) -> Result<Value> {
        (self)(ctx, run_id).await
    }
}

#[derive(Clone)]
pub enum AutomationKind {
    /// Hand-written async procedure
    Code(Arc<dyn CodeAutomation>),
    /// Ordered, conditionally guarded command steps
    Declarative(Vec<AutomationStep>),
}

impl fmt::Debug for AutomationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationKind::Code(_) => f.write_str("Code(..)"),
            AutomationKind::Declarative(steps) => f.debug_tuple("Declarative").field(steps).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutomationDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Cron-like hint for a host scheduler; nothing in this crate reads it
    pub schedule: Option<String>,
    pub kind: AutomationKind,
}

impl AutomationDefinition {
    pub fn declarative(
        id: impl Into<String>,
        name: impl Into<String>,
        steps: Vec<AutomationStep>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            schedule: None,
            kind: AutomationKind::Declarative(steps),
        }
    }

    pub fn code<F, Fut>(id: impl Into<String>, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Context, RunId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            schedule: None,
            kind: AutomationKind::Code(Arc::new(body)),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn steps(&self) -> Option<&[AutomationStep]> {
        match &self.kind {
            AutomationKind::Declarative(steps) => Some(steps),
            AutomationKind::Code(_) => None,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self.kind, AutomationKind::Code(_))
    }
}
