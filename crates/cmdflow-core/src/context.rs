//! Host context handed to every command and automation body
//!
//! The context is a bundle of capability handles, one per collaborator group.
//! Implementations live in the host; this crate only fixes the interface.
//! Each capability can describe itself as a `Value` via `snapshot()`, which
//! is what condition expressions see under the `context` name.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cmdflow_core_types::Sensitive;
use serde::{Deserialize, Serialize};

use crate::automation::run::AutomationRun;
use crate::errors::Result;
use crate::job::JobDefinition;
use crate::value::Value;

// ===== Domain records shared with the host =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub channel_id: String,
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
    pub active: bool,
}

// ===== Capabilities =====

/// Domain entities of the active workspace, their mutators, and the host log
pub trait WorkspaceOps: Send + Sync {
    fn agents(&self) -> Vec<Agent>;
    fn add_agent(&self, agent: Agent) -> Result<()>;
    fn remove_agent(&self, id: &str) -> bool;
    fn channels(&self) -> Vec<Channel>;
    fn add_channel(&self, channel: Channel) -> Result<()>;
    fn groups(&self) -> Vec<Group>;
    fn add_group(&self, group: Group) -> Result<()>;
    fn messages(&self, channel_id: &str) -> Vec<Message>;
    fn post_message(&self, message: Message) -> Result<()>;
    /// Host-visible log sink; automation runs forward their log lines here
    fn add_log(&self, message: &str);

    fn snapshot(&self) -> Value {
        Value::Null
    }
}

/// Job queue, job catalog and artifact storage
pub trait JobOps: Send + Sync {
    fn add_to_queue(&self, job: JobDefinition);
    fn remove_from_queue(&self, job_id: &str) -> bool;
    fn pause_queue(&self);
    fn resume_queue(&self);
    fn is_paused(&self) -> bool;
    fn queue(&self) -> Vec<JobDefinition>;

    fn catalog(&self) -> Vec<JobDefinition>;
    fn save_job(&self, job: JobDefinition);
    fn delete_job(&self, job_id: &str) -> bool;

    fn artifacts(&self) -> Vec<Artifact>;
    fn put_artifact(&self, artifact: Artifact);
    fn delete_artifact(&self, id: &str) -> bool;

    fn snapshot(&self) -> Value {
        Value::Null
    }
}

/// Multi-network state and bridges between networks
pub trait EcosystemOps: Send + Sync {
    fn networks(&self) -> Vec<Network>;
    fn add_network(&self, network: Network) -> Result<()>;
    fn remove_network(&self, id: &str) -> bool;
    fn bridges(&self) -> Vec<Bridge>;
    fn add_bridge(&self, bridge: Bridge) -> Result<()>;

    fn snapshot(&self) -> Value {
        Value::Null
    }
}

/// Caller identity. Authorization decisions are made by the host.
pub trait AuthInfo: Send + Sync {
    fn user(&self) -> Option<User>;

    fn snapshot(&self) -> Value {
        let user = self.user().map(|u| {
            Value::object()
                .field("id", u.id)
                .field("name", u.name)
                .field("roles", u.roles)
                .build()
        });
        Value::object().field("user", user).build()
    }
}

/// Host configuration setters
pub trait SystemOps: Send + Sync {
    fn set_api_key(&self, key: Sensitive<String>);
    fn set_model(&self, model: String);
    fn model(&self) -> Option<String>;

    fn snapshot(&self) -> Value {
        Value::object().field("model", self.model()).build()
    }
}

/// Generation hooks for building networks from a prompt
#[async_trait]
pub trait ArchitectOps: Send + Sync {
    async fn generate_network(&self, prompt: &str) -> Result<Value>;

    fn snapshot(&self) -> Value {
        Value::Null
    }
}

/// Lets an automation trigger another automation
#[async_trait]
pub trait AutomationOps: Send + Sync {
    /// # Errors
    ///
    /// `AutomationNotFound` for an unknown id. Failures inside the run are
    /// reported through the returned run's status, never as an error.
    async fn run_automation(&self, automation_id: &str) -> Result<AutomationRun>;

    /// Runs the host has recorded so far
    fn runs(&self) -> Vec<AutomationRun>;

    fn snapshot(&self) -> Value {
        Value::object().field("runCount", self.runs().len()).build()
    }
}

/// Multi-workspace lifecycle (optional capability)
pub trait WorkspaceManagerOps: Send + Sync {
    fn list_workspaces(&self) -> Vec<WorkspaceInfo>;
    fn create_workspace(&self, name: &str) -> WorkspaceInfo;
    fn switch_workspace(&self, id: &str) -> Result<()>;
    fn delete_workspace(&self, id: &str) -> bool;
    fn duplicate_workspace(&self, id: &str, new_name: &str) -> Result<WorkspaceInfo>;

    fn snapshot(&self) -> Value {
        let workspaces: Vec<Value> = self
            .list_workspaces()
            .into_iter()
            .map(|w| {
                Value::object()
                    .field("id", w.id)
                    .field("name", w.name)
                    .field("active", w.active)
                    .build()
            })
            .collect();
        Value::object().field("workspaces", workspaces).build()
    }
}

/// Capability bundle passed to every command and automation body
///
/// Cloning is cheap (handles are `Arc`s) and every clone shares the same host
/// state. Concurrent runs that mutate shared state are the host's consistency
/// problem; nothing here serializes them.
#[derive(Clone)]
pub struct Context {
    pub workspace: Arc<dyn WorkspaceOps>,
    pub jobs: Arc<dyn JobOps>,
    pub ecosystem: Arc<dyn EcosystemOps>,
    pub auth: Arc<dyn AuthInfo>,
    pub system: Arc<dyn SystemOps>,
    pub architect: Arc<dyn ArchitectOps>,
    pub automations: Arc<dyn AutomationOps>,
    pub workspace_manager: Option<Arc<dyn WorkspaceManagerOps>>,
}

impl Context {
    /// View of the context exposed to condition expressions
    pub fn to_value(&self) -> Value {
        Value::object()
            .field("workspace", self.workspace.snapshot())
            .field("jobs", self.jobs.snapshot())
            .field("ecosystem", self.ecosystem.snapshot())
            .field("auth", self.auth.snapshot())
            .field("system", self.system.snapshot())
            .field("architect", self.architect.snapshot())
            .field("automations", self.automations.snapshot())
            .field(
                "workspaceManager",
                self.workspace_manager
                    .as_ref()
                    .map_or(Value::Null, |m| m.snapshot()),
            )
            .build()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("user", &self.auth.user())
            .field("workspace_manager", &self.workspace_manager.is_some())
            .finish_non_exhaustive()
    }
}
