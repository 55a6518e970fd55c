//! In-memory host capabilities.
//!
//! Enough of a host to drive the engine in tests, demos and embedders that
//! keep everything in process. Every store is a lock-guarded `Vec`; no lock
//! is held across an `.await`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cmdflow_core::context::{
    Agent, ArchitectOps, Artifact, AuthInfo, AutomationOps, Bridge, Channel, EcosystemOps, Group,
    JobOps, Message, Network, SystemOps, User, WorkspaceInfo, WorkspaceManagerOps, WorkspaceOps,
};
use cmdflow_core::errors::{CmdFlowError, Result};
use cmdflow_core::job::JobDefinition;
use cmdflow_core::types::Sensitive;
use cmdflow_core::{AutomationRegistry, CommandRegistry, Context, RunnerConfig, Value};
use serde_json::json;

use crate::link::RunnerLink;
use crate::runner::AutomationRunner;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_value<T: serde::Serialize>(records: &T) -> Value {
    serde_json::to_value(records)
        .map(Value::from)
        .unwrap_or_default()
}

// ===== workspace =====

#[derive(Default)]
pub struct InMemoryWorkspace {
    agents: Mutex<Vec<Agent>>,
    channels: Mutex<Vec<Channel>>,
    groups: Mutex<Vec<Group>>,
    messages: Mutex<Vec<Message>>,
    logs: Mutex<Vec<String>>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received through `add_log`, oldest first
    pub fn logs(&self) -> Vec<String> {
        lock(&self.logs).clone()
    }
}

impl WorkspaceOps for InMemoryWorkspace {
    fn agents(&self) -> Vec<Agent> {
        lock(&self.agents).clone()
    }

    fn add_agent(&self, agent: Agent) -> Result<()> {
        let mut agents = lock(&self.agents);
        if agents.iter().any(|a| a.id == agent.id) {
            return Err(CmdFlowError::host(
                "workspace",
                format!("agent {} already exists", agent.id),
            ));
        }
        agents.push(agent);
        Ok(())
    }

    fn remove_agent(&self, id: &str) -> bool {
        let mut agents = lock(&self.agents);
        let before = agents.len();
        agents.retain(|a| a.id != id);
        agents.len() != before
    }

    fn channels(&self) -> Vec<Channel> {
        lock(&self.channels).clone()
    }

    fn add_channel(&self, channel: Channel) -> Result<()> {
        let mut channels = lock(&self.channels);
        if channels.iter().any(|c| c.id == channel.id) {
            return Err(CmdFlowError::host(
                "workspace",
                format!("channel {} already exists", channel.id),
            ));
        }
        channels.push(channel);
        Ok(())
    }

    fn groups(&self) -> Vec<Group> {
        lock(&self.groups).clone()
    }

    fn add_group(&self, group: Group) -> Result<()> {
        lock(&self.groups).push(group);
        Ok(())
    }

    fn messages(&self, channel_id: &str) -> Vec<Message> {
        lock(&self.messages)
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect()
    }

    fn post_message(&self, message: Message) -> Result<()> {
        if !lock(&self.channels).iter().any(|c| c.id == message.channel_id) {
            return Err(CmdFlowError::host(
                "workspace",
                format!("unknown channel {}", message.channel_id),
            ));
        }
        lock(&self.messages).push(message);
        Ok(())
    }

    fn add_log(&self, message: &str) {
        lock(&self.logs).push(message.to_string());
    }

    fn snapshot(&self) -> Value {
        Value::object()
            .field("agents", to_value(&self.agents()))
            .field("channels", to_value(&self.channels()))
            .field("groups", to_value(&self.groups()))
            .field("messageCount", lock(&self.messages).len())
            .build()
    }
}

// ===== jobs =====

#[derive(Default)]
pub struct InMemoryJobs {
    queue: Mutex<Vec<JobDefinition>>,
    paused: AtomicBool,
    catalog: Mutex<Vec<JobDefinition>>,
    artifacts: Mutex<Vec<Artifact>>,
}

impl InMemoryJobs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobOps for InMemoryJobs {
    fn add_to_queue(&self, job: JobDefinition) {
        lock(&self.queue).push(job);
    }

    fn remove_from_queue(&self, job_id: &str) -> bool {
        let mut queue = lock(&self.queue);
        let before = queue.len();
        queue.retain(|j| j.id != job_id);
        queue.len() != before
    }

    fn pause_queue(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume_queue(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn queue(&self) -> Vec<JobDefinition> {
        lock(&self.queue).clone()
    }

    fn catalog(&self) -> Vec<JobDefinition> {
        lock(&self.catalog).clone()
    }

    /// Insert, or replace the entry with the same id
    fn save_job(&self, job: JobDefinition) {
        let mut catalog = lock(&self.catalog);
        match catalog.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job,
            None => catalog.push(job),
        }
    }

    fn delete_job(&self, job_id: &str) -> bool {
        let mut catalog = lock(&self.catalog);
        let before = catalog.len();
        catalog.retain(|j| j.id != job_id);
        catalog.len() != before
    }

    fn artifacts(&self) -> Vec<Artifact> {
        lock(&self.artifacts).clone()
    }

    fn put_artifact(&self, artifact: Artifact) {
        let mut artifacts = lock(&self.artifacts);
        match artifacts.iter_mut().find(|a| a.id == artifact.id) {
            Some(existing) => *existing = artifact,
            None => artifacts.push(artifact),
        }
    }

    fn delete_artifact(&self, id: &str) -> bool {
        let mut artifacts = lock(&self.artifacts);
        let before = artifacts.len();
        artifacts.retain(|a| a.id != id);
        artifacts.len() != before
    }

    fn snapshot(&self) -> Value {
        Value::object()
            .field("queueLength", lock(&self.queue).len())
            .field("paused", self.is_paused())
            .field("catalogSize", lock(&self.catalog).len())
            .field("artifactCount", lock(&self.artifacts).len())
            .build()
    }
}

// ===== ecosystem =====

#[derive(Default)]
pub struct InMemoryEcosystem {
    networks: Mutex<Vec<Network>>,
    bridges: Mutex<Vec<Bridge>>,
}

impl InMemoryEcosystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EcosystemOps for InMemoryEcosystem {
    fn networks(&self) -> Vec<Network> {
        lock(&self.networks).clone()
    }

    fn add_network(&self, network: Network) -> Result<()> {
        let mut networks = lock(&self.networks);
        if networks.iter().any(|n| n.id == network.id) {
            return Err(CmdFlowError::host(
                "ecosystem",
                format!("network {} already exists", network.id),
            ));
        }
        networks.push(network);
        Ok(())
    }

    /// Removing a network also drops every bridge touching it
    fn remove_network(&self, id: &str) -> bool {
        let removed = {
            let mut networks = lock(&self.networks);
            let before = networks.len();
            networks.retain(|n| n.id != id);
            networks.len() != before
        };
        if removed {
            lock(&self.bridges).retain(|b| b.from != id && b.to != id);
        }
        removed
    }

    fn bridges(&self) -> Vec<Bridge> {
        lock(&self.bridges).clone()
    }

    fn add_bridge(&self, bridge: Bridge) -> Result<()> {
        let known = {
            let networks = lock(&self.networks);
            let has = |id: &str| networks.iter().any(|n| n.id == id);
            has(&bridge.from) && has(&bridge.to)
        };
        if !known {
            return Err(CmdFlowError::host(
                "ecosystem",
                format!("bridge {} joins unknown networks", bridge.id),
            ));
        }
        lock(&self.bridges).push(bridge);
        Ok(())
    }

    fn snapshot(&self) -> Value {
        Value::object()
            .field("networks", to_value(&self.networks()))
            .field("bridgeCount", lock(&self.bridges).len())
            .build()
    }
}

// ===== auth =====

/// Fixed caller identity
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<User>,
}

impl StaticAuth {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user<I, S>(id: impl Into<String>, name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user: Some(User {
                id: id.into(),
                name: name.into(),
                roles: roles.into_iter().map(Into::into).collect(),
            }),
        }
    }
}

impl AuthInfo for StaticAuth {
    fn user(&self) -> Option<User> {
        self.user.clone()
    }
}

// ===== system =====

#[derive(Default)]
pub struct InMemorySystem {
    api_key: Mutex<Option<Sensitive<String>>>,
    model: Mutex<Option<String>>,
}

impl InMemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(&self) -> Option<Sensitive<String>> {
        lock(&self.api_key).clone()
    }
}

impl SystemOps for InMemorySystem {
    fn set_api_key(&self, key: Sensitive<String>) {
        *lock(&self.api_key) = Some(key);
    }

    fn set_model(&self, model: String) {
        *lock(&self.model) = Some(model);
    }

    fn model(&self) -> Option<String> {
        lock(&self.model).clone()
    }

    /// Never exposes the key itself
    fn snapshot(&self) -> Value {
        Value::object()
            .field("model", self.model())
            .field("hasApiKey", lock(&self.api_key).is_some())
            .build()
    }
}

// ===== architect =====

/// Deterministic stand-in for a generation backend: echoes the prompt back
/// as an empty network
#[derive(Debug, Default)]
pub struct EchoArchitect;

#[async_trait]
impl ArchitectOps for EchoArchitect {
    async fn generate_network(&self, prompt: &str) -> Result<Value> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CmdFlowError::host("architect", "prompt must not be empty"));
        }
        Ok(Value::from(json!({
            "name": prompt,
            "agents": [],
            "channels": [],
        })))
    }
}

// ===== workspace manager =====

#[derive(Default)]
pub struct InMemoryWorkspaceManager {
    workspaces: Mutex<Vec<WorkspaceInfo>>,
    next_id: AtomicU64,
}

impl InMemoryWorkspaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self, name: &str, workspaces: &mut Vec<WorkspaceInfo>) -> WorkspaceInfo {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let info = WorkspaceInfo {
            id: format!("ws-{n}"),
            name: name.to_string(),
            // the first workspace becomes the active one
            active: workspaces.is_empty(),
        };
        workspaces.push(info.clone());
        info
    }
}

impl WorkspaceManagerOps for InMemoryWorkspaceManager {
    fn list_workspaces(&self) -> Vec<WorkspaceInfo> {
        lock(&self.workspaces).clone()
    }

    fn create_workspace(&self, name: &str) -> WorkspaceInfo {
        let mut workspaces = lock(&self.workspaces);
        self.allocate(name, &mut workspaces)
    }

    fn switch_workspace(&self, id: &str) -> Result<()> {
        let mut workspaces = lock(&self.workspaces);
        if !workspaces.iter().any(|w| w.id == id) {
            return Err(CmdFlowError::host(
                "workspaceManager",
                format!("unknown workspace {id}"),
            ));
        }
        for w in workspaces.iter_mut() {
            w.active = w.id == id;
        }
        Ok(())
    }

    /// The active workspace cannot be deleted
    fn delete_workspace(&self, id: &str) -> bool {
        let mut workspaces = lock(&self.workspaces);
        let before = workspaces.len();
        workspaces.retain(|w| w.id != id || w.active);
        workspaces.len() != before
    }

    fn duplicate_workspace(&self, id: &str, new_name: &str) -> Result<WorkspaceInfo> {
        let mut workspaces = lock(&self.workspaces);
        if !workspaces.iter().any(|w| w.id == id) {
            return Err(CmdFlowError::host(
                "workspaceManager",
                format!("unknown workspace {id}"),
            ));
        }
        Ok(self.allocate(new_name, &mut workspaces))
    }
}

// ===== assembly =====

/// Assemble a `Context`, defaulting every unset capability to its
/// in-memory implementation
#[derive(Default)]
pub struct ContextBuilder {
    workspace: Option<Arc<dyn WorkspaceOps>>,
    jobs: Option<Arc<dyn JobOps>>,
    ecosystem: Option<Arc<dyn EcosystemOps>>,
    auth: Option<Arc<dyn AuthInfo>>,
    system: Option<Arc<dyn SystemOps>>,
    architect: Option<Arc<dyn ArchitectOps>>,
    automations: Option<Arc<dyn AutomationOps>>,
    workspace_manager: Option<Arc<dyn WorkspaceManagerOps>>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, workspace: Arc<dyn WorkspaceOps>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn jobs(mut self, jobs: Arc<dyn JobOps>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn ecosystem(mut self, ecosystem: Arc<dyn EcosystemOps>) -> Self {
        self.ecosystem = Some(ecosystem);
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AuthInfo>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn system(mut self, system: Arc<dyn SystemOps>) -> Self {
        self.system = Some(system);
        self
    }

    pub fn architect(mut self, architect: Arc<dyn ArchitectOps>) -> Self {
        self.architect = Some(architect);
        self
    }

    pub fn automations(mut self, automations: Arc<dyn AutomationOps>) -> Self {
        self.automations = Some(automations);
        self
    }

    pub fn workspace_manager(mut self, manager: Arc<dyn WorkspaceManagerOps>) -> Self {
        self.workspace_manager = Some(manager);
        self
    }

    pub fn build(self) -> Context {
        Context {
            workspace: self
                .workspace
                .unwrap_or_else(|| Arc::new(InMemoryWorkspace::new())),
            jobs: self.jobs.unwrap_or_else(|| Arc::new(InMemoryJobs::new())),
            ecosystem: self
                .ecosystem
                .unwrap_or_else(|| Arc::new(InMemoryEcosystem::new())),
            auth: self.auth.unwrap_or_else(|| Arc::new(StaticAuth::anonymous())),
            system: self.system.unwrap_or_else(|| Arc::new(InMemorySystem::new())),
            architect: self.architect.unwrap_or_else(|| Arc::new(EchoArchitect)),
            automations: self
                .automations
                .unwrap_or_else(|| Arc::new(RunnerLink::new())),
            workspace_manager: self.workspace_manager,
        }
    }
}

/// Every in-memory capability, kept as concrete handles so callers can
/// seed and inspect state the `Context` only exposes through traits
pub struct InMemoryHost {
    pub workspace: Arc<InMemoryWorkspace>,
    pub jobs: Arc<InMemoryJobs>,
    pub ecosystem: Arc<InMemoryEcosystem>,
    pub auth: Arc<StaticAuth>,
    pub system: Arc<InMemorySystem>,
    pub architect: Arc<EchoArchitect>,
    pub link: Arc<RunnerLink>,
    pub workspace_manager: Arc<InMemoryWorkspaceManager>,
}

impl InMemoryHost {
    pub fn new(auth: StaticAuth) -> Self {
        Self {
            workspace: Arc::new(InMemoryWorkspace::new()),
            jobs: Arc::new(InMemoryJobs::new()),
            ecosystem: Arc::new(InMemoryEcosystem::new()),
            auth: Arc::new(auth),
            system: Arc::new(InMemorySystem::new()),
            architect: Arc::new(EchoArchitect),
            link: Arc::new(RunnerLink::new()),
            workspace_manager: Arc::new(InMemoryWorkspaceManager::new()),
        }
    }

    pub fn context(&self) -> Context {
        ContextBuilder::new()
            .workspace(self.workspace.clone())
            .jobs(self.jobs.clone())
            .ecosystem(self.ecosystem.clone())
            .auth(self.auth.clone())
            .system(self.system.clone())
            .architect(self.architect.clone())
            .automations(self.link.clone())
            .workspace_manager(self.workspace_manager.clone())
            .build()
    }

    /// Build a runner over this host and attach it to the `automations`
    /// capability so code automations can start other automations
    ///
    /// A host has exactly one runner. Keep the returned `Arc` alive for as
    /// long as nested runs should work.
    ///
    /// # Errors
    ///
    /// `Host` if a runner was already attached, even one since dropped.
    pub fn runner(
        &self,
        commands: Arc<CommandRegistry>,
        automations: Arc<AutomationRegistry>,
        config: RunnerConfig,
    ) -> Result<Arc<AutomationRunner>> {
        let runner = Arc::new(
            AutomationRunner::new(commands, automations, self.context()).with_config(config),
        );
        if !self.link.attach(&runner) {
            return Err(CmdFlowError::host(
                "automations",
                "a runner is already attached to this host",
            ));
        }
        Ok(runner)
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new(StaticAuth::anonymous())
    }
}
