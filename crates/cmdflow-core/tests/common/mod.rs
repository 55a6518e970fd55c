use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cmdflow_core::context::{
    Agent, ArchitectOps, Artifact, AuthInfo, AutomationOps, Bridge, Channel, EcosystemOps, Group,
    JobOps, Message, Network, SystemOps, User, WorkspaceOps,
};
use cmdflow_core::errors::{CmdFlowError, Result};
use cmdflow_core::job::JobDefinition;
use cmdflow_core::types::Sensitive;
use cmdflow_core::{AutomationRun, Context, Value};

/// Host stub whose capabilities do nothing except record `add_log` lines
#[derive(Default)]
pub struct NullHost {
    pub logs: Mutex<Vec<String>>,
    pub user: Option<User>,
}

impl WorkspaceOps for NullHost {
    fn agents(&self) -> Vec<Agent> {
        Vec::new()
    }
    fn add_agent(&self, _agent: Agent) -> Result<()> {
        Ok(())
    }
    fn remove_agent(&self, _id: &str) -> bool {
        false
    }
    fn channels(&self) -> Vec<Channel> {
        Vec::new()
    }
    fn add_channel(&self, _channel: Channel) -> Result<()> {
        Ok(())
    }
    fn groups(&self) -> Vec<Group> {
        Vec::new()
    }
    fn add_group(&self, _group: Group) -> Result<()> {
        Ok(())
    }
    fn messages(&self, _channel_id: &str) -> Vec<Message> {
        Vec::new()
    }
    fn post_message(&self, _message: Message) -> Result<()> {
        Ok(())
    }
    fn add_log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }
}

impl JobOps for NullHost {
    fn add_to_queue(&self, _job: JobDefinition) {}
    fn remove_from_queue(&self, _job_id: &str) -> bool {
        false
    }
    fn pause_queue(&self) {}
    fn resume_queue(&self) {}
    fn is_paused(&self) -> bool {
        false
    }
    fn queue(&self) -> Vec<JobDefinition> {
        Vec::new()
    }
    fn catalog(&self) -> Vec<JobDefinition> {
        Vec::new()
    }
    fn save_job(&self, _job: JobDefinition) {}
    fn delete_job(&self, _job_id: &str) -> bool {
        false
    }
    fn artifacts(&self) -> Vec<Artifact> {
        Vec::new()
    }
    fn put_artifact(&self, _artifact: Artifact) {}
    fn delete_artifact(&self, _id: &str) -> bool {
        false
    }
}

impl EcosystemOps for NullHost {
    fn networks(&self) -> Vec<Network> {
        Vec::new()
    }
    fn add_network(&self, _network: Network) -> Result<()> {
        Ok(())
    }
    fn remove_network(&self, _id: &str) -> bool {
        false
    }
    fn bridges(&self) -> Vec<Bridge> {
        Vec::new()
    }
    fn add_bridge(&self, _bridge: Bridge) -> Result<()> {
        Ok(())
    }
}

impl AuthInfo for NullHost {
    fn user(&self) -> Option<User> {
        self.user.clone()
    }
}

impl SystemOps for NullHost {
    fn set_api_key(&self, _key: Sensitive<String>) {}
    fn set_model(&self, _model: String) {}
    fn model(&self) -> Option<String> {
        None
    }
}

#[async_trait]
impl ArchitectOps for NullHost {
    async fn generate_network(&self, _prompt: &str) -> Result<Value> {
        Ok(Value::Null)
    }
}

#[async_trait]
impl AutomationOps for NullHost {
    async fn run_automation(&self, automation_id: &str) -> Result<AutomationRun> {
        Err(CmdFlowError::AutomationNotFound {
            automation_id: automation_id.to_string(),
        })
    }
    fn runs(&self) -> Vec<AutomationRun> {
        Vec::new()
    }
}

/// Context whose every capability is backed by one `NullHost`
#[allow(dead_code)]
pub fn null_context() -> (Context, Arc<NullHost>) {
    context_with(NullHost::default())
}

/// Context whose caller holds `roles`
#[allow(dead_code)]
pub fn context_with_roles(roles: &[&str]) -> (Context, Arc<NullHost>) {
    context_with(NullHost {
        user: Some(User {
            id: "u1".to_string(),
            name: "tester".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }),
        ..NullHost::default()
    })
}

fn context_with(host: NullHost) -> (Context, Arc<NullHost>) {
    let host = Arc::new(host);
    let ctx = Context {
        workspace: host.clone(),
        jobs: host.clone(),
        ecosystem: host.clone(),
        auth: host.clone(),
        system: host.clone(),
        architect: host.clone(),
        automations: host.clone(),
        workspace_manager: None,
    };
    (ctx, host)
}
