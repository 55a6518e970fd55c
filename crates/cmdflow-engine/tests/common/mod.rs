#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cmdflow_core::errors::CmdFlowError;
use cmdflow_core::{
    Args, AutomationDefinition, AutomationRegistry, CommandDefinition, CommandRegistry, Context,
    RunnerConfig, Value,
};
use cmdflow_engine::{AutomationRunner, InMemoryHost, StaticAuth};

/// Registries, host and runner wired together the way an embedder would
pub struct Harness {
    pub commands: Arc<CommandRegistry>,
    pub automations: Arc<AutomationRegistry>,
    pub host: InMemoryHost,
    pub runner: Arc<AutomationRunner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(StaticAuth::anonymous(), RunnerConfig::default())
    }

    pub fn with(auth: StaticAuth, config: RunnerConfig) -> Self {
        let commands = Arc::new(CommandRegistry::new());
        let automations = Arc::new(AutomationRegistry::new());
        let host = InMemoryHost::new(auth);
        let runner = host
            .runner(commands.clone(), automations.clone(), config)
            .expect("fresh host has no runner");
        Self {
            commands,
            automations,
            host,
            runner,
        }
    }

    pub fn command(&self, def: CommandDefinition) -> &Self {
        self.commands.register(def);
        self
    }

    pub fn automation(&self, def: AutomationDefinition) -> &Self {
        self.automations.register_automation(def);
        self
    }

    pub fn host_logs(&self) -> Vec<String> {
        self.host.workspace.logs()
    }
}

/// Command returning a fixed value and counting its invocations
pub fn returning(id: &str, value: Value, calls: Arc<AtomicUsize>) -> CommandDefinition {
    CommandDefinition::new(id, move |_args: Args, _ctx: Context| {
        let calls = calls.clone();
        let value = value.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    })
}

/// Command that always fails with `message`
pub fn failing(id: &str, message: &str, calls: Arc<AtomicUsize>) -> CommandDefinition {
    let command_id = id.to_string();
    let message = message.to_string();
    CommandDefinition::new(id, move |_args: Args, _ctx: Context| {
        let calls = calls.clone();
        let err = CmdFlowError::execution(command_id.clone(), message.clone());
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(err)
        }
    })
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(c: &Arc<AtomicUsize>) -> usize {
    c.load(Ordering::SeqCst)
}
