use cmdflow_core::errors::Result;
use cmdflow_core::types::RunId;
use cmdflow_core::{
    AutomationDefinition, AutomationRegistry, AutomationStep, Context, EntityRef, RefKind, Value,
};

use crate::builtin::commands::{AGENT_CREATE, CHANNEL_POST, SYSTEM_LOG};

pub const CREATE_AND_ANNOUNCE: &str = "create-and-announce";
pub const DAILY_DIGEST: &str = "daily-digest";

/// Register every built-in automation into `registry`
pub fn register_builtin_automations(registry: &AutomationRegistry) {
    registry.register_automation(create_and_announce());
    registry.register_automation(daily_digest());
}

/// Create an agent, announce it in `#general`, then note the announcement
pub fn create_and_announce() -> AutomationDefinition {
    AutomationDefinition::declarative(
        CREATE_AND_ANNOUNCE,
        "Create and announce agent",
        vec![
            AutomationStep::new("create", AGENT_CREATE).with_arg("name", "scout"),
            AutomationStep::new("announce", CHANNEL_POST)
                .with_arg("channel", EntityRef::new(RefKind::Channel, "general"))
                .with_arg("message", "Agent scout has joined the workspace")
                .with_condition("steps['create'].status === 'completed'"),
            AutomationStep::new("note", SYSTEM_LOG)
                .with_arg("message", "Announced new agent in #general")
                .with_condition("steps.announce.result.channelId === 'general'"),
        ],
    )
    .description("Declarative example: create an agent and post an announcement")
    .tags(["example", "agent"])
}

async fn digest(ctx: Context, run_id: RunId) -> Result<Value> {
    let agents = ctx.workspace.agents().len();
    let queued = ctx.jobs.queue().len();
    let paused = ctx.jobs.is_paused();
    ctx.workspace.add_log(&format!(
        "Daily digest: {agents} agents, {queued} queued jobs{}",
        if paused { " (queue paused)" } else { "" }
    ));
    Ok(Value::object()
        .field("runId", run_id.as_str())
        .field("agents", agents)
        .field("queued", queued)
        .field("paused", paused)
        .build())
}

/// Summarise workspace and queue state every morning
pub fn daily_digest() -> AutomationDefinition {
    AutomationDefinition::code(DAILY_DIGEST, "Daily digest", digest)
        .description("Code example: summarise agents and the job queue")
        .tags(["example", "report"])
        .schedule("0 9 * * *")
}
