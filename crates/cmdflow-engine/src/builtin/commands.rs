use chrono::Utc;
use cmdflow_core::context::{Agent, Message};
use cmdflow_core::errors::{CmdFlowError, Result};
use cmdflow_core::{
    ArgType, Args, CommandArg, CommandDefinition, CommandRegistry, Context, EntityRef, RefKind,
    Value,
};
use uuid::Uuid;

pub const SYSTEM_LOG: &str = "system.log";
pub const AGENT_CREATE: &str = "agent.create";
pub const AGENT_LIST: &str = "agent.list";
pub const CHANNEL_POST: &str = "channel.post";
pub const JOB_ENQUEUE: &str = "job.enqueue";
pub const WORKSPACE_ECHO: &str = "workspace.echo";

/// Register every built-in command into `registry`
pub fn register_builtin_commands(registry: &CommandRegistry) {
    for def in [
        system_log(),
        agent_create(),
        agent_list(),
        channel_post(),
        job_enqueue(),
        workspace_echo(),
    ] {
        registry.register(def);
    }
}

fn non_empty(value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err("must not be empty".to_string()),
    }
}

/// The declared string args are present after validation; anything else is
/// a registry bug surfaced as an execution error
fn str_arg<'a>(command_id: &str, args: &'a Args, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| CmdFlowError::execution(command_id, format!("argument '{name}' missing")))
}

async fn log_message(args: Args, ctx: Context) -> Result<Value> {
    let message = str_arg(SYSTEM_LOG, &args, "message")?;
    ctx.workspace.add_log(message);
    Ok(Value::from(message))
}

pub fn system_log() -> CommandDefinition {
    CommandDefinition::new(SYSTEM_LOG, log_message)
        .description("Write a line to the host log")
        .arg(CommandArg::new("message", ArgType::String).describe("Text to log"))
        .tags(["system"])
        .output("The logged message", None)
}

async fn create_agent(args: Args, ctx: Context) -> Result<Value> {
    let name = str_arg(AGENT_CREATE, &args, "name")?;
    let model = str_arg(AGENT_CREATE, &args, "model")?;
    let agent = Agent {
        id: format!("agent-{}", Uuid::now_v7()),
        name: name.to_string(),
        model: model.to_string(),
    };
    let reference = EntityRef::new(RefKind::Agent, agent.id.as_str());
    ctx.workspace.add_agent(agent)?;
    tracing::debug!(agent_id = %reference.id, "Created agent");
    Ok(Value::Reference(reference))
}

pub fn agent_create() -> CommandDefinition {
    CommandDefinition::new(AGENT_CREATE, create_agent)
        .description("Create an agent in the active workspace")
        .arg(
            CommandArg::new("name", ArgType::String)
                .describe("Display name")
                .validate(non_empty),
        )
        .arg(
            CommandArg::new("model", ArgType::String)
                .describe("Model identifier")
                .default_value("default"),
        )
        .tags(["agent", "workspace"])
        .output("Reference to the new agent", None)
}

async fn list_agents(_args: Args, ctx: Context) -> Result<Value> {
    let agents: Vec<Value> = ctx
        .workspace
        .agents()
        .into_iter()
        .map(|a| {
            Value::object()
                .field("id", a.id)
                .field("name", a.name)
                .field("model", a.model)
                .build()
        })
        .collect();
    Ok(Value::Array(agents))
}

pub fn agent_list() -> CommandDefinition {
    CommandDefinition::new(AGENT_LIST, list_agents)
        .description("List agents in the active workspace")
        .tags(["agent", "workspace"])
        .output("Array of {id, name, model}", None)
}

async fn post_to_channel(args: Args, ctx: Context) -> Result<Value> {
    // reference args are not type-checked by the registry
    let channel_id = match args.get("channel").and_then(Value::as_reference) {
        Some(r) if r.kind == RefKind::Channel => r.id.clone(),
        _ => {
            return Err(CmdFlowError::execution(
                CHANNEL_POST,
                "channel must be a channel reference",
            ))
        }
    };
    let content = str_arg(CHANNEL_POST, &args, "message")?.to_string();
    let author = ctx
        .auth
        .user()
        .map_or_else(|| "system".to_string(), |u| u.name);
    ctx.workspace.post_message(Message {
        channel_id: channel_id.clone(),
        author,
        content: content.clone(),
        timestamp: Utc::now(),
    })?;
    Ok(Value::object()
        .field("channelId", channel_id)
        .field("content", content)
        .build())
}

pub fn channel_post() -> CommandDefinition {
    CommandDefinition::new(CHANNEL_POST, post_to_channel)
        .description("Post a message to a channel")
        .arg(CommandArg::new("channel", ArgType::Channel).describe("Target channel"))
        .arg(
            CommandArg::new("message", ArgType::String)
                .describe("Message body")
                .validate(non_empty),
        )
        .rbac(["member", "admin"])
        .tags(["channel", "workspace"])
        .output("The posted message", None)
}

async fn enqueue_job(args: Args, ctx: Context) -> Result<Value> {
    let job_id = str_arg(JOB_ENQUEUE, &args, "jobId")?;
    let job = ctx
        .jobs
        .catalog()
        .into_iter()
        .find(|j| j.id == job_id)
        .ok_or_else(|| {
            CmdFlowError::execution(JOB_ENQUEUE, format!("Job not found in catalog: {job_id}"))
        })?;
    ctx.jobs.add_to_queue(job);
    Ok(Value::from(ctx.jobs.queue().len()))
}

pub fn job_enqueue() -> CommandDefinition {
    CommandDefinition::new(JOB_ENQUEUE, enqueue_job)
        .description("Queue a catalog job for the external job runner")
        .arg(CommandArg::new("jobId", ArgType::String).describe("Catalog job id"))
        .rbac(["operator", "admin"])
        .tags(["jobs"])
        .output("Queue length after enqueueing", None)
}

async fn echo(args: Args, _ctx: Context) -> Result<Value> {
    Ok(args.get("value").cloned().unwrap_or(Value::Null))
}

pub fn workspace_echo() -> CommandDefinition {
    CommandDefinition::new(WORKSPACE_ECHO, echo)
        .description("Return the value argument unchanged")
        .arg(
            CommandArg::new("value", ArgType::Object)
                .optional()
                .describe("Any value"),
        )
        .tags(["debug"])
        .output("The value argument, or null", None)
}
