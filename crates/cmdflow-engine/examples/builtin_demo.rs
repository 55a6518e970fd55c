//! Runs the built-in automations against the in-memory host.
//!
//! `cargo run -p cmdflow-engine --example builtin_demo`

use std::sync::Arc;

use cmdflow_core::context::{Channel, WorkspaceOps};
use cmdflow_core::logging_facility::init;
use cmdflow_core::{AutomationRegistry, CommandRegistry, EngineConfig};
use cmdflow_engine::builtin::automations::{CREATE_AND_ANNOUNCE, DAILY_DIGEST};
use cmdflow_engine::builtin::{register_builtin_automations, register_builtin_commands};
use cmdflow_engine::{InMemoryHost, StaticAuth};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    init(config.logging.profile);

    let commands = Arc::new(CommandRegistry::new());
    let automations = Arc::new(AutomationRegistry::new());
    register_builtin_commands(&commands);
    register_builtin_automations(&automations);

    for def in commands.get_all() {
        println!("{}", def.signature());
    }

    let host = InMemoryHost::new(StaticAuth::user("u1", "Ada", ["member"]));
    host.workspace.add_channel(Channel {
        id: "general".into(),
        name: "General".into(),
    })?;
    let runner = host.runner(commands, automations, config.runner)?;

    for id in [CREATE_AND_ANNOUNCE, DAILY_DIGEST] {
        let run = runner.run(id).await?;
        println!("\n{id}: {:?}", run.status);
        println!("{}", serde_json::to_string_pretty(&run)?);
    }

    println!("\nHost log:");
    for line in host.workspace.logs() {
        println!("  {line}");
    }
    Ok(())
}
