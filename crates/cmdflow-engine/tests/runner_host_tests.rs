#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::HashSet;
use std::time::Duration;

use cmdflow_core::automation::RunStatus;
use cmdflow_core::context::AutomationOps;
use cmdflow_core::errors::CmdFlowError;
use cmdflow_core::types::RunId;
use cmdflow_core::{
    Args, AutomationDefinition, AutomationStep, CommandDefinition, Context, EngineConfig,
    RunnerConfig, Value,
};
use cmdflow_engine::StaticAuth;
use futures::future::join_all;

use common::{counter, returning, Harness};

fn slow_step() -> CommandDefinition {
    CommandDefinition::new("slow", |_args: Args, _ctx: Context| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Value::from("slept"))
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_do_not_interfere() {
    let h = Harness::new();
    h.command(slow_step()).automation(AutomationDefinition::declarative(
        "slow-pair",
        "Slow pair",
        vec![
            AutomationStep::new("a", "slow"),
            AutomationStep::new("b", "slow").with_condition("steps.a.result === 'slept'"),
        ],
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runner = h.runner.clone();
            tokio::spawn(async move { runner.run("slow-pair").await })
        })
        .collect();
    let runs: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let ids: HashSet<_> = runs.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), 8, "every run gets its own id");
    for run in &runs {
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.step_outcomes().unwrap().len(), 2);
        assert_eq!(run.logs.len(), 4, "logs never leak between runs");
    }
}

#[tokio::test]
async fn test_run_logs_are_forwarded_with_prefix() {
    let h = Harness::new();
    h.command(returning("noop", Value::Null, counter()))
        .automation(AutomationDefinition::declarative(
            "fwd",
            "Forwarded",
            vec![AutomationStep::new("s1", "noop")],
        ));

    let run = h.runner.run("fwd").await.unwrap();

    let forwarded = h.host_logs();
    assert_eq!(forwarded.len(), run.logs.len());
    assert_eq!(forwarded[0], "[Auto:fwd] Starting automation: Forwarded");
    for (host_line, log) in forwarded.iter().zip(&run.logs) {
        assert_eq!(host_line, &format!("[Auto:fwd] {}", log.message));
    }
}

#[tokio::test]
async fn test_forwarding_honours_config() {
    let config = EngineConfig::from_toml_str("[runner]\nhost_log_prefix = false\n").unwrap();
    let h = Harness::with(StaticAuth::anonymous(), config.runner);
    h.automation(AutomationDefinition::declarative("bare", "Bare", vec![]));
    h.runner.run("bare").await.unwrap();
    assert_eq!(h.host_logs()[0], "Starting automation: Bare");

    let silent = Harness::with(
        StaticAuth::anonymous(),
        RunnerConfig {
            forward_to_host_log: false,
            host_log_prefix: true,
        },
    );
    silent.automation(AutomationDefinition::declarative("quiet", "Quiet", vec![]));
    let run = silent.runner.run("quiet").await.unwrap();
    assert!(silent.host_logs().is_empty());
    assert_eq!(run.logs.len(), 2, "run keeps its own logs regardless");
}

#[tokio::test]
async fn test_code_automation_can_run_another() {
    let h = Harness::new();
    h.command(returning("noop", Value::from("child-ok"), counter()))
        .automation(AutomationDefinition::declarative(
            "child",
            "Child",
            vec![AutomationStep::new("s1", "noop")],
        ))
        .automation(AutomationDefinition::code(
            "parent",
            "Parent",
            |ctx: Context, _run: RunId| async move {
                let child = ctx.automations.run_automation("child").await?;
                Ok(Value::object()
                    .field("childStatus", format!("{:?}", child.status))
                    .field("childRun", child.id.as_str())
                    .build())
            },
        ));

    let parent = h.runner.run("parent").await.unwrap();

    assert_eq!(parent.status, RunStatus::Completed);
    let results = parent.results.as_ref().unwrap().value().unwrap();
    assert_eq!(results.property("childStatus"), Some(Value::from("Completed")));

    let history = h.host.link.runs();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].automation_id, "child");
    assert!(h.host_logs().iter().any(|l| l.starts_with("[Auto:child] ")));
}

#[tokio::test]
async fn test_nested_unknown_automation_fails_parent() {
    let h = Harness::new();
    h.automation(AutomationDefinition::code(
        "orphan",
        "Orphan",
        |ctx: Context, _run: RunId| async move {
            ctx.automations.run_automation("missing").await?;
            Ok::<Value, CmdFlowError>(Value::Null)
        },
    ));

    let run = h.runner.run("orphan").await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.logs_contain("Automation not found: missing"));
}
