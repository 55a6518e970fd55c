#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use cmdflow_core::errors::CmdFlowError;
use cmdflow_core::logging_facility::init_test_capture;
use cmdflow_core::types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_RUN_LOG, EVENT_START};
use cmdflow_core::types::TraceId;
use cmdflow_core::value::args;
use cmdflow_core::{Args, AutomationDefinition, AutomationStep, CommandRegistry, Value};
use cmdflow_engine::builtin::commands::{AGENT_LIST, JOB_ENQUEUE};
use cmdflow_engine::builtin::register_builtin_commands;
use cmdflow_engine::{AuthorizedDispatcher, InMemoryHost, StaticAuth};
use tracing::Level;

use common::{counter, failing, returning, Harness};

#[tokio::test]
async fn test_automation_run_boundary_is_logged_once() {
    let capture = init_test_capture();
    let h = Harness::new();
    h.command(returning("noop", Value::Null, counter()))
        .automation(AutomationDefinition::declarative(
            "log-boundary-unique",
            "Boundary",
            vec![AutomationStep::new("s1", "noop")],
        ));

    let run = h.runner.run("log-boundary-unique").await.unwrap();

    let boundary: Vec<_> = capture
        .events_with("automation_id", "log-boundary-unique")
        .into_iter()
        .filter(|e| e.op.as_deref() == Some("automation_run"))
        .collect();
    let starts = boundary
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .count();
    let ends: Vec<_> = boundary
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(starts, 1);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("run_id"), Some(run.id.as_str()));
}

#[tokio::test]
async fn test_run_log_lines_are_mirrored_to_tracing() {
    let capture = init_test_capture();
    let h = Harness::new();
    h.command(failing("explode", "boom", counter()))
        .automation(AutomationDefinition::declarative(
            "log-mirror-unique",
            "Mirror",
            vec![AutomationStep::new("s1", "explode")],
        ));

    let run = h.runner.run("log-mirror-unique").await.unwrap();

    let mirrored: Vec<_> = capture
        .events_with("run_id", run.id.as_str())
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_RUN_LOG))
        .collect();
    assert_eq!(mirrored.len(), run.logs.len());
    let errors: Vec<_> = mirrored.iter().filter(|e| e.level == Level::ERROR).collect();
    assert_eq!(errors.len(), 2, "step failure and run failure");
    assert_eq!(errors[1].field("message"), Some("Automation failed: boom"));
}

#[tokio::test]
async fn test_unknown_automation_logs_end_error() {
    let capture = init_test_capture();
    let h = Harness::new();

    let _ = h.runner.run("log-missing-unique").await;

    let errors = capture
        .events_with("automation_id", "log-missing-unique")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err_code"), Some("ERR_AUTOMATION_NOT_FOUND"));
}

#[tokio::test]
async fn test_dispatch_events_carry_request_and_trace_ids() {
    let capture = init_test_capture();
    let registry = Arc::new(CommandRegistry::new());
    register_builtin_commands(&registry);
    let dispatcher = AuthorizedDispatcher::new(registry);
    let host = InMemoryHost::new(StaticAuth::anonymous());
    let trace = TraceId::new();

    let mut a = args([("jobId", Value::from("nightly"))]);
    let err = dispatcher
        .dispatch_traced(JOB_ENQUEUE, &mut a, &host.context(), Some(&trace))
        .await
        .unwrap_err();
    assert!(matches!(err, CmdFlowError::Forbidden { .. }));

    let events = capture.events_with("trace_id", trace.as_str());
    let start = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_START))
        .expect("start event");
    let failed = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("end_error event");
    let request_id = start.field("request_id").expect("request_id on start");
    assert!(!request_id.is_empty());
    assert_eq!(failed.field("request_id"), Some(request_id));
    assert_eq!(failed.field("err_code"), Some("ERR_FORBIDDEN"));

    // each dispatch is its own request
    let second = TraceId::new();
    let mut b = Args::new();
    dispatcher
        .dispatch_traced(AGENT_LIST, &mut b, &host.context(), Some(&second))
        .await
        .unwrap();
    let other = capture
        .events_with("trace_id", second.as_str())
        .into_iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .expect("end event");
    assert_ne!(other.field("request_id"), Some(request_id));
}
