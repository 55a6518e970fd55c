#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};

use cmdflow_core::value::args;
use cmdflow_core::{
    Args, ArgType, CmdFlowError, CommandArg, CommandDefinition, CommandRegistry, Context, Value,
};

use common::{context_with_roles, null_context};

/// Command that records the args it was invoked with
fn recording(id: &str, seen: Arc<Mutex<Vec<Args>>>) -> CommandDefinition {
    CommandDefinition::new(id, move |args: Args, _ctx: Context| {
        let seen = seen.clone();
        async move {
            seen.lock().unwrap().push(args.clone());
            Ok(Value::Object(args))
        }
    })
}

#[tokio::test]
async fn test_unknown_command_is_not_found() {
    let registry = CommandRegistry::new();
    let (ctx, _) = null_context();
    let err = registry
        .execute("nope", &mut Args::new(), &ctx)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CmdFlowError::CommandNotFound {
            command_id: "nope".to_string()
        }
    );
}

#[tokio::test]
async fn test_required_argument_missing_then_supplied() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = CommandRegistry::new();
    registry.register(
        recording("agent.rename", seen.clone()).arg(CommandArg::new("name", ArgType::String)),
    );
    let (ctx, _) = null_context();

    let err = registry
        .execute("agent.rename", &mut Args::new(), &ctx)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CmdFlowError::MissingArgument {
            command_id: "agent.rename".to_string(),
            arg: "name".to_string()
        }
    );
    assert!(seen.lock().unwrap().is_empty(), "body must not run");

    let mut a = args([("name", Value::from("scout"))]);
    let out = registry.execute("agent.rename", &mut a, &ctx).await.unwrap();
    assert_eq!(out.property("name"), Some(Value::from("scout")));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_default_value_is_observed_by_body_and_caller() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = CommandRegistry::new();
    registry.register(
        recording("agent.create", seen.clone())
            .arg(CommandArg::new("model", ArgType::String).default_value("default")),
    );
    let (ctx, _) = null_context();

    let mut a = Args::new();
    registry.execute("agent.create", &mut a, &ctx).await.unwrap();

    let observed = seen.lock().unwrap()[0].clone();
    assert_eq!(observed.get("model"), Some(&Value::from("default")));
    assert_eq!(a.get("model"), Some(&Value::from("default")));
}

#[tokio::test]
async fn test_explicit_null_takes_default() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = CommandRegistry::new();
    registry.register(
        recording("agent.create", seen.clone())
            .arg(CommandArg::new("model", ArgType::String).default_value("default")),
    );
    let (ctx, _) = null_context();

    let mut a = args([("model", Value::Null)]);
    registry.execute("agent.create", &mut a, &ctx).await.unwrap();
    assert_eq!(a.get("model"), Some(&Value::from("default")));
}

#[tokio::test]
async fn test_type_mismatch_for_every_checked_type() {
    let registry = CommandRegistry::new();
    let (ctx, _) = null_context();
    let cases = [
        (ArgType::String, Value::Number(1.0)),
        (ArgType::Number, Value::from("3")),
        (ArgType::Boolean, Value::from("true")),
        (ArgType::Array, Value::from("[]")),
    ];

    for (arg_type, wrong) in cases {
        let id = format!("typed.{arg_type}");
        registry.register(
            recording(&id, Arc::new(Mutex::new(Vec::new())))
                .arg(CommandArg::new("value", arg_type)),
        );
        let mut a = args([("value", wrong)]);
        match registry.execute(&id, &mut a, &ctx).await.unwrap_err() {
            CmdFlowError::TypeMismatch { arg, expected, .. } => {
                assert_eq!(arg, "value");
                assert_eq!(expected, arg_type.as_str());
            }
            other => panic!("Expected TypeMismatch for {arg_type}, got: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_reference_types_are_not_checked() {
    let registry = CommandRegistry::new();
    registry.register(
        recording("channel.post", Arc::new(Mutex::new(Vec::new())))
            .arg(CommandArg::new("channel", ArgType::Channel)),
    );
    let (ctx, _) = null_context();
    let mut a = args([("channel", Value::from("not-a-reference"))]);
    assert!(registry.execute("channel.post", &mut a, &ctx).await.is_ok());
}

#[tokio::test]
async fn test_reregistering_replaces_definition() {
    let registry = CommandRegistry::new();
    let (ctx, _) = null_context();
    registry.register(CommandDefinition::new("version", |_a: Args, _c: Context| async {
        Ok(Value::from(1))
    }));
    let previous = registry.register(CommandDefinition::new(
        "version",
        |_a: Args, _c: Context| async { Ok(Value::from(2)) },
    ));

    assert!(previous.is_some());
    assert_eq!(registry.len(), 1);
    let out = registry
        .execute("version", &mut Args::new(), &ctx)
        .await
        .unwrap();
    assert_eq!(out, Value::from(2));
}

#[tokio::test]
async fn test_body_error_propagates_unchanged() {
    let registry = CommandRegistry::new();
    registry.register(CommandDefinition::new("explode", |_a: Args, _c: Context| async {
        Err(CmdFlowError::execution("explode", "kaboom"))
    }));
    let (ctx, _) = null_context();
    let err = registry
        .execute("explode", &mut Args::new(), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err, CmdFlowError::execution("explode", "kaboom"));
    assert_eq!(err.to_string(), "kaboom");
}

#[tokio::test]
async fn test_registry_ignores_rbac() {
    let registry = CommandRegistry::new();
    registry.register(
        CommandDefinition::new("admin.reset", |_a: Args, _c: Context| async {
            Ok(Value::from("reset"))
        })
        .rbac(["admin"]),
    );

    let (anonymous, _) = null_context();
    let (viewer, _) = context_with_roles(&["viewer"]);
    for ctx in [anonymous, viewer] {
        let out = registry
            .execute("admin.reset", &mut Args::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(out, Value::from("reset"));
    }
}

#[tokio::test]
async fn test_validation_runs_on_defaulted_value() {
    let checked = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = CommandRegistry::new();
    let log = checked.clone();
    registry.register(
        recording("queue.limit", seen.clone()).arg(
            CommandArg::new("limit", ArgType::Number)
                .default_value(0)
                .validate(move |v| {
                    log.lock().unwrap().push(v.clone());
                    match v.as_f64() {
                        Some(n) if n > 0.0 => Ok(()),
                        _ => Err("limit must be positive".to_string()),
                    }
                }),
        ),
    );
    let (ctx, _) = null_context();

    let mut a = Args::new();
    let err = registry
        .execute("queue.limit", &mut a, &ctx)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CmdFlowError::ValidationFailed {
            command_id: "queue.limit".to_string(),
            arg: "limit".to_string(),
            message: "limit must be positive".to_string()
        }
    );
    assert_eq!(*checked.lock().unwrap(), vec![Value::from(0)]);
    assert!(seen.lock().unwrap().is_empty(), "body must not run");

    let mut ok = args([("limit", Value::from(5))]);
    registry.execute("queue.limit", &mut ok, &ctx).await.unwrap();
    assert_eq!(checked.lock().unwrap().len(), 2);
}
