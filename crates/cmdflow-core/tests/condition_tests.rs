#![allow(clippy::unwrap_used, clippy::expect_used)]

use cmdflow_core::automation::run::{steps_scope, StepOutcome, StepStatus};
use cmdflow_core::condition::{evaluate, Condition, Scope};
use cmdflow_core::{CmdFlowError, EntityRef, RefKind, Value};
use proptest::prelude::*;

fn scope_with_outcomes() -> Scope {
    let outcomes = vec![
        StepOutcome {
            step_id: "s1".to_string(),
            command_id: "agent.create".to_string(),
            status: StepStatus::Completed,
            result: Value::from("ok"),
        },
        StepOutcome {
            step_id: "s2".to_string(),
            command_id: "channel.post".to_string(),
            status: StepStatus::Skipped,
            result: Value::from("Condition not met"),
        },
    ];
    let context = Value::object()
        .field(
            "auth",
            Value::object()
                .field(
                    "user",
                    Value::object().field("roles", vec!["admin"]).build(),
                )
                .build(),
        )
        .build();
    Scope::new(steps_scope(&outcomes), context)
}

#[test]
fn test_prior_outcome_conditions() {
    let scope = scope_with_outcomes();
    assert!(evaluate("steps['s1'].result === 'ok'", &scope).unwrap());
    assert!(evaluate("steps.s2.status === 'skipped'", &scope).unwrap());
    assert!(evaluate("steps['s1'].commandId == 'agent.create' && !steps.s3", &scope).unwrap());
    assert!(!evaluate("steps['s1'].result === 'fail'", &scope).unwrap());
}

#[test]
fn test_context_conditions() {
    let scope = scope_with_outcomes();
    assert!(evaluate("context.auth.user.roles[0] === 'admin'", &scope).unwrap());
    assert!(evaluate("context.auth.user.roles.length >= 1", &scope).unwrap());
}

#[test]
fn test_parsed_condition_is_reusable() {
    let condition = Condition::parse("steps.s1.result === 'ok'").unwrap();
    assert_eq!(condition.source(), "steps.s1.result === 'ok'");
    assert!(condition.evaluate(&scope_with_outcomes()).unwrap());
    assert!(condition
        .evaluate(&Scope::new(Value::object().build(), Value::Null))
        .is_err());
}

#[test]
fn test_no_calls_or_assignment() {
    for src in ["steps.s1.result()", "steps = 1", "context.x += 1", "a; b"] {
        assert!(
            matches!(
                Condition::parse(src),
                Err(CmdFlowError::ConditionParse { .. })
            ),
            "{src} should not parse"
        );
    }
}

#[test]
fn test_reference_results_expose_kind_and_id() {
    let outcomes = vec![StepOutcome {
        step_id: "mk".to_string(),
        command_id: "agent.create".to_string(),
        status: StepStatus::Completed,
        result: Value::Reference(EntityRef::new(RefKind::Agent, "a1")),
    }];
    let scope = Scope::new(steps_scope(&outcomes), Value::Null);
    assert!(evaluate("steps.mk.result.kind === 'agent'", &scope).unwrap());
    assert!(evaluate("steps['mk'].result['id'] === 'a1'", &scope).unwrap());
    assert!(evaluate("steps.mk.result.id.length === 2", &scope).unwrap());
    assert!(evaluate("steps.mk.result.name === undefined", &scope).unwrap());
    assert!(evaluate("steps.mk.result.name.first", &scope).is_err());
}

#[test]
fn test_oversized_condition_fails_instead_of_overflowing() {
    let scope = scope_with_outcomes();
    let or_chain = format!("false{}", " || false".repeat(10_000));
    let and_chain = format!("true{}", " && true".repeat(10_000));
    let eq_chain = format!("1{}", " == 1".repeat(10_000));
    let member_chain = format!("steps.s1{}", ".result".repeat(10_000));
    for src in [or_chain, and_chain, eq_chain, member_chain] {
        match evaluate(&src, &scope) {
            Err(CmdFlowError::ConditionParse { message, .. }) => {
                assert!(message.contains("too large"), "{message}");
            }
            other => panic!("Expected ConditionParse, got: {other:?}"),
        }
    }
}

#[test]
fn test_long_but_bounded_chain_still_evaluates() {
    let src = format!("false{} || true", " || false".repeat(200));
    assert!(evaluate(&src, &Scope::default()).unwrap());
}

proptest! {
    #[test]
    fn prop_arbitrary_input_never_panics(src in "\\PC{0,64}") {
        let _ = evaluate(&src, &scope_with_outcomes());
    }

    #[test]
    fn prop_expression_shaped_input_never_panics(
        src in "[ a-z0-9'\\[\\]().!=<>&|-]{0,48}"
    ) {
        let _ = evaluate(&src, &scope_with_outcomes());
    }

    #[test]
    fn prop_numeric_comparison_matches_integers(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let scope = Scope::default();
        let src = format!("{a} < {b}");
        prop_assert_eq!(evaluate(&src, &scope).unwrap(), a < b);
    }
}
