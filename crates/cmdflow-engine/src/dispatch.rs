//! Host-side dispatch with role checks.
//!
//! `CommandRegistry` treats `rbac` as metadata only. Hosts that expose
//! commands to end users route calls through `AuthorizedDispatcher`, which
//! checks the caller's roles and then hands off to the registry.

use std::sync::Arc;
use std::time::Instant;

use cmdflow_core::context::User;
use cmdflow_core::errors::{CmdFlowError, ExError, Result};
use cmdflow_core::types::{RequestId, TraceId};
use cmdflow_core::{
    log_op_end, log_op_error, log_op_start, Args, CommandDefinition, CommandRegistry, Context,
    Value,
};

/// Allow when `rbac` is empty or the user holds at least one listed role
///
/// # Errors
///
/// `Forbidden` naming the command and the user (`anonymous` when there is
/// no user).
pub fn authorize(def: &CommandDefinition, user: Option<&User>) -> Result<()> {
    if def.rbac.is_empty() {
        return Ok(());
    }
    match user {
        Some(u) if def.rbac.iter().any(|role| u.has_role(role)) => Ok(()),
        _ => Err(CmdFlowError::Forbidden {
            command_id: def.id.clone(),
            user: user.map_or_else(|| "anonymous".to_string(), |u| u.id.clone()),
        }),
    }
}

pub struct AuthorizedDispatcher {
    registry: Arc<CommandRegistry>,
}

impl AuthorizedDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Check the caller's roles, then execute through the registry
    ///
    /// # Errors
    ///
    /// `CommandNotFound`, `Forbidden`, or anything `CommandRegistry::execute`
    /// returns.
    pub async fn dispatch(&self, id: &str, args: &mut Args, ctx: &Context) -> Result<Value> {
        self.dispatch_traced(id, args, ctx, None).await
    }

    /// Same as `dispatch`, tagging the boundary events with a fresh
    /// `request_id` and, when given, the caller's `trace_id`
    ///
    /// # Errors
    ///
    /// As `dispatch`.
    pub async fn dispatch_traced(
        &self,
        id: &str,
        args: &mut Args,
        ctx: &Context,
        trace_id: Option<&TraceId>,
    ) -> Result<Value> {
        let request_id = RequestId::new();
        log_op_start!(
            "command_dispatch",
            command_id = id,
            request_id = request_id.as_str(),
            trace_id = trace_id.map(TraceId::as_str)
        );
        let start = Instant::now();

        let result = self.dispatch_inner(id, args, ctx).await;

        match &result {
            Ok(_) => {
                log_op_end!(
                    "command_dispatch",
                    duration_ms = start.elapsed().as_millis() as u64,
                    command_id = id,
                    request_id = request_id.as_str(),
                    trace_id = trace_id.map(TraceId::as_str)
                );
            }
            Err(e) => {
                let mut ex_err = ExError::from(e.clone()).with_request_id(request_id.clone());
                if let Some(trace) = trace_id {
                    ex_err = ex_err.with_trace_id(trace.clone());
                }
                log_op_error!(
                    "command_dispatch",
                    ex_err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    command_id = id
                );
            }
        }

        result
    }

    async fn dispatch_inner(&self, id: &str, args: &mut Args, ctx: &Context) -> Result<Value> {
        let def = self
            .registry
            .get(id)
            .ok_or_else(|| CmdFlowError::CommandNotFound {
                command_id: id.to_string(),
            })?;
        authorize(&def, ctx.auth.user().as_ref())?;
        self.registry.execute(id, args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(roles: &[&str]) -> CommandDefinition {
        CommandDefinition::new("admin.reset", |_a: Args, _c: Context| async {
            Ok(Value::Null)
        })
        .rbac(roles.iter().copied())
    }

    fn user(roles: &[&str]) -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_rbac_is_open() {
        assert!(authorize(&def(&[]), None).is_ok());
    }

    #[test]
    fn test_any_matching_role_is_enough() {
        let d = def(&["admin", "operator"]);
        assert!(authorize(&d, Some(&user(&["viewer", "operator"]))).is_ok());
    }

    #[test]
    fn test_missing_role_is_forbidden() {
        let err = authorize(&def(&["admin"]), Some(&user(&["viewer"]))).unwrap_err();
        assert_eq!(
            err,
            CmdFlowError::Forbidden {
                command_id: "admin.reset".to_string(),
                user: "u1".to_string()
            }
        );
    }

    #[test]
    fn test_anonymous_is_forbidden_when_roles_required() {
        match authorize(&def(&["admin"]), None).unwrap_err() {
            CmdFlowError::Forbidden { user, .. } => assert_eq!(user, "anonymous"),
            other => panic!("Expected Forbidden, got: {other:?}"),
        }
    }
}
