use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::command::definition::CommandDefinition;
use crate::context::Context;
use crate::errors::{CmdFlowError, Result};
use crate::value::{Args, Value};
use crate::{log_op_end, log_op_error, log_op_start};

/// Registry of command definitions keyed by id
///
/// Registration is last-write-wins: re-registering an id replaces the
/// definition and logs a warning, which lets a host redefine commands live.
///
/// The registry does **not** check `CommandDefinition::rbac`. Authorization
/// belongs to the host dispatch layer, which must check the caller's roles
/// before calling `execute`.
///
/// Locks are held only for map access, never across a command body.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<CommandDefinition>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, returning the one it replaced
    pub fn register(&self, def: CommandDefinition) -> Option<Arc<CommandDefinition>> {
        let id = def.id.clone();
        let previous = self
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(def));
        if previous.is_some() {
            tracing::warn!(command_id = %id, "Overwriting existing command definition");
        } else {
            tracing::debug!(command_id = %id, "Registered command");
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<Arc<CommandDefinition>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of every definition, sorted by id
    pub fn get_all(&self) -> Vec<Arc<CommandDefinition>> {
        let mut all: Vec<_> = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn list_by_tag(&self, tag: &str) -> Vec<Arc<CommandDefinition>> {
        self.get_all()
            .into_iter()
            .filter(|def| def.has_tag(tag))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Help text for one command: signature, description and per-argument docs
    pub fn describe(&self, id: &str) -> Option<String> {
        let def = self.get(id)?;
        let mut out = def.signature();
        if !def.description.is_empty() {
            out.push_str("\n  ");
            out.push_str(&def.description);
        }
        for arg in def.args.values().filter(|a| !a.description.is_empty()) {
            out.push_str(&format!("\n    {}: {}", arg.name, arg.description));
        }
        if !def.output.is_empty() {
            out.push_str(&format!("\n  returns: {}", def.output));
        }
        Some(out)
    }

    /// Validate `args` against the definition of `id`, then run its body
    ///
    /// Defaults for missing arguments are written into `args` in place, so the
    /// caller observes exactly what the command received. Arguments the
    /// command does not declare pass through untouched.
    ///
    /// # Errors
    ///
    /// - `CommandNotFound` if no definition is registered under `id`
    /// - `MissingArgument`, `TypeMismatch`, `ValidationFailed` from
    ///   argument validation; the body is not invoked
    /// - whatever error the body itself returns, unchanged
    pub async fn execute(&self, id: &str, args: &mut Args, ctx: &Context) -> Result<Value> {
        log_op_start!("command_execute", command_id = id);
        let start = Instant::now();

        let result = self.execute_inner(id, args, ctx).await;

        match &result {
            Ok(_) => {
                log_op_end!(
                    "command_execute",
                    duration_ms = start.elapsed().as_millis() as u64,
                    command_id = id
                );
            }
            Err(e) => {
                log_op_error!(
                    "command_execute",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    command_id = id
                );
            }
        }

        result
    }

    async fn execute_inner(&self, id: &str, args: &mut Args, ctx: &Context) -> Result<Value> {
        let def = self.get(id).ok_or_else(|| CmdFlowError::CommandNotFound {
            command_id: id.to_string(),
        })?;
        resolve_args(&def, args)?;
        def.handler().execute(args.clone(), ctx.clone()).await
    }
}

/// Apply defaults and checks for every declared argument of `def`
///
/// For each declared argument, in name order:
/// 1. absent or null: fill `default_value` if declared, else fail
///    `MissingArgument` when required, else leave it absent and skip 2-3
/// 2. primitive type check (string/number/boolean/array only)
/// 3. custom validation hook, on the possibly defaulted value
///
/// # Errors
///
/// Returns the first `MissingArgument`, `TypeMismatch` or `ValidationFailed`
/// encountered.
pub fn resolve_args(def: &CommandDefinition, args: &mut Args) -> Result<()> {
    for (name, decl) in &def.args {
        let supplied = args.get(name).is_some_and(|v| !v.is_null());
        if !supplied {
            if let Some(default) = &decl.default_value {
                args.insert(name.clone(), default.clone());
            } else if decl.required {
                return Err(CmdFlowError::MissingArgument {
                    command_id: def.id.clone(),
                    arg: name.clone(),
                });
            } else {
                continue;
            }
        }

        let Some(value) = args.get(name) else {
            continue;
        };

        if decl.arg_type.is_primitive_checked() && !decl.arg_type.accepts(value) {
            return Err(CmdFlowError::TypeMismatch {
                command_id: def.id.clone(),
                arg: name.clone(),
                expected: decl.arg_type.to_string(),
                actual: value.type_name().to_string(),
            });
        }

        if let Some(validator) = &decl.validation {
            validator
                .check(value)
                .map_err(|message| CmdFlowError::ValidationFailed {
                    command_id: def.id.clone(),
                    arg: name.clone(),
                    message,
                })?;
        }
    }
    Ok(())
}
