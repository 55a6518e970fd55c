use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::command::arg::CommandArg;
use crate::context::Context;
use crate::errors::Result;
use crate::value::{Args, Value};

/// Body of a command
///
/// Receives the validated (and default-filled) arguments plus the host
/// context. Any error returned here propagates out of
/// `CommandRegistry::execute` unchanged.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, args: Args, ctx: Context) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(Args, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, args: Args, ctx: Context) -> Result<Value> {
        (self)(args, ctx).await
    }
}

/// A registered command
///
/// Immutable once registered; re-registering the same id replaces the whole
/// definition.
#[derive(Clone)]
pub struct CommandDefinition {
    pub id: String,
    pub description: String,
    pub args: BTreeMap<String, CommandArg>,
    /// Roles allowed to invoke this command. Metadata only: enforcement is
    /// the host dispatch layer's job.
    pub rbac: Vec<String>,
    pub tags: Vec<String>,
    /// Human-readable description of the result
    pub output: String,
    pub output_schema: Option<Value>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    /// Define a command whose body is an async closure or `async fn`
    pub fn new<F, Fut>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::from_handler(id, body)
    }

    pub fn from_handler<H>(id: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        Self {
            id: id.into(),
            description: String::new(),
            args: BTreeMap::new(),
            rbac: Vec::new(),
            tags: Vec::new(),
            output: String::new(),
            output_schema: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare an argument; a later declaration with the same name wins
    pub fn arg(mut self, arg: CommandArg) -> Self {
        self.args.insert(arg.name.clone(), arg);
        self
    }

    pub fn rbac<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rbac = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn output(mut self, output: impl Into<String>, schema: Option<Value>) -> Self {
        self.output = output.into();
        self.output_schema = schema;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub(crate) fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }

    /// One-line signature, e.g. `channel.post <channel:channel> <message:string> [pin:boolean=false]`
    pub fn signature(&self) -> String {
        let mut out = self.id.clone();
        for arg in self.args.values() {
            let mut part = format!("{}:{}", arg.name, arg.arg_type);
            if let Some(default) = &arg.default_value {
                part.push('=');
                part.push_str(&default.to_string());
            }
            if arg.required && arg.default_value.is_none() {
                out.push_str(&format!(" <{part}>"));
            } else {
                out.push_str(&format!(" [{part}]"));
            }
        }
        out
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("args", &self.args)
            .field("rbac", &self.rbac)
            .field("tags", &self.tags)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
