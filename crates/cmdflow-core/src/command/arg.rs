use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Declared type of a command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Agent,
    Channel,
    Group,
    Network,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Object => "object",
            ArgType::Array => "array",
            ArgType::Agent => "agent",
            ArgType::Channel => "channel",
            ArgType::Group => "group",
            ArgType::Network => "network",
        }
    }

    /// Whether the registry enforces this type before dispatch
    ///
    /// Only string/number/boolean/array are checked. Object and entity
    /// reference types are left to the consuming command.
    pub fn is_primitive_checked(&self) -> bool {
        matches!(
            self,
            ArgType::String | ArgType::Number | ArgType::Boolean | ArgType::Array
        )
    }

    /// Primitive type check; unchecked types accept anything
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ArgType::String => matches!(value, Value::String(_)),
            ArgType::Number => matches!(value, Value::Number(_)),
            ArgType::Boolean => matches!(value, Value::Bool(_)),
            ArgType::Array => matches!(value, Value::Array(_)),
            ArgType::Object
            | ArgType::Agent
            | ArgType::Channel
            | ArgType::Group
            | ArgType::Network => true,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom validation hook: `Ok(())` accepts, `Err(message)` rejects
#[derive(Clone)]
pub struct ArgValidator(Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>);

impl ArgValidator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for ArgValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArgValidator(..)")
    }
}

/// Declaration of one command parameter
///
/// `required` defaults to `true`. An optional argument with no default and
/// no supplied value is left absent from the args map.
#[derive(Debug, Clone)]
pub struct CommandArg {
    pub name: String,
    pub arg_type: ArgType,
    pub required: bool,
    pub description: String,
    pub default_value: Option<Value>,
    pub validation: Option<ArgValidator>,
}

impl CommandArg {
    pub fn new(name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            name: name.into(),
            arg_type,
            required: true,
            description: String::new(),
            default_value: None,
            validation: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validation = Some(ArgValidator::new(f));
        self
    }
}
